use super::ui;
use crate::core::currency::currency_symbol;
use crate::engine::{QueryEngine, QueryFilter, QueryRequest, RateRow};
use anyhow::Result;
use comfy_table::Cell;
use rust_decimal::{Decimal, RoundingStrategy};

fn title(filter: &QueryFilter) -> String {
    match filter {
        QueryFilter::All => "Exchange rates".to_string(),
        QueryFilter::Search(query) => format!("Exchange rates matching \"{query}\""),
        QueryFilter::Code(Some(code)) => format!("Exchange rate for {code}"),
        QueryFilter::Code(None) => "Default exchange rate".to_string(),
    }
}

/// Two decimals for whole amounts, full precision for sub-unit rates.
fn format_rate(amount: Decimal) -> String {
    if amount.abs() < Decimal::ONE {
        amount.normalize().to_string()
    } else {
        amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            .to_string()
    }
}

/// Renders query rows as a table, one row per currency.
pub fn display_rows(rows: &[RateRow]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Symbol"),
        ui::header_cell("Rate (per coin)"),
        ui::header_cell("Source"),
    ]);

    for row in rows {
        let rate = row.to_exchange_rate();
        table.add_row(vec![
            Cell::new(&row.currency_code),
            Cell::new(currency_symbol(&row.currency_code)),
            ui::amount_cell(format_rate(rate.fiat_decimal())),
            ui::subtle_cell(&row.source),
        ]);
    }
    table.to_string()
}

pub async fn run(engine: &QueryEngine, request: &QueryRequest, now_ms: i64) -> Result<()> {
    let pb = (!request.offline).then(|| ui::new_spinner("Fetching exchange rates..."));
    let rows = engine.query(now_ms, request).await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let Some(rows) = rows else {
        println!(
            "{}",
            ui::style_text("No exchange rates available", ui::StyleType::Subtle)
        );
        return Ok(());
    };

    println!("{}\n", ui::style_text(&title(&request.filter), ui::StyleType::Title));
    if rows.is_empty() {
        println!("{}", ui::style_text("No matching currency", ui::StyleType::Error));
    } else {
        println!("{}", display_rows(&rows));
    }
    Ok(())
}
