//! Currency metadata and locale defaults
//!
//! To add a currency, add an entry to the CURRENCIES array.

/// Display metadata for a fiat currency.
pub struct CurrencyDef {
    /// ISO 4217 code (e.g., "USD", "EUR")
    pub code: &'static str,
    /// Display symbol (e.g., "$", "€")
    pub symbol: &'static str,
    /// ISO 3166 regions using the currency
    pub regions: &'static [&'static str],
}

pub static CURRENCIES: &[CurrencyDef] = &[
    CurrencyDef {
        code: "USD",
        symbol: "$",
        regions: &["US", "EC", "SV", "PR", "PA", "TL", "ZW"],
    },
    CurrencyDef {
        code: "EUR",
        symbol: "€",
        regions: &[
            "AT", "BE", "CY", "DE", "EE", "ES", "FI", "FR", "GR", "HR", "IE", "IT", "LT", "LU",
            "LV", "MT", "NL", "PT", "SI", "SK", "AD", "MC", "ME", "SM", "VA",
        ],
    },
    CurrencyDef {
        code: "GBP",
        symbol: "£",
        regions: &["GB", "IM", "JE", "GG"],
    },
    CurrencyDef {
        code: "JPY",
        symbol: "¥",
        regions: &["JP"],
    },
    CurrencyDef {
        code: "CNY",
        symbol: "CN¥",
        regions: &["CN"],
    },
    CurrencyDef {
        code: "CHF",
        symbol: "CHF",
        regions: &["CH", "LI"],
    },
    CurrencyDef {
        code: "CAD",
        symbol: "CA$",
        regions: &["CA"],
    },
    CurrencyDef {
        code: "AUD",
        symbol: "A$",
        regions: &["AU"],
    },
    CurrencyDef {
        code: "NZD",
        symbol: "NZ$",
        regions: &["NZ"],
    },
    CurrencyDef {
        code: "SEK",
        symbol: "kr",
        regions: &["SE"],
    },
    CurrencyDef {
        code: "NOK",
        symbol: "kr",
        regions: &["NO"],
    },
    CurrencyDef {
        code: "DKK",
        symbol: "kr.",
        regions: &["DK", "GL", "FO"],
    },
    CurrencyDef {
        code: "PLN",
        symbol: "zł",
        regions: &["PL"],
    },
    CurrencyDef {
        code: "CZK",
        symbol: "Kč",
        regions: &["CZ"],
    },
    CurrencyDef {
        code: "HUF",
        symbol: "Ft",
        regions: &["HU"],
    },
    CurrencyDef {
        code: "RUB",
        symbol: "₽",
        regions: &["RU"],
    },
    CurrencyDef {
        code: "UAH",
        symbol: "₴",
        regions: &["UA"],
    },
    CurrencyDef {
        code: "TRY",
        symbol: "₺",
        regions: &["TR"],
    },
    CurrencyDef {
        code: "ILS",
        symbol: "₪",
        regions: &["IL"],
    },
    CurrencyDef {
        code: "INR",
        symbol: "₹",
        regions: &["IN"],
    },
    CurrencyDef {
        code: "KRW",
        symbol: "₩",
        regions: &["KR"],
    },
    CurrencyDef {
        code: "BRL",
        symbol: "R$",
        regions: &["BR"],
    },
    CurrencyDef {
        code: "MXN",
        symbol: "MX$",
        regions: &["MX"],
    },
    CurrencyDef {
        code: "ARS",
        symbol: "AR$",
        regions: &["AR"],
    },
    CurrencyDef {
        code: "ZAR",
        symbol: "R",
        regions: &["ZA"],
    },
    CurrencyDef {
        code: "SGD",
        symbol: "S$",
        regions: &["SG"],
    },
    CurrencyDef {
        code: "HKD",
        symbol: "HK$",
        regions: &["HK"],
    },
    CurrencyDef {
        code: "THB",
        symbol: "฿",
        regions: &["TH"],
    },
    CurrencyDef {
        code: "IDR",
        symbol: "Rp",
        regions: &["ID"],
    },
    CurrencyDef {
        code: "PHP",
        symbol: "₱",
        regions: &["PH"],
    },
    CurrencyDef {
        code: "NGN",
        symbol: "₦",
        regions: &["NG"],
    },
];

/// Looks up a currency definition by ISO code.
pub fn find(code: &str) -> Option<&'static CurrencyDef> {
    CURRENCIES.iter().find(|d| d.code == code)
}

/// Display symbol for `code`, or the code itself when the currency is unknown.
pub fn currency_symbol(code: &str) -> &str {
    find(code).map_or(code, |d| d.symbol)
}

/// Resolves the currency used in a POSIX-style locale such as `de_DE.UTF-8`.
pub fn currency_for_locale(locale: &str) -> Option<&'static str> {
    let name = locale.split(['.', '@']).next()?;
    let region = name.split(['_', '-']).nth(1)?.to_ascii_uppercase();
    CURRENCIES
        .iter()
        .find(|d| d.regions.contains(&region.as_str()))
        .map(|d| d.code)
}

/// Currency of the environment locale, if one can be determined.
///
/// An explicit `locale` wins over `LC_ALL`, `LC_MONETARY` and `LANG`.
pub fn default_currency_code(locale: Option<&str>) -> Option<String> {
    let locale = match locale {
        Some(l) => l.to_string(),
        None => ["LC_ALL", "LC_MONETARY", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty())?,
    };
    currency_for_locale(&locale).map(str::to_string)
}
