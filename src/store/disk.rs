use anyhow::{Context, Result};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::{debug, warn};

use super::RateStore;
use crate::core::ExchangeRate;
use crate::core::rate::COIN;

const PARTITION: &str = "exchange_rates";

pub const KEY_CURRENCY_CODE: &str = "currency_code";
pub const KEY_RATE_COIN: &str = "rate_coin";
pub const KEY_RATE_FIAT: &str = "rate_fiat";
pub const KEY_SOURCE: &str = "source";

/// Rate store backed by a fjall keyspace on disk.
pub struct DiskRateStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskRateStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open rate store at {}", path.display()))?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            partition,
        })
    }

    fn field(&self, key: &str) -> Result<Option<String>> {
        match self.partition.get(key.as_bytes())? {
            Some(value) => Ok(Some(
                String::from_utf8(value.to_vec())
                    .with_context(|| format!("Stored {key} is not UTF-8"))?,
            )),
            None => Ok(None),
        }
    }
}

impl RateStore for DiskRateStore {
    fn load(&self) -> Result<Option<ExchangeRate>> {
        let (Some(code), Some(coin), Some(fiat), Some(source)) = (
            self.field(KEY_CURRENCY_CODE)?,
            self.field(KEY_RATE_COIN)?,
            self.field(KEY_RATE_FIAT)?,
            self.field(KEY_SOURCE)?,
        ) else {
            debug!("Store MISS");
            return Ok(None);
        };

        let rate = ExchangeRate {
            currency_code: code,
            coin_amount: coin
                .parse()
                .with_context(|| format!("Invalid stored {KEY_RATE_COIN}: {coin}"))?,
            fiat_amount: fiat
                .parse()
                .with_context(|| format!("Invalid stored {KEY_RATE_FIAT}: {fiat}"))?,
            source,
        };
        if rate.coin_amount != COIN || rate.fiat_amount <= 0 {
            warn!(
                currency = %rate.currency_code,
                coin = rate.coin_amount,
                fiat = rate.fiat_amount,
                "Ignoring stored rate with invalid amounts"
            );
            return Ok(None);
        }
        debug!(currency = %rate.currency_code, "Store HIT");
        Ok(Some(rate))
    }

    fn save(&self, rate: &ExchangeRate) -> Result<()> {
        let coin = rate.coin_amount.to_string();
        let fiat = rate.fiat_amount.to_string();

        let mut batch = self.keyspace.batch();
        batch.insert(
            &self.partition,
            KEY_CURRENCY_CODE.as_bytes(),
            rate.currency_code.as_bytes(),
        );
        batch.insert(&self.partition, KEY_RATE_COIN.as_bytes(), coin.as_bytes());
        batch.insert(&self.partition, KEY_RATE_FIAT.as_bytes(), fiat.as_bytes());
        batch.insert(&self.partition, KEY_SOURCE.as_bytes(), rate.source.as_bytes());
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        debug!(currency = %rate.currency_code, "Store SAVE");
        Ok(())
    }
}
