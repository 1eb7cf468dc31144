use anyhow::{Context, Result};
use std::env;

use crate::aggregator::ResultOrder;
use crate::error::MatchError;
use crate::period::PeriodGranularity;

/// Settings for the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    number_length: usize,
    granularity: PeriodGranularity,
    order: ResultOrder,
}

impl MatchConfig {
    pub const DEFAULT_NUMBER_LENGTH: usize = 10;

    pub fn new(number_length: usize) -> Result<Self, MatchError> {
        if number_length == 0 {
            return Err(MatchError::InvalidConfig(
                "number length must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            number_length,
            granularity: PeriodGranularity::default(),
            order: ResultOrder::default(),
        })
    }

    pub fn with_granularity(mut self, granularity: PeriodGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_order(mut self, order: ResultOrder) -> Self {
        self.order = order;
        self
    }

    pub fn number_length(&self) -> usize {
        self.number_length
    }

    pub fn granularity(&self) -> PeriodGranularity {
        self.granularity
    }

    pub fn order(&self) -> ResultOrder {
        self.order
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            number_length: Self::DEFAULT_NUMBER_LENGTH,
            granularity: PeriodGranularity::Month,
            order: ResultOrder::Input,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub winning_numbers_url: Option<String>,
    pub matching: MatchConfig,
}

pub fn load() -> Result<Config> {
    load_from(|key| env::var(key).ok())
}

pub fn load_from<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let database_url = lookup("LOTTO_DB_PATH").unwrap_or_else(|| "data/lottery.db".to_string());
    let winning_numbers_url = lookup("LOTTO_WINNING_NUMBERS_URL").filter(|url| !url.trim().is_empty());

    let number_length = match lookup("LOTTO_NUMBER_LENGTH") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("LOTTO_NUMBER_LENGTH is not a number: {:?}", raw))?,
        None => MatchConfig::DEFAULT_NUMBER_LENGTH,
    };

    let granularity = match lookup("LOTTO_PERIOD") {
        Some(raw) => raw.parse::<PeriodGranularity>().map_err(anyhow::Error::msg)?,
        None => PeriodGranularity::default(),
    };

    let order = match lookup("LOTTO_RESULT_ORDER") {
        Some(raw) => raw.parse::<ResultOrder>().map_err(anyhow::Error::msg)?,
        None => ResultOrder::default(),
    };

    let matching = MatchConfig::new(number_length)?
        .with_granularity(granularity)
        .with_order(order);

    Ok(Config {
        database_url,
        winning_numbers_url,
        matching,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = load_from(lookup(&[])).unwrap();
        assert_eq!(config.database_url, "data/lottery.db");
        assert_eq!(config.winning_numbers_url, None);
        assert_eq!(config.matching, MatchConfig::default());
        assert_eq!(config.matching.number_length(), 10);
    }

    #[test]
    fn test_overrides() {
        let config = load_from(lookup(&[
            ("LOTTO_DB_PATH", "/tmp/t.db"),
            ("LOTTO_NUMBER_LENGTH", "6"),
            ("LOTTO_PERIOD", "week"),
            ("LOTTO_RESULT_ORDER", "purchase-date-desc"),
            ("LOTTO_WINNING_NUMBERS_URL", "http://localhost/api/winning-numbers"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "/tmp/t.db");
        assert_eq!(config.matching.number_length(), 6);
        assert_eq!(config.matching.granularity(), PeriodGranularity::Week);
        assert_eq!(config.matching.order(), ResultOrder::PurchaseDateDesc);
        assert!(config.winning_numbers_url.is_some());
    }

    #[test]
    fn test_zero_length_rejected() {
        assert_eq!(
            MatchConfig::new(0),
            Err(MatchError::InvalidConfig(
                "number length must be at least 1".to_string()
            ))
        );
        assert!(load_from(lookup(&[("LOTTO_NUMBER_LENGTH", "0")])).is_err());
        assert!(load_from(lookup(&[("LOTTO_NUMBER_LENGTH", "ten")])).is_err());
        assert!(load_from(lookup(&[("LOTTO_PERIOD", "daily")])).is_err());
    }
}
