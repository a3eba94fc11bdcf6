//! Strategy configuration loading.
//!
//! INI files with a `[backtest]` section for trade parameters and a
//! `[strategy]` section holding the raw buy/sell condition strings:
//!
//! ```ini
//! [backtest]
//! coin_pair = BTC-USD
//! time_unit = 1h
//! capital = 10000
//! stop_loss = 5
//! start_time = 1514764800
//!
//! [strategy]
//! buy = rsi(14) < 30 && sma(9) > sma(15)
//! sell = rsi(14) > 70
//! ```
//!
//! The conditions are kept as strings here; parsing them is the caller's
//! step so that a parse failure can be reported against the raw text.

use crate::domain::error::TradequeryError;
use crate::domain::request::TradeParams;
use configparser::ini::Ini;
use std::path::Path;

const DEFAULT_TIME_UNIT: &str = "1h";

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub params: TradeParams,
    pub buy: String,
    pub sell: String,
}

impl StrategyConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TradequeryError> {
        let mut config = Ini::new();
        config
            .load(&path)
            .map_err(|reason| TradequeryError::ConfigParse {
                file: path.as_ref().display().to_string(),
                reason,
            })?;
        Self::from_ini(&config)
    }

    pub fn from_string(content: &str) -> Result<Self, TradequeryError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| TradequeryError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Self::from_ini(&config)
    }

    fn from_ini(config: &Ini) -> Result<Self, TradequeryError> {
        let coin_pair = require_string(config, "backtest", "coin_pair")?;
        let time_unit = config
            .get("backtest", "time_unit")
            .unwrap_or_else(|| DEFAULT_TIME_UNIT.to_string());

        let capital = require_double(config, "backtest", "capital")?;
        if capital <= 0.0 {
            return Err(TradequeryError::ConfigInvalid {
                section: "backtest".into(),
                key: "capital".into(),
                reason: "must be greater than zero".into(),
            });
        }

        let stop_loss = get_double(config, "backtest", "stop_loss", 0.0)?;
        if !(0.0..=100.0).contains(&stop_loss) {
            return Err(TradequeryError::ConfigInvalid {
                section: "backtest".into(),
                key: "stop_loss".into(),
                reason: "must be a percentage between 0 and 100".into(),
            });
        }

        let start_time = get_int(config, "backtest", "start_time", 0)?;

        let buy = require_string(config, "strategy", "buy")?;
        let sell = require_string(config, "strategy", "sell")?;

        Ok(Self {
            params: TradeParams {
                coin_pair,
                time_unit,
                capital,
                stop_loss,
                start_time,
            },
            buy,
            sell,
        })
    }
}

fn require_string(config: &Ini, section: &str, key: &str) -> Result<String, TradequeryError> {
    config
        .get(section, key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| TradequeryError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        })
}

fn require_double(config: &Ini, section: &str, key: &str) -> Result<f64, TradequeryError> {
    match config.getfloat(section, key) {
        Ok(Some(v)) => Ok(v),
        Ok(None) => Err(TradequeryError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
        Err(reason) => Err(TradequeryError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        }),
    }
}

fn get_double(
    config: &Ini,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TradequeryError> {
    match config.getfloat(section, key) {
        Ok(Some(v)) => Ok(v),
        Ok(None) => Ok(default),
        Err(reason) => Err(TradequeryError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        }),
    }
}

fn get_int(config: &Ini, section: &str, key: &str, default: i64) -> Result<i64, TradequeryError> {
    match config.getint(section, key) {
        Ok(Some(v)) => Ok(v),
        Ok(None) => Ok(default),
        Err(reason) => Err(TradequeryError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        }),
    }
}
