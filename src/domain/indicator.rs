//! Indicator leaf values.
//!
//! An [`Indicator`] is one side of a comparison: the current traded price, a
//! literal number, or a named technical indicator with a lookback period.
//! The serde representation is the `kind`-tagged form the backtest evaluator
//! consumes, and [`Indicator::series_key`] produces the canonical series key
//! (`sma-9`, `currentprice`) used to request computed data.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Indicator {
    #[serde(rename = "currentprice")]
    Price,
    Sma { period: usize },
    Ema { period: usize },
    Rsi { period: usize },
    #[serde(rename = "real")]
    Real { val: f64 },
}

impl Indicator {
    /// Canonical key for the indicator's data series on the wire.
    ///
    /// `Real` literals have no key: a constant never needs a server-side
    /// series. The `{kind}-{period}` shape and the fixed `currentprice` key
    /// are part of the evaluator contract and must not change.
    pub fn series_key(&self) -> Option<String> {
        match self {
            Indicator::Price => Some("currentprice".to_string()),
            Indicator::Sma { period } => Some(format!("sma-{period}")),
            Indicator::Ema { period } => Some(format!("ema-{period}")),
            Indicator::Rsi { period } => Some(format!("rsi-{period}")),
            Indicator::Real { .. } => None,
        }
    }

    /// Resolve a canonical series key back to its indicator.
    ///
    /// Pure inverse of [`series_key`](Self::series_key) for the keys that
    /// have one. Only the canonical period shape is accepted: ASCII digits
    /// with no sign and no leading zero, so keys with a zero, signed, or
    /// otherwise malformed period resolve to `None`.
    pub fn from_key(key: &str) -> Option<Indicator> {
        if key == "currentprice" {
            return Some(Indicator::Price);
        }

        let (kind, period) = key.split_once('-')?;
        if period.is_empty()
            || !period.bytes().all(|b| b.is_ascii_digit())
            || period.starts_with('0')
        {
            return None;
        }
        let period: usize = period.parse().ok()?;

        match kind {
            "sma" => Some(Indicator::Sma { period }),
            "ema" => Some(Indicator::Ema { period }),
            "rsi" => Some(Indicator::Rsi { period }),
            _ => None,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Price => write!(f, "current-price"),
            Indicator::Sma { period } => write!(f, "sma({period})"),
            Indicator::Ema { period } => write!(f, "ema({period})"),
            Indicator::Rsi { period } => write!(f, "rsi({period})"),
            Indicator::Real { val } => write!(f, "{val}"),
        }
    }
}
