//! Backtest request payload.
//!
//! The transport snapshot handed to the remote evaluator: both strategy
//! trees in their `kind`-tagged form, the merged list of indicator series
//! the evaluator must compute, and the accompanying trade parameters. Field
//! names on the wire are camelCase.

use crate::domain::expr::{Expr, required_indicators};
use serde::{Deserialize, Serialize};

/// Trade parameters that accompany a backtest request. These come from the
/// caller's form or config and pass through unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeParams {
    pub coin_pair: String,
    pub time_unit: String,
    pub capital: f64,
    pub stop_loss: f64,
    pub start_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub coin_pair: String,
    pub time_unit: String,
    pub capital: f64,
    pub stop_loss: f64,
    pub start_time: i64,
    pub buy_strategy: Expr,
    pub sell_strategy: Expr,
    pub indicators: Vec<String>,
}

impl BacktestRequest {
    /// Assemble a request from parsed buy/sell strategies. The indicator
    /// list is the union of both sides' requirements, deduplicated with
    /// first-occurrence order (buy side first).
    pub fn new(params: TradeParams, buy_strategy: Expr, sell_strategy: Expr) -> Self {
        let indicators = merged_indicators(&buy_strategy, &sell_strategy);
        Self {
            coin_pair: params.coin_pair,
            time_unit: params.time_unit,
            capital: params.capital,
            stop_loss: params.stop_loss,
            start_time: params.start_time,
            buy_strategy,
            sell_strategy,
            indicators,
        }
    }
}

/// Deduplicated union of the indicator series required by both strategy
/// sides, preserving first-occurrence order.
pub fn merged_indicators(buy: &Expr, sell: &Expr) -> Vec<String> {
    dedup_keys(
        required_indicators(buy)
            .into_iter()
            .chain(required_indicators(sell)),
    )
}

/// Collapse duplicate series keys, keeping first-occurrence order. This is
/// the ordering rule of the wire contract's `indicators` list.
pub fn dedup_keys(keys: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut deduped = Vec::new();
    for key in keys {
        if !deduped.contains(&key) {
            deduped.push(key);
        }
    }
    deduped
}
