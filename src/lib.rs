//! tradequery — trading condition query compiler.
//!
//! Parses condition expressions such as `current-price > sma(9) && rsi(14) < 30`
//! into an AST, determines which indicator series a backtest needs, and builds
//! the request payload sent to the remote evaluator. Core logic lives in
//! [`domain`], configuration loading in [`config`], the CLI in [`cli`].

pub mod cli;
pub mod config;
pub mod domain;
