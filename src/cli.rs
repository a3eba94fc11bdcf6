//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::StrategyConfig;
use crate::domain::error::TradequeryError;
use crate::domain::expr::{Expr, required_indicators};
use crate::domain::parser;
use crate::domain::request::{BacktestRequest, dedup_keys};

#[derive(Parser, Debug)]
#[command(name = "tradequery", about = "Trading condition query compiler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse a condition and print its serialized form
    Check {
        /// Condition text, e.g. "current-price > sma(9)"
        condition: String,
    },
    /// List the indicator series a condition depends on
    Indicators {
        condition: String,
        /// Collapse duplicate series keys
        #[arg(long)]
        dedup: bool,
    },
    /// Build a backtest request payload from a strategy config
    Request {
        #[arg(short, long)]
        config: PathBuf,
        /// Pretty-print the payload JSON
        #[arg(long)]
        pretty: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Check { condition } => run_check(&condition),
        Command::Indicators { condition, dedup } => run_indicators(&condition, dedup),
        Command::Request { config, pretty } => run_request(&config, pretty),
    }
}

fn parse_condition(label: &str, condition: &str) -> Result<Expr, ExitCode> {
    parser::parse(condition).map_err(|e| {
        eprintln!(
            "error: failed to parse {label} condition:\n{}",
            e.display_with_context(condition.trim())
        );
        ExitCode::from(&TradequeryError::from(e))
    })
}

fn run_check(condition: &str) -> ExitCode {
    let expr = match parse_condition("the", condition) {
        Ok(e) => e,
        Err(code) => return code,
    };

    eprintln!("Parsed: {expr}");
    match serde_json::to_string_pretty(&expr) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let err = TradequeryError::from(e);
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn run_indicators(condition: &str, dedup: bool) -> ExitCode {
    let expr = match parse_condition("the", condition) {
        Ok(e) => e,
        Err(code) => return code,
    };

    let mut keys = required_indicators(&expr);
    if dedup {
        keys = dedup_keys(keys);
    }

    for key in &keys {
        println!("{key}");
    }
    eprintln!("{} indicator series required", keys.len());
    ExitCode::SUCCESS
}

fn run_request(config_path: &PathBuf, pretty: bool) -> ExitCode {
    eprintln!("Loading strategy from {}", config_path.display());
    let config = match StrategyConfig::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(&e);
        }
    };

    let buy = match parse_condition("buy", &config.buy) {
        Ok(e) => e,
        Err(code) => return code,
    };
    let sell = match parse_condition("sell", &config.sell) {
        Ok(e) => e,
        Err(code) => return code,
    };

    eprintln!("Buy when:  {buy}");
    eprintln!("Sell when: {sell}");

    let request = BacktestRequest::new(config.params, buy, sell);
    eprintln!("Indicators: {}", request.indicators.join(", "));

    let serialized = if pretty {
        serde_json::to_string_pretty(&request)
    } else {
        serde_json::to_string(&request)
    };

    match serialized {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            let err = TradequeryError::from(e);
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}
