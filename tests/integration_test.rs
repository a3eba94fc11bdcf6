//! End-to-end tests: strategy config on disk → parsed conditions → backtest
//! request payload.

use std::io::Write;
use tempfile::NamedTempFile;
use tradequery::config::StrategyConfig;
use tradequery::domain::error::TradequeryError;
use tradequery::domain::expr::{Expr, required_indicators};
use tradequery::domain::indicator::Indicator;
use tradequery::domain::parser::parse;
use tradequery::domain::request::BacktestRequest;

const VALID_INI: &str = r#"
[backtest]
coin_pair = BTC-USD
time_unit = 1h
capital = 10000
stop_loss = 5
start_time = 1514764800

[strategy]
buy = rsi(14) < 30 && sma(9) > sma(15)
sell = rsi(14) > 70 || current-price < sma(15)
"#;

fn write_temp_ini(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn config_to_request_pipeline() {
    let file = write_temp_ini(VALID_INI);
    let config = StrategyConfig::from_file(file.path()).unwrap();

    let buy = parse(&config.buy).unwrap();
    let sell = parse(&config.sell).unwrap();

    assert_eq!(required_indicators(&buy), vec!["rsi-14", "sma-9", "sma-15"]);
    assert_eq!(required_indicators(&sell), vec!["rsi-14", "sma-15"]);

    let request = BacktestRequest::new(config.params, buy, sell);
    assert_eq!(request.indicators, vec!["rsi-14", "sma-9", "sma-15"]);

    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["coinPair"], "BTC-USD");
    assert_eq!(json["timeUnit"], "1h");
    assert_eq!(json["stopLoss"], 5.0);
    assert_eq!(json["startTime"], 1_514_764_800i64);
    assert_eq!(json["buyStrategy"]["kind"], "And");
    assert_eq!(json["sellStrategy"]["kind"], "Or");
}

#[test]
fn buy_strategy_wire_shape_matches_evaluator_contract() {
    let buy = parse("current-price > sma(9)").unwrap();
    let json = serde_json::to_value(&buy).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "kind": "GT",
            "l": {"kind": "currentprice"},
            "r": {"kind": "sma", "period": 9},
        })
    );
}

#[test]
fn malformed_condition_in_config_surfaces_as_parse_error() {
    let content = VALID_INI.replace("rsi(14) > 70 || current-price < sma(15)", "rsi(14) >");
    let file = write_temp_ini(&content);
    let config = StrategyConfig::from_file(file.path()).unwrap();

    assert!(parse(&config.buy).is_ok());
    let err = parse(&config.sell).unwrap_err();
    let top = TradequeryError::from(err);
    assert!(matches!(top, TradequeryError::ConditionParse(_)));
}

#[test]
fn previously_serialized_ast_can_be_retransmitted() {
    // The UI may hand back an AST it serialized earlier; it must deserialize
    // to the same tree the original text parses to.
    let expr = parse("!(current-price < 10) && rsi(14) <= 70").unwrap();
    let wire = serde_json::to_string(&expr).unwrap();
    let back: Expr = serde_json::from_str(&wire).unwrap();
    assert_eq!(back, expr);
}

#[test]
fn series_keys_resolve_back_to_indicators() {
    let buy = parse("rsi(14) < 30 && sma(9) > ema(21)").unwrap();
    for key in required_indicators(&buy) {
        let indicator = Indicator::from_key(&key).unwrap();
        assert_eq!(indicator.series_key().unwrap(), key);
    }
}
