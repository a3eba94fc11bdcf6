//! Condition expression AST.
//!
//! An [`Expr`] is a boolean tree over [`Indicator`] leaves: comparisons at
//! the bottom, conjunction/disjunction/negation above. Trees are immutable
//! once built by the parser. The serde representation mirrors the
//! `kind`-tagged JSON the backtest evaluator consumes; `Display` renders the
//! expression back to condition syntax.

use crate::domain::indicator::Indicator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A condition expression. Comparison variants hold indicator leaves only,
/// never nested expressions; `!=` in the source desugars to `Not(Eq)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    Eq {
        #[serde(rename = "l")]
        left: Indicator,
        #[serde(rename = "r")]
        right: Indicator,
    },
    #[serde(rename = "LT")]
    Lt {
        #[serde(rename = "l")]
        left: Indicator,
        #[serde(rename = "r")]
        right: Indicator,
    },
    #[serde(rename = "GT")]
    Gt {
        #[serde(rename = "l")]
        left: Indicator,
        #[serde(rename = "r")]
        right: Indicator,
    },
    #[serde(rename = "LEq")]
    Le {
        #[serde(rename = "l")]
        left: Indicator,
        #[serde(rename = "r")]
        right: Indicator,
    },
    #[serde(rename = "GEq")]
    Ge {
        #[serde(rename = "l")]
        left: Indicator,
        #[serde(rename = "r")]
        right: Indicator,
    },
    And {
        #[serde(rename = "e1")]
        left: Box<Expr>,
        #[serde(rename = "e2")]
        right: Box<Expr>,
    },
    Or {
        #[serde(rename = "e1")]
        left: Box<Expr>,
        #[serde(rename = "e2")]
        right: Box<Expr>,
    },
    Not {
        #[serde(rename = "e")]
        expr: Box<Expr>,
    },
}

/// Collect the indicator series keys a condition depends on, in
/// left-to-right tree order. Duplicates are preserved; callers dedup when
/// merging buy- and sell-side requirements. Price and literal leaves emit
/// nothing: price data is always available and constants need no series.
pub fn required_indicators(expr: &Expr) -> Vec<String> {
    let mut keys = Vec::new();
    collect_keys(expr, &mut keys);
    keys
}

fn collect_keys(expr: &Expr, keys: &mut Vec<String>) {
    match expr {
        Expr::Eq { left, right }
        | Expr::Lt { left, right }
        | Expr::Gt { left, right }
        | Expr::Le { left, right }
        | Expr::Ge { left, right } => {
            push_leaf(left, keys);
            push_leaf(right, keys);
        }
        Expr::And { left, right } | Expr::Or { left, right } => {
            collect_keys(left, keys);
            collect_keys(right, keys);
        }
        Expr::Not { expr } => collect_keys(expr, keys),
    }
}

fn push_leaf(leaf: &Indicator, keys: &mut Vec<String>) {
    match leaf {
        Indicator::Sma { .. } | Indicator::Ema { .. } | Indicator::Rsi { .. } => {
            if let Some(key) = leaf.series_key() {
                keys.push(key);
            }
        }
        Indicator::Price | Indicator::Real { .. } => {}
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Eq { left, right } => write!(f, "{left} = {right}"),
            Expr::Lt { left, right } => write!(f, "{left} < {right}"),
            Expr::Gt { left, right } => write!(f, "{left} > {right}"),
            Expr::Le { left, right } => write!(f, "{left} <= {right}"),
            Expr::Ge { left, right } => write!(f, "{left} >= {right}"),
            Expr::And { left, right } => {
                // Parenthesize wherever the grammar would otherwise regroup:
                // a left-nested And, or an Or child under an And.
                fmt_child(left, f, matches!(**left, Expr::And { .. } | Expr::Or { .. }))?;
                write!(f, " && ")?;
                fmt_child(right, f, matches!(**right, Expr::Or { .. }))
            }
            Expr::Or { left, right } => {
                fmt_child(left, f, matches!(**left, Expr::Or { .. }))?;
                write!(f, " || ")?;
                fmt_child(right, f, false)
            }
            Expr::Not { expr } => write!(f, "!({expr})"),
        }
    }
}

fn fmt_child(child: &Expr, f: &mut fmt::Formatter<'_>, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({child})")
    } else {
        write!(f, "{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gt(left: Indicator, right: Indicator) -> Expr {
        Expr::Gt { left, right }
    }

    fn price_above(value: f64) -> Expr {
        gt(Indicator::Price, Indicator::Real { val: value })
    }

    #[test]
    fn extract_single_comparison() {
        let expr = gt(Indicator::Price, Indicator::Sma { period: 9 });
        assert_eq!(required_indicators(&expr), vec!["sma-9"]);
    }

    #[test]
    fn extract_preserves_left_to_right_order() {
        let expr = Expr::And {
            left: Box::new(Expr::Lt {
                left: Indicator::Rsi { period: 14 },
                right: Indicator::Real { val: 30.0 },
            }),
            right: Box::new(gt(
                Indicator::Sma { period: 9 },
                Indicator::Sma { period: 15 },
            )),
        };
        assert_eq!(required_indicators(&expr), vec!["rsi-14", "sma-9", "sma-15"]);
    }

    #[test]
    fn extract_keeps_duplicates() {
        let expr = Expr::Or {
            left: Box::new(gt(Indicator::Sma { period: 9 }, Indicator::Price)),
            right: Box::new(gt(
                Indicator::Sma { period: 9 },
                Indicator::Real { val: 100.0 },
            )),
        };
        assert_eq!(required_indicators(&expr), vec!["sma-9", "sma-9"]);
    }

    #[test]
    fn extract_skips_price_and_literals() {
        assert_eq!(required_indicators(&price_above(10.0)), Vec::<String>::new());
    }

    #[test]
    fn extract_recurses_through_not() {
        let expr = Expr::Not {
            expr: Box::new(gt(Indicator::Ema { period: 21 }, Indicator::Price)),
        };
        assert_eq!(required_indicators(&expr), vec!["ema-21"]);
    }

    #[test]
    fn display_comparison() {
        let expr = gt(Indicator::Price, Indicator::Sma { period: 9 });
        assert_eq!(expr.to_string(), "current-price > sma(9)");
    }

    #[test]
    fn display_and_binds_tighter_than_or() {
        let expr = Expr::Or {
            left: Box::new(Expr::And {
                left: Box::new(price_above(1.0)),
                right: Box::new(price_above(2.0)),
            }),
            right: Box::new(price_above(3.0)),
        };
        assert_eq!(
            expr.to_string(),
            "current-price > 1 && current-price > 2 || current-price > 3"
        );
    }

    #[test]
    fn display_parenthesizes_or_under_and() {
        let expr = Expr::And {
            left: Box::new(Expr::Or {
                left: Box::new(price_above(1.0)),
                right: Box::new(price_above(2.0)),
            }),
            right: Box::new(price_above(3.0)),
        };
        assert_eq!(
            expr.to_string(),
            "(current-price > 1 || current-price > 2) && current-price > 3"
        );
    }

    #[test]
    fn display_not() {
        let expr = Expr::Not {
            expr: Box::new(price_above(10.0)),
        };
        assert_eq!(expr.to_string(), "!(current-price > 10)");
    }

    #[test]
    fn serialize_comparison_kind_tags() {
        let expr = Expr::Ge {
            left: Indicator::Price,
            right: Indicator::Sma { period: 9 },
        };
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "GEq",
                "l": {"kind": "currentprice"},
                "r": {"kind": "sma", "period": 9},
            })
        );
    }

    #[test]
    fn serialize_nested_combinators() {
        let expr = Expr::Not {
            expr: Box::new(Expr::And {
                left: Box::new(price_above(1.0)),
                right: Box::new(price_above(2.0)),
            }),
        };
        let json = serde_json::to_value(&expr).unwrap();
        assert_eq!(json["kind"], "Not");
        assert_eq!(json["e"]["kind"], "And");
        assert_eq!(json["e"]["e1"]["kind"], "GT");
    }

    #[test]
    fn deserialize_round_trips() {
        let expr = Expr::Or {
            left: Box::new(Expr::Lt {
                left: Indicator::Rsi { period: 14 },
                right: Indicator::Real { val: 30.0 },
            }),
            right: Box::new(Expr::Not {
                expr: Box::new(price_above(5.0)),
            }),
        };
        let json = serde_json::to_string(&expr).unwrap();
        let back: Expr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
