//! Condition expression parser.
//!
//! Hand-written recursive descent over the condition grammar with PEG-style
//! ordered choice: alternatives are tried in a fixed order and a failed
//! alternative fully backtracks to its start position before the next one is
//! tried. Comparison operators keep their original order (`>` ahead of `>=`,
//! `<` ahead of `<=`); the backtracking is what makes `>=` and `<=` reachable
//! when the shorter operator matches but the rest of the alternative fails.
//!
//! Token discipline: the input is trimmed once at the entry point and every
//! terminal consumes any whitespace that follows it, so whitespace between
//! tokens is insignificant everywhere.

use crate::domain::error::ParseError;
use crate::domain::expr::Expr;
use crate::domain::indicator::Indicator;

/// Nesting depth guard. Each parenthesized or chained level costs two
/// frames (one per precedence level), so this allows roughly 32 levels of
/// user-written nesting before the parse fails instead of the stack.
const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Match a literal at the current position and consume trailing
    /// whitespace on success.
    fn token(&mut self, literal: &str) -> bool {
        if self.remaining().starts_with(literal) {
            self.pos += literal.len();
            self.skip_whitespace();
            true
        } else {
            false
        }
    }

    fn expect_token(&mut self, expected: &str) -> Result<(), ParseError> {
        if self.token(expected) {
            Ok(())
        } else {
            let found = self
                .peek()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "end of input".to_string());
            Err(ParseError {
                message: format!("expected '{expected}', found '{found}'"),
                position: self.pos,
            })
        }
    }

    /// Run one ordered-choice alternative; on failure restore the parser to
    /// its state at the call and return `None`.
    fn attempt<T>(
        &mut self,
        alternative: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Option<T> {
        let pos = self.pos;
        let depth = self.depth;
        match alternative(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = pos;
                self.depth = depth;
                None
            }
        }
    }

    /// Integer lexeme: optionally signed, no leading zero unless the literal
    /// is exactly `0`.
    fn parse_integer(&mut self) -> Result<i64, ParseError> {
        let start = self.pos;

        if matches!(self.peek(), Some('+') | Some('-')) {
            // A sign is only valid ahead of a nonzero digit.
            if !matches!(self.remaining()[1..].chars().next(), Some('1'..='9')) {
                return Err(ParseError {
                    message: "expected integer".to_string(),
                    position: start,
                });
            }
            self.advance();
        }

        match self.peek() {
            Some('0') => {
                self.advance();
            }
            Some('1'..='9') => {
                self.advance();
                while matches!(self.peek(), Some('0'..='9')) {
                    self.advance();
                }
            }
            _ => {
                return Err(ParseError {
                    message: "expected integer".to_string(),
                    position: start,
                });
            }
        }

        let text = &self.input[start..self.pos];
        let value = text.parse::<i64>().map_err(|_| ParseError {
            message: format!("invalid integer: {text}"),
            position: start,
        })?;
        self.skip_whitespace();
        Ok(value)
    }

    /// An indicator period: an integer lexeme constrained to be >= 1.
    fn parse_period(&mut self) -> Result<usize, ParseError> {
        let start = self.pos;
        let value = self.parse_integer()?;
        if value < 1 {
            return Err(ParseError {
                message: format!("period must be at least 1, got {value}"),
                position: start,
            });
        }
        Ok(value as usize)
    }

    /// Real lexeme: `-?\d+(\.\d*)?`.
    fn parse_real(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;

        if self.peek() == Some('-') {
            self.advance();
        }

        let mut digits = 0;
        while matches!(self.peek(), Some('0'..='9')) {
            digits += 1;
            self.advance();
        }
        if digits == 0 {
            return Err(ParseError {
                message: "expected number".to_string(),
                position: start,
            });
        }

        if self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        let text = &self.input[start..self.pos];
        let value = text.parse::<f64>().map_err(|_| ParseError {
            message: format!("invalid number: {text}"),
            position: start,
        })?;
        self.skip_whitespace();
        Ok(value)
    }

    fn parse_periodic(&mut self, keyword: &str) -> Result<usize, ParseError> {
        if !self.token(keyword) {
            return Err(ParseError {
                message: format!("expected '{keyword}'"),
                position: self.pos,
            });
        }
        self.expect_token("(")?;
        let period = self.parse_period()?;
        self.expect_token(")")?;
        Ok(period)
    }

    /// Indicator leaf, ordered choice. The numeric literal is tried first so
    /// that keyword matching never shadows it; this ordering must be kept if
    /// the grammar grows new leaf forms.
    fn parse_indicator(&mut self) -> Result<Indicator, ParseError> {
        if let Some(val) = self.attempt(|p| p.parse_real()) {
            return Ok(Indicator::Real { val });
        }
        if self.token("current-price") {
            return Ok(Indicator::Price);
        }
        if let Some(period) = self.attempt(|p| p.parse_periodic("sma")) {
            return Ok(Indicator::Sma { period });
        }
        if let Some(period) = self.attempt(|p| p.parse_periodic("ema")) {
            return Ok(Indicator::Ema { period });
        }
        if let Some(period) = self.attempt(|p| p.parse_periodic("rsi")) {
            return Ok(Indicator::Rsi { period });
        }

        Err(ParseError {
            message: "expected indicator".to_string(),
            position: self.pos,
        })
    }

    fn parse_comparison(&mut self, op: &str) -> Result<Expr, ParseError> {
        let left = self.parse_indicator()?;
        self.expect_token(op)?;
        let right = self.parse_indicator()?;

        Ok(match op {
            "=" => Expr::Eq { left, right },
            ">" => Expr::Gt { left, right },
            "<" => Expr::Lt { left, right },
            ">=" => Expr::Ge { left, right },
            "<=" => Expr::Le { left, right },
            "!=" => Expr::Not {
                expr: Box::new(Expr::Eq { left, right }),
            },
            _ => unreachable!(),
        })
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        for op in ["=", ">", "<", ">=", "<=", "!="] {
            if let Some(expr) = self.attempt(|p| p.parse_comparison(op)) {
                return Ok(expr);
            }
        }

        if let Some(expr) = self.attempt(|p| {
            p.expect_token("(")?;
            let inner = p.parse_expr()?;
            p.expect_token(")")?;
            Ok(inner)
        }) {
            return Ok(expr);
        }

        if let Some(expr) = self.attempt(|p| {
            p.expect_token("!")?;
            p.expect_token("(")?;
            let inner = p.parse_expr()?;
            p.expect_token(")")?;
            Ok(Expr::Not {
                expr: Box::new(inner),
            })
        }) {
            return Ok(expr);
        }

        Err(ParseError {
            message: "expected condition".to_string(),
            position: self.pos,
        })
    }

    // and := atom "&&" and | atom
    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError {
                message: "condition nesting too deep".to_string(),
                position: self.pos,
            });
        }
        self.depth += 1;
        let result = self.parse_and_inner();
        self.depth -= 1;
        result
    }

    fn parse_and_inner(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_atom()?;
        let checkpoint = self.pos;
        if self.token("&&") {
            match self.parse_and() {
                Ok(right) => {
                    return Ok(Expr::And {
                        left: Box::new(left),
                        right: Box::new(right),
                    });
                }
                Err(_) => self.pos = checkpoint,
            }
        }
        Ok(left)
    }

    // or := and "||" or | and
    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError {
                message: "condition nesting too deep".to_string(),
                position: self.pos,
            });
        }
        self.depth += 1;
        let result = self.parse_expr_inner();
        self.depth -= 1;
        result
    }

    fn parse_expr_inner(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_and()?;
        let checkpoint = self.pos;
        if self.token("||") {
            match self.parse_expr() {
                Ok(right) => {
                    return Ok(Expr::Or {
                        left: Box::new(left),
                        right: Box::new(right),
                    });
                }
                Err(_) => self.pos = checkpoint,
            }
        }
        Ok(left)
    }
}

/// Parse a condition string into an expression tree.
///
/// The input is trimmed first and must be consumed in full: leftover text
/// after a valid prefix is a parse failure, and no partial tree is ever
/// returned. Error positions are relative to the trimmed input.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let trimmed = input.trim();
    let mut parser = Parser::new(trimmed);
    let expr = parser.parse_expr()?;
    if parser.pos < trimmed.len() {
        return Err(ParseError {
            message: format!("unexpected input after condition: '{}'", parser.remaining()),
            position: parser.pos,
        });
    }
    Ok(expr)
}
