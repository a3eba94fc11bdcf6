//! Domain error types.

/// A parse error with position information for condition parsing.
///
/// Positions are byte offsets into the trimmed input handed to the parser.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// Top-level error type for tradequery.
#[derive(Debug, thiserror::Error)]
pub enum TradequeryError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    ConditionParse(#[from] ParseError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradequeryError> for std::process::ExitCode {
    fn from(err: &TradequeryError) -> Self {
        let code: u8 = match err {
            TradequeryError::Io(_) | TradequeryError::Serialize(_) => 1,
            TradequeryError::ConfigParse { .. }
            | TradequeryError::ConfigMissing { .. }
            | TradequeryError::ConfigInvalid { .. } => 2,
            TradequeryError::ConditionParse(_) => 4,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError {
            message: "expected indicator".to_string(),
            position: 3,
        };
        assert_eq!(
            err.to_string(),
            "parse error at position 3: expected indicator"
        );
    }

    #[test]
    fn display_with_context_places_caret() {
        let err = ParseError {
            message: "expected ')'".to_string(),
            position: 6,
        };
        let ctx = err.display_with_context("sma(9x");
        let lines: Vec<&str> = ctx.lines().collect();
        assert_eq!(lines[0], "sma(9x");
        assert_eq!(lines[1], "      ^");
        assert!(lines[2].contains("position 6"));
    }

    #[test]
    fn condition_parse_error_is_transparent() {
        let err = TradequeryError::from(ParseError {
            message: "expected expression".into(),
            position: 0,
        });
        assert_eq!(
            err.to_string(),
            "parse error at position 0: expected expression"
        );
    }
}
