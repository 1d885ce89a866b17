use thiserror::Error;

/// What went wrong while parsing a rule string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("rule text is empty")]
    Empty,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unrecognized token '{0}'")]
    UnrecognizedToken(String),

    #[error("unknown comparison operator '{0}'")]
    UnknownOperator(String),

    #[error("number literal '{0}' is out of range")]
    InvalidNumber(String),

    #[error("expected {expected} but reached the end of the rule")]
    MissingOperand { expected: &'static str },

    #[error("expected {expected} but found {found}")]
    Unexpected {
        expected: &'static str,
        found: String,
    },

    #[error("unmatched parenthesis")]
    UnmatchedParen,

    #[error("unexpected {found} after a complete expression")]
    TrailingInput { found: String },

    #[error("expression nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },

    #[error("expression tree is deeper than {limit} levels")]
    TreeTooDeep { limit: usize },
}

/// Errors produced when parsing a rule string.
///
/// The offset is a byte offset into the parsed text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at offset {offset}: {kind}")]
pub struct ParseError {
    kind: ParseErrorKind,
    offset: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Human-readable description without the offset.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParseError::new(ParseErrorKind::UnrecognizedToken("$".into()), 4);
        assert_eq!(
            err.to_string(),
            "parse error at offset 4: unrecognized token '$'"
        );
        assert_eq!(err.message(), "unrecognized token '$'");
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn missing_operand_display() {
        let err = ParseError::new(
            ParseErrorKind::MissingOperand {
                expected: "a literal",
            },
            5,
        );
        assert_eq!(
            err.message(),
            "expected a literal but reached the end of the rule"
        );
    }
}
