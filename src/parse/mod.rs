mod book;
mod error;
mod lexer;
mod parser;

pub use book::parse_rule_book;
pub use error::{ParseError, ParseErrorKind};

use crate::Expr;

/// Default bound on how deeply parentheses and `NOT` may nest.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default bound on the height of a parsed tree, as reported by
/// [`Expr::depth`]. Every `AND`/`OR` term in a chain adds a level.
pub const DEFAULT_MAX_HEIGHT: usize = 512;

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    max_depth: usize,
    max_height: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit nesting of parentheses and `NOT` to `depth` levels.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Limit the parsed tree to `height` levels.
    #[must_use]
    pub fn max_height(mut self, height: usize) -> Self {
        self.max_height = height;
        self
    }

    #[must_use]
    pub fn depth_limit(&self) -> usize {
        self.max_depth
    }

    #[must_use]
    pub fn height_limit(&self) -> usize {
        self.max_height
    }
}

/// Parse a rule string into an [`Expr`] with default options.
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid rule expression.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    parse_with(input, &ParseOptions::default())
}

/// Parse a rule string into an [`Expr`].
///
/// # Errors
///
/// Returns [`ParseError`] if the input is not a valid rule expression or
/// exceeds the nesting or height limits in `options`.
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Expr, ParseError> {
    let tokens = lexer::tokenize(input)?;
    parser::parse_tokens(&tokens, input.len(), options)
}
