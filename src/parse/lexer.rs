use std::fmt;

use winnow::ascii::{digit1, multispace0};
use winnow::combinator::{opt, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

use super::error::{ParseError, ParseErrorKind};
use crate::CompareOp;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Number(f64),
    Text(String),
    Op(CompareOp),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) offset: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "field name '{name}'"),
            Token::Number(n) => write!(f, "number {n}"),
            Token::Text(s) => write!(f, "string \"{s}\""),
            Token::Op(op) => write!(f, "operator '{op}'"),
            Token::And => write!(f, "'AND'"),
            Token::Or => write!(f, "'OR'"),
            Token::Not => write!(f, "'NOT'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

// -- Token parsers ----------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    multispace0.void().parse_next(input)
}

pub(super) fn identifier<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

fn number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .parse_next(input)
}

/// No escape processing: the body runs to the next matching quote.
fn quoted(input: &mut &str) -> ModalResult<String> {
    let quote = one_of(['\'', '"']).parse_next(input)?;
    terminated(take_till(0.., quote), quote)
        .map(str::to_owned)
        .parse_next(input)
}

/// The longest run of operator characters, so that `=<` or `===` is
/// reported as one unknown operator rather than split.
fn operator<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., ['<', '>', '=', '!']).parse_next(input)
}

fn keyword(word: &str) -> Option<Token> {
    if word.eq_ignore_ascii_case("and") {
        Some(Token::And)
    } else if word.eq_ignore_ascii_case("or") {
        Some(Token::Or)
    } else if word.eq_ignore_ascii_case("not") {
        Some(Token::Not)
    } else {
        None
    }
}

// -- Tokenizer --------------------------------------------------------------

/// Split a rule string into tokens.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut input = source;
    let mut tokens = Vec::new();

    loop {
        ws(&mut input).ok();
        let offset = source.len() - input.len();
        let Some(c) = input.chars().next() else {
            break;
        };
        let unrecognized = || ParseError::new(ParseErrorKind::UnrecognizedToken(c.to_string()), offset);

        let token = match c {
            '(' => {
                input = &input[1..];
                Token::LParen
            }
            ')' => {
                input = &input[1..];
                Token::RParen
            }
            '\'' | '"' => quoted(&mut input)
                .map(Token::Text)
                .map_err(|_| ParseError::new(ParseErrorKind::UnterminatedString, offset))?,
            '-' | '0'..='9' => {
                let text = number(&mut input).map_err(|_| unrecognized())?;
                let value = text
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| {
                        ParseError::new(ParseErrorKind::InvalidNumber(text.to_owned()), offset)
                    })?;
                Token::Number(value)
            }
            '<' | '>' | '=' | '!' => {
                let symbol = operator(&mut input).map_err(|_| unrecognized())?;
                let op = CompareOp::from_symbol(symbol).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::UnknownOperator(symbol.to_owned()), offset)
                })?;
                Token::Op(op)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = identifier(&mut input).map_err(|_| unrecognized())?;
                keyword(word).unwrap_or_else(|| Token::Ident(word.to_owned()))
            }
            _ => return Err(unrecognized()),
        };

        tokens.push(Spanned { token, offset });
    }

    Ok(tokens)
}
