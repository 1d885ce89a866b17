use winnow::combinator::{cut_err, opt, repeat};
use winnow::error::{ErrMode, ModalResult, ParserError};
use winnow::prelude::*;
use winnow::stream::{Stateful, Stream, TokenSlice};
use winnow::token::one_of;

use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Spanned, Token};
use super::ParseOptions;
use crate::{Expr, Value};

/// Limits carried alongside the token stream.
#[derive(Debug, Clone)]
struct Limits {
    depth: usize,
    max_depth: usize,
    max_height: usize,
    /// Offset reported for errors at the end of input.
    end: usize,
}

type Tokens<'t> = Stateful<TokenSlice<'t, Spanned>, Limits>;

/// A parsed subtree and its height.
struct Node {
    expr: Expr,
    height: usize,
}

impl<'t> ParserError<Tokens<'t>> for ParseError {
    type Inner = Self;

    fn from_input(input: &Tokens<'t>) -> Self {
        match input.first() {
            Some(found) => unexpected("an expression", found),
            None => ParseError::new(
                ParseErrorKind::MissingOperand {
                    expected: "an expression",
                },
                input.state.end,
            ),
        }
    }

    fn into_inner(self) -> Result<Self::Inner, Self> {
        Ok(self)
    }
}

fn unexpected(expected: &'static str, found: &Spanned) -> ParseError {
    ParseError::new(
        ParseErrorKind::Unexpected {
            expected,
            found: found.token.to_string(),
        },
        found.offset,
    )
}

fn fail<T>(kind: ParseErrorKind, offset: usize) -> ModalResult<T, ParseError> {
    Err(ErrMode::Cut(ParseError::new(kind, offset)))
}

fn check_height(input: &Tokens<'_>, height: usize, offset: usize) -> ModalResult<(), ParseError> {
    if height > input.state.max_height {
        return fail(
            ParseErrorKind::TreeTooDeep {
                limit: input.state.max_height,
            },
            offset,
        );
    }
    Ok(())
}

/// Parse a token stream as one expression.
///
/// Precedence levels, lowest first: `or_expr`, `and_expr`, `not_expr`,
/// `primary`. Binary levels collect their operands and fold to the left.
/// Parentheses and `NOT` count against `max_depth`; every node counts
/// against `max_height`.
pub(crate) fn parse_tokens(
    tokens: &[Spanned],
    end: usize,
    options: &ParseOptions,
) -> Result<Expr, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::new(ParseErrorKind::Empty, 0));
    }

    let mut input = Stateful {
        input: TokenSlice::new(tokens),
        state: Limits {
            depth: 0,
            max_depth: options.depth_limit(),
            max_height: options.height_limit(),
            end,
        },
    };

    let node = or_expr(&mut input).map_err(|err| {
        err.into_inner().unwrap_or_else(|_| {
            ParseError::new(
                ParseErrorKind::MissingOperand {
                    expected: "an expression",
                },
                end,
            )
        })
    })?;

    match input.first() {
        None => Ok(node.expr),
        Some(Spanned {
            token: Token::RParen,
            offset,
        }) => Err(ParseError::new(ParseErrorKind::UnmatchedParen, *offset)),
        Some(extra) => Err(ParseError::new(
            ParseErrorKind::TrailingInput {
                found: extra.token.to_string(),
            },
            extra.offset,
        )),
    }
}

// -- Keywords ---------------------------------------------------------------

/// Match one keyword token, yielding its offset.
fn keyword<'t>(kind: Token) -> impl Parser<Tokens<'t>, usize, ErrMode<ParseError>> {
    one_of(move |t: &Spanned| t.token == kind).map(|t: &Spanned| t.offset)
}

/// Run `parser` one nesting level deeper. `offset` is where the level opens.
fn nested<'t, P>(input: &mut Tokens<'t>, offset: usize, mut parser: P) -> ModalResult<Node, ParseError>
where
    P: Parser<Tokens<'t>, Node, ErrMode<ParseError>>,
{
    if input.state.depth >= input.state.max_depth {
        return fail(
            ParseErrorKind::NestingTooDeep {
                limit: input.state.max_depth,
            },
            offset,
        );
    }
    input.state.depth += 1;
    let result = parser.parse_next(input);
    input.state.depth -= 1;
    result
}

// -- Expressions (precedence: OR < AND < NOT < primary) ---------------------

fn or_expr(input: &mut Tokens<'_>) -> ModalResult<Node, ParseError> {
    let first = and_expr(input)?;
    let rest: Vec<(usize, Node)> =
        repeat(0.., (keyword(Token::Or), cut_err(and_expr))).parse_next(input)?;
    fold_chain(input, first, rest, Expr::or)
}

fn and_expr(input: &mut Tokens<'_>) -> ModalResult<Node, ParseError> {
    let first = not_expr(input)?;
    let rest: Vec<(usize, Node)> =
        repeat(0.., (keyword(Token::And), cut_err(not_expr))).parse_next(input)?;
    fold_chain(input, first, rest, Expr::and)
}

fn fold_chain(
    input: &Tokens<'_>,
    first: Node,
    rest: Vec<(usize, Node)>,
    join: fn(Expr, Expr) -> Expr,
) -> ModalResult<Node, ParseError> {
    rest.into_iter().try_fold(first, |left, (offset, right)| {
        let height = 1 + left.height.max(right.height);
        check_height(input, height, offset)?;
        Ok(Node {
            expr: join(left.expr, right.expr),
            height,
        })
    })
}

fn not_expr(input: &mut Tokens<'_>) -> ModalResult<Node, ParseError> {
    let Some(offset) = opt(keyword(Token::Not)).parse_next(input)? else {
        return primary(input);
    };
    let operand = nested(input, offset, not_expr)?;
    let height = operand.height + 1;
    check_height(input, height, offset)?;
    Ok(Node {
        expr: !operand.expr,
        height,
    })
}

fn primary(input: &mut Tokens<'_>) -> ModalResult<Node, ParseError> {
    let end = input.state.end;
    let Some(spanned) = input.next_token() else {
        return fail(
            ParseErrorKind::MissingOperand {
                expected: "an expression",
            },
            end,
        );
    };
    match &spanned.token {
        Token::LParen => {
            let inner = nested(input, spanned.offset, or_expr)?;
            match input.next_token() {
                Some(Spanned {
                    token: Token::RParen,
                    ..
                }) => Ok(inner),
                Some(other) => Err(ErrMode::Cut(unexpected("')'", other))),
                None => fail(ParseErrorKind::UnmatchedParen, spanned.offset),
            }
        }
        Token::Ident(name) => comparison(input, name, spanned.offset),
        Token::Number(_) | Token::Text(_) => {
            Err(ErrMode::Cut(unexpected("a field name", spanned)))
        }
        _ => Err(ErrMode::Cut(unexpected("an expression", spanned))),
    }
}

fn comparison(input: &mut Tokens<'_>, field: &str, offset: usize) -> ModalResult<Node, ParseError> {
    let end = input.state.end;
    let op = match input.next_token() {
        Some(Spanned {
            token: Token::Op(op),
            ..
        }) => *op,
        Some(other) => return Err(ErrMode::Cut(unexpected("a comparison operator", other))),
        None => {
            return fail(
                ParseErrorKind::MissingOperand {
                    expected: "a comparison operator",
                },
                end,
            )
        }
    };
    let literal = match input.next_token() {
        Some(Spanned {
            token: Token::Number(n),
            ..
        }) => Value::Number(*n),
        Some(Spanned {
            token: Token::Text(s),
            ..
        }) => Value::Text(s.clone()),
        Some(other) => return Err(ErrMode::Cut(unexpected("a literal", other))),
        None => {
            return fail(
                ParseErrorKind::MissingOperand {
                    expected: "a literal",
                },
                end,
            )
        }
    };
    check_height(input, 1, offset)?;
    Ok(Node {
        expr: Expr::Compare {
            field: field.to_owned(),
            op,
            literal,
        },
        height: 1,
    })
}
