use std::fmt;
use std::ops::Not;

use super::Value;

/// Comparison operators supported in rule expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompareOp {
    #[cfg_attr(feature = "serde", serde(rename = "=="))]
    Eq,
    #[cfg_attr(feature = "serde", serde(rename = "!="))]
    Neq,
    #[cfg_attr(feature = "serde", serde(rename = ">"))]
    Gt,
    #[cfg_attr(feature = "serde", serde(rename = ">="))]
    Gte,
    #[cfg_attr(feature = "serde", serde(rename = "<"))]
    Lt,
    #[cfg_attr(feature = "serde", serde(rename = "<="))]
    Lte,
}

impl CompareOp {
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Neq,
        CompareOp::Gt,
        CompareOp::Gte,
        CompareOp::Lt,
        CompareOp::Lte,
    ];

    /// Look up an operator by its exact spelling.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<CompareOp> {
        Self::ALL.into_iter().find(|op| op.symbol() == symbol)
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Neq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    /// `true` for `>`, `>=`, `<` and `<=`.
    #[must_use]
    pub fn is_ordering(self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Neq)
    }

    /// IEEE-754 comparison: any comparison involving NaN is false except `!=`.
    #[must_use]
    pub fn compare_numbers(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Neq => left != right,
            CompareOp::Gt => left > right,
            CompareOp::Gte => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Lte => left <= right,
        }
    }
}

/// Rule expression AST.
///
/// Every node exclusively owns its children, so a tree is finite, acyclic and
/// immutable once built. Produced by [`parse`](crate::parse::parse) or by the
/// [`field()`] builder.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Expr {
    Compare {
        field: String,
        op: CompareOp,
        literal: Value,
    },
    And {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Or {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not {
        operand: Box<Expr>,
    },
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Canonical rendering with only the parentheses the grammar needs: left
/// chains stay flat, while right-nested groups, `OR` under `AND` and
/// combinators under `NOT` are grouped.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare { field, op, literal } => write!(f, "{field} {op} {literal}"),
            Expr::And { left, right } => {
                write_operand(f, left, left.is_or())?;
                f.write_str(" AND ")?;
                write_operand(f, right, right.is_binary())
            }
            Expr::Or { left, right } => {
                write_operand(f, left, false)?;
                f.write_str(" OR ")?;
                write_operand(f, right, right.is_or())
            }
            Expr::Not { operand } => {
                f.write_str("NOT ")?;
                write_operand(f, operand, operand.is_binary())
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, grouped: bool) -> fmt::Result {
    if grouped {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl Expr {
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        Expr::And {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Expr {
        Expr::Or {
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    fn is_or(&self) -> bool {
        matches!(self, Expr::Or { .. })
    }

    fn is_binary(&self) -> bool {
        matches!(self, Expr::And { .. } | Expr::Or { .. })
    }

    /// Field names referenced by this expression, left to right, with repeats.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_fields(self, &mut out);
        out
    }

    /// Height of the tree; a single comparison has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Expr::Compare { .. } => 1,
            Expr::And { left, right } | Expr::Or { left, right } => {
                1 + left.depth().max(right.depth())
            }
            Expr::Not { operand } => 1 + operand.depth(),
        }
    }
}

fn collect_fields<'a>(expr: &'a Expr, out: &mut Vec<&'a str>) {
    match expr {
        Expr::Compare { field, .. } => out.push(field),
        Expr::And { left, right } | Expr::Or { left, right } => {
            collect_fields(left, out);
            collect_fields(right, out);
        }
        Expr::Not { operand } => collect_fields(operand, out),
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Not {
            operand: Box::new(self),
        }
    }
}

/// Intermediate builder for field comparison expressions.
/// Created by [`field()`]; requires a comparison method to produce a valid [`Expr`].
#[derive(Debug, Clone)]
pub struct FieldExpr {
    name: String,
}

impl FieldExpr {
    fn compare(self, op: CompareOp, literal: impl Into<Value>) -> Expr {
        Expr::Compare {
            field: self.name,
            op,
            literal: literal.into(),
        }
    }

    #[must_use]
    pub fn eq(self, literal: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Eq, literal)
    }

    #[must_use]
    pub fn neq(self, literal: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Neq, literal)
    }

    #[must_use]
    pub fn gt(self, literal: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Gt, literal)
    }

    #[must_use]
    pub fn gte(self, literal: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Gte, literal)
    }

    #[must_use]
    pub fn lt(self, literal: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Lt, literal)
    }

    #[must_use]
    pub fn lte(self, literal: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Lte, literal)
    }
}

#[must_use]
pub fn field(name: &str) -> FieldExpr {
    FieldExpr {
        name: name.to_owned(),
    }
}
