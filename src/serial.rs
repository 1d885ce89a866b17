//! Binary serialization and deserialization of rule sets.
//!
//! This module provides a stable binary format for persisting a
//! [`RuleSet`](crate::RuleSet) together with its parsed expressions. Loading
//! re-parses every rule's source with the parser options it was built with
//! and rejects a blob whose stored tree differs from that parse. The format
//! consists of a 32-byte fixed header followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"ELIG"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::error::EligoError;
use crate::parse::ParseOptions;
use crate::types::{Combine, CompareOp, Expr, Rule, RuleSet, Value};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"ELIG";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`RuleSet`](crate::RuleSet) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule set: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleSet`](crate::RuleSet) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not an eligo binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRuleSet {
    metadata: RuleSetMetadata,
    rules: Vec<SerializedRule>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleSetMetadata {
    rule_count: usize,
    combine: SerializedCombine,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    name: String,
    source: String,
    max_depth: usize,
    max_height: usize,
    condition: SerializedExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum SerializedExpr {
    FieldCmp {
        field: String,
        op: SerializedCompareOp,
        value: SerializedValue,
    },
    And(Vec<SerializedExpr>),
    Or(Vec<SerializedExpr>),
    Not(Box<SerializedExpr>),
}

// Bincode is not self-describing, so `Value`'s untagged serde form cannot be
// decoded; the cache uses its own tagged mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum SerializedValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum SerializedCompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum SerializedCombine {
    All,
    Any,
}

// ---------------------------------------------------------------------------
// Scalar conversions
// ---------------------------------------------------------------------------

fn serialize_op(op: CompareOp) -> SerializedCompareOp {
    match op {
        CompareOp::Eq => SerializedCompareOp::Eq,
        CompareOp::Neq => SerializedCompareOp::Neq,
        CompareOp::Gt => SerializedCompareOp::Gt,
        CompareOp::Gte => SerializedCompareOp::Gte,
        CompareOp::Lt => SerializedCompareOp::Lt,
        CompareOp::Lte => SerializedCompareOp::Lte,
    }
}

fn deserialize_op(op: SerializedCompareOp) -> CompareOp {
    match op {
        SerializedCompareOp::Eq => CompareOp::Eq,
        SerializedCompareOp::Neq => CompareOp::Neq,
        SerializedCompareOp::Gt => CompareOp::Gt,
        SerializedCompareOp::Gte => CompareOp::Gte,
        SerializedCompareOp::Lt => CompareOp::Lt,
        SerializedCompareOp::Lte => CompareOp::Lte,
    }
}

fn serialize_value(value: &Value) -> SerializedValue {
    match value {
        Value::Number(v) => SerializedValue::Number(*v),
        Value::Text(v) => SerializedValue::Text(v.clone()),
    }
}

fn deserialize_value(value: SerializedValue) -> Value {
    match value {
        SerializedValue::Number(v) => Value::Number(v),
        SerializedValue::Text(v) => Value::Text(v),
    }
}

fn serialize_combine(combine: Combine) -> SerializedCombine {
    match combine {
        Combine::All => SerializedCombine::All,
        Combine::Any => SerializedCombine::Any,
    }
}

fn deserialize_combine(combine: SerializedCombine) -> Combine {
    match combine {
        SerializedCombine::All => Combine::All,
        SerializedCombine::Any => Combine::Any,
    }
}

// ---------------------------------------------------------------------------
// Expression flattening (binary -> n-ary)
// ---------------------------------------------------------------------------

fn flatten_expr(expr: &Expr) -> SerializedExpr {
    match expr {
        Expr::And { .. } => {
            let mut children = Vec::new();
            collect_and_children(expr, &mut children);
            SerializedExpr::And(children)
        }
        Expr::Or { .. } => {
            let mut children = Vec::new();
            collect_or_children(expr, &mut children);
            SerializedExpr::Or(children)
        }
        Expr::Not { operand } => SerializedExpr::Not(Box::new(flatten_expr(operand))),
        Expr::Compare { field, op, literal } => SerializedExpr::FieldCmp {
            field: field.clone(),
            op: serialize_op(*op),
            value: serialize_value(literal),
        },
    }
}

// Only the left spine is flattened: `a AND (b AND c)` keeps its grouping,
// so decoding reproduces the original tree exactly.
fn collect_and_children(expr: &Expr, out: &mut Vec<SerializedExpr>) {
    match expr {
        Expr::And { left, right } => {
            collect_and_children(left, out);
            out.push(flatten_expr(right));
        }
        other => out.push(flatten_expr(other)),
    }
}

fn collect_or_children(expr: &Expr, out: &mut Vec<SerializedExpr>) {
    match expr {
        Expr::Or { left, right } => {
            collect_or_children(left, out);
            out.push(flatten_expr(right));
        }
        other => out.push(flatten_expr(other)),
    }
}

// ---------------------------------------------------------------------------
// Expression unflattening (n-ary -> binary)
// ---------------------------------------------------------------------------

fn fold_children(
    children: Vec<SerializedExpr>,
    join: fn(Expr, Expr) -> Expr,
) -> Result<Expr, DeserializeError> {
    let mut iter = children.into_iter();
    let first = iter.next().ok_or_else(|| {
        DeserializeError::Validation("empty And/Or expression".to_owned())
    })?;
    let first = unflatten_expr(first)?;
    iter.try_fold(first, |acc, child| Ok(join(acc, unflatten_expr(child)?)))
}

fn unflatten_expr(expr: SerializedExpr) -> Result<Expr, DeserializeError> {
    match expr {
        SerializedExpr::And(children) => fold_children(children, Expr::and),
        SerializedExpr::Or(children) => fold_children(children, Expr::or),
        SerializedExpr::Not(inner) => Ok(!unflatten_expr(*inner)?),
        SerializedExpr::FieldCmp { field, op, value } => Ok(Expr::Compare {
            field,
            op: deserialize_op(op),
            literal: deserialize_value(value),
        }),
    }
}

// ---------------------------------------------------------------------------
// RuleSet <-> SerializedRuleSet
// ---------------------------------------------------------------------------

fn ruleset_to_serialized(ruleset: &RuleSet) -> SerializedRuleSet {
    let rules: Vec<SerializedRule> = ruleset
        .rules
        .iter()
        .map(|r| SerializedRule {
            name: r.name().to_owned(),
            source: r.source().to_owned(),
            max_depth: r.options().depth_limit(),
            max_height: r.options().height_limit(),
            condition: flatten_expr(r.expr()),
        })
        .collect();

    SerializedRuleSet {
        metadata: RuleSetMetadata {
            rule_count: rules.len(),
            combine: serialize_combine(ruleset.combine),
        },
        rules,
    }
}

fn serialized_to_ruleset(ser: SerializedRuleSet) -> Result<RuleSet, DeserializeError> {
    validate(&ser)?;

    let rules = ser
        .rules
        .into_iter()
        .map(|sr| {
            let expr = unflatten_expr(sr.condition)?;
            let options = ParseOptions::new()
                .max_depth(sr.max_depth)
                .max_height(sr.max_height);
            let name = sr.name.clone();
            Rule::from_parts_with(sr.name, sr.source, expr, &options)
                .map_err(|err| rejected_rule(&name, err))
        })
        .collect::<Result<Vec<_>, DeserializeError>>()?;

    Ok(RuleSet {
        rules,
        combine: deserialize_combine(ser.metadata.combine),
    })
}

fn rejected_rule(name: &str, err: EligoError) -> DeserializeError {
    match err {
        EligoError::SourceMismatch { .. } => DeserializeError::Validation(err.to_string()),
        other => DeserializeError::Validation(format!("rule '{name}': {other}")),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedRuleSet) -> Result<(), DeserializeError> {
    let rule_count = ser.rules.len();

    if ser.metadata.rule_count != rule_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count, rule_count
        )));
    }
    if rule_count == 0 {
        return Err(DeserializeError::Validation(
            "rule set contains no rules".to_owned(),
        ));
    }

    for rule in &ser.rules {
        if rule.name.trim().is_empty() {
            return Err(DeserializeError::Validation("empty rule name".to_owned()));
        }
        validate_expr(&rule.condition)?;
    }

    Ok(())
}

fn validate_expr(expr: &SerializedExpr) -> Result<(), DeserializeError> {
    match expr {
        SerializedExpr::FieldCmp { field, value, .. } => {
            if field.is_empty() {
                return Err(DeserializeError::Validation(
                    "comparison with an empty field name".to_owned(),
                ));
            }
            if let SerializedValue::Number(n) = value {
                if !n.is_finite() {
                    return Err(DeserializeError::Validation(format!(
                        "non-finite number literal on field '{field}'"
                    )));
                }
            }
            Ok(())
        }
        SerializedExpr::And(children) | SerializedExpr::Or(children) => {
            if children.is_empty() {
                return Err(DeserializeError::Validation(
                    "empty And/Or expression".to_owned(),
                ));
            }
            children.iter().try_for_each(validate_expr)
        }
        SerializedExpr::Not(inner) => validate_expr(inner),
    }
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] engine version, bytes[8..12] flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(ruleset: &RuleSet) -> Result<Vec<u8>, SerializeError> {
    let serialized = ruleset_to_serialized(ruleset);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleSet, DeserializeError> {
    decode_unlogged(bytes).inspect_err(|err| warn!(error = %err, "rejected rule set binary"))
}

fn decode_unlogged(bytes: &[u8]) -> Result<RuleSet, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_start = HEADER_SIZE;
    let payload_end = payload_start + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[payload_start..payload_end];

    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedRuleSet, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    serialized_to_ruleset(serialized)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
