#![cfg(feature = "binary-cache")]

use eligo::{Combine, DeserializeError, EligoError, ParseOptions, Record, RuleSet, RuleSetBuilder};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn simple_ruleset() -> RuleSet {
    RuleSetBuilder::new()
        .rule("adult", "age >= 18")
        .rule("sales", "department == 'Sales'")
        .build()
        .unwrap()
}

fn complex_ruleset() -> RuleSet {
    RuleSetBuilder::new()
        .rule(
            "senior_or_experienced",
            "(age > 30 AND department == 'Sales') OR (experience > 10)",
        )
        .rule("paid", "salary >= 50000.5 AND salary < 1000000")
        .rule("not_legal", "NOT NOT NOT department == \"Legal\"")
        .rule("chain", "a == 1 OR b == 2 OR c == 3 OR (d == 4 AND e == 5 AND f != 6)")
        .rule("grouped_right", "a == 1 AND (b == 2 AND c == 3)")
        .combine(Combine::Any)
        .build()
        .unwrap()
}

fn record() -> Record {
    Record::new()
        .set("age", 35_i64)
        .set("department", "Sales")
        .set("experience", 4_i64)
        .set("salary", 60_000_i64)
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn round_trip_simple() {
    let original = simple_ruleset();
    let bytes = original.to_bytes().unwrap();
    let restored = RuleSet::from_bytes(&bytes).unwrap();

    assert_eq!(restored, original);
    assert_eq!(restored.evaluate(&record()), original.evaluate(&record()));
}

#[test]
fn round_trip_complex_preserves_trees() {
    let original = complex_ruleset();
    let restored = RuleSet::from_bytes(&original.to_bytes().unwrap()).unwrap();

    assert_eq!(restored.combine(), Combine::Any);
    for (a, b) in original.rules().iter().zip(restored.rules()) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.source(), b.source());
        assert_eq!(a.expr(), b.expr(), "tree changed for {}", a.name());
    }
}

#[test]
fn round_trip_beyond_default_depth() {
    let deep = format!("{}age > 1{}", "(".repeat(80), ")".repeat(80));
    let original = RuleSetBuilder::new()
        .rule("deep", &deep)
        .options(ParseOptions::new().max_depth(128))
        .build()
        .unwrap();
    let restored = RuleSet::from_bytes(&original.to_bytes().unwrap()).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn encoding_is_deterministic() {
    assert_eq!(
        complex_ruleset().to_bytes().unwrap(),
        complex_ruleset().to_bytes().unwrap()
    );
}

#[test]
fn file_round_trip() {
    let dir = std::env::temp_dir().join("eligo_test_binary_cache");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("rules.elgb");

    let original = complex_ruleset();
    original.to_binary_file(&path).unwrap();
    let restored = RuleSet::from_binary_file(&path).unwrap();
    assert_eq!(restored, original);

    std::fs::remove_file(&path).ok();
}

// ---------------------------------------------------------------------------
// Corruption and rejection
// ---------------------------------------------------------------------------

#[test]
fn bad_magic() {
    let mut bytes = simple_ruleset().to_bytes().unwrap();
    bytes[0] = b'X';
    assert!(matches!(
        RuleSet::from_bytes(&bytes),
        Err(DeserializeError::BadMagic)
    ));
}

#[test]
fn incompatible_version() {
    let mut bytes = simple_ruleset().to_bytes().unwrap();
    bytes[4..6].copy_from_slice(&99_u16.to_le_bytes());
    assert!(matches!(
        RuleSet::from_bytes(&bytes),
        Err(DeserializeError::IncompatibleVersion {
            blob: 99,
            supported: 1
        })
    ));
}

#[test]
fn flipped_payload_byte_fails_checksum() {
    let mut bytes = simple_ruleset().to_bytes().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(matches!(
        RuleSet::from_bytes(&bytes),
        Err(DeserializeError::ChecksumMismatch)
    ));
}

#[test]
fn truncated_payload() {
    let bytes = simple_ruleset().to_bytes().unwrap();
    let truncated = &bytes[..bytes.len() - 4];
    assert!(matches!(
        RuleSet::from_bytes(truncated),
        Err(DeserializeError::LengthMismatch { .. })
    ));
}

#[test]
fn too_short_for_header() {
    assert!(matches!(
        RuleSet::from_bytes(&[0_u8; 10]),
        Err(DeserializeError::LengthMismatch { expected: 32, actual: 10 })
    ));
}

/// Replace `from` with `to` (same length) inside the payload and rewrite the
/// header checksum so only the content check can catch it.
fn retarget_source(bytes: &mut [u8], from: &[u8], to: &[u8]) {
    let at = bytes
        .windows(from.len())
        .position(|w| w == from)
        .expect("source text present in payload");
    bytes[at..at + to.len()].copy_from_slice(to);
    let hash = blake3::hash(&bytes[32..]);
    bytes[16..32].copy_from_slice(&hash.as_bytes()[..16]);
}

#[test]
fn edited_source_with_valid_checksum_is_rejected() {
    let mut bytes = simple_ruleset().to_bytes().unwrap();
    retarget_source(&mut bytes, b"age >= 18", b"age >= 99");
    match RuleSet::from_bytes(&bytes) {
        Err(DeserializeError::Validation(msg)) => {
            assert_eq!(msg, "rule 'adult': expression does not match its source text");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn edited_source_that_no_longer_parses_is_rejected() {
    let mut bytes = simple_ruleset().to_bytes().unwrap();
    retarget_source(&mut bytes, b"age >= 18", b"age >= ()");
    assert!(matches!(
        RuleSet::from_bytes(&bytes),
        Err(DeserializeError::Validation(msg)) if msg.starts_with("rule 'adult': parse error")
    ));
}

#[test]
fn missing_file_is_io_error() {
    let path = std::env::temp_dir().join("eligo_test_binary_cache_missing.elgb");
    assert!(matches!(
        RuleSet::from_binary_file(path),
        Err(DeserializeError::Io(_))
    ));
}

#[test]
fn errors_convert_into_eligo_error() {
    let err: EligoError = RuleSet::from_bytes(b"nope").unwrap_err().into();
    assert!(matches!(err, EligoError::Deserialize(_)));
}
