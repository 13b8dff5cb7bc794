//! Sanitization tests
//!
//! Malformed key/value input is repaired and reported as warnings, never
//! rejected.

use deepstack_core::sanitize::{INVALID_KEY, INVALID_KEY_TYPE, ODD_PAIR_COUNT};
use deepstack_core::{kv, Level, Value};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use tests::TestHarness;

fn attributes(h: &TestHarness) -> HashMap<String, Value> {
    h.backend.single_record().attributes
}

#[test]
fn test_valid_pairs_pass_through_without_warnings() {
    let h = TestHarness::new(Level::Debug);
    h.logger.info("msg", kv!["a", 1, "b", "two", "c", false]);

    let attrs = attributes(&h);
    assert_eq!(attrs.len(), 3);
    assert_eq!(attrs["b"], Value::from("two"));
    assert!(h.backend.warnings().is_empty());
}

#[test]
fn test_duplicate_keys_keep_last_value() {
    let h = TestHarness::new(Level::Debug);
    h.logger.info("msg", kv!["k", 1, "k", 2, "k", 3]);

    let attrs = attributes(&h);
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs["k"], Value::I64(3));
    assert!(h.backend.warnings().is_empty());
}

#[test]
fn test_odd_count_warns_once_and_drops_dangling_key() {
    let h = TestHarness::new(Level::Debug);
    h.logger.info("msg", kv!["k1", "v1", "k2", "v2", "dangling"]);

    let warnings = h.backend.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, ODD_PAIR_COUNT);
    assert_eq!(
        warnings[0].1,
        vec![("count".to_string(), Value::U64(5))]
    );

    let attrs = attributes(&h);
    assert_eq!(attrs.len(), 2);
    assert!(!attrs.contains_key("dangling"));
}

#[test]
fn test_non_string_key_warns_with_actual_type() {
    let h = TestHarness::new(Level::Debug);
    h.logger.info("msg", kv![123, "value1", "key2", "value2"]);

    assert_eq!(
        h.backend.warnings(),
        vec![(
            INVALID_KEY_TYPE.to_string(),
            vec![("actual_type".to_string(), Value::from("int"))]
        )]
    );

    let attrs = attributes(&h);
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs["key2"], Value::from("value2"));
}

#[test]
fn test_whitespace_key_warns_with_key() {
    let h = TestHarness::new(Level::Debug);
    h.logger.info("msg", [("user id", "42"), ("ok", "yes")]);

    assert_eq!(
        h.backend.warnings(),
        vec![(
            INVALID_KEY.to_string(),
            vec![("key".to_string(), Value::from("user id"))]
        )]
    );
    let attrs = attributes(&h);
    assert_eq!(attrs.len(), 1);
    assert!(attrs.contains_key("ok"));
}

#[test]
fn test_warnings_precede_the_record() {
    let h = TestHarness::new(Level::Debug);
    h.logger.error("msg", kv![true, 1, "k", "v"]);

    let calls = h.backend.calls();
    let warning_at = calls
        .iter()
        .position(|c| matches!(c, tests::BackendCall::Warning { .. }))
        .unwrap();
    let dispatch_at = calls
        .iter()
        .position(|c| matches!(c, tests::BackendCall::Dispatch(_)))
        .unwrap();
    assert!(warning_at < dispatch_at);
}

#[test]
fn test_every_invalid_pair_is_reported() {
    let h = TestHarness::new(Level::Debug);
    h.logger.info("msg", kv![1, "a", "b c", "d", 2.5, "e", "ok", "f", "tail"]);

    assert_eq!(
        h.backend.warning_messages(),
        vec![
            ODD_PAIR_COUNT.to_string(),
            INVALID_KEY_TYPE.to_string(),
            INVALID_KEY.to_string(),
            INVALID_KEY_TYPE.to_string(),
        ]
    );
    let attrs = attributes(&h);
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs["ok"], Value::from("f"));
}

#[test]
fn test_warning_points_at_the_logging_call() {
    let h = TestHarness::new(Level::Debug);
    let line = line!() + 1;
    h.logger.info("msg", kv!["k", "v", "dangling"]);

    let sources = h.backend.warning_sources();
    assert_eq!(sources.len(), 1);
    assert!(sources[0].file.ends_with("sanitization.rs"), "file was {}", sources[0].file);
    assert_eq!(sources[0].line, line);
    assert_eq!(h.backend.single_record().source, Some(sources[0]));
}
