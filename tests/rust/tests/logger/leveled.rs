//! Leveled logging tests
//!
//! Validates skip-check short-circuiting, record construction and dispatch.

use deepstack_core::{kv, Level, Value};
use pretty_assertions::assert_eq;
use tests::{BackendCall, TestHarness};

#[test]
fn test_skipped_level_only_queries_backend() {
    let h = TestHarness::new(Level::Info);

    // Malformed on purpose: would warn if sanitization ran
    h.logger.debug("msg", kv![123, "v", "bad key", 1, "dangling"]);

    let calls = h.backend.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], BackendCall::ShouldSkip(Level::Debug)));
    assert_eq!(h.tracer.capture_count(), 0);
}

#[test]
fn test_each_level_dispatches_its_own_level() {
    let h = TestHarness::new(Level::Debug);
    h.logger.debug("d", ());
    h.logger.info("i", ());
    h.logger.warn("w", ());
    h.logger.error("e", ());

    let levels: Vec<_> = h.backend.records().iter().map(|r| r.level).collect();
    assert_eq!(
        levels,
        vec![Level::Debug, Level::Info, Level::Warn, Level::Error]
    );
}

#[test]
fn test_threshold_filters_lower_levels() {
    let h = TestHarness::new(Level::Warn);
    h.logger.debug("d", ());
    h.logger.info("i", ());
    h.logger.warn("w", ());
    h.logger.error("e", ());

    let messages: Vec<_> = h
        .backend
        .records()
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(messages, vec!["w".to_string(), "e".to_string()]);
    assert!(!h.logger.enabled(Level::Info));
    assert!(h.logger.enabled(Level::Error));
}

#[test]
fn test_attributes_are_attached_verbatim() {
    let h = TestHarness::new(Level::Debug);
    h.logger.info(
        "This is an info message",
        [("key1", "value1"), ("key2", "value 2")],
    );

    let record = h.backend.single_record();
    assert_eq!(record.level, Level::Info);
    assert_eq!(record.message, "This is an info message");
    assert_eq!(record.attributes.len(), 2);
    assert_eq!(record.attr("key1"), Some(&Value::from("value1")));
    assert_eq!(record.attr("key2"), Some(&Value::from("value 2")));
    assert!(h.backend.warnings().is_empty());
    assert!(h.backend.lines().is_empty());
}

#[test]
fn test_mixed_value_types() {
    let h = TestHarness::new(Level::Debug);
    h.logger.info(
        "mixed",
        kv![
            "count", 3,
            "ratio", 0.5,
            "ok", true,
            "missing", None::<String>,
            "payload", serde_json::json!({"a": [1, 2]})
        ],
    );

    let record = h.backend.single_record();
    assert_eq!(record.attr("count"), Some(&Value::I64(3)));
    assert_eq!(record.attr("ratio"), Some(&Value::F64(0.5)));
    assert_eq!(record.attr("ok"), Some(&Value::Bool(true)));
    assert_eq!(record.attr("missing"), Some(&Value::Null));
    assert_eq!(
        record.attr("payload"),
        Some(&Value::Json(serde_json::json!({"a": [1, 2]})))
    );
}

#[test]
fn test_record_source_points_at_caller() {
    let h = TestHarness::new(Level::Debug);
    h.logger.warn("here", ());

    let source = h.backend.single_record().source.expect("source captured");
    assert!(source.file.ends_with("leveled.rs"), "file was {}", source.file);
}

#[test]
fn test_dispatch_happens_after_skip_check() {
    let h = TestHarness::new(Level::Debug);
    h.logger.error("msg", [("k", "v")]);

    let calls = h.backend.calls();
    assert_eq!(calls.len(), 2);
    assert!(matches!(calls[0], BackendCall::ShouldSkip(Level::Error)));
    assert!(matches!(calls[1], BackendCall::Dispatch(_)));
}
