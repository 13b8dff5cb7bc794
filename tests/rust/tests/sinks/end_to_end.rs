use deepstack_core::{kv, Level, LoggerOptions, ERROR_FIELD};
use deepstack_sinks::{
    build_backend, logger_for, new_logger, ConsoleSink, FileSinkConfig, LoggerConfig,
    SinkBackend, TracingSink,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tests::SharedBuffer;

fn file_config(dir: &std::path::Path) -> LoggerConfig {
    LoggerConfig {
        level: Level::Debug,
        console: false,
        file: Some(FileSinkConfig {
            compress: false,
            ..FileSinkConfig::in_dir(dir.join("logs"))
        }),
        work_dir: Some(dir.to_path_buf()),
        ..LoggerConfig::default()
    }
}

fn read_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_new_logger_writes_to_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = file_config(temp_dir.path());
    let logger = new_logger(&config).unwrap();

    logger.debug("starting", kv!["port", 8080]);
    logger.info("ready", ());

    let lines = read_lines(&temp_dir.path().join("logs/app.log"));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["level"], "DEBUG");
    assert_eq!(lines[0]["port"], 8080);
    assert!(lines[0]["source"]["file"]
        .as_str()
        .unwrap()
        .ends_with("end_to_end.rs"));
    assert_eq!(lines[1]["msg"], "ready");
}

#[test]
fn test_rich_error_lands_in_file_and_plain_output() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = file_config(temp_dir.path());
    let plain = SharedBuffer::new();
    let backend = build_backend(&config).unwrap().with_plain_writer(plain.clone());
    let backend = Arc::new(backend);
    let logger = logger_for(&config, backend.clone());

    let err = logger.new_error("db timeout", [("table", "users")]);
    let err = logger.add_context(err, [("attempt", 3)]);
    logger.error("query failed", kv![ERROR_FIELD, err.clone()]);
    backend.flush();

    let lines = read_lines(&temp_dir.path().join("logs/app.log"));
    assert_eq!(lines.len(), 1);
    let line = &lines[0];
    assert_eq!(line["level"], "ERROR");
    assert_eq!(line["msg"], "query failed");
    assert_eq!(line["error_cause"], "db timeout");
    assert_eq!(line["table"], "users");
    assert_eq!(line["attempt"], 3);
    assert_eq!(line["stack_trace"], err.stack_trace());
    assert!(line.get("error").is_none());

    assert!(plain.contents().contains("rich_error_lands_in_file_and_plain_output"));
}

#[test]
fn test_foreign_error_warning_reaches_the_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let logger = new_logger(&file_config(temp_dir.path())).unwrap();

    logger.error("failed", kv![ERROR_FIELD, anyhow::anyhow!("plain failure")]);

    let lines = read_lines(&temp_dir.path().join("logs/app.log"));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["level"], "WARN");
    assert_eq!(
        lines[0]["msg"],
        "invalid error type in log message, must be a rich error"
    );
    assert_eq!(lines[0]["actual_type"], "error");
    assert!(lines[0]["source"]["file"]
        .as_str()
        .unwrap()
        .ends_with("end_to_end.rs"));
    assert_eq!(lines[1]["error"], "plain failure");
}

#[test]
fn test_foreign_error_warning_disabled_by_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig {
        options: LoggerOptions {
            warn_on_foreign_errors: false,
            ..LoggerOptions::default()
        },
        ..file_config(temp_dir.path())
    };
    let logger = new_logger(&config).unwrap();

    logger.error("failed", kv![ERROR_FIELD, "just a string"]);

    let lines = read_lines(&temp_dir.path().join("logs/app.log"));
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["error"], "just a string");
}

#[test]
fn test_console_and_file_receive_the_same_records() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = file_config(temp_dir.path());
    let console = SharedBuffer::new();
    let backend = build_backend(&config)
        .unwrap()
        .with_sink(ConsoleSink::new(console.clone()));
    let logger = logger_for(&config, Arc::new(backend));

    logger.warn("low memory", kv!["free_mb", 64]);

    let lines = read_lines(&temp_dir.path().join("logs/app.log"));
    assert_eq!(lines.len(), 1);
    assert_eq!(console.contents().lines().count(), 1);
    assert!(console.contents().contains("\"low memory\" free_mb=64"));
}

#[test]
fn test_tracing_sink_emits_events() {
    let output = SharedBuffer::new();
    let writer = output.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let backend = SinkBackend::new(Level::Debug).with_sink(TracingSink::new());
    let logger = logger_for(&LoggerConfig::default(), Arc::new(backend));

    tracing::subscriber::with_default(subscriber, || {
        logger.info("via tracing", kv!["user", "bob"]);
    });

    let text = output.contents();
    assert!(text.contains("INFO"), "output was {text}");
    assert!(text.contains("deepstack"), "output was {text}");
    assert!(text.contains("via tracing"), "output was {text}");
    assert!(text.contains(r#"attributes={"user":"bob"}"#), "output was {text}");
}

#[test]
fn test_build_backend_without_sinks_skips_everything() {
    let config = LoggerConfig {
        console: false,
        file: None,
        ..LoggerConfig::default()
    };
    let backend = build_backend(&config).unwrap();
    assert!(backend.sink_names().is_empty());

    let logger = logger_for(&config, Arc::new(backend));
    assert!(!logger.enabled(Level::Error));
}
