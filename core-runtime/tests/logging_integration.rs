//! Integration tests for logging system

use bridge_traits::time::LogLevel;
use core_runtime::logging::{
    init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig,
};

#[test]
fn test_init_logging_only_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).expect("first initialization succeeds");
    tracing::debug!(target: "core_auth", "logging initialized");

    let second = init_logging(config);
    assert!(second.is_err());
    assert!(second
        .unwrap_err()
        .to_string()
        .contains("Failed to initialize logging"));
}

#[test]
fn test_pii_redaction_oauth_material() {
    assert_eq!(redact_if_sensitive("access_token", "ya29.a0AfH6"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("refresh_token", "1//0gdX"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("Authorization", "Bearer x"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("client_secret", "GOCSPX-1"), "[REDACTED]");
}

#[test]
fn test_pii_redaction_emails() {
    let redacted = redact_if_sensitive("owner", "user@example.com");

    assert!(redacted.starts_with('u'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_pii_redaction_normal_values() {
    assert_eq!(redact_if_sensitive("file_id", "1a2b3c"), "1a2b3c");
    assert_eq!(redact_if_sensitive("name", "test.txt"), "test.txt");
    assert_eq!(redact_if_sensitive("mime_type", "text/plain"), "text/plain");
}

#[test]
fn test_path_stripping() {
    assert_eq!(strip_path("/home/user/Documents/report.pdf"), "report.pdf");
    assert_eq!(strip_path("D:\\data\\file.txt"), "file.txt");
    assert_eq!(strip_path("filename.txt"), "filename.txt");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    let config = LoggingConfig::default();

    #[cfg(debug_assertions)]
    assert_eq!(config.format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(config.format, LogFormat::Json);
}
