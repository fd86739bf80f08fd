use super::*;
use std::error::Error;

#[test]
fn test_network_error_connection_refused() {
    let err = SweepError::Network {
        message: "connection refused".to_string(),
        source: None,
    };

    assert!(matches!(err, SweepError::Network { .. }));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_authentication_error_invalid_token() {
    let err = SweepError::authentication("invalid token", Some(401));

    assert!(matches!(err, SweepError::Authentication { .. }));
    assert!(err.to_string().contains("invalid token"));
    assert_eq!(err.status_code(), Some(401));
}

#[test]
fn test_not_found_error_namespace() {
    let err = SweepError::not_found("namespace", "team-a");

    assert!(err.to_string().contains("namespace"));
    assert!(err.to_string().contains("team-a"));
    assert_eq!(err.status_code(), Some(404));
}

#[test]
fn test_rate_limit_error() {
    let err = SweepError::rate_limit("too many requests", Some(60));

    match err {
        SweepError::RateLimit { retry_after, .. } => assert_eq!(retry_after, Some(60)),
        _ => panic!("Expected RateLimit error"),
    }
}

#[test]
fn test_server_error_carries_status_and_body() {
    let err = SweepError::server("internal server error: {\"message\":\"boom\"}", 500);

    assert!(err.to_string().contains("500"));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.status_code(), Some(500));
}

#[test]
fn test_unavailable_error_reports_last_status_and_attempts() {
    let err = SweepError::unavailable(503, 4, "https://api.example.com/namespaces");

    let message = err.to_string();
    assert!(message.contains("503"));
    assert!(message.contains("4 attempts"));
    assert_eq!(err.status_code(), Some(503));
}

#[test]
fn test_policy_error_names_input() {
    let err = SweepError::policy("grace duration", "12days", "expected <N>hr<N>m<N>s");

    assert!(matches!(err, SweepError::Policy { .. }));
    assert!(err.to_string().contains("grace duration"));
    assert!(err.to_string().contains("'12days'"));
    assert!(err.is_usage_error());
}

#[test]
fn test_config_error_is_usage_error() {
    let err = SweepError::config("region and base_url are mutually exclusive", None);
    assert!(err.is_usage_error());
    assert_eq!(err.status_code(), None);
}

#[test]
fn test_network_error_is_not_usage_error() {
    let err = SweepError::network("timeout");
    assert!(!err.is_usage_error());
}

#[test]
fn test_config_error_with_source() {
    let source_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err = SweepError::config_with_source(
        "failed to read config",
        Some("/path/to/config.yaml"),
        source_error,
    );

    assert!(err.source().is_some());
    assert!(err.source().unwrap().to_string().contains("file not found"));
}

#[test]
fn test_validation_with_source_helper_constructor() {
    let io_err = std::io::Error::new(std::io::ErrorKind::InvalidData, "invalid data");
    let err = SweepError::validation_with_source("invalid tag payload", io_err);
    assert!(matches!(err, SweepError::Validation { .. }));
    assert!(err.source().is_some());
}

#[test]
fn test_error_implements_error_trait() {
    let err = SweepError::network("test error");
    let _: &dyn std::error::Error = &err;
}
