use bridge_traits::time::LogLevel;
use core_runtime::logging::{file_name_only, init_logging, redact_field, LogFormat, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_init_logging_only_once_per_process() {
    // Installs the global subscriber; keep this the only such test in the binary.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn);

    assert!(init_logging(config.clone()).is_ok());
    assert!(matches!(init_logging(config), Err(Error::Config(_))));

    tracing::warn!(target: "core_upload", batch_id = "b-1", "Logged after init");
}

#[test]
fn test_credentials_are_redacted() {
    assert_eq!(redact_field("token", "eyJhbGciOiJIUzI1NiJ9"), "[REDACTED]");
    assert_eq!(redact_field("Authorization", "Bearer abc"), "[REDACTED]");
    assert_eq!(redact_field("new_password", "p4ss"), "[REDACTED]");
}

#[test]
fn test_email_is_masked() {
    let masked = redact_field("email", "seller@shop.example");

    assert!(masked.starts_with('s'));
    assert!(!masked.contains("shop.example"));
}

#[test]
fn test_product_fields_pass_through() {
    assert_eq!(
        redact_field("sku", "SKU-1700000000000-k3j2h1g0f"),
        "SKU-1700000000000-k3j2h1g0f"
    );
    assert_eq!(redact_field("category", "Home & Garden"), "Home & Garden");
    assert_eq!(redact_field("username", "jane"), "jane");
}

#[test]
fn test_file_names_drop_directories() {
    assert_eq!(file_name_only("/home/jane/Pictures/shoe.png"), "shoe.png");
    assert_eq!(file_name_only("C:\\Users\\Jane\\lamp.jpg"), "lamp.jpg");
    assert_eq!(file_name_only("mug.webp"), "mug.webp");
    assert_eq!(file_name_only(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Error)
        .with_filter("core_upload=trace")
        .with_redaction(false)
        .with_target(false);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Error);
    assert_eq!(config.filter.as_deref(), Some("core_upload=trace"));
    assert!(!config.redact);
    assert!(!config.display_target);
}
