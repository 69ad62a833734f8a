//! Unit tests for API configuration and server template validation.

use camino::Utf8PathBuf;
use hcloud_builder::{ConfigError, HcloudConfig, ServerConfig, config::DEFAULT_ENDPOINT};
use rstest::*;
use tempfile::TempDir;

#[fixture]
fn valid_api_config() -> HcloudConfig {
    HcloudConfig {
        token: String::from("hcloud-token-example"),
        endpoint: String::from(DEFAULT_ENDPOINT),
        poll_interval_ms: 500,
        action_timeout_secs: 600,
    }
}

fn template_json(extra: &str) -> String {
    format!(r#"{{"server_type": "cx22", "location": "fsn1"{extra}}}"#)
}

#[rstest]
fn api_config_accepts_complete_values(valid_api_config: HcloudConfig) {
    assert!(valid_api_config.validate().is_ok());
}

#[rstest]
fn api_config_rejects_missing_token_with_actionable_error(valid_api_config: HcloudConfig) {
    let cfg = HcloudConfig {
        token: String::new(),
        ..valid_api_config
    };

    let error = cfg.validate().expect_err("token is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error, got {error:?}");
    };
    assert!(message.contains("HCLOUD_TOKEN"), "message: {message}");
    assert!(message.contains("hcloud-builder.toml"), "message: {message}");
}

#[rstest]
fn api_config_rejects_zero_poll_interval(valid_api_config: HcloudConfig) {
    let cfg = HcloudConfig {
        poll_interval_ms: 0,
        ..valid_api_config
    };

    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn template_fills_generated_server_name() {
    let config = ServerConfig::from_json_str(&template_json(r#", "image": "ubuntu-24.04""#))
        .expect("template parses");

    assert!(
        config.server_name.starts_with("packer-"),
        "name: {}",
        config.server_name
    );
    assert_eq!(config.image_name(), Some("ubuntu-24.04"));
}

#[rstest]
#[case::image_and_filter(
    r#", "image": "ubuntu", "image_filter": {"with_selector": ["role=base"]}"#,
    "image and image_filter cannot both be specified"
)]
#[case::both_user_data_sources(
    r#", "image": "ubuntu", "user_data": "x", "user_data_file": "/tmp/x""#,
    "only one of user_data or user_data_file can be specified"
)]
#[case::upgrade_to_same_type(
    r#", "image": "ubuntu", "upgrade_server_type": "cx22""#,
    "upgrade_server_type cx22 matches server_type"
)]
fn template_rejects_conflicting_options(#[case] extra: &str, #[case] expected: &str) {
    let error = ServerConfig::from_json_str(&template_json(extra)).expect_err("conflict");

    assert_eq!(error, ConfigError::Conflict(String::from(expected)));
}

#[test]
fn template_requires_an_image_source() {
    let error = ServerConfig::from_json_str(&template_json("")).expect_err("image required");

    assert!(matches!(error, ConfigError::MissingField(ref message) if message.contains("image")));
}

#[test]
fn template_rejects_unknown_fields() {
    let error = ServerConfig::from_json_str(&template_json(r#", "image": "u", "colour": "red""#))
        .expect_err("unknown field");

    assert!(matches!(error, ConfigError::Parse(_)), "got {error:?}");
}

#[test]
fn template_loads_from_disk() {
    let dir = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("template.json"))
        .unwrap_or_else(|path| panic!("non-UTF-8 temp path: {}", path.display()));
    std::fs::write(
        &path,
        template_json(
            r#", "server_name": "img-build", "image_filter": {"with_selector": ["role=base"], "most_recent": true}"#,
        ),
    )
    .expect("write template");

    let config = ServerConfig::load_template(&path).expect("template loads");

    assert_eq!(config.server_name, "img-build");
    assert_eq!(config.image_filter.selector(), "role=base");
    assert!(config.image_filter.most_recent);
}

#[test]
fn missing_template_reports_path() {
    let error = ServerConfig::load_template(camino::Utf8Path::new("/nonexistent/template.json"))
        .expect_err("missing file");

    assert!(
        error
            .to_string()
            .starts_with("failed to read server template `/nonexistent/template.json`"),
        "got {error}"
    );
}
