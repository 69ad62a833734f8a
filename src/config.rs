//! Configuration loading via `ortho-config` and server template parsing.
//!
//! Two layers feed the builder: [`HcloudConfig`] carries API credentials and
//! polling behaviour merged from defaults, configuration files, and
//! environment variables, while [`ServerConfig`] is the per-build server
//! template read from a JSON file.

use std::collections::BTreeMap;
use std::time::Duration;

use camino::Utf8Path;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::user_data::read_to_string_ambient;

/// Default Hetzner Cloud API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.hetzner.cloud/v1";

/// API settings derived from environment variables and configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "HCLOUD",
    discovery(
        app_name = "hcloud-builder",
        env_var = "HCLOUD_BUILDER_CONFIG_PATH",
        config_file_name = "hcloud-builder.toml",
        dotfile_name = ".hcloud-builder.toml",
        project_file_name = "hcloud-builder.toml"
    )
)]
pub struct HcloudConfig {
    /// API token used as bearer credentials. This value is required.
    pub token: String,
    /// API base URL.
    #[ortho_config(default = DEFAULT_ENDPOINT.to_owned())]
    pub endpoint: String,
    /// Interval between action status polls, in milliseconds.
    #[ortho_config(default = 500)]
    pub poll_interval_ms: u64,
    /// Upper bound for a single action to finish, in seconds.
    #[ortho_config(default = 600)]
    pub action_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl HcloudConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to hcloud-builder.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("hcloud-builder")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the token or endpoint is
    /// empty, and [`ConfigError::Invalid`] when the poll interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.token,
            &FieldMetadata::new("Hetzner Cloud API token", "HCLOUD_TOKEN", "token"),
        )?;
        Self::require_field(
            &self.endpoint,
            &FieldMetadata::new("API endpoint", "HCLOUD_ENDPOINT", "endpoint"),
        )?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "poll_interval_ms must be greater than zero",
            )));
        }
        Ok(())
    }

    /// Interval between action status polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Maximum time to wait for one action.
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}

/// Label-selector based image lookup.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ImageFilter {
    /// Label selector expressions, joined with commas for the query.
    pub with_selector: Vec<String>,
    /// Pick the newest image when several match instead of failing.
    pub most_recent: bool,
}

impl ImageFilter {
    /// Returns the comma-joined selector sent to the API.
    #[must_use]
    pub fn selector(&self) -> String {
        self.with_selector.join(",")
    }

    /// Returns true when no selector expressions are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with_selector.is_empty()
    }
}

/// Server template consumed by the provisioning step.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Name given to the build server.
    pub server_name: String,
    /// Server type to create the server with.
    pub server_type: String,
    /// Image name; mutually exclusive with `image_filter`.
    pub image: Option<String>,
    /// Label-selector lookup; mutually exclusive with `image`.
    pub image_filter: ImageFilter,
    /// Additional SSH keys (identifier or name) to inject.
    pub ssh_keys: Vec<String>,
    /// Location to create the server in.
    pub location: String,
    /// Inline cloud-init user-data.
    pub user_data: Option<String>,
    /// Path to a cloud-init user-data file.
    pub user_data_file: Option<String>,
    /// Private network identifiers to attach.
    pub networks: Vec<i64>,
    /// Labels applied to the server.
    pub server_labels: BTreeMap<String, String>,
    /// Server type to switch to after creation.
    pub upgrade_server_type: Option<String>,
    /// Rescue system to boot into after creation (for example `linux64`).
    pub rescue_mode: Option<String>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|text| !text.trim().is_empty())
}

impl ServerConfig {
    /// Parses a template from JSON, fills defaults, and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and the validation
    /// errors of [`ServerConfig::validate`].
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let config = parsed.with_defaults();
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a template file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the errors of [`ServerConfig::from_json_str`].
    pub fn load_template(path: &Utf8Path) -> Result<Self, ConfigError> {
        let raw = read_to_string_ambient(path.as_str()).map_err(|message| ConfigError::Read {
            path: path.to_string(),
            message,
        })?;
        Self::from_json_str(&raw)
    }

    /// Assigns a unique server name when the template leaves it blank.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        if self.server_name.trim().is_empty() {
            self.server_name = format!("packer-{}", Uuid::new_v4().simple());
        }
        self
    }

    /// Image name when one is configured.
    #[must_use]
    pub fn image_name(&self) -> Option<&str> {
        non_empty(self.image.as_ref())
    }

    /// Server type to switch to after creation, if any.
    #[must_use]
    pub fn upgrade_target(&self) -> Option<&str> {
        non_empty(self.upgrade_server_type.as_ref())
    }

    /// Rescue system to enable, if any.
    #[must_use]
    pub fn rescue_target(&self) -> Option<&str> {
        non_empty(self.rescue_mode.as_ref())
    }

    fn require_field(value: &str, key: &'static str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {key}: set \"{key}\" in the server template"
            )));
        }
        Ok(())
    }

    /// Checks required fields and mutually exclusive options.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] for absent required values and
    /// [`ConfigError::Conflict`] when exclusive options are combined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(&self.server_name, "server_name")?;
        Self::require_field(&self.server_type, "server_type")?;
        Self::require_field(&self.location, "location")?;

        match (self.image_name().is_some(), self.image_filter.is_empty()) {
            (true, false) => {
                return Err(ConfigError::Conflict(String::from(
                    "image and image_filter cannot both be specified",
                )));
            }
            (false, true) => {
                return Err(ConfigError::MissingField(String::from(
                    "missing image: set \"image\" or \"image_filter\" in the server template",
                )));
            }
            _ => {}
        }

        if self.user_data.is_some() && self.user_data_file.is_some() {
            return Err(ConfigError::Conflict(String::from(
                "only one of user_data or user_data_file can be specified",
            )));
        }

        if let Some(target) = self.upgrade_target()
            && target == self.server_type
        {
            return Err(ConfigError::Conflict(format!(
                "upgrade_server_type {target} matches server_type"
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates mutually exclusive options were combined.
    #[error("conflicting configuration: {0}")]
    Conflict(String),
    /// Indicates a value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader or template parser.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when the server template cannot be read.
    #[error("failed to read server template `{path}`: {message}")]
    Read {
        /// Template path as given.
        path: String,
        /// Underlying error message.
        message: String,
    },
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
