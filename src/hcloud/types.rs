//! Typed views of the Hetzner Cloud resources the builder touches.
//!
//! The views are decoded from the `hcloud` crate's models and keep only the
//! fields the provisioning steps read.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Provider-assigned server identifier.
pub type ServerId = i64;

/// CPU architecture reported for server types and images.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// `x86_64` hosts.
    X86,
    /// `aarch64` hosts.
    Arm,
}

impl Architecture {
    /// Returns the value used by the API for query filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Arm => "arm",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress state of an asynchronous provider action.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// The action is still in progress.
    Running,
    /// The action completed successfully.
    Success,
    /// The action failed; see [`Action::error`].
    Error,
}

/// Error details attached to a failed action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ActionError {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Asynchronous operation handle returned by every mutating call.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Action {
    /// Action identifier used for polling.
    pub id: i64,
    /// Command the action performs (for example `create_server`).
    pub command: String,
    /// Current status.
    pub status: ActionStatus,
    /// Completion percentage reported by the provider.
    #[serde(default)]
    pub progress: u8,
    /// Populated when `status` is [`ActionStatus::Error`].
    #[serde(default)]
    pub error: Option<ActionError>,
}

/// Public IPv4 assignment of a server.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Ipv4Assignment {
    /// Dotted-decimal address.
    pub ip: Ipv4Addr,
}

/// Public networking block of a server.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct PublicNet {
    /// Primary IPv4 address, absent when the server was created without one.
    #[serde(default)]
    pub ipv4: Option<Ipv4Assignment>,
}

/// Provider-side server resource.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Server {
    /// Server identifier.
    pub id: ServerId,
    /// Server name.
    pub name: String,
    /// Public networking details.
    #[serde(default)]
    pub public_net: PublicNet,
    /// Whether the server will boot into the rescue system on next reboot.
    #[serde(default)]
    pub rescue_enabled: bool,
}

impl Server {
    /// Returns the public IPv4 address when one is assigned.
    #[must_use]
    pub fn public_ipv4(&self) -> Option<Ipv4Addr> {
        self.public_net.ipv4.as_ref().map(|assignment| assignment.ip)
    }
}

/// Server flavour; only the architecture matters for image selection.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ServerType {
    /// Server type identifier.
    pub id: i64,
    /// Server type name (for example `cx22`).
    pub name: String,
    /// CPU architecture of hosts with this type.
    pub architecture: Architecture,
}

/// Boot image (system image or snapshot).
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Image {
    /// Image identifier.
    pub id: i64,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Creation timestamp used by the most-recent policy.
    pub created: DateTime<Utc>,
}

/// Registered SSH public key.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct SshKey {
    /// SSH key identifier.
    pub id: i64,
    /// SSH key name.
    #[serde(default)]
    pub name: String,
}

impl SshKey {
    /// Builds a reference to a key known only by identifier.
    #[must_use]
    pub const fn with_id(id: i64) -> Self {
        Self {
            id,
            name: String::new(),
        }
    }
}

/// Image reference passed to the create call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ImageRef {
    /// Image addressed by name; no existence check is made before creation.
    Name(String),
    /// Image resolved to a concrete identifier.
    Id(i64),
}

impl ImageRef {
    /// Renders the reference the way the API expects it in request bodies.
    #[must_use]
    pub fn to_api_value(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Id(id) => id.to_string(),
        }
    }
}

/// Filters for listing available images.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageListOpts {
    /// Comma-joined label selector.
    pub label_selector: String,
    /// Required CPU architecture.
    pub architecture: Architecture,
}

/// Parameters for creating a server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerCreateOpts {
    /// Server name.
    pub name: String,
    /// Server type name.
    pub server_type: String,
    /// Boot image.
    pub image: ImageRef,
    /// SSH keys injected into the server.
    pub ssh_keys: Vec<SshKey>,
    /// Location name.
    pub location: String,
    /// Cloud-init user-data; empty means none.
    pub user_data: String,
    /// Private network identifiers to attach.
    pub networks: Vec<i64>,
    /// Labels applied to the server.
    pub labels: BTreeMap<String, String>,
    /// `Some(false)` keeps the server powered off after creation.
    pub start_after_create: Option<bool>,
}

/// Result of a create call.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ServerCreateResult {
    /// Newly created server.
    pub server: Server,
    /// Creation action.
    pub action: Action,
    /// Follow-up actions (network attachment, firewall application, ...).
    #[serde(default)]
    pub next_actions: Vec<Action>,
}

/// Parameters for a server type change.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChangeTypeOpts {
    /// Target server type name.
    pub server_type: String,
    /// Whether the disk grows with the new type (irreversible).
    pub upgrade_disk: bool,
}

/// Parameters for enabling the rescue system.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnableRescueOpts {
    /// Rescue system type (for example `linux64`).
    pub rescue_type: String,
    /// Keys authorised for root login in the rescue system.
    pub ssh_keys: Vec<SshKey>,
}

/// Result of enabling the rescue system.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct EnableRescueResult {
    /// Action tracking the mode switch.
    pub action: Action,
    /// One-time root password for the rescue system.
    #[serde(default)]
    pub root_password: Option<String>,
}
