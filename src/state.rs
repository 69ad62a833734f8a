//! Typed build state shared between pipeline steps.
//!
//! Earlier steps populate the inputs, the create-server step owns the server
//! outputs, and any step that halts records its error for the final summary.

use std::net::Ipv4Addr;
use std::sync::Arc;

use crate::api::CloudApi;
use crate::config::ServerConfig;
use crate::hcloud::types::{ServerId, ServerType};
use crate::ui::Ui;

/// Values produced and consumed by the steps of one build.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BuildState {
    /// SSH key registered by an earlier step for this build.
    pub ssh_key_id: i64,
    /// Server type resolved from the template, when looked up.
    pub server_type: Option<ServerType>,
    /// Identifier of the created server.
    pub server_id: Option<ServerId>,
    /// Generic alias of `server_id` read by provisioners.
    pub instance_id: Option<ServerId>,
    /// Public IPv4 address of the created server.
    pub server_ip: Option<Ipv4Addr>,
    /// Error recorded by the step that halted the build.
    pub error: Option<String>,
}

impl BuildState {
    /// Creates state seeded with the build's SSH key.
    #[must_use]
    pub fn new(ssh_key_id: i64) -> Self {
        Self {
            ssh_key_id,
            ..Self::default()
        }
    }

    /// Records the identity and address of a freshly created server.
    pub const fn record_server(&mut self, id: ServerId, ip: Option<Ipv4Addr>) {
        self.server_id = Some(id);
        self.instance_id = Some(id);
        self.server_ip = ip;
    }
}

/// Everything a step needs: provider client, UI sink, template, and state.
#[derive(Clone)]
pub struct BuildContext {
    /// Provider client.
    pub api: Arc<dyn CloudApi>,
    /// Progress sink.
    pub ui: Arc<dyn Ui>,
    /// Validated server template.
    pub config: ServerConfig,
    /// Mutable build state.
    pub state: BuildState,
}

impl BuildContext {
    /// Assembles a context for a new build.
    #[must_use]
    pub fn new(
        api: Arc<dyn CloudApi>,
        ui: Arc<dyn Ui>,
        config: ServerConfig,
        ssh_key_id: i64,
    ) -> Self {
        Self {
            api,
            ui,
            config,
            state: BuildState::new(ssh_key_id),
        }
    }

    /// Reports `message` to the UI and records it as the build error.
    pub fn halt_with(&mut self, message: String) {
        self.ui.error(&message);
        self.state.error = Some(message);
    }
}
