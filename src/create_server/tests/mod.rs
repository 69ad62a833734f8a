//! Tests for the create-server step.


use std::sync::Arc;

use rstest::fixture;

use crate::config::ServerConfig;
use crate::state::BuildContext;
use crate::test_support::{RecordingUi, ScriptedApi};

pub(super) struct Harness {
    pub api: ScriptedApi,
    pub ui: RecordingUi,
}

impl Harness {
    pub fn context(&self, config: ServerConfig) -> BuildContext {
        let mut ctx = BuildContext::new(
            Arc::new(self.api.clone()),
            Arc::new(self.ui.clone()),
            config,
            7,
        );
        ctx.state.server_type = Some(crate::hcloud::types::ServerType {
            id: 1,
            name: String::from("cx22"),
            architecture: crate::hcloud::types::Architecture::X86,
        });
        ctx
    }
}

#[fixture]
pub(super) fn harness() -> Harness {
    Harness {
        api: ScriptedApi::new(),
        ui: RecordingUi::new(),
    }
}

pub(super) fn base_config() -> ServerConfig {
    ServerConfig {
        server_name: String::from("build-1"),
        server_type: String::from("cx22"),
        image: Some(String::from("ubuntu-24.04")),
        location: String::from("fsn1"),
        ..ServerConfig::default()
    }
}
