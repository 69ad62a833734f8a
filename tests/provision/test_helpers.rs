//! Shared fixtures and helpers for provisioning BDD scenarios.

use std::sync::Arc;

use hcloud_builder::test_support::{RecordingUi, ScriptedApi};
use hcloud_builder::{
    BuildContext, BuildState, CleanupPolicy, ServerConfig, Step, StepCreateServer,
    StepFetchServerType, run_steps,
};
use rstest::fixture;
use tokio::runtime::Runtime;

/// SSH key the scenarios pass as the build key.
pub const BUILD_SSH_KEY_ID: i64 = 7;

#[derive(Clone, Debug)]
pub enum ProvisionOutcome {
    Success(BuildState),
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct ProvisionContext {
    pub api: ScriptedApi,
    pub ui: RecordingUi,
    pub config: ServerConfig,
    pub outcome: Option<ProvisionOutcome>,
}

#[fixture]
pub fn provision_context() -> ProvisionContext {
    ProvisionContext {
        api: ScriptedApi::new(),
        ui: RecordingUi::new(),
        config: ServerConfig::default(),
        outcome: None,
    }
}

pub fn template(server_type: &str) -> ServerConfig {
    ServerConfig {
        server_name: String::from("bdd-build"),
        server_type: server_type.to_owned(),
        location: String::from("nbg1"),
        ..ServerConfig::default()
    }
}

/// Runs the fetch-type and create-server steps against the scripted provider.
pub fn run_pipeline(
    context: &ProvisionContext,
    policy: CleanupPolicy,
) -> Result<ProvisionOutcome, std::io::Error> {
    let runtime = Runtime::new()?;
    let mut ctx = BuildContext::new(
        Arc::new(context.api.clone()),
        Arc::new(context.ui.clone()),
        context.config.clone(),
        BUILD_SSH_KEY_ID,
    );
    let mut steps: Vec<Box<dyn Step>> = vec![
        Box::new(StepFetchServerType),
        Box::new(StepCreateServer::new()),
    ];

    let result = runtime.block_on(run_steps(&mut steps, &mut ctx, policy));
    Ok(match result {
        Ok(()) => ProvisionOutcome::Success(ctx.state),
        Err(_) => ProvisionOutcome::Failure(ctx.state.error.unwrap_or_default()),
    })
}
