//! Step that resolves the template's server type before provisioning.
//!
//! Image selection filters on the server type's architecture, so the lookup
//! runs ahead of the create-server step.

use tracing::info;

use crate::pipeline::{Step, StepAction, StepFuture};
use crate::state::BuildContext;

/// Looks up the configured server type and stores it in the build state.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepFetchServerType;

impl StepFetchServerType {
    async fn fetch(ctx: &mut BuildContext) -> StepAction {
        if ctx.state.server_type.is_some() {
            return StepAction::Continue;
        }

        let name = ctx.config.server_type.clone();
        match ctx.api.get_server_type(&name).await {
            Ok(Some(server_type)) => {
                info!(server_type = %server_type.name, architecture = %server_type.architecture, "resolved server type");
                ctx.state.server_type = Some(server_type);
                StepAction::Continue
            }
            Ok(None) => {
                ctx.halt_with(format!("Could not find server type: {name}"));
                StepAction::Halt
            }
            Err(err) => {
                ctx.halt_with(format!("Error fetching server type: {err}"));
                StepAction::Halt
            }
        }
    }
}

impl Step for StepFetchServerType {
    fn name(&self) -> &'static str {
        "fetch_server_type"
    }

    fn run<'a>(&'a mut self, ctx: &'a mut BuildContext) -> StepFuture<'a, StepAction> {
        Box::pin(Self::fetch(ctx))
    }

    fn cleanup<'a>(&'a mut self, _ctx: &'a BuildContext) -> StepFuture<'a, ()> {
        Box::pin(async {})
    }
}
