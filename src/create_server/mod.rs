//! Step that creates the build server and tears it down again.
//!
//! Provisioning advances through explicit stages: the server is created,
//! optionally moved to a different server type, optionally booted into a
//! rescue system, and finally reported ready. Any failure halts the build
//! with a message naming the stage, and cleanup deletes whatever server was
//! created.

mod error;
mod image;
mod rescue;
mod wait;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::CloudApi;
use crate::config::ServerConfig;
use crate::hcloud::types::{
    ChangeTypeOpts, ImageRef, Server, ServerCreateOpts, ServerCreateResult, ServerId, ServerType,
    SshKey,
};
use crate::pipeline::{Step, StepAction, StepFuture};
use crate::state::BuildContext;
use crate::ui::Ui;
use crate::user_data::resolve_user_data;

pub use error::{CreateServerError, ImageResolveError};
pub use image::{resolve_image_with_selectors, select_image};
pub use rescue::set_rescue_mode;
pub use wait::wait_for_action;

/// Provisioning progress of [`StepCreateServer`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProvisionStage {
    /// The server exists and its creation actions have finished.
    Created,
    /// The server runs on the upgrade server type.
    TypeUpgraded,
    /// The server has rebooted into the rescue system.
    RescueEnabled,
    /// Provisioning finished.
    Ready,
}

/// Creates the build server and deletes it during cleanup.
#[derive(Clone, Debug, Default)]
pub struct StepCreateServer {
    server_id: Option<ServerId>,
    stage: Option<ProvisionStage>,
}

impl StepCreateServer {
    /// Creates a step that has not provisioned anything yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier of the server this step owns, if any.
    #[must_use]
    pub const fn server_id(&self) -> Option<ServerId> {
        self.server_id
    }

    /// Last stage reached by the most recent run.
    #[must_use]
    pub const fn stage(&self) -> Option<ProvisionStage> {
        self.stage
    }

    fn advance(&mut self, stage: ProvisionStage) {
        debug!(?stage, server_id = ?self.server_id, "provisioning stage reached");
        self.stage = Some(stage);
    }

    async fn provision(&mut self, ctx: &mut BuildContext) -> Result<(), CreateServerError> {
        let api = Arc::clone(&ctx.api);
        let ui = Arc::clone(&ctx.ui);
        let config = &ctx.config;

        ui.say("Creating server...");

        let user_data = resolve_user_data(
            config.user_data.as_deref(),
            config.user_data_file.as_deref(),
        )
        .map_err(CreateServerError::UserData)?;
        let ssh_keys = collect_ssh_keys(api.as_ref(), ctx.state.ssh_key_id, &config.ssh_keys).await?;
        let image = choose_image(
            api.as_ref(),
            ui.as_ref(),
            config,
            ctx.state.server_type.as_ref(),
        )
        .await?;
        let upgrade = config.upgrade_target();

        let opts = ServerCreateOpts {
            name: config.server_name.clone(),
            server_type: config.server_type.clone(),
            image,
            ssh_keys: ssh_keys.clone(),
            location: config.location.clone(),
            user_data,
            networks: config.networks.clone(),
            labels: config.server_labels.clone(),
            start_after_create: upgrade.map(|_| false),
        };
        let created = api
            .create_server(&opts)
            .await
            .map_err(CreateServerError::Create)?;

        let server = created.server.clone();
        ctx.state.record_server(server.id, server.public_ipv4());
        self.server_id = Some(server.id);
        info!(server_id = server.id, name = %server.name, ip = ?server.public_ipv4(), "server created");

        await_creation(api.as_ref(), &created).await?;
        self.advance(ProvisionStage::Created);

        if let Some(target) = upgrade {
            upgrade_server_type(api.as_ref(), ui.as_ref(), server.id, target).await?;
            self.advance(ProvisionStage::TypeUpgraded);
        }

        if let Some(rescue) = config.rescue_target() {
            boot_into_rescue(api.as_ref(), ui.as_ref(), &server, rescue, &ssh_keys).await?;
            self.advance(ProvisionStage::RescueEnabled);
        }

        self.advance(ProvisionStage::Ready);
        Ok(())
    }
}

async fn collect_ssh_keys(
    api: &dyn CloudApi,
    build_key: i64,
    configured: &[String],
) -> Result<Vec<SshKey>, CreateServerError> {
    let mut keys = vec![SshKey::with_id(build_key)];
    for name in configured {
        let key = api
            .get_ssh_key(name)
            .await
            .map_err(CreateServerError::FetchSshKey)?
            .ok_or_else(|| CreateServerError::SshKeyNotFound(name.clone()))?;
        keys.push(key);
    }
    Ok(keys)
}

async fn choose_image(
    api: &dyn CloudApi,
    ui: &dyn Ui,
    config: &ServerConfig,
    server_type: Option<&ServerType>,
) -> Result<ImageRef, CreateServerError> {
    if let Some(name) = config.image_name() {
        return Ok(ImageRef::Name(name.to_owned()));
    }

    let server_type =
        server_type.ok_or_else(|| CreateServerError::MissingServerType(config.server_type.clone()))?;
    let image = resolve_image_with_selectors(api, &config.image_filter, server_type).await?;
    ui.message(&format!(
        "Using image {} with ID {}",
        image.description, image.id
    ));
    Ok(ImageRef::Id(image.id))
}

async fn await_creation(
    api: &dyn CloudApi,
    created: &ServerCreateResult,
) -> Result<(), CreateServerError> {
    wait_for_action(api, &created.action)
        .await
        .map_err(CreateServerError::Create)?;
    for action in &created.next_actions {
        wait_for_action(api, action)
            .await
            .map_err(CreateServerError::Create)?;
    }
    Ok(())
}

async fn upgrade_server_type(
    api: &dyn CloudApi,
    ui: &dyn Ui,
    id: ServerId,
    target: &str,
) -> Result<(), CreateServerError> {
    ui.say("Changing server-type...");
    let opts = ChangeTypeOpts {
        server_type: target.to_owned(),
        upgrade_disk: false,
    };
    let action = api
        .change_server_type(id, &opts)
        .await
        .map_err(CreateServerError::ChangeType)?;
    wait_for_action(api, &action)
        .await
        .map_err(CreateServerError::ChangeType)?;

    ui.say("Starting server...");
    let action = api
        .power_on_server(id)
        .await
        .map_err(CreateServerError::PowerOn)?;
    wait_for_action(api, &action)
        .await
        .map_err(CreateServerError::PowerOn)
}

async fn boot_into_rescue(
    api: &dyn CloudApi,
    ui: &dyn Ui,
    server: &Server,
    rescue: &str,
    ssh_keys: &[SshKey],
) -> Result<(), CreateServerError> {
    ui.say("Enabling Rescue Mode...");
    set_rescue_mode(api, server, rescue, ssh_keys)
        .await
        .map_err(CreateServerError::EnableRescue)?;

    ui.say("Reboot server...");
    let action = api
        .reset_server(server.id)
        .await
        .map_err(CreateServerError::Reboot)?;
    wait_for_action(api, &action)
        .await
        .map_err(CreateServerError::Reboot)
}

impl Step for StepCreateServer {
    fn name(&self) -> &'static str {
        "create_server"
    }

    fn run<'a>(&'a mut self, ctx: &'a mut BuildContext) -> StepFuture<'a, StepAction> {
        Box::pin(async move {
            self.stage = None;
            match self.provision(ctx).await {
                Ok(()) => StepAction::Continue,
                Err(err) => {
                    warn!(stage = ?self.stage, error = %err, "provisioning failed");
                    ctx.halt_with(err.to_string());
                    StepAction::Halt
                }
            }
        })
    }

    fn cleanup<'a>(&'a mut self, ctx: &'a BuildContext) -> StepFuture<'a, ()> {
        Box::pin(async move {
            let Some(id) = self.server_id else {
                return;
            };

            ctx.ui.say("Destroying server...");
            match ctx.api.delete_server(id).await {
                Ok(_) => {
                    info!(server_id = id, "server destroyed");
                    self.server_id = None;
                }
                Err(err) => {
                    warn!(server_id = id, error = %err, "server deletion failed");
                    ctx.ui.error(&format!(
                        "Error destroying server. Please destroy it manually: {err}"
                    ));
                }
            }
        })
    }
}
