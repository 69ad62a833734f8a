//! Server lifecycle calls: create, delete, and power/rescue actions.

use hcloud::apis::servers_api;
use serde_json::json;

use super::types::{
    Action, ChangeTypeOpts, EnableRescueOpts, EnableRescueResult, ServerCreateOpts,
    ServerCreateResult, ServerId,
};
use super::{HcloudClient, HcloudError, reencode, request_body};

/// Renders the create request body; empty optional fields are omitted.
pub(super) fn create_server_body(opts: &ServerCreateOpts) -> serde_json::Value {
    let mut body = json!({
        "name": opts.name,
        "server_type": opts.server_type,
        "image": opts.image.to_api_value(),
        "ssh_keys": opts.ssh_keys.iter().map(|key| key.id.to_string()).collect::<Vec<_>>(),
        "location": opts.location,
    });
    if !opts.user_data.is_empty() {
        body["user_data"] = json!(opts.user_data);
    }
    if !opts.networks.is_empty() {
        body["networks"] = json!(opts.networks);
    }
    if !opts.labels.is_empty() {
        body["labels"] = json!(opts.labels);
    }
    if let Some(start) = opts.start_after_create {
        body["start_after_create"] = json!(start);
    }
    body
}

impl HcloudClient {
    pub(super) async fn post_server(
        &self,
        opts: &ServerCreateOpts,
    ) -> Result<ServerCreateResult, HcloudError> {
        let create_server_request = request_body("create server", create_server_body(opts))?;
        let response = Self::call(
            "create server",
            servers_api::create_server(
                &self.config,
                servers_api::CreateServerParams {
                    create_server_request,
                },
            ),
        )
        .await?;
        reencode("create server", &response)
    }

    pub(super) async fn remove_server(&self, id: ServerId) -> Result<Action, HcloudError> {
        let response = Self::call(
            "delete server",
            servers_api::delete_server(&self.config, servers_api::DeleteServerParams { id }),
        )
        .await?;
        reencode("delete server", &response.action)
    }

    pub(super) async fn post_change_type(
        &self,
        id: ServerId,
        opts: &ChangeTypeOpts,
    ) -> Result<Action, HcloudError> {
        let request: hcloud::models::ChangeTypeOfServerRequest = request_body(
            "change server type",
            json!({
                "server_type": opts.server_type,
                "upgrade_disk": opts.upgrade_disk,
            }),
        )?;
        let response = Self::call(
            "change server type",
            servers_api::change_type_of_server(
                &self.config,
                servers_api::ChangeTypeOfServerParams {
                    id,
                    change_type_of_server_request: request.into(),
                },
            ),
        )
        .await?;
        reencode("change server type", &response.action)
    }

    pub(super) async fn power_on(&self, id: ServerId) -> Result<Action, HcloudError> {
        let response = Self::call(
            "power on server",
            servers_api::power_on_server(&self.config, servers_api::PowerOnServerParams { id }),
        )
        .await?;
        reencode("power on server", &response.action)
    }

    pub(super) async fn reset(&self, id: ServerId) -> Result<Action, HcloudError> {
        let response = Self::call(
            "reset server",
            servers_api::reset_server(&self.config, servers_api::ResetServerParams { id }),
        )
        .await?;
        reencode("reset server", &response.action)
    }

    pub(super) async fn post_enable_rescue(
        &self,
        id: ServerId,
        opts: &EnableRescueOpts,
    ) -> Result<EnableRescueResult, HcloudError> {
        let request: hcloud::models::EnableRescueModeForServerRequest = request_body(
            "enable rescue",
            json!({
                "type": opts.rescue_type,
                "ssh_keys": opts.ssh_keys.iter().map(|key| key.id).collect::<Vec<_>>(),
            }),
        )?;
        let response = Self::call(
            "enable rescue",
            servers_api::enable_rescue_mode_for_server(
                &self.config,
                servers_api::EnableRescueModeForServerParams {
                    id,
                    enable_rescue_mode_for_server_request: request.into(),
                },
            ),
        )
        .await?;
        reencode("enable rescue", &response)
    }

    pub(super) async fn post_disable_rescue(&self, id: ServerId) -> Result<Action, HcloudError> {
        let response = Self::call(
            "disable rescue",
            servers_api::disable_rescue_mode_for_server(
                &self.config,
                servers_api::DisableRescueModeForServerParams { id },
            ),
        )
        .await?;
        reencode("disable rescue", &response.action)
    }
}
