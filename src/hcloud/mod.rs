//! Hetzner Cloud client built on the `hcloud` SDK.
//!
//! Requests go through the SDK's generated API functions. Responses are
//! re-encoded into the trimmed views in [`types`], and SDK failures are
//! mapped onto [`HcloudError`].

mod actions;
mod error;
mod lookup;
mod servers;
pub mod types;

use std::time::Duration;

use hcloud::apis::configuration::Configuration;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::{ApiFuture, CloudApi};
use crate::config::HcloudConfig;
use types::{
    Action, ChangeTypeOpts, EnableRescueOpts, EnableRescueResult, Image, ImageListOpts,
    ServerCreateOpts, ServerCreateResult, ServerId, ServerType, SshKey,
};

pub use error::HcloudError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("hcloud-builder/", env!("CARGO_PKG_VERSION"));

/// Client for the Hetzner Cloud API.
#[derive(Clone)]
pub struct HcloudClient {
    config: Configuration,
    poll_interval: Duration,
    action_timeout: Duration,
}

impl HcloudClient {
    /// Constructs a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HcloudError::Config`] when the configuration fails
    /// validation.
    pub fn new(config: &HcloudConfig) -> Result<Self, HcloudError> {
        config.validate()?;
        let mut sdk = Configuration::new();
        sdk.base_path_mapping.insert(
            "https://api.hetzner.cloud/v1".to_owned(),
            config.endpoint.trim_end_matches('/').to_owned(),
        );
        sdk.bearer_access_token = Some(config.token.clone());
        sdk.user_agent = Some(USER_AGENT.to_owned());
        Ok(Self {
            config: sdk,
            poll_interval: config.poll_interval(),
            action_timeout: config.action_timeout(),
        })
    }

    /// Awaits an SDK call, bounding it by the HTTP timeout.
    async fn call<T, E, F>(operation: &'static str, request: F) -> Result<T, HcloudError>
    where
        E: std::fmt::Debug,
        F: Future<Output = Result<T, hcloud::apis::Error<E>>>,
    {
        match tokio::time::timeout(HTTP_TIMEOUT, request).await {
            Ok(result) => result.map_err(|err| HcloudError::from_api(operation, err)),
            Err(_) => Err(HcloudError::Transport {
                operation,
                message: format!("no response within {}s", HTTP_TIMEOUT.as_secs()),
            }),
        }
    }
}

/// Converts an SDK model into one of the trimmed views.
pub(crate) fn reencode<S, T>(context: &'static str, model: &S) -> Result<T, HcloudError>
where
    S: Serialize,
    T: DeserializeOwned,
{
    serde_json::to_value(model)
        .and_then(serde_json::from_value)
        .map_err(|err| HcloudError::Decode {
            context,
            message: err.to_string(),
        })
}

/// Builds an SDK request model from a JSON body.
pub(crate) fn request_body<T: DeserializeOwned>(
    context: &'static str,
    body: serde_json::Value,
) -> Result<T, HcloudError> {
    serde_json::from_value(body).map_err(|err| HcloudError::Decode {
        context,
        message: err.to_string(),
    })
}

impl CloudApi for HcloudClient {
    fn get_ssh_key<'a>(&'a self, id_or_name: &'a str) -> ApiFuture<'a, Option<SshKey>> {
        Box::pin(self.find_ssh_key(id_or_name))
    }

    fn get_server_type<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<ServerType>> {
        Box::pin(self.find_server_type(name))
    }

    fn list_images<'a>(&'a self, opts: &'a ImageListOpts) -> ApiFuture<'a, Vec<Image>> {
        Box::pin(self.all_images(opts))
    }

    fn create_server<'a>(
        &'a self,
        opts: &'a ServerCreateOpts,
    ) -> ApiFuture<'a, ServerCreateResult> {
        Box::pin(self.post_server(opts))
    }

    fn delete_server(&self, id: ServerId) -> ApiFuture<'_, Action> {
        Box::pin(self.remove_server(id))
    }

    fn change_server_type<'a>(
        &'a self,
        id: ServerId,
        opts: &'a ChangeTypeOpts,
    ) -> ApiFuture<'a, Action> {
        Box::pin(self.post_change_type(id, opts))
    }

    fn power_on_server(&self, id: ServerId) -> ApiFuture<'_, Action> {
        Box::pin(self.power_on(id))
    }

    fn reset_server(&self, id: ServerId) -> ApiFuture<'_, Action> {
        Box::pin(self.reset(id))
    }

    fn enable_rescue<'a>(
        &'a self,
        id: ServerId,
        opts: &'a EnableRescueOpts,
    ) -> ApiFuture<'a, EnableRescueResult> {
        Box::pin(self.post_enable_rescue(id, opts))
    }

    fn disable_rescue(&self, id: ServerId) -> ApiFuture<'_, Action> {
        Box::pin(self.post_disable_rescue(id))
    }

    fn watch_action<'a>(&'a self, action: &'a Action) -> ApiFuture<'a, ()> {
        Box::pin(self.wait_for_action(action))
    }
}
