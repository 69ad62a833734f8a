//! Provider abstraction consumed by the provisioning steps.
//!
//! [`CloudApi`] lists exactly the calls the build steps issue. The
//! [`HcloudClient`](crate::hcloud::HcloudClient) implements it over HTTP and
//! [`ScriptedApi`](crate::test_support::ScriptedApi) implements it for tests.

use std::future::Future;
use std::pin::Pin;

use crate::hcloud::HcloudError;
use crate::hcloud::types::{
    Action, ChangeTypeOpts, EnableRescueOpts, EnableRescueResult, Image, ImageListOpts,
    ServerCreateOpts, ServerCreateResult, ServerId, ServerType, SshKey,
};

/// Future returned by provider operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, HcloudError>> + Send + 'a>>;

/// Cloud provider operations used while provisioning a build server.
pub trait CloudApi: Send + Sync {
    /// Looks up an SSH key by identifier or name; `None` when it does not exist.
    fn get_ssh_key<'a>(&'a self, id_or_name: &'a str) -> ApiFuture<'a, Option<SshKey>>;

    /// Looks up a server type by name; `None` when it does not exist.
    fn get_server_type<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<ServerType>>;

    /// Lists every image matching the filters across all result pages.
    fn list_images<'a>(&'a self, opts: &'a ImageListOpts) -> ApiFuture<'a, Vec<Image>>;

    /// Creates a server.
    fn create_server<'a>(&'a self, opts: &'a ServerCreateOpts)
    -> ApiFuture<'a, ServerCreateResult>;

    /// Deletes a server.
    fn delete_server(&self, id: ServerId) -> ApiFuture<'_, Action>;

    /// Changes the server type of a stopped server.
    fn change_server_type<'a>(
        &'a self,
        id: ServerId,
        opts: &'a ChangeTypeOpts,
    ) -> ApiFuture<'a, Action>;

    /// Powers a server on.
    fn power_on_server(&self, id: ServerId) -> ApiFuture<'_, Action>;

    /// Hard-resets a server.
    fn reset_server(&self, id: ServerId) -> ApiFuture<'_, Action>;

    /// Enables the rescue system for the next boot.
    fn enable_rescue<'a>(
        &'a self,
        id: ServerId,
        opts: &'a EnableRescueOpts,
    ) -> ApiFuture<'a, EnableRescueResult>;

    /// Disables the rescue system.
    fn disable_rescue(&self, id: ServerId) -> ApiFuture<'_, Action>;

    /// Resolves once the action has finished, failing when it ends in error.
    fn watch_action<'a>(&'a self, action: &'a Action) -> ApiFuture<'a, ()>;
}
