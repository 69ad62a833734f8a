//! Blocking wait on provider actions.

use tracing::debug;

use crate::api::CloudApi;
use crate::hcloud::HcloudError;
use crate::hcloud::types::Action;

/// Waits until `action` completes; an action that ends in error fails the wait.
///
/// # Errors
///
/// Returns the [`HcloudError`] delivered by the provider's progress watch.
pub async fn wait_for_action(api: &dyn CloudApi, action: &Action) -> Result<(), HcloudError> {
    debug!(action_id = action.id, command = %action.command, "waiting for action");
    api.watch_action(action).await
}
