//! Rescue-mode switching.

use crate::api::CloudApi;
use crate::hcloud::HcloudError;
use crate::hcloud::types::{EnableRescueOpts, Server, SshKey};

use super::wait::wait_for_action;

/// Moves `server` into the requested rescue system, or out of rescue mode
/// when `rescue` is empty.
///
/// An enabled rescue system is always disabled first. Enabling returns the
/// one-time root password and leaves the reboot to the caller. Disabling
/// without a new rescue type resets the server so it boots normally again.
/// Returns an empty string when nothing had to change.
///
/// # Errors
///
/// Returns the first [`HcloudError`] raised by a call or its action.
pub async fn set_rescue_mode(
    api: &dyn CloudApi,
    server: &Server,
    rescue: &str,
    ssh_keys: &[SshKey],
) -> Result<String, HcloudError> {
    let rescue_changed = server.rescue_enabled;
    if rescue_changed {
        let action = api.disable_rescue(server.id).await?;
        wait_for_action(api, &action).await?;
    }

    if !rescue.is_empty() {
        let opts = EnableRescueOpts {
            rescue_type: rescue.to_owned(),
            ssh_keys: ssh_keys.to_vec(),
        };
        let result = api.enable_rescue(server.id, &opts).await?;
        wait_for_action(api, &result.action).await?;
        return Ok(result.root_password.unwrap_or_default());
    }

    if rescue_changed {
        let action = api.reset_server(server.id).await?;
        wait_for_action(api, &action).await?;
    }
    Ok(String::new())
}
