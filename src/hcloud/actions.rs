//! Action progress watching.
//!
//! Every mutating call returns an [`Action`]. The watcher polls the action
//! until it settles, honouring the configured poll interval and timeout.

use std::time::Instant;

use hcloud::apis::actions_api;
use tokio::time::sleep;
use tracing::debug;

use super::types::{Action, ActionStatus};
use super::{HcloudClient, HcloudError, reencode};

/// Returns the final outcome of a settled action, or `None` while it runs.
pub(super) fn settled(action: &Action) -> Option<Result<(), HcloudError>> {
    match action.status {
        ActionStatus::Running => None,
        ActionStatus::Success => Some(Ok(())),
        ActionStatus::Error => {
            let (code, message) = action.error.as_ref().map_or_else(
                || (String::from("unknown"), String::from("action failed")),
                |error| (error.code.clone(), error.message.clone()),
            );
            Some(Err(HcloudError::ActionFailed {
                id: action.id,
                command: action.command.clone(),
                code,
                message,
            }))
        }
    }
}

impl HcloudClient {
    async fn get_action(&self, id: i64) -> Result<Action, HcloudError> {
        let response = Self::call(
            "get action",
            actions_api::get_action(&self.config, actions_api::GetActionParams { id }),
        )
        .await?;
        reencode("get action", &response.action)
    }

    pub(super) async fn wait_for_action(&self, action: &Action) -> Result<(), HcloudError> {
        // A timeout too large to represent never expires.
        let deadline = Instant::now().checked_add(self.action_timeout);
        let mut current = action.clone();

        loop {
            if let Some(outcome) = settled(&current) {
                return outcome;
            }
            if deadline.is_some_and(|limit| Instant::now() > limit) {
                return Err(HcloudError::Timeout {
                    id: current.id,
                    command: current.command,
                });
            }
            debug!(
                action_id = current.id,
                command = %current.command,
                progress = current.progress,
                "action in progress"
            );
            sleep(self.poll_interval).await;
            current = self.get_action(current.id).await?;
        }
    }
}
