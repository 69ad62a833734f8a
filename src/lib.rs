//! Core library for the hcloud-builder provisioning tool.
//!
//! The crate provisions short-lived Hetzner Cloud servers for image builds.
//! A build runs a sequence of steps over a shared [`BuildContext`]: the
//! server type is resolved first, then [`StepCreateServer`] creates the
//! server, optionally resizes it or boots it into a rescue system, and
//! deletes it again during cleanup.

pub mod api;
pub mod config;
pub mod create_server;
pub mod hcloud;
pub mod pipeline;
pub mod server_type;
pub mod state;
pub mod test_support;
pub mod ui;
pub mod user_data;

pub use api::{ApiFuture, CloudApi};
pub use config::{ConfigError, HcloudConfig, ImageFilter, ServerConfig};
pub use create_server::{
    CreateServerError, ImageResolveError, ProvisionStage, StepCreateServer,
    resolve_image_with_selectors, select_image, set_rescue_mode, wait_for_action,
};
pub use self::hcloud::{HcloudClient, HcloudError};
pub use pipeline::{CleanupPolicy, PipelineError, Step, StepAction, StepFuture, run_steps};
pub use server_type::StepFetchServerType;
pub use state::{BuildContext, BuildState};
pub use ui::{ConsoleUi, Ui};
pub use user_data::{UserDataError, resolve_user_data};
