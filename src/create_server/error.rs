//! Error types for the create-server step.

use thiserror::Error;

use crate::hcloud::HcloudError;
use crate::user_data::UserDataError;

/// Errors raised while resolving an image from a label selector.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ImageResolveError {
    /// No available image matched the selector.
    #[error("no image found for selector {selector:?}")]
    NotFound {
        /// Comma-joined selector used for the lookup.
        selector: String,
    },
    /// Several images matched and the most-recent policy is off.
    #[error("more than one image found for selector {selector:?}")]
    Ambiguous {
        /// Comma-joined selector used for the lookup.
        selector: String,
    },
    /// The image listing failed.
    #[error(transparent)]
    Provider(#[from] HcloudError),
}

/// Errors that halt the create-server step.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CreateServerError {
    /// The user-data file could not be read.
    #[error("Problem reading user data file: {0}")]
    UserData(#[source] UserDataError),
    /// An SSH key lookup failed.
    #[error("Error fetching SSH key: {0}")]
    FetchSshKey(#[source] HcloudError),
    /// An SSH key does not exist.
    #[error("Could not find key: {0}")]
    SshKeyNotFound(String),
    /// Image selection ran before the server type was resolved.
    #[error("server type {0} has not been resolved; cannot filter images by architecture")]
    MissingServerType(String),
    /// Image selection failed.
    #[error(transparent)]
    Image(#[from] ImageResolveError),
    /// The create call or one of its actions failed.
    #[error("Error creating server: {0}")]
    Create(#[source] HcloudError),
    /// The server type change failed.
    #[error("Error changing server-type: {0}")]
    ChangeType(#[source] HcloudError),
    /// Powering the server on failed.
    #[error("Error starting server: {0}")]
    PowerOn(#[source] HcloudError),
    /// Switching the server into rescue mode failed.
    #[error("Error enabling rescue mode: {0}")]
    EnableRescue(#[source] HcloudError),
    /// The reboot into rescue mode failed.
    #[error("Error rebooting server: {0}")]
    Reboot(#[source] HcloudError),
}
