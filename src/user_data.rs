//! Cloud-init user-data resolution.
//!
//! User-data can be provided inline or via a file path. When a file path is
//! configured its contents replace any inline value.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

/// Errors raised while resolving user-data.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum UserDataError {
    /// Raised when reading the file source fails.
    #[error("failed to read user-data file `{path}`: {message}")]
    FileRead {
        /// Expanded path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
}

/// Resolves the user-data sent with the create call.
///
/// Returns the file contents when `file` is set, the inline payload
/// otherwise, and an empty string when neither is configured. Payloads are
/// passed through unmodified.
///
/// # Errors
///
/// Returns [`UserDataError::FileRead`] when the file cannot be read.
pub fn resolve_user_data(inline: Option<&str>, file: Option<&str>) -> Result<String, UserDataError> {
    let Some(path) = file.filter(|candidate| !candidate.is_empty()) else {
        return Ok(inline.unwrap_or_default().to_owned());
    };

    let expanded = expand_tilde(path);
    read_to_string_ambient(&expanded).map_err(|message| UserDataError::FileRead {
        path: expanded.clone(),
        message,
    })
}

/// Expands a leading `~/` using `HOME`.
pub(crate) fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}

pub(crate) fn read_to_string_ambient(path: &str) -> Result<String, String> {
    let path_buf = Utf8Path::new(path);

    let (dir_path, file_path) = if path_buf.is_absolute() {
        let parent = path_buf
            .parent()
            .ok_or_else(|| format!("path has no parent directory: {path_buf}"))?;
        let file_name = path_buf
            .file_name()
            .ok_or_else(|| format!("path has no file name: {path_buf}"))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), path_buf)
    };

    let dir =
        Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(|err| err.to_string())?;
    dir.read_to_string(file_path).map_err(|err| err.to_string())
}
