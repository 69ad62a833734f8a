//! Image resolution from label selectors.

use tracing::debug;

use crate::api::CloudApi;
use crate::config::ImageFilter;
use crate::hcloud::types::{Image, ImageListOpts, ServerType};

use super::error::ImageResolveError;

/// Lists available images for the server type's architecture that match the
/// filter's selector and picks exactly one.
///
/// # Errors
///
/// Returns [`ImageResolveError::Provider`] when listing fails and the
/// selection errors of [`select_image`].
pub async fn resolve_image_with_selectors(
    api: &dyn CloudApi,
    filter: &ImageFilter,
    server_type: &ServerType,
) -> Result<Image, ImageResolveError> {
    let selector = filter.selector();
    let opts = ImageListOpts {
        label_selector: selector.clone(),
        architecture: server_type.architecture,
    };

    let images = api.list_images(&opts).await?;
    debug!(selector = %selector, candidates = images.len(), "listed images");
    select_image(images, &selector, filter.most_recent)
}

/// Picks the only candidate, or the newest one when `most_recent` is set.
///
/// Candidates sharing the newest creation time are not ordered further.
///
/// # Errors
///
/// Returns [`ImageResolveError::NotFound`] for an empty candidate list and
/// [`ImageResolveError::Ambiguous`] for several candidates without
/// `most_recent`.
pub fn select_image(
    mut candidates: Vec<Image>,
    selector: &str,
    most_recent: bool,
) -> Result<Image, ImageResolveError> {
    if candidates.len() > 1 {
        if !most_recent {
            return Err(ImageResolveError::Ambiguous {
                selector: selector.to_owned(),
            });
        }
        candidates.sort_unstable_by(|lhs, rhs| rhs.created.cmp(&lhs.created));
    }

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ImageResolveError::NotFound {
            selector: selector.to_owned(),
        })
}
