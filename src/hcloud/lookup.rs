//! Read-only lookups: SSH keys, server types, and paginated image listing.

use hcloud::apis::{images_api, server_types_api, ssh_keys_api};

use super::types::{Image, ImageListOpts, ServerType, SshKey};
use super::{HcloudClient, HcloudError, reencode};

pub(super) const PER_PAGE: u16 = 50;

/// Only images in this state can boot a server.
const AVAILABLE: &str = "available";

/// Builds a single-valued query filter.
pub(super) fn filter_value<T: FromIterator<String>>(value: &str) -> T {
    std::iter::once(value.to_owned()).collect()
}

/// Returns true when a page of `len` results may be followed by another.
pub(super) const fn has_more(len: usize) -> bool {
    len >= PER_PAGE as usize
}

impl HcloudClient {
    /// Fetches a key by numeric identifier, falling back to a name lookup.
    pub(super) async fn find_ssh_key(
        &self,
        id_or_name: &str,
    ) -> Result<Option<SshKey>, HcloudError> {
        if let Ok(id) = id_or_name.parse::<i64>() {
            let result = Self::call(
                "get ssh key",
                ssh_keys_api::get_ssh_key(&self.config, ssh_keys_api::GetSshKeyParams { id }),
            )
            .await;
            return match result {
                Ok(response) => reencode("get ssh key", &response.ssh_key).map(Some),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            };
        }

        let response = Self::call(
            "list ssh keys",
            ssh_keys_api::list_ssh_keys(
                &self.config,
                ssh_keys_api::ListSshKeysParams {
                    name: Some(id_or_name.to_owned()),
                    ..Default::default()
                },
            ),
        )
        .await?;
        response
            .ssh_keys
            .first()
            .map(|key| reencode("list ssh keys", key))
            .transpose()
    }

    pub(super) async fn find_server_type(
        &self,
        name: &str,
    ) -> Result<Option<ServerType>, HcloudError> {
        let response = Self::call(
            "list server types",
            server_types_api::list_server_types(
                &self.config,
                server_types_api::ListServerTypesParams {
                    name: Some(name.to_owned()),
                    ..Default::default()
                },
            ),
        )
        .await?;
        response
            .server_types
            .first()
            .map(|server_type| reencode("list server types", server_type))
            .transpose()
    }

    /// Lists every available image matching `opts`, following pagination.
    pub(super) async fn all_images(&self, opts: &ImageListOpts) -> Result<Vec<Image>, HcloudError> {
        let label_selector = (!opts.label_selector.is_empty()).then(|| opts.label_selector.clone());
        let mut images = Vec::new();
        let mut page: u16 = 1;
        loop {
            let response = Self::call(
                "list images",
                images_api::list_images(
                    &self.config,
                    images_api::ListImagesParams {
                        label_selector: label_selector.clone(),
                        status: Some(filter_value(AVAILABLE)),
                        architecture: Some(opts.architecture.as_str().to_owned()),
                        page: Some(page.into()),
                        per_page: Some(PER_PAGE.into()),
                        ..Default::default()
                    },
                ),
            )
            .await?;
            let fetched = response.images.len();
            for image in &response.images {
                images.push(reencode("list images", image)?);
            }
            if !has_more(fetched) {
                return Ok(images);
            }
            match page.checked_add(1) {
                Some(next) => page = next,
                None => return Ok(images),
            }
        }
    }
}
