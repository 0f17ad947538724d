//! On-disk avatar images used as notification icons.

use std::path::{Path, PathBuf};

use super::write_atomic;
use crate::client::ApiClient;
use crate::timeline::sanitize;

/// Downloads each avatar once into `<cache_dir>/avatars/`.
///
/// Avatars are cosmetic: every failure is logged and yields `None`.
#[derive(Debug, Clone)]
pub struct AvatarCache {
    dir: PathBuf,
    client: ApiClient,
}

impl AvatarCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, client: ApiClient) -> Self {
        Self {
            dir: dir.into(),
            client,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local file for `url`.
    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(sanitize(url))
    }

    /// Return the local copy of `url`, downloading it if needed.
    pub async fn resolve(&self, url: &str) -> Option<PathBuf> {
        let path = self.path_for(url);
        if path.is_file() {
            return Some(path);
        }

        let bytes = match self.client.get_bytes(url, &[], false).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                tracing::warn!(url, "Avatar download returned an empty body");
                return None;
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Avatar download failed");
                return None;
            }
        };

        if let Err(e) = write_atomic(&path, &bytes) {
            tracing::warn!(url, error = %e, "Could not store avatar");
            return None;
        }

        tracing::debug!(url, path = %path.display(), "Cached avatar");
        Some(path)
    }
}
