//! Durable state: the watermark, the author metadata cache and avatar files.

mod avatars;
mod profiles;
mod watermark;

pub use avatars::AvatarCache;
pub use profiles::{AuthorMetadata, HttpProfileSource, MetadataCache, ProfileSource};
pub use watermark::{Watermark, WatermarkStore, DEFAULT_LOOKBACK_DAYS};

use std::io::Write;
use std::path::Path;

use crate::error::StoreError;

/// Write `contents` to `path` via a temp file in the same directory and a
/// rename, creating parent directories as needed.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    file.write_all(contents).map_err(write_err)?;
    file.as_file().sync_all().map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
