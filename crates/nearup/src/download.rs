//! Locating, and if needed downloading, the node binary.

use std::future::Future;
use std::path::Path;

use tracing::info;

use crate::binary::{NODE_BINARY_NAME, NodeBinary};
use crate::error::{LocalnetError, Result};
use crate::paths::NearupPaths;

/// Fetches the node binary for this platform.
pub trait Downloader {
    /// Write an executable binary to `dest`.
    fn download(&self, dest: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// Downloads the binary from a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    pub url: String,
}

impl Downloader for HttpDownloader {
    async fn download(&self, dest: &Path) -> Result<()> {
        info!("Downloading {} to {}", self.url, dest.display());
        let response = reqwest::get(&self.url)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| LocalnetError::Download(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LocalnetError::Download(e.to_string()))?;

        // Written next to the destination so the rename cannot cross filesystems.
        let partial = dest.with_extension("partial");
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(LocalnetError::filesystem(&partial))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            tokio::fs::set_permissions(&partial, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(LocalnetError::filesystem(&partial))?;
        }
        tokio::fs::rename(&partial, dest)
            .await
            .map_err(LocalnetError::filesystem(dest))?;
        info!("Downloaded {} bytes", bytes.len());
        Ok(())
    }
}

/// Resolve the binary to launch.
///
/// An explicit path wins; a directory means the `neard` inside it. Otherwise
/// the binary comes from the cache directory, downloaded first when a
/// downloader is given.
pub async fn resolve_binary<D: Downloader>(
    explicit: Option<&Path>,
    paths: &NearupPaths,
    downloader: Option<&D>,
) -> Result<NodeBinary> {
    if let Some(path) = explicit {
        let path = if path.is_dir() {
            path.join(NODE_BINARY_NAME)
        } else {
            path.to_path_buf()
        };
        return Ok(NodeBinary::new(path));
    }

    let cache_dir = paths.binary_cache_dir();
    tokio::fs::create_dir_all(&cache_dir)
        .await
        .map_err(LocalnetError::filesystem(&cache_dir))?;

    let cached = paths.cached_binary();
    match downloader {
        Some(downloader) => downloader.download(&cached).await?,
        None if cached.is_file() => info!("Using cached binary {}", cached.display()),
        None => {
            return Err(LocalnetError::Download(format!(
                "no binary cached at {}; pass --binary-path or --download-url",
                cached.display()
            )));
        }
    }
    Ok(NodeBinary::new(cached))
}
