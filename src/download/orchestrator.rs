use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::download::catalog::{list_resolutions, progressive_renditions};
use crate::download::source::{SourceResolver, CONTAINER};
use crate::error::DownloadError;
use crate::file::{resolve_unique_path, sanitize_filename};
use crate::options::Options;

pub const COMPLETED_STATUS: &str = "Download completed!";

/// What the user asked for at the moment they pressed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub resolution: String,
    pub destination: PathBuf,
}

/// Status line for a finished download.
pub fn status_message(result: &Result<PathBuf, DownloadError>) -> String {
    match result {
        Ok(_) => COMPLETED_STATUS.to_string(),
        Err(err) => err.user_message(),
    }
}

async fn check_destination(directory: &Path) -> Result<(), DownloadError> {
    let metadata = tokio::fs::metadata(directory)
        .await
        .map_err(|err| DownloadError::filesystem(directory, err))?;

    if !metadata.is_dir() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "not a directory");
        return Err(DownloadError::filesystem(directory, err));
    }

    if metadata.permissions().readonly() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "directory is read-only");
        return Err(DownloadError::filesystem(directory, err));
    }

    Ok(())
}

/// Runs one download from start to end. No step is retried.
pub async fn download(resolver: &dyn SourceResolver, request: &DownloadRequest) -> Result<PathBuf, DownloadError> {
    tracing::info!("Downloading {} at {} into {}", request.url, request.resolution, request.destination.display());

    // the catalog is queried again here, availability may have changed since the listing
    let source = resolver.resolve(&request.url).await?;

    let available = list_resolutions(source.as_ref());
    if !available.contains(&request.resolution) {
        tracing::error!("Resolution {} not in {:?}", request.resolution, available);
        return Err(DownloadError::ResolutionUnavailable {
            requested: request.resolution.clone(),
            available,
        });
    }

    let rendition = progressive_renditions(source.as_ref())
        .find(|rendition| rendition.resolution == request.resolution)
        .cloned()
        .ok_or_else(|| DownloadError::ResolutionUnavailable {
            requested: request.resolution.clone(),
            available: available.clone(),
        })?;

    check_destination(&request.destination).await?;

    let base_name = sanitize_filename(source.title());
    let path = resolve_unique_path(&request.destination, &base_name, CONTAINER);

    match source.transfer(&rendition, &path).await {
        Ok(bytes) => {
            tracing::info!("Finished downloading {} ({} bytes)", path.display(), bytes);
            Ok(path)
        }
        Err(err) => {
            tracing::error!("Error downloading {}: {}", request.url, err);
            Err(err)
        }
    }
}

/// Runs downloads on a background task, one at a time.
#[derive(Clone)]
pub struct Downloader {
    resolver: Arc<dyn SourceResolver>,
    options: Arc<Options>,
    busy: Arc<AtomicBool>,
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Downloader {
    pub fn new(resolver: Arc<dyn SourceResolver>, options: Options) -> Self {
        Self {
            resolver,
            options: Arc::new(options),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn resolver(&self) -> &dyn SourceResolver {
        self.resolver.as_ref()
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Spawns the download. Fails with `AlreadyInProgress` while another one is running.
    pub fn start(&self, request: DownloadRequest) -> Result<JoinHandle<Result<PathBuf, DownloadError>>, DownloadError> {
        if self.busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            tracing::warn!("Ignoring download of {}, another download is running", request.url);
            return Err(DownloadError::AlreadyInProgress);
        }

        let guard = BusyGuard(Arc::clone(&self.busy));
        let resolver = Arc::clone(&self.resolver);

        Ok(tokio::spawn(async move {
            let _guard = guard;
            download(resolver.as_ref(), &request).await
        }))
    }
}
