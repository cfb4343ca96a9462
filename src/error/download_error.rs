use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can stop a download, from resolving the URL to the last byte written.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("video source unavailable for {url}: {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("resolution {requested:?} is not available (available: {})", .available.join(", "))]
    ResolutionUnavailable {
        requested: String,
        available: Vec<String>,
    },

    #[error("transfer to {} failed: {source}", .path.display())]
    TransferFailed {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("destination {} is not writable: {source}", .path.display())]
    FilesystemError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a download is already in progress")]
    AlreadyInProgress,
}

impl DownloadError {
    pub fn source_unavailable(url: impl Into<String>, reason: impl ToString) -> Self {
        DownloadError::SourceUnavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn transfer_failed(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        DownloadError::TransferFailed {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::FilesystemError {
            path: path.into(),
            source,
        }
    }

    /// Returns the single status line shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            DownloadError::ResolutionUnavailable { .. } => {
                "Error: Selected resolution not available.".to_string()
            }
            DownloadError::AlreadyInProgress => {
                "A download is already running, wait for it to finish.".to_string()
            }
            other => format!("An error occurred: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_unavailable_has_fixed_status() {
        let err = DownloadError::ResolutionUnavailable {
            requested: "Select Quality".to_string(),
            available: vec!["360p".to_string(), "720p".to_string()],
        };

        assert_eq!(err.user_message(), "Error: Selected resolution not available.");
        assert!(err.to_string().contains("360p, 720p"));
    }

    #[test]
    fn other_errors_are_prefixed() {
        let err = DownloadError::source_unavailable("https://example.com/v", "video removed");

        assert_eq!(
            err.user_message(),
            "An error occurred: video source unavailable for https://example.com/v: video removed"
        );
    }

    #[test]
    fn transfer_failed_keeps_its_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "connection reset");
        let err = DownloadError::transfer_failed("/tmp/a.mp4", io);

        let cause = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("connection reset"));
    }
}
