pub mod catalog;
pub mod orchestrator;
pub mod source;

use std::path::Path;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::DownloadError;

pub struct DownloadClient {
    client: reqwest::Client,
    keep_partial: bool,
}

/// Removes a file this process created and failed to finish.
async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(_) => tracing::info!("Removed partial file {}", path.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!("Could not remove partial file {}: {}", path.display(), err),
    }
}

impl DownloadClient {
    pub fn new(user_agent: &str, keep_partial: bool) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, keep_partial })
    }

    #[cfg(test)]
    fn local(keep_partial: bool) -> Self {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Self { client, keep_partial }
    }

    async fn write_body(
        response: &mut reqwest::Response,
        file: &mut tokio::fs::File,
        output: &Path,
    ) -> Result<u64, DownloadError> {
        let mut written = 0u64;
        loop {
            let chunk: Bytes = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) => {
                    tracing::error!("Error reading response: {}", err);
                    return Err(DownloadError::transfer_failed(output, err));
                }
            };

            if let Err(err) = file.write_all(&chunk).await {
                tracing::error!("Error writing to file: {}", err);
                return Err(DownloadError::transfer_failed(output, err));
            }
            written += chunk.len() as u64;
        }

        if let Err(err) = file.flush().await {
            return Err(DownloadError::transfer_failed(output, err));
        }

        Ok(written)
    }

    /// Streams `url` into a new file at `output`.
    ///
    /// `output` must not exist yet. Headers that do not form valid HTTP header names or
    /// values are skipped. When the body fails half way the file is removed again, unless
    /// the client keeps partial files.
    pub async fn download_to_file(
        &self,
        url: &Url,
        headers: &[(String, String)],
        output: &Path,
    ) -> Result<u64, DownloadError> {
        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(name), Ok(value)) => {
                    header_map.insert(name, value);
                }
                _ => tracing::debug!("Skipping unusable header {}", name),
            }
        }

        let request = self.client.get(url.as_str()).headers(header_map);

        let mut response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Error downloading {}: {}", url, err);
                return Err(DownloadError::transfer_failed(output, err));
            }
        };

        if let Err(err) = response.error_for_status_ref() {
            tracing::error!("Error downloading {}: {}", url, err);
            return Err(DownloadError::transfer_failed(output, err));
        }

        let mut file = match tokio::fs::OpenOptions::new().write(true).create_new(true).open(output).await {
            Ok(file) => file,
            Err(err) => {
                tracing::error!("Error creating file {}: {}", output.display(), err);
                return Err(DownloadError::filesystem(output, err));
            }
        };

        match Self::write_body(&mut response, &mut file, output).await {
            Ok(written) => Ok(written),
            Err(err) => {
                drop(file);
                if !self.keep_partial {
                    remove_partial(output).await;
                }
                Err(err)
            }
        }
    }
}
