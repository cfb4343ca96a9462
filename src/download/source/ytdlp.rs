use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use url::Url;

use super::{Rendition, SourceResolver, VideoSource};
use crate::download::DownloadClient;
use crate::error::DownloadError;
use crate::options::Options;

#[derive(Deserialize, Debug)]
struct VideoInfo {
    title: String,
    #[serde(default)]
    formats: Vec<Format>,
}

#[derive(Deserialize, Debug, Clone)]
struct Format {
    format_id: String,
    ext: String,
    height: Option<u32>,
    vcodec: Option<String>,
    acodec: Option<String>,
    protocol: Option<String>,
    url: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

impl Format {
    fn has_codec(codec: &Option<String>) -> bool {
        matches!(codec.as_deref(), Some(codec) if codec != "none")
    }

    /// Single-file http(s) stream carrying both audio and video.
    fn is_progressive(&self) -> bool {
        let plain_http = matches!(self.protocol.as_deref(), None | Some("http") | Some("https"));
        plain_http && Self::has_codec(&self.vcodec) && Self::has_codec(&self.acodec)
    }

    fn rendition(&self) -> Option<Rendition> {
        let height = self.height?;
        Some(Rendition {
            format_id: self.format_id.clone(),
            resolution: format!("{}p", height),
            container: self.ext.clone(),
            progressive: self.is_progressive(),
        })
    }
}

pub struct YtDlpSource {
    client: DownloadClient,
    title: String,
    renditions: Vec<Rendition>,
    formats: Vec<Format>,
}

impl YtDlpSource {
    fn from_json(json: &[u8], client: DownloadClient) -> Result<Self, serde_json::Error> {
        let info: VideoInfo = serde_json::from_slice(json)?;
        let renditions = info.formats.iter().filter_map(Format::rendition).collect();

        Ok(Self {
            client,
            title: info.title,
            renditions,
            formats: info.formats,
        })
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    fn title(&self) -> &str {
        &self.title
    }

    fn renditions(&self) -> &[Rendition] {
        &self.renditions
    }

    async fn transfer(&self, rendition: &Rendition, destination: &Path) -> Result<u64, DownloadError> {
        let format = self
            .formats
            .iter()
            .find(|format| format.format_id == rendition.format_id)
            .ok_or_else(|| {
                DownloadError::transfer_failed(
                    destination,
                    format!("format {} is no longer listed", rendition.format_id),
                )
            })?;

        let raw_url = format.url.as_deref().ok_or_else(|| {
            DownloadError::transfer_failed(destination, format!("format {} has no url", format.format_id))
        })?;
        let url = Url::parse(raw_url).map_err(|err| DownloadError::transfer_failed(destination, err))?;

        let headers: Vec<(String, String)> = format
            .http_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        tracing::info!("Downloading format {} ({}) to {}", format.format_id, rendition.resolution, destination.display());

        self.client.download_to_file(&url, &headers, destination).await
    }
}

/// Resolves URLs by asking a local `yt-dlp` for the video's JSON description.
pub struct YtDlpResolver {
    ytdlp_bin: PathBuf,
    user_agent: String,
    keep_partial: bool,
}

impl YtDlpResolver {
    pub fn new(options: &Options) -> Self {
        Self {
            ytdlp_bin: options.ytdlp_bin.clone(),
            user_agent: options.user_agent.clone(),
            keep_partial: options.keep_partial,
        }
    }
}

fn last_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| "no error output".to_string())
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn resolve(&self, url: &str) -> Result<Box<dyn VideoSource>, DownloadError> {
        let parsed = Url::parse(url).map_err(|err| DownloadError::source_unavailable(url, err))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(DownloadError::source_unavailable(url, "URL must start with http or https"));
        }

        tracing::debug!("Running {} -J {}", self.ytdlp_bin.display(), url);

        let output = Command::new(&self.ytdlp_bin)
            .arg("-J")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                tracing::error!("Error starting {}: {}", self.ytdlp_bin.display(), err);
                DownloadError::source_unavailable(url, err)
            })?;

        if !output.status.success() {
            let reason = last_line(&output.stderr);
            tracing::error!("yt-dlp failed for {}: {}", url, reason);
            return Err(DownloadError::source_unavailable(url, reason));
        }

        let client = DownloadClient::new(&self.user_agent, self.keep_partial).map_err(|err| DownloadError::source_unavailable(url, err))?;
        let source = YtDlpSource::from_json(&output.stdout, client)
            .map_err(|err| DownloadError::source_unavailable(url, format!("unreadable yt-dlp output: {}", err)))?;

        tracing::info!("Resolved \"{}\" with {} renditions", source.title, source.renditions.len());

        Ok(Box::new(source))
    }
}
