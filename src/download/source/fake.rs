use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::{Rendition, SourceResolver, VideoSource, CONTAINER};
use crate::error::DownloadError;

pub fn progressive(format_id: &str, resolution: &str) -> Rendition {
    Rendition {
        format_id: format_id.to_string(),
        resolution: resolution.to_string(),
        container: CONTAINER.to_string(),
        progressive: true,
    }
}

pub fn adaptive(format_id: &str, resolution: &str) -> Rendition {
    Rendition {
        progressive: false,
        ..progressive(format_id, resolution)
    }
}

pub fn in_container(format_id: &str, resolution: &str, container: &str) -> Rendition {
    Rendition {
        container: container.to_string(),
        ..progressive(format_id, resolution)
    }
}

#[derive(Clone)]
pub struct FakeVideo {
    pub title: String,
    pub renditions: Vec<Rendition>,
    pub payload: Vec<u8>,
    /// fail before writing anything
    pub fail_transfer: bool,
    /// transfer waits for a notification before writing
    pub gate: Option<Arc<Notify>>,
    pub transferred: Arc<Mutex<Vec<String>>>,
}

impl FakeVideo {
    pub fn new(title: &str, renditions: Vec<Rendition>) -> Self {
        Self {
            title: title.to_string(),
            renditions,
            payload: b"fake video bytes".to_vec(),
            fail_transfer: false,
            gate: None,
            transferred: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl VideoSource for FakeVideo {
    fn title(&self) -> &str {
        &self.title
    }

    fn renditions(&self) -> &[Rendition] {
        &self.renditions
    }

    async fn transfer(&self, rendition: &Rendition, destination: &Path) -> Result<u64, DownloadError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.transferred.lock().unwrap().push(rendition.format_id.clone());

        if self.fail_transfer {
            let reset = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
            return Err(DownloadError::transfer_failed(destination, reset));
        }

        tokio::fs::write(destination, &self.payload)
            .await
            .map_err(|err| DownloadError::filesystem(destination, err))?;

        Ok(self.payload.len() as u64)
    }
}

/// In-memory resolver. Unknown URLs resolve to `SourceUnavailable`.
#[derive(Default)]
pub struct FakeResolver {
    videos: Mutex<HashMap<String, FakeVideo>>,
    resolves: AtomicUsize,
}

impl FakeResolver {
    pub fn with_video(url: &str, video: FakeVideo) -> Self {
        let resolver = Self::default();
        resolver.set(url, video);
        resolver
    }

    pub fn set(&self, url: &str, video: FakeVideo) {
        self.videos.lock().unwrap().insert(url.to_string(), video);
    }

    pub fn resolve_count(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceResolver for FakeResolver {
    async fn resolve(&self, url: &str) -> Result<Box<dyn VideoSource>, DownloadError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);

        let video = self.videos.lock().unwrap().get(url).cloned();
        match video {
            Some(video) => Ok(Box::new(video)),
            None => Err(DownloadError::source_unavailable(url, "video unavailable")),
        }
    }
}
