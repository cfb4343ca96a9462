//! The video source collaborator.
//!
//! A [`SourceResolver`] turns a URL into a [`VideoSource`], which knows the title,
//! the available renditions and how to write one of them to disk. The rest of the
//! crate only talks to these traits, so the extraction backend can be swapped.

pub mod ytdlp;

#[cfg(test)]
pub mod fake;

use std::path::Path;

use async_trait::async_trait;

use crate::error::DownloadError;

/// The only container the downloader accepts.
pub const CONTAINER: &str = "mp4";

/// One encoded variant of a video as reported by its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    /// backend specific id used to pick the rendition again at transfer time
    pub format_id: String,
    /// e.g. `720p`
    pub resolution: String,
    pub container: String,
    /// audio and video muxed into one stream
    pub progressive: bool,
}

impl Rendition {
    pub fn is_progressive_mp4(&self) -> bool {
        self.progressive && self.container == CONTAINER
    }
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    fn title(&self) -> &str;

    /// Renditions in the order the source reported them.
    fn renditions(&self) -> &[Rendition];

    /// Writes the bytes of `rendition` to a new file at `destination`, returning the number of
    /// bytes written. An existing file is never overwritten. On failure only a file this call
    /// created may be removed; what the implementation leaves behind follows its partial file policy.
    async fn transfer(&self, rendition: &Rendition, destination: &Path) -> Result<u64, DownloadError>;
}

#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolves `url` into a source. Every call queries the backend again.
    async fn resolve(&self, url: &str) -> Result<Box<dyn VideoSource>, DownloadError>;
}
