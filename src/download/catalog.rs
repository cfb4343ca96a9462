use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::download::source::{Rendition, SourceResolver, VideoSource};
use crate::error::DownloadError;

/// Renditions the downloader can use, in source order.
pub fn progressive_renditions(source: &dyn VideoSource) -> impl Iterator<Item = &Rendition> {
    source.renditions().iter().filter(|rendition| rendition.is_progressive_mp4())
}

/// Leading number of a label such as `720p`.
fn numeric_value(label: &str) -> Option<u64> {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Orders labels by their numeric value. Labels without one sort last, alphabetically.
pub fn compare_resolutions(a: &str, b: &str) -> Ordering {
    match (numeric_value(a), numeric_value(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Distinct resolution labels of the progressive mp4 renditions, ascending.
pub fn list_resolutions(source: &dyn VideoSource) -> Vec<String> {
    let labels: BTreeSet<&str> = progressive_renditions(source)
        .map(|rendition| rendition.resolution.as_str())
        .collect();

    let mut labels: Vec<String> = labels.into_iter().map(str::to_string).collect();
    labels.sort_by(|a, b| compare_resolutions(a, b));
    labels
}

/// Resolves `url` and lists its resolutions. Resolution failures are returned, never an empty list.
pub async fn fetch_resolutions(resolver: &dyn SourceResolver, url: &str) -> Result<Vec<String>, DownloadError> {
    let source = resolver.resolve(url).await?;
    let resolutions = list_resolutions(source.as_ref());

    tracing::info!("{} offers {:?}", url, resolutions);

    Ok(resolutions)
}
