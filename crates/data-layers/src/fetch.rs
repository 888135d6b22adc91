//! Raster payload fetchers.
//!
//! The resolver never builds or signs requests itself; whatever embeds it
//! supplies a [`RasterFetcher`] that turns a data-layer URL into bytes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use solar_common::LayerError;
use tracing::{debug, instrument};

/// Source of raw GeoTIFF payloads.
#[async_trait]
pub trait RasterFetcher: Send + Sync {
    /// Download the payload behind `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes, LayerError>;
}

#[derive(Debug, Clone)]
enum Entry {
    Payload(Bytes),
    Failure(LayerError),
}

/// Fetcher backed by a URL-keyed map, for tests and embedding.
///
/// Entries can carry an artificial delay to exercise out-of-order
/// completion.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFetcher {
    entries: HashMap<String, (Entry, Option<Duration>)>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, url: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        self.entries.insert(url.into(), (Entry::Payload(bytes.into()), None));
        self
    }

    pub fn with_delayed_payload(mut self, url: impl Into<String>, bytes: impl Into<Bytes>, delay: Duration) -> Self {
        self.entries.insert(url.into(), (Entry::Payload(bytes.into()), Some(delay)));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, error: LayerError) -> Self {
        self.entries.insert(url.into(), (Entry::Failure(error), None));
        self
    }
}

#[async_trait]
impl RasterFetcher for InMemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, LayerError> {
        let (entry, delay) = self.entries.get(url).ok_or_else(|| LayerError::Upstream {
            status: 404,
            body: format!("no payload registered for {}", url),
        })?;
        if let Some(delay) = delay {
            tokio::time::sleep(*delay).await;
        }
        match entry {
            Entry::Payload(bytes) => Ok(bytes.clone()),
            Entry::Failure(err) => Err(err.clone()),
        }
    }
}

/// Fetcher that serves `<root>/<id>.tif` for each URL.
///
/// `<id>` is the URL's `id` query parameter when present (the Solar API's
/// `geoTiff:get?id=...` form), otherwise its last path segment without
/// extension.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path a URL maps to, or `None` if no id can be derived.
    pub fn path_for(&self, url: &str) -> Option<PathBuf> {
        raster_id(url).map(|id| self.root.join(format!("{}.tif", id)))
    }
}

#[async_trait]
impl RasterFetcher for FsFetcher {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn fetch(&self, url: &str) -> Result<Bytes, LayerError> {
        let path = self
            .path_for(url)
            .ok_or_else(|| LayerError::invalid_parameter("url", format!("cannot derive a raster id from {:?}", url)))?;
        debug!(path = %path.display(), "Reading raster from disk");
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LayerError::Upstream {
                status: 404,
                body: format!("{} not found", path.display()),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Identifier of the raster behind a data-layer URL.
fn raster_id(url: &str) -> Option<&str> {
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    };

    if let Some(id) = query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .find_map(|pair| pair.strip_prefix("id="))
        .filter(|id| !id.is_empty() && !id.contains(['/', '\\']) && !id.starts_with('.'))
    {
        return Some(id);
    }

    let segment = path.trim_end_matches('/').rsplit('/').next()?;
    let stem = segment.split('.').next().unwrap_or(segment);
    // `geoTiff:get` without an id names the endpoint, not a raster.
    if stem.is_empty() || stem.contains(':') {
        return None;
    }
    Some(stem)
}
