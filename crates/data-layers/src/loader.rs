//! Fetch, decode and reproject rasters, caching by URL for one query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use futures::stream::{self, StreamExt, TryStreamExt};
use solar_common::{GeoRaster, LayerError, RequestError};
use tracing::{debug, info, instrument, warn};

use crate::config::ResolverConfig;
use crate::fetch::RasterFetcher;

/// Decode a GeoTIFF payload into a georeferenced raster.
///
/// This is the whole CPU-bound part of loading: TIFF decoding, GeoKey
/// parsing and reprojection of the bounding box to WGS84.
pub fn decode_raster(bytes: &[u8]) -> Result<GeoRaster, LayerError> {
    let decoded = geotiff_parser::decode(bytes)?;
    let bounds = projection::to_geodetic_bounds(&decoded.model_bbox, &decoded.geo_keys)?;
    GeoRaster::new(decoded.width, decoded.height, decoded.bands, bounds)
}

/// Rasters decoded for the current query.
///
/// `epoch` advances on every clear, so a batch that started before the clear
/// can tell that its results belong to a superseded query.
#[derive(Default)]
struct RasterCache {
    epoch: u64,
    rasters: HashMap<String, Arc<GeoRaster>>,
}

/// Loads rasters through a [`RasterFetcher`] and keeps every decoded raster
/// of the current query, so a mask shared by several layers is fetched and
/// decoded once.
pub struct RasterLoader {
    fetcher: Arc<dyn RasterFetcher>,
    config: ResolverConfig,
    // Never held across an await.
    cache: Mutex<RasterCache>,
}

impl RasterLoader {
    pub fn new(fetcher: Arc<dyn RasterFetcher>, config: ResolverConfig) -> Self {
        Self {
            fetcher,
            config,
            cache: Mutex::new(RasterCache::default()),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, RasterCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop every cached raster (a new location was queried).
    ///
    /// Batches still in flight finish, but their rasters are not cached.
    pub fn clear_cache(&self) {
        let mut cache = self.lock();
        if !cache.rasters.is_empty() {
            debug!(entries = cache.rasters.len(), "Clearing raster cache");
        }
        cache.rasters.clear();
        cache.epoch += 1;
    }

    pub fn cached(&self, url: &str) -> Option<Arc<GeoRaster>> {
        self.lock().rasters.get(url).cloned()
    }

    /// Load a single raster.
    pub async fn load(&self, url: &str) -> Result<Arc<GeoRaster>, RequestError> {
        let mut rasters = self.load_all(&[url.to_string()], || {}).await?;
        rasters.pop().ok_or_else(|| RequestError::new(url, LayerError::Format("no raster decoded".to_string())))
    }

    /// Load several rasters, fetching everything first and then decoding.
    ///
    /// Results come back in the order of `urls`. `on_decoding` fires once
    /// every payload has arrived, before decoding starts. The first failure
    /// aborts the whole batch; nothing from a failed batch is cached, and
    /// neither is anything from a batch that outlived a [`clear_cache`].
    ///
    /// [`clear_cache`]: RasterLoader::clear_cache
    #[instrument(skip(self, urls, on_decoding), fields(count = urls.len()))]
    pub async fn load_all<F>(&self, urls: &[String], on_decoding: F) -> Result<Vec<Arc<GeoRaster>>, RequestError>
    where
        F: FnOnce(),
    {
        let (epoch, mut found, missing) = {
            let cache = self.lock();
            let mut found: HashMap<String, Arc<GeoRaster>> = HashMap::new();
            let mut missing: Vec<String> = Vec::new();
            for url in urls {
                if found.contains_key(url) || missing.contains(url) {
                    continue;
                }
                match cache.rasters.get(url) {
                    Some(raster) => {
                        found.insert(url.clone(), raster.clone());
                    }
                    None => missing.push(url.clone()),
                }
            }
            (cache.epoch, found, missing)
        };
        debug!(cached = found.len(), missing = missing.len(), "Loading rasters");

        let payloads: Vec<(String, Bytes)> = stream::iter(missing)
            .map(|url| self.fetch(url))
            .buffer_unordered(self.config.max_concurrent_fetches.max(1))
            .try_collect()
            .await?;

        on_decoding();

        let decoded = futures::future::try_join_all(payloads.into_iter().map(|(url, bytes)| self.decode(url, bytes))).await?;

        {
            let mut cache = self.lock();
            if cache.epoch == epoch {
                for (url, raster) in &decoded {
                    cache.rasters.insert(url.clone(), raster.clone());
                }
            } else {
                debug!(rasters = decoded.len(), "Cache cleared during load, not caching batch");
            }
        }
        found.extend(decoded);

        urls.iter()
            .map(|url| {
                found
                    .get(url)
                    .cloned()
                    .ok_or_else(|| RequestError::new(url.as_str(), LayerError::Format("raster missing from batch".to_string())))
            })
            .collect()
    }

    async fn fetch(&self, url: String) -> Result<(String, Bytes), RequestError> {
        match self.fetcher.fetch(&url).await {
            Ok(bytes) => Ok((url, bytes)),
            Err(e) => {
                warn!(url = %url, error = %e, "Raster fetch failed");
                Err(RequestError::new(url, e))
            }
        }
    }

    async fn decode(&self, url: String, bytes: Bytes) -> Result<(String, Arc<GeoRaster>), RequestError> {
        let size = bytes.len();
        let result = if self.config.decode_on_blocking_pool {
            match tokio::task::spawn_blocking(move || decode_raster(&bytes)).await {
                Ok(result) => result,
                Err(e) => return Err(RequestError::new(url, LayerError::Format(format!("decode task failed: {}", e)))),
            }
        } else {
            decode_raster(&bytes)
        };

        match result {
            Ok(raster) => {
                info!(
                    url = %url,
                    bytes = size,
                    width = raster.width(),
                    height = raster.height(),
                    bands = raster.band_count(),
                    "Decoded raster"
                );
                Ok((url, Arc::new(raster)))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Raster decode failed");
                Err(RequestError::new(url, e))
            }
        }
    }
}

impl std::fmt::Debug for RasterLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.cache.lock().map(|c| c.rasters.len()).unwrap_or(0);
        f.debug_struct("RasterLoader")
            .field("config", &self.config)
            .field("cached", &cached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::InMemoryFetcher;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_fetch_names_the_url() {
        let fetcher = InMemoryFetcher::new().with_failure("https://x/mask", LayerError::Transport("reset".into()));
        let loader = RasterLoader::new(Arc::new(fetcher), ResolverConfig::default());

        let err = loader.load("https://x/mask").await.unwrap_err();
        assert_eq!(err.url, "https://x/mask");
        assert_eq!(err.source.kind_code(), "RequestError");
        assert!(loader.cached("https://x/mask").is_none());
    }

    #[tokio::test]
    async fn test_garbage_payload_is_format_error() {
        let fetcher = InMemoryFetcher::new().with_payload("https://x/dsm", &b"<html>quota exceeded</html>"[..]);
        let loader = RasterLoader::new(Arc::new(fetcher), ResolverConfig::default());

        let err = loader.load("https://x/dsm").await.unwrap_err();
        assert_eq!(err.source.kind_code(), "FormatError");
    }

    fn mask_payload() -> Vec<u8> {
        test_utils::GeoTiffBuilder::new(2, 2)
            .band_u8(vec![0, 1, 1, 0])
            .origin(576000.0, 4145000.0)
            .pixel_size(0.5, 0.5)
            .utm(10, true)
            .build()
    }

    #[tokio::test]
    async fn test_duplicate_urls_share_one_raster() {
        let fetcher = InMemoryFetcher::new().with_payload("https://x/mask", mask_payload());
        let loader = RasterLoader::new(Arc::new(fetcher), ResolverConfig::default());

        let urls = vec!["https://x/mask".to_string(), "https://x/mask".to_string()];
        let rasters = loader.load_all(&urls, || {}).await.unwrap();
        assert_eq!(rasters.len(), 2);
        assert!(Arc::ptr_eq(&rasters[0], &rasters[1]));
    }

    #[tokio::test]
    async fn test_batch_outliving_clear_is_not_cached() {
        let fetcher =
            InMemoryFetcher::new().with_delayed_payload("https://x/mask", mask_payload(), Duration::from_millis(100));
        let loader = RasterLoader::new(Arc::new(fetcher), ResolverConfig::default());

        let (loaded, _) = tokio::join!(loader.load("https://x/mask"), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            loader.clear_cache();
        });

        // The caller still gets its raster, the next query does not.
        assert!(loaded.is_ok());
        assert!(loader.cached("https://x/mask").is_none());
    }
}
