//! Resolver configuration.

use std::env;

use tracing::warn;

const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 4;

/// Tuning knobs for raster loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound on raster fetches in flight for one layer (the twelve
    /// hourly-shade rasters are the only fan-out wider than two).
    pub max_concurrent_fetches: usize,
    /// Decode and reproject on tokio's blocking pool instead of inline.
    pub decode_on_blocking_pool: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            decode_on_blocking_pool: true,
        }
    }
}

impl ResolverConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SOLAR_MAX_CONCURRENT_FETCHES`: positive integer, default 4
    /// - `SOLAR_DECODE_ON_BLOCKING_POOL`: `true`/`false`, default `true`
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_concurrent_fetches = match env::var("SOLAR_MAX_CONCURRENT_FETCHES") {
            Ok(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!(value = %raw, "Invalid SOLAR_MAX_CONCURRENT_FETCHES, using default");
                    defaults.max_concurrent_fetches
                }
            },
            Err(_) => defaults.max_concurrent_fetches,
        };

        let decode_on_blocking_pool = env::var("SOLAR_DECODE_ON_BLOCKING_POOL")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(defaults.decode_on_blocking_pool);

        Self {
            max_concurrent_fetches,
            decode_on_blocking_pool,
        }
    }

    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n.max(1);
        self
    }
}
