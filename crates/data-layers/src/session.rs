//! Per-query resolution state with stale-result suppression.
//!
//! Every new query or layer selection bumps a generation counter. A
//! [`ResolveTicket`] remembers the generation it was issued under, and its
//! outcome is applied only if that generation is still current, so a slow
//! resolution for a layer the user already switched away from can never
//! overwrite the layer now on screen.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use solar_common::{DataLayersResponse, ErrorPayload, GeoRaster, LayerError, LayerId, RequestError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::layer::Layer;
use crate::loader::RasterLoader;
use crate::resolve::{resolve_with_progress, ResolvePhase};

/// Monotonically increasing identifier of the live query.
pub type QueryGeneration = u64;

/// Where the current selection stands.
#[derive(Debug, Clone)]
pub enum ResolveState {
    Idle,
    Fetching { kind: LayerId, urls: Vec<String> },
    Decoding { kind: LayerId, rasters: usize },
    Ready(Arc<Layer>),
    Failed(RequestError),
}

impl ResolveState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ResolveState::Fetching { .. } | ResolveState::Decoding { .. })
    }
}

/// Result of a finished [`ResolveTicket`], to hand back to [`LayerSession::apply`].
#[derive(Debug)]
pub struct ResolveOutcome {
    pub generation: QueryGeneration,
    pub kind: LayerId,
    pub result: Result<Layer, RequestError>,
}

/// One pending resolution.
///
/// Owns everything it needs, so it can be moved into `tokio::spawn`.
pub struct ResolveTicket {
    generation: QueryGeneration,
    kind: LayerId,
    response: Arc<DataLayersResponse>,
    loader: Arc<RasterLoader>,
    live: Arc<AtomicU64>,
    state: Arc<watch::Sender<ResolveState>>,
}

impl ResolveTicket {
    pub fn generation(&self) -> QueryGeneration {
        self.generation
    }

    pub fn kind(&self) -> LayerId {
        self.kind
    }

    /// Fetch, decode and assemble the layer.
    ///
    /// Progress is published to the session while this ticket is current.
    pub async fn run(self) -> ResolveOutcome {
        let ResolveTicket {
            generation,
            kind,
            response,
            loader,
            live,
            state,
        } = self;

        let result = resolve_with_progress(kind, &response, &loader, |phase| {
            let ResolvePhase::Decoding { rasters } = phase else {
                return;
            };
            state.send_if_modified(|current| {
                if live.load(Ordering::SeqCst) != generation {
                    return false;
                }
                *current = ResolveState::Decoding { kind, rasters };
                true
            });
        })
        .await;

        ResolveOutcome { generation, kind, result }
    }
}

impl std::fmt::Debug for ResolveTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveTicket")
            .field("generation", &self.generation)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Layer selection and resolution state for one viewer.
pub struct LayerSession {
    loader: Arc<RasterLoader>,
    response: Option<Arc<DataLayersResponse>>,
    selected: Option<LayerId>,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<ResolveState>>,
}

impl LayerSession {
    pub fn new(loader: Arc<RasterLoader>) -> Self {
        let (state, _) = watch::channel(ResolveState::Idle);
        Self {
            loader,
            response: None,
            selected: None,
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    pub fn generation(&self) -> QueryGeneration {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    /// A new location was queried.
    ///
    /// Invalidates anything in flight, drops the raster cache and the
    /// current layer. Call [`LayerSession::select`] afterwards.
    pub fn begin_query(&mut self, response: DataLayersResponse) -> QueryGeneration {
        self.loader.clear_cache();
        self.response = Some(Arc::new(response));
        let generation = self.advance(ResolveState::Idle);
        info!(generation, "New data layers query");
        generation
    }

    /// Select a layer kind, or `None` to show nothing.
    ///
    /// Returns the ticket to run for the new selection. Errors if a layer is
    /// selected before any query response is known.
    pub fn select(&mut self, kind: Option<LayerId>) -> Result<Option<ResolveTicket>, LayerError> {
        self.selected = kind;
        let Some(kind) = kind else {
            self.advance(ResolveState::Idle);
            return Ok(None);
        };
        let response = self
            .response
            .clone()
            .ok_or_else(|| LayerError::invalid_parameter("layer", "no data layers response for this session"))?;

        let urls = crate::resolve::layer_urls(kind, &response);
        let generation = self.advance(ResolveState::Fetching { kind, urls });
        debug!(generation, layer = %kind, "Layer selected");

        Ok(Some(ResolveTicket {
            generation,
            kind,
            response,
            loader: self.loader.clone(),
            live: self.generation.clone(),
            state: self.state.clone(),
        }))
    }

    /// Apply a finished resolution. Returns `false` if it was stale and
    /// has been discarded.
    pub fn apply(&mut self, outcome: ResolveOutcome) -> bool {
        let ResolveOutcome { generation, kind, result } = outcome;
        let applied = self.state.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = match result {
                Ok(layer) => ResolveState::Ready(Arc::new(layer)),
                Err(err) => {
                    warn!(layer = %kind, url = %err.url, error = %err.source, "Layer resolution failed");
                    ResolveState::Failed(err)
                }
            };
            true
        });

        if !applied {
            debug!(generation, current = self.generation(), layer = %kind, "Discarding stale layer result");
        }
        applied
    }

    /// Select and resolve in one step, applying the result.
    pub async fn select_and_resolve(&mut self, kind: Option<LayerId>) -> Result<bool, LayerError> {
        match self.select(kind)? {
            Some(ticket) => {
                let outcome = ticket.run().await;
                Ok(self.apply(outcome))
            }
            None => Ok(true),
        }
    }

    pub fn state(&self) -> ResolveState {
        self.state.borrow().clone()
    }

    /// Watch state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ResolveState> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn current_layer(&self) -> Option<Arc<Layer>> {
        match &*self.state.borrow() {
            ResolveState::Ready(layer) => Some(layer.clone()),
            _ => None,
        }
    }

    /// Displayable error for the current selection, if it failed.
    pub fn error_payload(&self) -> Option<ErrorPayload> {
        match &*self.state.borrow() {
            ResolveState::Failed(err) => Some(err.payload()),
            _ => None,
        }
    }

    /// Cached raster for `url` in the current query.
    pub fn cached_raster(&self, url: &str) -> Option<Arc<GeoRaster>> {
        self.loader.cached(url)
    }

    // The bump happens inside the state lock so a ticket cannot publish
    // progress between the two.
    fn advance(&self, next: ResolveState) -> QueryGeneration {
        let mut generation = 0;
        self.state.send_modify(|current| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *current = next;
        });
        generation
    }
}

impl std::fmt::Debug for LayerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerSession")
            .field("generation", &self.generation())
            .field("selected", &self.selected)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::fetch::InMemoryFetcher;

    fn session() -> LayerSession {
        let loader = RasterLoader::new(Arc::new(InMemoryFetcher::new()), ResolverConfig::default());
        LayerSession::new(Arc::new(loader))
    }

    #[test]
    fn test_select_before_query_fails() {
        let mut session = session();
        let err = session.select(Some(LayerId::Mask)).unwrap_err();
        assert_eq!(err.kind_code(), "InvalidParameter");
    }

    #[test]
    fn test_select_none_is_idle() {
        let mut session = session();
        assert!(session.select(None).unwrap().is_none());
        assert!(matches!(session.state(), ResolveState::Idle));
        assert!(!session.is_loading());
        assert_eq!(session.generation(), 1);
    }
}
