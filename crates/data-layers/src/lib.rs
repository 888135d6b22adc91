//! Solar API data layers: from a `dataLayers` response to rendered frames.
//!
//! The flow for one selection is:
//! 1. [`LayerSession::select`] issues a [`ResolveTicket`] under a fresh query generation
//! 2. the ticket fetches the mask and the kind's rasters through a [`RasterFetcher`],
//!    decodes them concurrently and builds a [`Layer`]
//! 3. [`LayerSession::apply`] installs the layer unless a newer selection superseded it
//! 4. [`Layer::render`] produces the full frame sequence; [`DisplayState`] picks the frame shown

pub mod config;
pub mod display;
pub mod fetch;
pub mod layer;
pub mod loader;
pub mod render;
pub mod resolve;
pub mod session;

pub use config::ResolverConfig;
pub use display::{layer_options, DisplayState, LayerOption};
pub use fetch::{FsFetcher, InMemoryFetcher, RasterFetcher};
pub use layer::{Layer, LayerSource, LayerSummary, Legend, LegendSummary};
pub use loader::{decode_raster, RasterLoader};
pub use render::render;
pub use resolve::{layer_urls, resolve, resolve_with_progress, ResolvePhase, ANNUAL_FLUX_RANGE, MONTHLY_FLUX_RANGE};
pub use session::{LayerSession, QueryGeneration, ResolveOutcome, ResolveState, ResolveTicket};
