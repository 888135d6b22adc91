//! Layer renderer
//!
//! Resolves one Solar API data layer from GeoTIFF files in a local
//! directory and writes its frames as PNG plus a JSON manifest.

mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use data_layers::{DisplayState, FsFetcher, LayerSession, RasterLoader, ResolverConfig};
use solar_common::{DataLayersResponse, ErrorPayload, LayerError, LayerId};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use output::Manifest;

#[derive(Parser, Debug)]
#[command(name = "layer-render")]
#[command(about = "Render Solar API data layers from local GeoTIFF files")]
struct Args {
    /// dataLayers response JSON
    #[arg(long, env = "LAYER_RENDER_RESPONSE")]
    response: PathBuf,

    /// Directory holding `<id>.tif` for every raster the response names
    #[arg(long, env = "LAYER_RENDER_DATA_DIR")]
    data_dir: PathBuf,

    /// mask, dsm, rgb, annualFlux, monthlyFlux or hourlyShade
    #[arg(long)]
    layer: String,

    /// Make pixels outside the roof mask transparent
    #[arg(long)]
    roof_only: bool,

    /// Month, 0 = January
    #[arg(long, default_value_t = 0)]
    month: usize,

    /// Day of month for hourly shade
    #[arg(long, default_value_t = 14)]
    day: u32,

    /// Hour of the displayed hourly shade frame
    #[arg(long, default_value_t = 0)]
    hour: usize,

    /// Output directory
    #[arg(short, long, default_value = "out", env = "LAYER_RENDER_OUT")]
    out: PathBuf,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs);

    match run(&args).await {
        Ok(manifest) => {
            info!(layer = %manifest.layer.id, frames = manifest.frames.len(), "Done");
            Ok(())
        }
        Err(payload) => {
            error!(kind = %payload.kind, status = payload.status, "{}", payload.message);
            println!("{}", serde_json::to_string_pretty(&payload)?);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(args: &Args) -> Result<Manifest, ErrorPayload> {
    let kind = LayerId::parse_selection(&args.layer)
        .map_err(|e| ErrorPayload::from(&e))?
        .ok_or_else(|| ErrorPayload::from(&LayerError::invalid_parameter("layer", "nothing to render for 'none'")))?;
    let display = display_state(kind, args).map_err(|e| ErrorPayload::from(&e))?;
    let response = load_response(&args.response).await.map_err(|e| ErrorPayload::from(&e))?;

    let config = ResolverConfig::from_env();
    info!(
        layer = %kind,
        data_dir = %args.data_dir.display(),
        max_concurrent_fetches = config.max_concurrent_fetches,
        "Resolving layer"
    );
    let loader = RasterLoader::new(Arc::new(FsFetcher::new(&args.data_dir)), config);
    let mut session = LayerSession::new(Arc::new(loader));
    session.begin_query(response);
    session
        .select_and_resolve(Some(kind))
        .await
        .map_err(|e| ErrorPayload::from(&e))?;

    if let Some(payload) = session.error_payload() {
        return Err(payload);
    }
    let layer = session
        .current_layer()
        .ok_or_else(|| ErrorPayload::from(&LayerError::Render("layer did not resolve".to_string())))?;

    let (roof_only, month, day) = (args.roof_only, display.month, display.day);
    let render_layer = layer.clone();
    let pngs = tokio::task::spawn_blocking(move || {
        let frames = render_layer.render(roof_only, month, day)?;
        output::encode_frames(&frames)
    })
    .await
    .map_err(|e| ErrorPayload::from(&LayerError::Render(format!("render task failed: {}", e))))?
    .map_err(|e| ErrorPayload::from(&e))?;

    output::write_layer(&args.out, &layer, &pngs, display)
        .await
        .map_err(|e| ErrorPayload::from(&e))
}

/// Display state for the requested month, day and hour.
fn display_state(kind: LayerId, args: &Args) -> Result<DisplayState, LayerError> {
    let mut display = DisplayState {
        playing: false,
        ..DisplayState::default()
    };
    display.set_date(args.month, args.day)?;
    match kind {
        LayerId::MonthlyFlux => display.set_slider(kind, args.month)?,
        LayerId::HourlyShade => display.set_slider(kind, args.hour)?,
        _ => {}
    }
    Ok(display)
}

async fn load_response(path: &std::path::Path) -> Result<DataLayersResponse, LayerError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| LayerError::invalid_parameter("response", format!("{}: {}", path.display(), e)))?;
    DataLayersResponse::from_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{site_payloads, DATA_LAYERS_JSON};

    fn args(dir: &std::path::Path, layer: &str) -> Args {
        let response = dir.join("response.json");
        std::fs::write(&response, DATA_LAYERS_JSON).unwrap();
        Args {
            response,
            data_dir: dir.to_path_buf(),
            layer: layer.to_string(),
            roof_only: true,
            month: 3,
            day: 1,
            hour: 12,
            out: dir.join("out"),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    fn write_site(dir: &std::path::Path) {
        for (id, bytes) in site_payloads(4, 4) {
            std::fs::write(dir.join(format!("{}.tif", id)), bytes).unwrap();
        }
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "layer-render",
            "--response",
            "r.json",
            "--data-dir",
            "data",
            "--layer",
            "monthlyFlux",
            "--roof-only",
            "--month",
            "6",
        ])
        .unwrap();
        assert!(args.roof_only);
        assert_eq!(args.month, 6);
        assert_eq!(args.day, 14);
    }

    #[tokio::test]
    async fn test_writes_hourly_frames_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_site(dir.path());

        let manifest = run(&args(dir.path(), "hourlyShade")).await.unwrap();
        assert_eq!(manifest.frames.len(), 24);
        assert_eq!(manifest.displayed_frame, 12);
        assert_eq!(manifest.frames[12], "hourlyShade_12.png");

        let out = dir.path().join("out");
        assert!(out.join("hourlyShade_23.png").exists());
        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(out.join("hourlyShade.json")).unwrap()).unwrap();
        assert_eq!(json["frameCount"], 24);
        assert_eq!(json["displayedFrame"], 12);
        assert_eq!(json["legend"]["maxLabel"], "Sun");
    }

    #[tokio::test]
    async fn test_missing_raster_is_payload() {
        let dir = tempfile::tempdir().unwrap();

        let payload = run(&args(dir.path(), "mask")).await.unwrap_err();
        assert_eq!(payload.status, 404);
        assert_eq!(
            payload.url.as_deref(),
            Some("https://solar.example.com/v1/geoTiff:get?id=mask")
        );
    }

    #[tokio::test]
    async fn test_none_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let payload = run(&args(dir.path(), "none")).await.unwrap_err();
        assert_eq!(payload.kind, "InvalidParameter");
    }
}
