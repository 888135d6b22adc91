//! Writing rendered frames and the layer manifest.

use std::path::Path;

use data_layers::{DisplayState, Layer, LayerSummary};
use renderer::RenderFrame;
use serde::Serialize;
use solar_common::LayerError;
use tracing::{debug, info};

/// Everything an overlay needs to show the written frames.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(flatten)]
    pub layer: LayerSummary,
    pub display: DisplayState,
    /// Index into `frames` the display state selects
    pub displayed_frame: usize,
    pub frames: Vec<String>,
}

/// File name of frame `index` of `layer`.
pub fn frame_file_name(layer: &Layer, index: usize) -> String {
    format!("{}_{:02}.png", layer.id, index)
}

/// PNG-encode every frame. CPU-bound; run it off the async executor.
pub fn encode_frames(frames: &[RenderFrame]) -> Result<Vec<Vec<u8>>, LayerError> {
    frames.iter().map(|frame| Ok(frame.to_png()?)).collect()
}

/// Write encoded frames plus `<layer>.json` into `out_dir`.
pub async fn write_layer(
    out_dir: &Path,
    layer: &Layer,
    pngs: &[Vec<u8>],
    display: DisplayState,
) -> Result<Manifest, LayerError> {
    tokio::fs::create_dir_all(out_dir).await?;

    let mut names = Vec::with_capacity(pngs.len());
    for (index, png) in pngs.iter().enumerate() {
        let name = frame_file_name(layer, index);
        debug!(file = %name, bytes = png.len(), "Writing frame");
        tokio::fs::write(out_dir.join(&name), png).await?;
        names.push(name);
    }

    let manifest = Manifest {
        layer: layer.summary(),
        display,
        displayed_frame: display.frame_index(layer.id),
        frames: names,
    };
    let path = out_dir.join(format!("{}.json", layer.id));
    tokio::fs::write(&path, serde_json::to_vec_pretty(&manifest)?).await?;
    info!(path = %path.display(), frames = pngs.len(), "Wrote layer");

    Ok(manifest)
}
