//! Decompose command: write every subband and the configured reconstruction.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use trous_wavelet::{Band, PyramidTransform, decompose, reconstruct_to_configured};

use crate::cli::DecomposeArgs;
use crate::config::TrousConfig;
use crate::{convert, matrix};

/// Run the decomposition pipeline.
pub fn run(args: DecomposeArgs) -> Result<()> {
    let _cmd = info_span!("decompose").entered();

    let mut config = TrousConfig::load(args.transform.config.as_deref())?;
    config.transform.apply_overrides(&args.transform);
    let transform = convert::build_transform_config(&config.transform)?;

    info!(path = %args.input.display(), "reading input matrix");
    let image = matrix::read(&args.input)?;
    let pyramid = decompose(&image, &transform).context("decomposition failed")?;
    for diagnostic in pyramid.diagnostics() {
        warn!(%diagnostic, "transform diagnostic");
    }
    for (k, energy) in pyramid.detail_energy().iter().enumerate() {
        info!(level = k, energy, "detail energy");
    }

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("failed to create output directory: {}", args.output_dir.display())
    })?;
    write_subbands(&pyramid, &args.output_dir)?;

    let reconstruction =
        reconstruct_to_configured(&pyramid, &transform).context("reconstruction failed")?;
    matrix::write(&args.output_dir.join("reconstruction.txt"), &reconstruction)?;
    info!(
        levels = pyramid.n_levels(),
        dir = %args.output_dir.display(),
        "decomposition written"
    );
    Ok(())
}

/// Writes `level{k}_{band}.txt` for every level and band.
fn write_subbands(pyramid: &PyramidTransform, dir: &Path) -> Result<()> {
    for level in pyramid.levels() {
        for band in [Band::Approximation, Band::Horizontal, Band::Vertical, Band::Diagonal] {
            let path = dir.join(format!("level{}_{}.txt", level.index(), band.name()));
            matrix::write(&path, level.band(band))?;
        }
    }
    Ok(())
}
