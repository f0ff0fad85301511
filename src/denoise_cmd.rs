//! Denoise command: PURE-LET denoising of a matrix file.

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use trous_purelet::denoise;

use crate::cli::DenoiseArgs;
use crate::config::TrousConfig;
use crate::{convert, matrix};

/// Run the denoising pipeline.
pub fn run(args: DenoiseArgs) -> Result<()> {
    let _cmd = info_span!("denoise").entered();

    let mut config = TrousConfig::load(args.transform.config.as_deref())?;
    config.transform.apply_overrides(&args.transform);
    if let Some(v) = args.noise_variance {
        config.denoise.noise_variance = Some(v);
    }
    if let Some(k) = args.cutoff {
        config.denoise.threshold_cutoff = Some(k);
    }
    if let Some(a) = args.poisson_gain {
        config.denoise.poisson_gain = a;
    }
    let denoise_cfg = convert::build_denoise_config(&config.transform, &config.denoise)?;

    info!(path = %args.input.display(), "reading input matrix");
    let image = matrix::read(&args.input)?;
    let result = denoise(&image, &denoise_cfg).context("denoising failed")?;
    for diagnostic in result.diagnostics() {
        warn!(%diagnostic, "denoise diagnostic");
    }
    for (level, w) in result.weights().iter().enumerate() {
        info!(level, mode = ?w.mode, raw = w.raw, thresholded = w.thresholded, "level weights");
    }

    matrix::write(&args.output, result.image())?;
    info!(
        path = %args.output.display(),
        noise_variance = result.noise_variance(),
        "denoised output written"
    );
    Ok(())
}
