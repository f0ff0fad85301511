//! Pure conversion functions: TOML config structs -> crate API config types.

use anyhow::{Context, Result, bail};

use crate::config::{DenoiseToml, TransformToml};

use trous_purelet::DenoiseConfig;
use trous_wavelet::{Engine, FilterPair, TransformConfig};

/// Parses a wavelet filter name into its filter pair.
pub fn parse_wavelet(s: &str) -> Result<FilterPair> {
    FilterPair::from_name(s).with_context(|| format!("unknown wavelet filter: {s:?}"))
}

/// Parses an engine name.
pub fn parse_engine(s: &str) -> Result<Engine> {
    Engine::from_name(s).with_context(|| format!("unknown engine: {s:?}"))
}

/// Builds a [`TransformConfig`] from the TOML transform section.
pub fn build_transform_config(transform: &TransformToml) -> Result<TransformConfig> {
    let wavelet = match transform.custom_filter {
        Some(ref custom) => FilterPair::new(
            custom.dec_lo.clone(),
            custom.dec_hi.clone(),
            custom.rec_lo.clone(),
            custom.rec_hi.clone(),
        )
        .context("invalid custom filter")?,
        None => parse_wavelet(&transform.wavelet)?,
    };
    let cfg = TransformConfig::new()
        .with_wavelet(wavelet)
        .with_levels_opt(transform.levels)
        .with_reconstruction_level(transform.reconstruction_level)
        .with_engine(parse_engine(&transform.engine)?);
    cfg.validate().context("invalid transform settings")?;
    Ok(cfg)
}

/// Builds a [`DenoiseConfig`] from the TOML transform and denoise sections.
///
/// The reconstruction level does not apply: denoised output is always at
/// the source resolution.
pub fn build_denoise_config(
    transform: &TransformToml,
    denoise: &DenoiseToml,
) -> Result<DenoiseConfig> {
    if transform.reconstruction_level != 0 {
        bail!(
            "reconstruction_level = {} is not supported when denoising",
            transform.reconstruction_level
        );
    }
    let cfg = DenoiseConfig::new(build_transform_config(transform)?)
        .with_noise_variance_opt(denoise.noise_variance)
        .with_threshold_cutoff_opt(denoise.threshold_cutoff)
        .with_poisson_gain(denoise.poisson_gain)
        .with_identity_only(denoise.identity_only);
    cfg.validate().context("invalid denoise settings")?;
    Ok(cfg)
}
