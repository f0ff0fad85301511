use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Trous undecimated wavelet toolkit.
#[derive(Parser)]
#[command(
    name = "trous",
    version,
    about = "Translation-invariant 2-D wavelet decomposition and PURE-LET denoising"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Decompose a matrix into subbands and write each one out.
    Decompose(DecomposeArgs),
    /// Denoise a matrix with PURE-LET thresholding.
    Denoise(DenoiseArgs),
}

/// Transform overrides shared by both subcommands.
#[derive(clap::Args)]
pub struct TransformArgs {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the number of levels (capped to what the image supports).
    #[arg(short, long)]
    pub levels: Option<usize>,

    /// Override the wavelet filter (haar, db1..db4, sym4, coif1).
    #[arg(short, long)]
    pub wavelet: Option<String>,

    /// Override the transform engine (spatial or frequency).
    #[arg(short, long)]
    pub engine: Option<String>,
}

/// Arguments for the `decompose` subcommand.
#[derive(clap::Args)]
pub struct DecomposeArgs {
    /// Path to the input matrix text file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory receiving `level{k}_{band}.txt` and `reconstruction.txt`.
    #[arg(short, long)]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub transform: TransformArgs,
}

/// Arguments for the `denoise` subcommand.
#[derive(clap::Args)]
pub struct DenoiseArgs {
    /// Path to the input matrix text file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path for the denoised matrix.
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub transform: TransformArgs,

    /// Gaussian noise variance; estimated from the data when absent.
    #[arg(long = "noise-variance", visible_alias = "var")]
    pub noise_variance: Option<f64>,

    /// Suppress levels below this index.
    #[arg(long)]
    pub cutoff: Option<usize>,

    /// Poisson gain of the signal-dependent noise part.
    #[arg(long = "poisson-gain")]
    pub poisson_gain: Option<f64>,
}
