//! PURE-LET weight solver.
//!
//! Each free level `j` contributes two candidate images, the plain synthesis
//! of its details `F_raw = R_j(d_j)` and the synthesis of the thresholded
//! details `F_thr = R_j(theta(d_j, A_j))`. The output is
//! `B + sum_i a_i F_i`, where `B` holds the coarse approximation plus every
//! identity-forced level and the weights `a` minimise an unbiased estimate of
//! the mean squared error:
//!
//! ```text
//! M a = c,   M_il = <F_i, F_l>
//! c_i = <y - B, F_i> - alpha * ydiv_i - sigma^2 (div_i - alpha * div2_i)
//! ```
//!
//! The divergence terms are assembled per pixel from the threshold
//! derivatives and the operator kernels (see [`crate::kernels`]).

use std::fmt;

use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayView1, ArrayView2, Zip};
use num_complex::Complex64;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use trous_wavelet::{Band, DetailBands, Diagnostic, Fft2, Image, PyramidTransform, synthesize};

use crate::error::DenoiseError;
use crate::kernels::{BandKernel, OperatorKernels, correlate};
use crate::threshold::{ThresholdDerivatives, ThresholdParameters};

/// How the weights of one level are chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelMode {
    /// Below the threshold cutoff: the level is dropped, weights `(0, 0)`.
    Suppressed,
    /// Passed through unchanged, weights `(1, 0)`.
    Identity,
    /// Weights solved from the risk estimate.
    Free,
}

/// Weights of the two candidates of one level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelWeights {
    /// How the weights were chosen.
    pub mode: LevelMode,
    /// Weight of the unthresholded synthesis.
    pub raw: f64,
    /// Weight of the thresholded synthesis.
    pub thresholded: f64,
}

impl LevelWeights {
    fn fixed(mode: LevelMode) -> Self {
        let raw = if mode == LevelMode::Identity { 1.0 } else { 0.0 };
        Self {
            mode,
            raw,
            thresholded: 0.0,
        }
    }
}

/// Something the denoiser recovered from instead of failing.
#[derive(Clone, Debug, PartialEq)]
pub enum DenoiseDiagnostic {
    /// Raised by the wavelet transform.
    Transform(Diagnostic),
    /// The risk system was rank deficient; the minimum-norm solution was used.
    SingularSystem {
        /// Numerical rank.
        rank: usize,
        /// Number of unknowns.
        size: usize,
    },
}

impl fmt::Display for DenoiseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(d) => write!(f, "{d}"),
            Self::SingularSystem { rank, size } => {
                write!(f, "risk system has rank {rank} of {size}; minimum-norm weights used")
            }
        }
    }
}

/// Result of a denoising run.
#[derive(Clone, Debug)]
pub struct Denoised {
    image: Array2<f64>,
    weights: Vec<LevelWeights>,
    noise_variance: f64,
    diagnostics: Vec<DenoiseDiagnostic>,
}

impl Denoised {
    /// The denoised image.
    pub fn image(&self) -> &Array2<f64> {
        &self.image
    }

    /// Consumes the result, returning the image.
    pub fn into_image(self) -> Array2<f64> {
        self.image
    }

    /// Per-level weights, finest first.
    pub fn weights(&self) -> &[LevelWeights] {
        &self.weights
    }

    /// Pixel-domain noise variance that was used (given or estimated).
    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }

    /// Recovered conditions, in the order they occurred.
    pub fn diagnostics(&self) -> &[DenoiseDiagnostic] {
        &self.diagnostics
    }
}

/// Solves for the PURE-LET weights of a decomposed image.
#[derive(Clone, Debug)]
pub struct PureLetSolver {
    noise_variance: f64,
    poisson_gain: f64,
    threshold_cutoff: usize,
    identity_only: bool,
    shape: ThresholdParameters,
}

impl PureLetSolver {
    /// Creates a solver for Gaussian `noise_variance` and Poisson gain
    /// `poisson_gain`, with no cutoff and the default threshold shape.
    pub fn new(noise_variance: f64, poisson_gain: f64) -> Self {
        Self {
            noise_variance,
            poisson_gain,
            threshold_cutoff: 0,
            identity_only: false,
            shape: ThresholdParameters::default(),
        }
    }

    /// Suppresses levels `0..cutoff`.
    pub fn with_threshold_cutoff(mut self, cutoff: usize) -> Self {
        self.threshold_cutoff = cutoff;
        self
    }

    /// Forces identity weights on every level that is not suppressed.
    pub fn with_identity_only(mut self, identity_only: bool) -> Self {
        self.identity_only = identity_only;
        self
    }

    /// Sets the threshold shape template.
    pub fn with_threshold_shape(mut self, shape: ThresholdParameters) -> Self {
        self.shape = shape;
        self
    }

    /// Returns the noise variance.
    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }

    /// Returns the Poisson gain.
    pub fn poisson_gain(&self) -> f64 {
        self.poisson_gain
    }

    /// Mode of level `j`.
    ///
    /// Noise-free input (`sigma^2 = 0` and `alpha = 0`) forces identity on
    /// every level that is not suppressed.
    pub fn level_mode(&self, level: usize) -> LevelMode {
        if level < self.threshold_cutoff {
            LevelMode::Suppressed
        } else if self.identity_only || (self.noise_variance == 0.0 && self.poisson_gain == 0.0) {
            LevelMode::Identity
        } else {
            LevelMode::Free
        }
    }

    /// Denoises `image` given its decomposition and the operator kernels of
    /// that decomposition.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`DenoiseError::InvalidNoiseVariance`] | negative or non-finite variance |
    /// | [`DenoiseError::InvalidPoissonGain`] | negative or non-finite gain |
    /// | [`DenoiseError::InvalidThreshold`] | bad threshold shape |
    /// | [`DenoiseError::Wavelet`] | image, pyramid and kernels disagree on the transform |
    /// | [`DenoiseError::MissingKernelWeights`] | `poisson_gain > 0`, kernels lack weights |
    pub fn solve(
        &self,
        image: &Image,
        pyramid: &PyramidTransform,
        kernels: &OperatorKernels,
    ) -> Result<Denoised, DenoiseError> {
        if !self.noise_variance.is_finite() || self.noise_variance < 0.0 {
            return Err(DenoiseError::InvalidNoiseVariance(self.noise_variance));
        }
        if !self.poisson_gain.is_finite() || self.poisson_gain < 0.0 {
            return Err(DenoiseError::InvalidPoissonGain(self.poisson_gain));
        }
        self.shape.validate()?;
        let shape = pyramid.shape();
        if image.shape() != shape {
            return Err(trous_wavelet::WaveletError::ShapeMismatch {
                expected: shape,
                got: image.shape(),
            }
            .into());
        }
        if kernels.n_levels() != pyramid.n_levels() {
            return Err(trous_wavelet::WaveletError::ReconstructionLevel {
                requested: pyramid.n_levels(),
                levels: kernels.n_levels(),
            }
            .into());
        }

        let mut diagnostics: Vec<DenoiseDiagnostic> = pyramid
            .diagnostics()
            .iter()
            .chain(kernels.diagnostics())
            .cloned()
            .map(DenoiseDiagnostic::Transform)
            .collect();

        let modes: Vec<LevelMode> = (0..pyramid.n_levels()).map(|j| self.level_mode(j)).collect();

        let (mut base, coarse_diagnostics) = pyramid.coarse_component_with_diagnostics()?;
        record(&mut diagnostics, coarse_diagnostics);
        for (j, mode) in modes.iter().enumerate() {
            if *mode == LevelMode::Identity {
                let (component, component_diagnostics) = pyramid.component_with_diagnostics(j)?;
                record(&mut diagnostics, component_diagnostics);
                base += &component;
            }
        }

        let y_spectrum = (self.poisson_gain > 0.0).then(|| {
            let fft = Fft2::new(shape);
            let spectrum = fft.forward(image.view());
            (fft, spectrum)
        });

        let mut candidates: Vec<Candidate> = Vec::new();
        for (j, mode) in modes.iter().enumerate() {
            if *mode != LevelMode::Free {
                continue;
            }
            let (raw, thresholded) = self.level_candidates(
                pyramid,
                kernels,
                j,
                y_spectrum.as_ref(),
                &mut diagnostics,
            )?;
            candidates.push(raw);
            candidates.push(thresholded);
        }

        let residual = &image.view() - &base;
        let weights = self.solve_weights(residual.view(), &candidates, &mut diagnostics);

        let mut output = base;
        for (candidate, &a) in candidates.iter().zip(&weights) {
            output.scaled_add(a, &candidate.image);
        }

        let mut free = weights.chunks_exact(2);
        let level_weights: Vec<LevelWeights> = modes
            .iter()
            .map(|&mode| match mode {
                LevelMode::Free => match free.next() {
                    Some(&[raw, thresholded]) => LevelWeights {
                        mode,
                        raw,
                        thresholded,
                    },
                    _ => LevelWeights::fixed(LevelMode::Suppressed),
                },
                _ => LevelWeights::fixed(mode),
            })
            .collect();
        for (j, w) in level_weights.iter().enumerate() {
            debug!(
                level = j,
                mode = ?w.mode,
                raw = w.raw,
                thresholded = w.thresholded,
                "level weights"
            );
        }

        Ok(Denoised {
            image: output,
            weights: level_weights,
            noise_variance: self.noise_variance,
            diagnostics,
        })
    }

    /// Builds the raw and thresholded candidates of level `j`.
    fn level_candidates(
        &self,
        pyramid: &PyramidTransform,
        kernels: &OperatorKernels,
        j: usize,
        y_spectrum: Option<&(Fft2, Array2<Complex64>)>,
        diagnostics: &mut Vec<DenoiseDiagnostic>,
    ) -> Result<(Candidate, Candidate), DenoiseError> {
        let (Some(level), Some(level_kernels)) = (pyramid.level(j), kernels.level(j)) else {
            return Err(trous_wavelet::WaveletError::ReconstructionLevel {
                requested: j,
                levels: pyramid.n_levels(),
            }
            .into());
        };
        let approximation = level.approximation().view();
        let gain = level_kernels.gain();

        let mut raw_terms = RiskTerms::default();
        let mut thr_terms = RiskTerms::default();
        let mut thresholded: Vec<Array2<f64>> = Vec::with_capacity(3);
        for band in Band::DETAILS {
            let Some(kernel) = level_kernels.band(band) else {
                continue;
            };
            let energy = kernel.energy();
            let variance = self.noise_variance * energy;
            let scale = if gain > 0.0 {
                self.poisson_gain * energy / gain
            } else {
                0.0
            };
            let params = self.shape.with_noise(variance, scale);

            let correlations = match (y_spectrum, kernel.weights()) {
                (None, _) => None,
                (Some((fft, spectrum)), Some((qd, qs))) => Some((
                    correlate(fft, spectrum, qd.view()),
                    correlate(fft, spectrum, qs.view()),
                )),
                (Some(_), None) => {
                    return Err(DenoiseError::MissingKernelWeights {
                        level: j,
                        band: band.name(),
                    });
                }
            };

            let pass = threshold_band(
                &params,
                level.band(band).view(),
                approximation,
                kernel,
                correlations.as_ref().map(|(a, b)| (a.view(), b.view())),
            );
            raw_terms += pass.raw;
            thr_terms += pass.thresholded;
            trace!(level = j, band = band.name(), variance, scale, "band thresholded");
            thresholded.push(pass.values);
        }

        let n_levels = pyramid.n_levels();
        let (raw_image, raw_diagnostics) = pyramid.component_with_diagnostics(j)?;
        record(diagnostics, raw_diagnostics);
        let mut details: Vec<DetailBands<'_>> = vec![[None, None, None]; n_levels];
        details[j] = [
            thresholded.first().map(Array2::view),
            thresholded.get(1).map(Array2::view),
            thresholded.get(2).map(Array2::view),
        ];
        let (thr_image, transform_diagnostics) =
            synthesize(
                pyramid.engine(),
                pyramid.filter_bank(),
                pyramid.shape(),
                None,
                &details,
                0,
            )?;
        record(diagnostics, transform_diagnostics);

        Ok((
            Candidate {
                image: raw_image,
                correction: raw_terms.correction(self.noise_variance, self.poisson_gain),
            },
            Candidate {
                image: thr_image,
                correction: thr_terms.correction(self.noise_variance, self.poisson_gain),
            },
        ))
    }

    /// Solves `M a = c` in the least-squares sense.
    fn solve_weights(
        &self,
        residual: ArrayView2<'_, f64>,
        candidates: &[Candidate],
        diagnostics: &mut Vec<DenoiseDiagnostic>,
    ) -> Vec<f64> {
        let n = candidates.len();
        if n == 0 {
            return Vec::new();
        }
        let gram = DMatrix::from_fn(n, n, |i, l| {
            inner(candidates[i].image.view(), candidates[l].image.view())
        });
        let rhs = DVector::from_iterator(
            n,
            candidates
                .iter()
                .map(|c| inner(residual, c.image.view()) - c.correction),
        );

        let svd = gram.svd(true, true);
        let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
        let eps = sigma_max * n as f64 * f64::EPSILON;
        let rank = svd.rank(eps);
        if rank < n {
            warn!(rank, size = n, "risk system is singular, using minimum-norm weights");
            diagnostics.push(DenoiseDiagnostic::SingularSystem { rank, size: n });
        }
        match svd.solve(&rhs, eps) {
            Ok(solution) => solution
                .iter()
                .map(|&a| if a.is_finite() { a } else { 0.0 })
                .collect(),
            Err(reason) => {
                warn!(reason, "risk system could not be solved, weights set to zero");
                vec![0.0; n]
            }
        }
    }
}

/// One candidate image with its divergence correction.
struct Candidate {
    image: Array2<f64>,
    correction: f64,
}

/// Accumulated divergence sums of one candidate.
#[derive(Clone, Copy, Debug, Default)]
struct RiskTerms {
    /// `sum d theta/dx kappa_D + d theta/dy kappa_S`.
    div: f64,
    /// Same weighted by the correlated image (signal-dependent part).
    ydiv: f64,
    /// Second-order term.
    div2: f64,
}

impl RiskTerms {
    fn accumulate(
        &mut self,
        d: &ThresholdDerivatives,
        kernel: &BandKernel,
        corr: Option<(f64, f64)>,
    ) {
        self.div += d.dx * kernel.kappa_d() + d.dy * kernel.kappa_s();
        if let Some((qd, qs)) = corr {
            self.ydiv += d.dx * qd + d.dy * qs;
        }
        self.div2 += d.d2x * kernel.kappa_dd()
            + 2.0 * d.dxdy * kernel.kappa_ds()
            + d.d2y * kernel.kappa_ss();
    }

    fn correction(&self, noise_variance: f64, poisson_gain: f64) -> f64 {
        poisson_gain * self.ydiv + noise_variance * (self.div - poisson_gain * self.div2)
    }
}

impl std::ops::AddAssign for RiskTerms {
    fn add_assign(&mut self, rhs: Self) {
        self.div += rhs.div;
        self.ydiv += rhs.ydiv;
        self.div2 += rhs.div2;
    }
}

/// Output of the per-pixel pass over one band.
struct BandPass {
    values: Array2<f64>,
    raw: RiskTerms,
    thresholded: RiskTerms,
}

/// Thresholds one band row by row in parallel, accumulating the divergence
/// sums of both the thresholded and the identity candidate.
fn threshold_band(
    params: &ThresholdParameters,
    detail: ArrayView2<'_, f64>,
    approximation: ArrayView2<'_, f64>,
    kernel: &BandKernel,
    correlations: Option<(ArrayView2<'_, f64>, ArrayView2<'_, f64>)>,
) -> BandPass {
    let (rows, cols) = detail.dim();
    let per_row: Vec<(Vec<f64>, RiskTerms, RiskTerms)> = (0..rows)
        .into_par_iter()
        .map(|m| {
            let mut values = Vec::with_capacity(cols);
            let mut raw = RiskTerms::default();
            let mut thr = RiskTerms::default();
            for n in 0..cols {
                let x = detail[[m, n]];
                let d = params.evaluate(x, approximation[[m, n]]);
                let corr = correlations.map(|(qd, qs)| (qd[[m, n]], qs[[m, n]]));
                thr.accumulate(&d, kernel, corr);
                raw.accumulate(&ThresholdDerivatives::identity(x), kernel, corr);
                values.push(d.value);
            }
            (values, raw, thr)
        })
        .collect();

    let mut pass = BandPass {
        values: Array2::zeros((rows, cols)),
        raw: RiskTerms::default(),
        thresholded: RiskTerms::default(),
    };
    for (m, (values, raw, thr)) in per_row.into_iter().enumerate() {
        pass.values.row_mut(m).assign(&ArrayView1::from(values.as_slice()));
        pass.raw += raw;
        pass.thresholded += thr;
    }
    pass
}

fn record(diagnostics: &mut Vec<DenoiseDiagnostic>, raised: Vec<Diagnostic>) {
    diagnostics.extend(raised.into_iter().map(DenoiseDiagnostic::Transform));
}

fn inner(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> f64 {
    Zip::from(a).and(b).fold(0.0, |acc, &x, &y| acc + x * y)
}
