//! Fourier-domain engine.
//!
//! Each level filter becomes an outer product of two 1-D transfer functions
//! sampled on the unit circle. The forward pass keeps the running spectrum
//! of the approximation, so the level-`k` approximation spectrum is the
//! image spectrum times the product of all lower-level low-pass responses.

use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex64;

use crate::bank::{LevelFilters, Taps};
use crate::engine::DetailBands;
use crate::pyramid::{DecompositionLevel, Diagnostic};
use crate::spectral::Fft2;

/// Imaginary residual (relative) above which a diagnostic is recorded.
pub(crate) const IMAGINARY_TOLERANCE: f64 = 1e-8;

/// Separable 2-D response `ty[m] * tx[n]`.
struct Separable {
    y: Vec<Complex64>,
    x: Vec<Complex64>,
}

impl Separable {
    fn new(y: &Taps, x: &Taps, shape: (usize, usize)) -> Self {
        Self {
            y: y.transfer(shape.0),
            x: x.transfer(shape.1),
        }
    }

    fn apply(&self, spectrum: &Array2<Complex64>) -> Array2<Complex64> {
        let mut out = Array2::zeros(spectrum.raw_dim());
        self.apply_add(spectrum, &mut out);
        out
    }

    fn apply_add(&self, spectrum: &Array2<Complex64>, out: &mut Array2<Complex64>) {
        Zip::indexed(out)
            .and(spectrum)
            .par_for_each(|(m, n), o, &s| *o += s * self.y[m] * self.x[n]);
    }
}

/// Per-level responses for the four analysis or synthesis band filters.
struct BandResponses {
    approximation: Separable,
    horizontal: Separable,
    vertical: Separable,
    diagonal: Separable,
}

impl BandResponses {
    fn new(lo: &Taps, hi: &Taps, shape: (usize, usize)) -> Self {
        Self {
            approximation: Separable::new(lo, lo, shape),
            horizontal: Separable::new(hi, lo, shape),
            vertical: Separable::new(lo, hi, shape),
            diagonal: Separable::new(hi, hi, shape),
        }
    }
}

fn check_residual(level: usize, residual: f64, diagnostics: &mut Vec<Diagnostic>) {
    if residual > IMAGINARY_TOLERANCE {
        tracing::warn!(level, residual, "imaginary residual above tolerance dropped");
        diagnostics.push(Diagnostic::ImaginaryResidual {
            level,
            magnitude: residual,
        });
    }
}

/// Running state of a Fourier-domain decomposition.
pub(crate) struct ForwardState {
    fft: Fft2,
    spectrum: Array2<Complex64>,
}

impl ForwardState {
    pub(crate) fn new(image: ArrayView2<'_, f64>) -> Self {
        let fft = Fft2::new(image.dim());
        let spectrum = fft.forward(image);
        Self { fft, spectrum }
    }

    /// Computes one level and advances the running spectrum.
    pub(crate) fn step(
        &mut self,
        filters: &LevelFilters,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> DecompositionLevel {
        let shape = self.fft.shape();
        let bands = BandResponses::new(filters.analysis_lo(), filters.analysis_hi(), shape);
        let level = filters.level();

        let mut worst = 0.0_f64;
        let mut invert = |response: &Separable| {
            let (real, residual) = self.fft.inverse(response.apply(&self.spectrum));
            worst = worst.max(residual);
            real
        };
        let horizontal = invert(&bands.horizontal);
        let vertical = invert(&bands.vertical);
        let diagonal = invert(&bands.diagonal);

        self.spectrum = bands.approximation.apply(&self.spectrum);
        let (approximation, residual) = self.fft.inverse(self.spectrum.clone());
        worst = worst.max(residual);
        check_residual(level, worst, diagnostics);

        DecompositionLevel::new(level, approximation, horizontal, vertical, diagonal)
    }

    /// The current approximation in the pixel domain.
    pub(crate) fn into_image(self) -> Array2<f64> {
        self.fft.inverse(self.spectrum).0
    }
}

/// Fourier-domain inverse over optional inputs, from the deepest level down
/// to `stop`.
///
/// `filters[k]` belongs to level `k`; `details.len()` equals `filters.len()`.
pub(crate) fn synthesize(
    shape: (usize, usize),
    filters: &[LevelFilters],
    coarse: Option<ArrayView2<'_, f64>>,
    details: &[DetailBands<'_>],
    stop: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Array2<f64> {
    let fft = Fft2::new(shape);
    let mut acc: Option<Array2<Complex64>> = coarse.map(|c| fft.forward(c));

    for k in (stop..filters.len()).rev() {
        let bands = &details[k];
        if acc.is_none() && bands.iter().all(Option::is_none) {
            continue;
        }
        let f = &filters[k];
        let responses = BandResponses::new(f.synthesis_lo(), f.synthesis_hi(), shape);
        let mut next = Array2::zeros(shape);
        if let Some(a) = &acc {
            responses.approximation.apply_add(a, &mut next);
        }
        let [h, v, d] = bands;
        for (band, response) in [
            (h, &responses.horizontal),
            (v, &responses.vertical),
            (d, &responses.diagonal),
        ] {
            if let Some(data) = band {
                response.apply_add(&fft.forward(*data), &mut next);
            }
        }
        next.mapv_inplace(|c| c * 0.25);
        acc = Some(next);
    }

    match acc {
        Some(spectrum) => {
            let (real, residual) = fft.inverse(spectrum);
            check_residual(stop, residual, diagnostics);
            real
        }
        None => Array2::zeros(shape),
    }
}
