//! Impulse-response description of the analysis and synthesis operators.
//!
//! Every operator in the pyramid is a circular convolution, so it is fully
//! described by its response to a unit impulse at the origin. For band `b`
//! at level `j` let `d` be the analysis response, `s` the same-level
//! approximation response and `r` the synthesis response. The divergence
//! terms of the risk estimate only need the zero-lag products
//!
//! ```text
//! kappa_D  = sum_k r[k] d[-k]        kappa_S  = sum_k r[k] s[-k]
//! kappa_DD = sum_k r[k] d[-k]^2      kappa_DS = sum_k r[k] d[-k] s[-k]
//! kappa_SS = sum_k r[k] s[-k]^2
//! ```
//!
//! which are exact for any filter length. The signal-dependent (Poisson)
//! terms additionally correlate the noisy image with `r(k) d(-k)` and
//! `r(k) s(-k)`.

use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex64;
use tracing::debug;

use trous_wavelet::{
    Band, Decomposer, DetailBands, Diagnostic, Engine, FilterBank, Fft2, Image, TransformConfig,
    WaveletError, synthesize,
};

/// `out[m, n] = a[-m, -n]` with periodic indexing.
fn reflect(a: ArrayView2<'_, f64>) -> Array2<f64> {
    let (rows, cols) = a.dim();
    Array2::from_shape_fn((rows, cols), |(m, n)| a[[(rows - m) % rows, (cols - n) % cols]])
}

/// Zero-lag products of one band's operators.
#[derive(Clone, Debug)]
pub struct BandKernel {
    energy: f64,
    kappa_d: f64,
    kappa_s: f64,
    kappa_dd: f64,
    kappa_ds: f64,
    kappa_ss: f64,
    /// `r(k) d(-k)` and `r(k) s(-k)`, kept only when correlations are needed.
    weights: Option<(Array2<f64>, Array2<f64>)>,
}

impl BandKernel {
    fn new(
        analysis: ArrayView2<'_, f64>,
        approximation: ArrayView2<'_, f64>,
        synthesis: ArrayView2<'_, f64>,
        keep_weights: bool,
    ) -> Self {
        let d = reflect(analysis);
        let s = reflect(approximation);
        let mut sums = [0.0_f64; 5];
        Zip::from(&synthesis).and(&d).and(&s).for_each(|&r, &dk, &sk| {
            sums[0] += r * dk;
            sums[1] += r * sk;
            sums[2] += r * dk * dk;
            sums[3] += r * dk * sk;
            sums[4] += r * sk * sk;
        });
        let weights = keep_weights.then(|| (&synthesis * &d, &synthesis * &s));
        Self {
            energy: analysis.iter().map(|v| v * v).sum(),
            kappa_d: sums[0],
            kappa_s: sums[1],
            kappa_dd: sums[2],
            kappa_ds: sums[3],
            kappa_ss: sums[4],
            weights,
        }
    }

    /// `||d||^2`: gain of white noise through the analysis filter.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Diagonal of the composite `R D`.
    pub fn kappa_d(&self) -> f64 {
        self.kappa_d
    }

    /// Diagonal of the composite `R S`.
    pub fn kappa_s(&self) -> f64 {
        self.kappa_s
    }

    /// `sum_k r[k] d[-k]^2`.
    pub fn kappa_dd(&self) -> f64 {
        self.kappa_dd
    }

    /// `sum_k r[k] d[-k] s[-k]`.
    pub fn kappa_ds(&self) -> f64 {
        self.kappa_ds
    }

    /// `sum_k r[k] s[-k]^2`.
    pub fn kappa_ss(&self) -> f64 {
        self.kappa_ss
    }

    /// Correlation weights `(r d~, r s~)`, if they were kept.
    pub fn weights(&self) -> Option<(&Array2<f64>, &Array2<f64>)> {
        self.weights.as_ref().map(|(a, b)| (a, b))
    }
}

/// Kernels of the three detail bands at one level.
#[derive(Clone, Debug)]
pub struct LevelKernels {
    gain: f64,
    bands: [BandKernel; 3],
}

impl LevelKernels {
    /// DC gain of the level approximation filter, `sum s`.
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Kernel of one detail band, `None` for [`Band::Approximation`].
    pub fn band(&self, band: Band) -> Option<&BandKernel> {
        band.detail_index().map(|idx| &self.bands[idx])
    }

    /// All three band kernels in [`Band::DETAILS`] order.
    pub fn bands(&self) -> &[BandKernel; 3] {
        &self.bands
    }
}

/// Kernels for every level of a pyramid.
#[derive(Clone, Debug)]
pub struct OperatorKernels {
    levels: Vec<LevelKernels>,
    coarse_kappa: f64,
    diagnostics: Vec<Diagnostic>,
}

impl OperatorKernels {
    /// Measures the operators of an `n_levels` pyramid over `shape`.
    ///
    /// `keep_weights` retains the full-size correlation weights needed by the
    /// signal-dependent noise terms.
    ///
    /// # Errors
    ///
    /// Propagates [`WaveletError`] from the transform layer.
    pub fn measure(
        bank: &FilterBank,
        engine: Engine,
        shape: (usize, usize),
        n_levels: usize,
        keep_weights: bool,
    ) -> Result<Self, WaveletError> {
        let impulse = Image::impulse(shape)?;
        let config = TransformConfig::new()
            .with_wavelet(bank.pair().clone())
            .with_levels(n_levels)
            .with_engine(engine);
        let response = Decomposer::new(&impulse, &config).finish();
        let n_levels = response.n_levels();
        let mut diagnostics = response.diagnostics().to_vec();

        let mut levels = Vec::with_capacity(n_levels);
        for (j, level) in response.levels().iter().enumerate() {
            let approximation = level.approximation().view();
            let [h, v, d] = Band::DETAILS
                .map(|band| band_synthesis(bank, engine, impulse.view(), n_levels, j, band));
            let (h, v, d) = (h?, v?, d?);
            diagnostics.extend(h.1.into_iter().chain(v.1).chain(d.1));
            let synthesis = [h.0, v.0, d.0];
            let bands: [BandKernel; 3] = std::array::from_fn(|i| {
                BandKernel::new(
                    level.band(Band::DETAILS[i]).view(),
                    approximation,
                    synthesis[i].view(),
                    keep_weights,
                )
            });
            levels.push(LevelKernels {
                gain: approximation.sum(),
                bands,
            });
        }

        // Coarse path: synthesis of the coarse approximation against its analysis.
        let details: Vec<DetailBands<'_>> = vec![[None, None, None]; n_levels];
        let (coarse_synthesis, coarse_diagnostics) = synthesize(
            engine,
            bank,
            shape,
            Some(impulse.view()),
            &details,
            0,
        )?;
        diagnostics.extend(coarse_diagnostics);
        let coarse_kappa = (&coarse_synthesis * &reflect(response.coarse().view())).sum();

        debug!(levels = n_levels, keep_weights, "operator kernels measured");
        Ok(Self {
            levels,
            coarse_kappa,
            diagnostics,
        })
    }

    /// Number of levels.
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// Kernels of level `j`, `None` if out of range.
    pub fn level(&self, j: usize) -> Option<&LevelKernels> {
        self.levels.get(j)
    }

    /// All levels, finest first.
    pub fn levels(&self) -> &[LevelKernels] {
        &self.levels
    }

    /// Diagonal of the coarse analysis/synthesis composite.
    ///
    /// Together with every band's `kappa_d` it sums to one, because the
    /// whole pyramid reconstructs perfectly.
    pub fn coarse_kappa(&self) -> f64 {
        self.coarse_kappa
    }

    /// Conditions recovered while measuring the impulse responses.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Synthesis response of a unit impulse placed in one band at one level.
fn band_synthesis(
    bank: &FilterBank,
    engine: Engine,
    impulse: ArrayView2<'_, f64>,
    n_levels: usize,
    level: usize,
    band: Band,
) -> Result<(Array2<f64>, Vec<Diagnostic>), WaveletError> {
    let mut details: Vec<DetailBands<'_>> = vec![[None, None, None]; n_levels];
    if let Some(idx) = band.detail_index() {
        details[level][idx] = Some(impulse);
    }
    synthesize(engine, bank, impulse.dim(), None, &details, 0)
}

/// Circular correlation `(y * q)[m] = sum_k y[m + k] q[k]` for every `m`.
pub(crate) fn correlate(
    fft: &Fft2,
    y_spectrum: &Array2<Complex64>,
    q: ArrayView2<'_, f64>,
) -> Array2<f64> {
    let mut product = fft.forward(q);
    Zip::from(&mut product)
        .and(y_spectrum)
        .for_each(|p, &y| *p = y * p.conj());
    fft.inverse(product).0
}
