//! Engine selection, the interruptible level loop, and generic synthesis.

use ndarray::{Array2, ArrayView2};
use tracing::{debug, trace};

use crate::bank::{FilterBank, LevelFilters};
use crate::config::TransformConfig;
use crate::error::WaveletError;
use crate::frequency::{self, ForwardState};
use crate::image::Image;
use crate::pyramid::{DecompositionLevel, Diagnostic, PyramidTransform};
use crate::spatial;

/// Detail bands of one level in [`Band::DETAILS`](crate::Band::DETAILS)
/// order. `None` stands for an all-zero band.
pub type DetailBands<'a> = [Option<ArrayView2<'a, f64>>; 3];

/// How convolutions are evaluated. Both engines produce the same subbands
/// to round-off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Direct separable circular convolution.
    #[default]
    Spatial,
    /// Products of per-axis transfer functions, via FFT.
    Frequency,
}

impl Engine {
    /// Lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Spatial => "spatial",
            Self::Frequency => "frequency",
        }
    }

    /// Parses `"spatial"` or `"frequency"` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::InvalidConfig`] for any other name.
    pub fn from_name(name: &str) -> Result<Self, WaveletError> {
        match name.trim().to_lowercase().as_str() {
            "spatial" => Ok(Self::Spatial),
            "frequency" | "fourier" => Ok(Self::Frequency),
            other => Err(WaveletError::InvalidConfig(format!("unknown engine: {other:?}"))),
        }
    }
}

enum Cursor {
    Spatial(Array2<f64>),
    Frequency(ForwardState),
}

/// Forward transform driven one level at a time.
///
/// Level `k + 1` needs level `k`'s approximation, so levels run strictly in
/// order. Callers that want to stop early call [`step`](Self::step) in a
/// loop, check their own cancellation condition between calls, and package
/// whatever finished with [`interrupt`](Self::interrupt).
///
/// # Example
///
/// ```ignore
/// let mut run = Decomposer::new(&image, &config);
/// while let Some(level) = run.step() {
///     if cancelled() { break; }
///     println!("level {} done", level.index());
/// }
/// let pyramid = run.interrupt();
/// ```
pub struct Decomposer {
    shape: (usize, usize),
    bank: FilterBank,
    engine: Engine,
    planned: usize,
    cursor: Cursor,
    levels: Vec<DecompositionLevel>,
    diagnostics: Vec<Diagnostic>,
}

impl Decomposer {
    /// Plans the level count and prepares the first level's input.
    pub fn new(image: &Image, config: &TransformConfig) -> Self {
        let shape = image.shape();
        let bank = FilterBank::new(config.wavelet().clone());
        let (planned, capped) = bank.plan_levels(config.levels(), shape);
        let cursor = match config.engine() {
            Engine::Spatial => Cursor::Spatial(image.as_array().clone()),
            Engine::Frequency => Cursor::Frequency(ForwardState::new(image.view())),
        };
        debug!(
            rows = shape.0,
            cols = shape.1,
            levels = planned,
            wavelet = bank.pair().name(),
            engine = config.engine().name(),
            "decomposition planned"
        );
        Self {
            shape,
            bank,
            engine: config.engine(),
            planned,
            cursor,
            levels: Vec::with_capacity(planned),
            diagnostics: capped.into_iter().collect(),
        }
    }

    /// Number of levels that will be computed.
    pub fn planned_levels(&self) -> usize {
        self.planned
    }

    /// Number of levels computed so far.
    pub fn completed(&self) -> usize {
        self.levels.len()
    }

    /// Computes the next level, `None` once all planned levels are done.
    pub fn step(&mut self) -> Option<&DecompositionLevel> {
        let k = self.levels.len();
        if k >= self.planned {
            return None;
        }
        let filters = self.bank.level(k);
        let level = match &mut self.cursor {
            Cursor::Spatial(approx) => {
                let level = spatial::forward_level(approx.view(), &filters);
                approx.assign(level.approximation());
                level
            }
            Cursor::Frequency(state) => state.step(&filters, &mut self.diagnostics),
        };
        trace!(level = k, energy = level.detail_energy(), "level decomposed");
        self.levels.push(level);
        self.levels.last()
    }

    /// Runs the remaining levels and returns the full pyramid.
    pub fn finish(mut self) -> PyramidTransform {
        while self.step().is_some() {}
        self.interrupt()
    }

    /// Packages the levels completed so far, skipping the rest.
    pub fn interrupt(self) -> PyramidTransform {
        let coarse = match self.levels.last() {
            Some(level) => level.approximation().clone(),
            None => match self.cursor {
                Cursor::Spatial(approx) => approx,
                Cursor::Frequency(state) => state.into_image(),
            },
        };
        PyramidTransform::new(
            self.shape,
            self.bank,
            self.engine,
            self.levels,
            coarse,
            self.diagnostics,
        )
    }
}

/// Inverse transform over optional inputs, from level `details.len() - 1`
/// down to `stop`.
///
/// `None` inputs are zero. The result is the approximation fed into level
/// `stop` (the image itself for `stop = 0`); for `stop = details.len()` it is
/// `coarse` unchanged. Any diagnostic raised is returned alongside.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`WaveletError::ReconstructionLevel`] | `stop > details.len()` |
/// | [`WaveletError::ShapeMismatch`] | an input does not have `shape` |
pub fn synthesize<'a>(
    engine: Engine,
    bank: &FilterBank,
    shape: (usize, usize),
    coarse: Option<ArrayView2<'a, f64>>,
    details: &[DetailBands<'a>],
    stop: usize,
) -> Result<(Array2<f64>, Vec<Diagnostic>), WaveletError> {
    let n_levels = details.len();
    if stop > n_levels {
        return Err(WaveletError::ReconstructionLevel {
            requested: stop,
            levels: n_levels,
        });
    }
    for view in coarse.iter().chain(details.iter().flatten().flatten()) {
        if view.dim() != shape {
            return Err(WaveletError::ShapeMismatch {
                expected: shape,
                got: view.dim(),
            });
        }
    }

    let mut diagnostics = Vec::new();
    let image = match engine {
        Engine::Spatial => {
            let mut acc: Option<Array2<f64>> = coarse.map(|c| c.to_owned());
            for k in (stop..n_levels).rev() {
                let filters: LevelFilters = bank.level(k);
                let next =
                    spatial::inverse_level(acc.as_ref().map(|a| a.view()), &details[k], &filters);
                if next.is_some() {
                    acc = next;
                }
            }
            acc.unwrap_or_else(|| Array2::zeros(shape))
        }
        Engine::Frequency => {
            let filters: Vec<LevelFilters> = (0..n_levels).map(|k| bank.level(k)).collect();
            frequency::synthesize(shape, &filters, coarse, details, stop, &mut diagnostics)
        }
    };
    Ok((image, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::WaveletFilter;
    use ndarray::Array2;

    fn image(shape: (usize, usize)) -> Image {
        Image::new(Array2::from_shape_fn(shape, |(i, j)| (i * j) as f64 % 5.0)).unwrap()
    }

    #[test]
    fn engine_names() {
        assert_eq!(Engine::from_name("Spatial").unwrap(), Engine::Spatial);
        assert_eq!(Engine::from_name("frequency").unwrap(), Engine::Frequency);
        assert!(Engine::from_name("wavelet").is_err());
        assert_eq!(Engine::default(), Engine::Spatial);
    }

    #[test]
    fn step_stops_after_planned_levels() {
        let config = TransformConfig::new().with_levels(2);
        let mut run = Decomposer::new(&image((8, 8)), &config);
        assert_eq!(run.planned_levels(), 2);
        assert_eq!(run.step().map(|l| l.index()), Some(0));
        assert_eq!(run.step().map(|l| l.index()), Some(1));
        assert!(run.step().is_none());
        assert_eq!(run.completed(), 2);
    }

    #[test]
    fn interrupt_keeps_completed_levels() {
        let config = TransformConfig::new().with_levels(3);
        let mut run = Decomposer::new(&image((16, 16)), &config);
        run.step();
        let pyramid = run.interrupt();
        assert_eq!(pyramid.n_levels(), 1);
        assert_eq!(pyramid.coarse(), pyramid.levels()[0].approximation());
    }

    #[test]
    fn interrupt_before_first_level_returns_image() {
        for engine in [Engine::Spatial, Engine::Frequency] {
            let img = image((8, 8));
            let config = TransformConfig::new().with_engine(engine);
            let pyramid = Decomposer::new(&img, &config).interrupt();
            assert_eq!(pyramid.n_levels(), 0);
            for (a, b) in pyramid.coarse().iter().zip(img.as_array().iter()) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn synthesize_rejects_deep_stop() {
        let bank = FilterBank::default();
        let err = synthesize(Engine::Spatial, &bank, (4, 4), None, &[[None, None, None]], 2)
            .unwrap_err();
        assert_eq!(
            err,
            WaveletError::ReconstructionLevel {
                requested: 2,
                levels: 1
            }
        );
    }

    #[test]
    fn synthesize_rejects_wrong_shape() {
        let bank = FilterBank::new(WaveletFilter::Haar.into());
        let wrong = Array2::<f64>::zeros((4, 5));
        let err = synthesize(
            Engine::Frequency,
            &bank,
            (4, 4),
            None,
            &[[Some(wrong.view()), None, None]],
            0,
        )
        .unwrap_err();
        assert!(matches!(err, WaveletError::ShapeMismatch { got: (4, 5), .. }));
    }
}
