//! Level-indexed subband storage.

use std::fmt;

use ndarray::{Array2, ArrayView2};

use crate::bank::FilterBank;
use crate::engine::{DetailBands, Engine, synthesize};
use crate::error::WaveletError;

/// Subband roles. Rows are the y axis, columns the x axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Band {
    /// Low-pass along both axes.
    Approximation,
    /// High-pass along y, low-pass along x (responds to horizontal edges).
    Horizontal,
    /// Low-pass along y, high-pass along x (responds to vertical edges).
    Vertical,
    /// High-pass along both axes.
    Diagonal,
}

impl Band {
    /// The three detail bands, in storage order.
    pub const DETAILS: [Band; 3] = [Band::Horizontal, Band::Vertical, Band::Diagonal];

    /// Lower-case name, used in file names and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approximation => "approximation",
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Diagonal => "diagonal",
        }
    }

    /// Position among [`Band::DETAILS`], `None` for the approximation.
    pub fn detail_index(&self) -> Option<usize> {
        match self {
            Self::Approximation => None,
            Self::Horizontal => Some(0),
            Self::Vertical => Some(1),
            Self::Diagonal => Some(2),
        }
    }
}

/// Something the transform recovered from instead of failing.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// More levels were requested than the image supports.
    LevelsCapped {
        /// Level count that was asked for.
        requested: usize,
        /// Level count actually used.
        used: usize,
        /// Kernel length of the first unsupported level.
        kernel_len: usize,
        /// Smaller image dimension.
        min_dim: usize,
    },
    /// An inverse FFT left an imaginary part above round-off; it was dropped.
    ImaginaryResidual {
        /// Level whose output carried the residual.
        level: usize,
        /// Largest imaginary magnitude relative to the real part.
        magnitude: f64,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelsCapped {
                requested,
                used,
                kernel_len,
                min_dim,
            } => write!(
                f,
                "requested {requested} levels, used {used}: \
                 next kernel length {kernel_len} exceeds {min_dim}"
            ),
            Self::ImaginaryResidual { level, magnitude } => {
                write!(f, "level {level}: imaginary residual {magnitude:e} dropped")
            }
        }
    }
}

/// The four subbands of one level. Every array has the source image's shape.
#[derive(Clone, Debug, PartialEq)]
pub struct DecompositionLevel {
    index: usize,
    approximation: Array2<f64>,
    horizontal: Array2<f64>,
    vertical: Array2<f64>,
    diagonal: Array2<f64>,
}

impl DecompositionLevel {
    pub(crate) fn new(
        index: usize,
        approximation: Array2<f64>,
        horizontal: Array2<f64>,
        vertical: Array2<f64>,
        diagonal: Array2<f64>,
    ) -> Self {
        Self {
            index,
            approximation,
            horizontal,
            vertical,
            diagonal,
        }
    }

    /// Level index `k`, 0 being the finest.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns one subband.
    pub fn band(&self, band: Band) -> &Array2<f64> {
        match band {
            Band::Approximation => &self.approximation,
            Band::Horizontal => &self.horizontal,
            Band::Vertical => &self.vertical,
            Band::Diagonal => &self.diagonal,
        }
    }

    /// Low-pass output, input of the next level.
    pub fn approximation(&self) -> &Array2<f64> {
        &self.approximation
    }

    /// Horizontal detail.
    pub fn horizontal(&self) -> &Array2<f64> {
        &self.horizontal
    }

    /// Vertical detail.
    pub fn vertical(&self) -> &Array2<f64> {
        &self.vertical
    }

    /// Diagonal detail.
    pub fn diagonal(&self) -> &Array2<f64> {
        &self.diagonal
    }

    /// Borrowed detail bands, ready for synthesis.
    pub fn details(&self) -> DetailBands<'_> {
        [
            Some(self.horizontal.view()),
            Some(self.vertical.view()),
            Some(self.diagonal.view()),
        ]
    }

    /// Sum of squares over the three detail bands.
    pub fn detail_energy(&self) -> f64 {
        Band::DETAILS
            .iter()
            .map(|&b| self.band(b).iter().map(|v| v * v).sum::<f64>())
            .sum()
    }
}

/// A full undecimated decomposition: levels finest to coarsest plus the
/// terminal approximation.
#[derive(Clone, Debug)]
pub struct PyramidTransform {
    shape: (usize, usize),
    bank: FilterBank,
    engine: Engine,
    levels: Vec<DecompositionLevel>,
    coarse: Array2<f64>,
    diagnostics: Vec<Diagnostic>,
}

impl PyramidTransform {
    pub(crate) fn new(
        shape: (usize, usize),
        bank: FilterBank,
        engine: Engine,
        levels: Vec<DecompositionLevel>,
        coarse: Array2<f64>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            shape,
            bank,
            engine,
            levels,
            coarse,
            diagnostics,
        }
    }

    /// Source image shape, shared by every subband.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of levels `L`.
    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    /// All levels, finest first.
    pub fn levels(&self) -> &[DecompositionLevel] {
        &self.levels
    }

    /// One level, `None` if out of range.
    pub fn level(&self, index: usize) -> Option<&DecompositionLevel> {
        self.levels.get(index)
    }

    /// The terminal approximation (the source image when `L = 0`).
    pub fn coarse(&self) -> &Array2<f64> {
        &self.coarse
    }

    /// The filter bank that produced the pyramid.
    pub fn filter_bank(&self) -> &FilterBank {
        &self.bank
    }

    /// The engine that produced the pyramid; reconstruction uses it too.
    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Recovered conditions, in the order they occurred.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Detail energy per level.
    pub fn detail_energy(&self) -> Vec<f64> {
        self.levels.iter().map(|l| l.detail_energy()).collect()
    }

    /// Borrowed detail bands of every level.
    pub fn details(&self) -> Vec<DetailBands<'_>> {
        self.levels.iter().map(|l| l.details()).collect()
    }

    /// Inverse transform down to `level` (default 0, the source resolution).
    ///
    /// Reconstructing to `r > 0` yields the approximation that was fed into
    /// level `r`; `r = L` returns the coarse approximation unchanged.
    /// Imaginary residuals of the frequency engine are only logged here; see
    /// [`reconstruct_with_diagnostics`](Self::reconstruct_with_diagnostics).
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::ReconstructionLevel`] | `level > L` |
    pub fn reconstruct(&self, level: Option<usize>) -> Result<Array2<f64>, WaveletError> {
        self.reconstruct_with_diagnostics(level).map(|(image, _)| image)
    }

    /// [`reconstruct`](Self::reconstruct), also returning the diagnostics the
    /// inverse transform raised.
    ///
    /// # Errors
    ///
    /// Same as [`reconstruct`](Self::reconstruct).
    pub fn reconstruct_with_diagnostics(
        &self,
        level: Option<usize>,
    ) -> Result<(Array2<f64>, Vec<Diagnostic>), WaveletError> {
        let details = self.details();
        synthesize(
            self.engine,
            &self.bank,
            self.shape,
            Some(self.coarse.view()),
            &details,
            level.unwrap_or(0),
        )
    }

    /// Contribution of one level's details to the source-resolution image.
    ///
    /// The components of all levels plus [`coarse_component`](Self::coarse_component)
    /// sum to the reconstruction.
    ///
    /// # Errors
    ///
    /// [`WaveletError::ReconstructionLevel`] if `level >= L`.
    pub fn component(&self, level: usize) -> Result<Array2<f64>, WaveletError> {
        self.component_with_diagnostics(level).map(|(image, _)| image)
    }

    /// [`component`](Self::component) with the diagnostics of its synthesis.
    ///
    /// # Errors
    ///
    /// Same as [`component`](Self::component).
    pub fn component_with_diagnostics(
        &self,
        level: usize,
    ) -> Result<(Array2<f64>, Vec<Diagnostic>), WaveletError> {
        let selected = self.levels.get(level).ok_or(WaveletError::ReconstructionLevel {
            requested: level,
            levels: self.levels.len(),
        })?;
        let mut details: Vec<DetailBands<'_>> = vec![[None, None, None]; self.levels.len()];
        details[level] = selected.details();
        synthesize(self.engine, &self.bank, self.shape, None, &details, 0)
    }

    /// Contribution of the coarse approximation alone.
    pub fn coarse_component(&self) -> Result<Array2<f64>, WaveletError> {
        self.coarse_component_with_diagnostics().map(|(image, _)| image)
    }

    /// [`coarse_component`](Self::coarse_component) with the diagnostics of
    /// its synthesis.
    pub fn coarse_component_with_diagnostics(
        &self,
    ) -> Result<(Array2<f64>, Vec<Diagnostic>), WaveletError> {
        let details: Vec<DetailBands<'_>> = vec![[None, None, None]; self.levels.len()];
        synthesize(
            self.engine,
            &self.bank,
            self.shape,
            Some(self.coarse.view()),
            &details,
            0,
        )
    }

    /// Approximation of level `k` as a view, `None` if out of range.
    pub fn approximation(&self, level: usize) -> Option<ArrayView2<'_, f64>> {
        self.levels.get(level).map(|l| l.approximation.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn level() -> DecompositionLevel {
        DecompositionLevel::new(
            2,
            array![[1.0, 1.0]],
            array![[1.0, -1.0]],
            array![[2.0, 0.0]],
            array![[0.0, 3.0]],
        )
    }

    #[test]
    fn band_names_and_indices() {
        assert_eq!(Band::Horizontal.name(), "horizontal");
        assert_eq!(Band::Approximation.detail_index(), None);
        for (i, band) in Band::DETAILS.iter().enumerate() {
            assert_eq!(band.detail_index(), Some(i));
        }
    }

    #[test]
    fn level_accessors() {
        let l = level();
        assert_eq!(l.index(), 2);
        assert_eq!(l.band(Band::Vertical), &array![[2.0, 0.0]]);
        assert_eq!(l.band(Band::Approximation), l.approximation());
        assert_eq!(l.detail_energy(), 2.0 + 4.0 + 9.0);
        assert!(l.details().iter().all(Option::is_some));
    }

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::LevelsCapped {
            requested: 9,
            used: 4,
            kernel_len: 32,
            min_dim: 16,
        };
        assert_eq!(
            d.to_string(),
            "requested 9 levels, used 4: next kernel length 32 exceeds 16"
        );
    }

    #[test]
    fn pyramid_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<PyramidTransform>();
        assert_impl::<DecompositionLevel>();
    }
}
