//! Dyadic ("a trous") filter banks.
//!
//! Level `k` uses the base taps spaced `2^k` samples apart. Every filter is
//! applied as a circular convolution `out[x] = sum_j c_j * in[(x - o_j) mod n]`,
//! so a level filter is just a list of `(offset, coeff)` taps. Analysis offsets
//! are `j * 2^k`; synthesis offsets are `(j - d) * 2^k`, where `d` is the
//! reconstruction delay of the [`FilterPair`].

use std::f64::consts::PI;

use num_complex::Complex64;
use tracing::warn;

use crate::filter::FilterPair;
use crate::pyramid::Diagnostic;

/// Whether a [`Taps`] set belongs to the analysis or the synthesis side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapRole {
    /// Forward (decomposition) filter.
    Analysis,
    /// Inverse (reconstruction) filter.
    Synthesis,
}

/// One dilated filter at one level, as offset/coefficient pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct Taps {
    role: TapRole,
    stride: usize,
    offsets: Vec<isize>,
    coeffs: Vec<f64>,
}

impl Taps {
    fn analysis(coeffs: &[f64], stride: usize) -> Self {
        Self {
            role: TapRole::Analysis,
            stride,
            offsets: (0..coeffs.len()).map(|j| (j * stride) as isize).collect(),
            coeffs: coeffs.to_vec(),
        }
    }

    fn synthesis(coeffs: &[f64], stride: usize, delay: usize) -> Self {
        Self {
            role: TapRole::Synthesis,
            stride,
            offsets: (0..coeffs.len())
                .map(|j| (j as isize - delay as isize) * stride as isize)
                .collect(),
            coeffs: coeffs.to_vec(),
        }
    }

    /// Analysis or synthesis.
    pub fn role(&self) -> TapRole {
        self.role
    }

    /// Spacing between consecutive taps (`2^k`).
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The signed convolution offsets.
    pub fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    /// The base coefficients, in their original order.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Length of the dilated kernel: `base_length * 2^k`.
    pub fn kernel_len(&self) -> usize {
        self.coeffs.len() * self.stride
    }

    /// The explicit dilated kernel with zeros between taps.
    ///
    /// Analysis kernels are reversed in time, so sliding them over the input
    /// as a correlation performs the convolution; synthesis kernels keep the
    /// original order.
    pub fn dense(&self) -> Vec<f64> {
        let n = self.coeffs.len();
        let mut kernel = vec![0.0; self.kernel_len()];
        for (j, &c) in self.coeffs.iter().enumerate() {
            let slot = match self.role {
                TapRole::Analysis => n - 1 - j,
                TapRole::Synthesis => j,
            };
            kernel[slot * self.stride] = c;
        }
        kernel
    }

    /// Offsets reduced modulo `n`, paired with their coefficients.
    pub(crate) fn wrapped(&self, n: usize) -> Vec<(usize, f64)> {
        self.offsets
            .iter()
            .zip(&self.coeffs)
            .map(|(&o, &c)| (o.rem_euclid(n as isize) as usize, c))
            .collect()
    }

    /// Frequency response on the `n`-point sampled unit circle:
    /// `T[l] = sum_j c_j exp(-2 pi i l o_j / n)`.
    pub fn transfer(&self, n: usize) -> Vec<Complex64> {
        let wrapped = self.wrapped(n);
        (0..n)
            .map(|l| {
                wrapped
                    .iter()
                    .map(|&(o, c)| {
                        let phase = -2.0 * PI * ((l * o) % n) as f64 / n as f64;
                        Complex64::from_polar(c, phase)
                    })
                    .sum()
            })
            .collect()
    }
}

/// The four filters used at one decomposition level.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelFilters {
    level: usize,
    analysis_lo: Taps,
    analysis_hi: Taps,
    synthesis_lo: Taps,
    synthesis_hi: Taps,
}

impl LevelFilters {
    /// Level index `k`.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Tap spacing `2^k`.
    pub fn stride(&self) -> usize {
        self.analysis_lo.stride()
    }

    /// Analysis low-pass.
    pub fn analysis_lo(&self) -> &Taps {
        &self.analysis_lo
    }

    /// Analysis high-pass.
    pub fn analysis_hi(&self) -> &Taps {
        &self.analysis_hi
    }

    /// Synthesis low-pass.
    pub fn synthesis_lo(&self) -> &Taps {
        &self.synthesis_lo
    }

    /// Synthesis high-pass.
    pub fn synthesis_hi(&self) -> &Taps {
        &self.synthesis_hi
    }
}

/// Returned by [`FilterBank::level_for`] when the level-`k` kernel is longer
/// than the smaller image dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CapacityExceeded {
    /// Level that was asked for.
    pub level: usize,
    /// Length of its dilated kernel.
    pub kernel_len: usize,
    /// Smaller image dimension.
    pub min_dim: usize,
}

/// Builds level filters from a base [`FilterPair`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterBank {
    pair: FilterPair,
}

impl FilterBank {
    /// Creates a bank for the given pair.
    pub fn new(pair: FilterPair) -> Self {
        Self { pair }
    }

    /// The base filter pair.
    pub fn pair(&self) -> &FilterPair {
        &self.pair
    }

    /// Kernel length at level `k`, `None` on overflow.
    pub fn kernel_len(&self, level: usize) -> Option<usize> {
        u32::try_from(level)
            .ok()
            .and_then(|shift| 1usize.checked_shl(shift))
            .and_then(|stride| stride.checked_mul(self.pair.base_length()))
    }

    /// Level filters for level `k`, without a capacity check.
    pub fn level(&self, level: usize) -> LevelFilters {
        let stride = 1usize << level;
        let delay = self.pair.delay();
        LevelFilters {
            level,
            analysis_lo: Taps::analysis(self.pair.dec_lo(), stride),
            analysis_hi: Taps::analysis(self.pair.dec_hi(), stride),
            synthesis_lo: Taps::synthesis(self.pair.rec_lo(), stride, delay),
            synthesis_hi: Taps::synthesis(self.pair.rec_hi(), stride, delay),
        }
    }

    /// Level filters for level `k` on an image of `shape`.
    ///
    /// Fails when the dilated kernel is longer than the smaller dimension.
    pub fn level_for(
        &self,
        level: usize,
        shape: (usize, usize),
    ) -> Result<LevelFilters, CapacityExceeded> {
        let min_dim = shape.0.min(shape.1);
        match self.kernel_len(level) {
            Some(len) if len <= min_dim => Ok(self.level(level)),
            len => Err(CapacityExceeded {
                level,
                kernel_len: len.unwrap_or(usize::MAX),
                min_dim,
            }),
        }
    }

    /// Number of levels an image of `shape` supports.
    pub fn max_levels(&self, shape: (usize, usize)) -> usize {
        (0..usize::BITS as usize)
            .take_while(|&k| self.level_for(k, shape).is_ok())
            .count()
    }

    /// Resolves a requested level count against the image shape.
    ///
    /// `None` selects the maximum. A request beyond the maximum is truncated
    /// and reported through the returned diagnostic.
    pub fn plan_levels(
        &self,
        requested: Option<usize>,
        shape: (usize, usize),
    ) -> (usize, Option<Diagnostic>) {
        let max = self.max_levels(shape);
        match requested {
            None => (max, None),
            Some(n) if n <= max => (n, None),
            Some(n) => {
                let min_dim = shape.0.min(shape.1);
                let kernel_len = self.kernel_len(max).unwrap_or(usize::MAX);
                warn!(
                    requested = n,
                    used = max,
                    kernel_len,
                    min_dim,
                    "level count capped by image size"
                );
                (
                    max,
                    Some(Diagnostic::LevelsCapped {
                        requested: n,
                        used: max,
                        kernel_len,
                        min_dim,
                    }),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::WaveletFilter;
    use approx::assert_relative_eq;

    fn bank(filter: WaveletFilter) -> FilterBank {
        FilterBank::new(filter.into())
    }

    #[test]
    fn kernel_length_doubles_per_level() {
        let b = bank(WaveletFilter::Db2);
        assert_eq!(b.kernel_len(0), Some(4));
        assert_eq!(b.kernel_len(3), Some(32));
        assert_eq!(b.level(3).analysis_lo().kernel_len(), 32);
        assert_eq!(b.kernel_len(200), None);
    }

    #[test]
    fn analysis_offsets_are_strided() {
        let f = bank(WaveletFilter::Db2).level(2);
        assert_eq!(f.stride(), 4);
        assert_eq!(f.analysis_lo().offsets(), &[0, 4, 8, 12]);
    }

    #[test]
    fn synthesis_offsets_include_delay() {
        let f = bank(WaveletFilter::Db2).level(1);
        assert_eq!(f.synthesis_lo().offsets(), &[-6, -4, -2, 0]);
        let h = bank(WaveletFilter::Haar).level(0);
        assert_eq!(h.synthesis_hi().offsets(), &[-1, 0]);
    }

    #[test]
    fn dense_analysis_is_reversed_and_dilated() {
        let f = bank(WaveletFilter::Db2).level(1);
        let h = WaveletFilter::Db2.scaling_coeffs();
        let dense = f.synthesis_lo().dense();
        assert_eq!(dense.len(), 8);
        assert_eq!(dense, vec![h[0], 0.0, h[1], 0.0, h[2], 0.0, h[3], 0.0]);
        // dec_lo is reverse(h); reversing again restores h.
        let dense = f.analysis_lo().dense();
        assert_eq!(dense, vec![h[0], 0.0, h[1], 0.0, h[2], 0.0, h[3], 0.0]);
    }

    #[test]
    fn wrapped_offsets_are_non_negative() {
        let f = bank(WaveletFilter::Haar).level(0);
        assert_eq!(f.synthesis_lo().wrapped(8)[0].0, 7);
    }

    #[test]
    fn transfer_at_dc_is_coefficient_sum() {
        let f = bank(WaveletFilter::Db3).level(2);
        let lo = f.analysis_lo().transfer(64);
        let hi = f.analysis_hi().transfer(64);
        assert_relative_eq!(lo[0].re, 2f64.sqrt(), epsilon = 1e-10);
        assert!(lo[0].im.abs() < 1e-12);
        assert!(hi[0].norm() < 1e-10);
    }

    #[test]
    fn transfer_satisfies_reconstruction_identity() {
        // S_lo A_lo + S_hi A_hi = 2 at every frequency.
        for filter in WaveletFilter::ALL {
            let f = bank(filter).level(1);
            let n = 32;
            let (al, ah) = (f.analysis_lo().transfer(n), f.analysis_hi().transfer(n));
            let (sl, sh) = (f.synthesis_lo().transfer(n), f.synthesis_hi().transfer(n));
            for l in 0..n {
                let total = sl[l] * al[l] + sh[l] * ah[l];
                assert_relative_eq!(total.re, 2.0, epsilon = 1e-9);
                assert!(total.im.abs() < 1e-9, "{filter:?} l={l}");
            }
        }
    }

    #[test]
    fn haar_16_supports_four_levels() {
        let b = bank(WaveletFilter::Haar);
        assert_eq!(b.max_levels((16, 16)), 4);
        assert_eq!(b.max_levels((16, 64)), 4);
        assert_eq!(b.max_levels((1, 64)), 0);
    }

    #[test]
    fn level_for_reports_capacity() {
        let b = bank(WaveletFilter::Db4);
        assert!(b.level_for(0, (8, 8)).is_ok());
        let err = b.level_for(1, (8, 8)).unwrap_err();
        assert_eq!(
            err,
            CapacityExceeded {
                level: 1,
                kernel_len: 16,
                min_dim: 8
            }
        );
    }

    #[test]
    fn plan_levels_caps_with_diagnostic() {
        let b = bank(WaveletFilter::Haar);
        assert_eq!(b.plan_levels(None, (16, 16)), (4, None));
        assert_eq!(b.plan_levels(Some(2), (16, 16)), (2, None));
        let (used, diag) = b.plan_levels(Some(9), (16, 16));
        assert_eq!(used, 4);
        assert_eq!(
            diag,
            Some(Diagnostic::LevelsCapped {
                requested: 9,
                used: 4,
                kernel_len: 32,
                min_dim: 16
            })
        );
    }
}
