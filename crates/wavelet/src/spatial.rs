//! Direct separable convolution engine with periodic borders.
//!
//! The x pass filters along rows (axis 1), the y pass along columns
//! (axis 0). Lanes are independent, so both passes run lane-parallel.

use ndarray::{Array2, ArrayView2, Axis, Zip};

use crate::bank::{LevelFilters, Taps};
use crate::engine::DetailBands;
use crate::pyramid::DecompositionLevel;

/// Circular convolution of every lane along `axis` with `taps`.
pub(crate) fn convolve_axis(input: ArrayView2<'_, f64>, taps: &Taps, axis: Axis) -> Array2<f64> {
    let n = input.len_of(axis);
    let wrapped = taps.wrapped(n);
    let mut out = Array2::zeros(input.raw_dim());
    Zip::from(out.lanes_mut(axis))
        .and(input.lanes(axis))
        .par_for_each(|mut dst, src| {
            for (x, slot) in dst.iter_mut().enumerate() {
                let mut acc = 0.0;
                for &(shift, c) in &wrapped {
                    let mut idx = x + n - shift;
                    if idx >= n {
                        idx -= n;
                    }
                    acc += c * src[idx];
                }
                *slot = acc;
            }
        });
    out
}

fn add_assign(acc: &mut Option<Array2<f64>>, term: Array2<f64>) {
    match acc {
        Some(a) => *a += &term,
        None => *acc = Some(term),
    }
}

/// One forward level: splits `approx` into the next approximation and three
/// details.
pub(crate) fn forward_level(
    approx: ArrayView2<'_, f64>,
    filters: &LevelFilters,
) -> DecompositionLevel {
    let (lo_x, hi_x) = rayon::join(
        || convolve_axis(approx, filters.analysis_lo(), Axis(1)),
        || convolve_axis(approx, filters.analysis_hi(), Axis(1)),
    );
    let ((next, horizontal), (vertical, diagonal)) = rayon::join(
        || {
            (
                convolve_axis(lo_x.view(), filters.analysis_lo(), Axis(0)),
                convolve_axis(lo_x.view(), filters.analysis_hi(), Axis(0)),
            )
        },
        || {
            (
                convolve_axis(hi_x.view(), filters.analysis_lo(), Axis(0)),
                convolve_axis(hi_x.view(), filters.analysis_hi(), Axis(0)),
            )
        },
    );
    DecompositionLevel::new(filters.level(), next, horizontal, vertical, diagonal)
}

/// One inverse level: `(S_ll A + S_hl H + S_lh V + S_hh D) / 4`.
///
/// Missing inputs count as zero. Returns `None` when every input is missing.
pub(crate) fn inverse_level(
    approx: Option<ArrayView2<'_, f64>>,
    bands: &DetailBands<'_>,
    filters: &LevelFilters,
) -> Option<Array2<f64>> {
    let [horizontal, vertical, diagonal] = bands;
    let (rec_lo, rec_hi) = (filters.synthesis_lo(), filters.synthesis_hi());

    // Group by the y filter: low-pass along y carries A and V, high-pass H and D.
    let mut lo_y = None;
    let mut hi_y = None;
    if let Some(a) = approx {
        add_assign(&mut lo_y, convolve_axis(a, rec_lo, Axis(1)));
    }
    if let Some(v) = vertical {
        add_assign(&mut lo_y, convolve_axis(*v, rec_hi, Axis(1)));
    }
    if let Some(h) = horizontal {
        add_assign(&mut hi_y, convolve_axis(*h, rec_lo, Axis(1)));
    }
    if let Some(d) = diagonal {
        add_assign(&mut hi_y, convolve_axis(*d, rec_hi, Axis(1)));
    }

    let mut out = None;
    if let Some(t) = lo_y {
        add_assign(&mut out, convolve_axis(t.view(), rec_lo, Axis(0)));
    }
    if let Some(t) = hi_y {
        add_assign(&mut out, convolve_axis(t.view(), rec_hi, Axis(0)));
    }
    out.map(|mut o| {
        o.mapv_inplace(|v| v * 0.25);
        o
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::FilterBank;
    use crate::filter::WaveletFilter;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn convolve_rows_wraps_around() {
        let filters = FilterBank::new(WaveletFilter::Haar.into()).level(0);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let x = array![[1.0, 2.0, 3.0, 4.0]];
        let out = convolve_axis(x.view(), filters.analysis_lo(), Axis(1));
        // out[x] = s * in[x] + s * in[x - 1]
        let expected = array![[5.0 * s, 3.0 * s, 5.0 * s, 7.0 * s]];
        for (a, b) in out.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn convolve_columns_matches_transposed_rows() {
        let filters = FilterBank::new(WaveletFilter::Db2.into()).level(1);
        let x = Array2::from_shape_fn((8, 5), |(i, j)| ((i * 7 + j * 3) % 11) as f64);
        let cols = convolve_axis(x.view(), filters.analysis_hi(), Axis(0));
        let rows = convolve_axis(x.t(), filters.analysis_hi(), Axis(1));
        for (a, b) in cols.iter().zip(rows.t().iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn one_level_round_trip() {
        let filters = FilterBank::new(WaveletFilter::Db3.into()).level(0);
        let x = Array2::from_shape_fn((12, 10), |(i, j)| (i as f64 * 0.3).sin() + j as f64);
        let level = forward_level(x.view(), &filters);
        let back =
            inverse_level(Some(level.approximation().view()), &level.details(), &filters).unwrap();
        for (a, b) in back.iter().zip(x.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn constant_image_has_no_detail() {
        let filters = FilterBank::new(WaveletFilter::Sym4.into()).level(1);
        let x = Array2::from_elem((16, 16), 3.0);
        let level = forward_level(x.view(), &filters);
        assert!(level.detail_energy() < 1e-20);
        // Low-pass DC gain is sqrt(2) per axis.
        assert_abs_diff_eq!(level.approximation()[[4, 4]], 6.0, epsilon = 1e-10);
    }

    #[test]
    fn inverse_of_nothing_is_none() {
        let filters = FilterBank::default().level(0);
        assert!(inverse_level(None, &[None, None, None], &filters).is_none());
    }
}
