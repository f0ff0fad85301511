//! Row/column-batched 2-D FFT on `ndarray` buffers.

use std::sync::Arc;

use ndarray::{Array2, ArrayView2, Axis, Zip};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

/// Planned forward and inverse 2-D transforms for one image shape.
///
/// Rows and columns are transformed lane by lane in parallel; the inverse is
/// normalised by `1 / (rows * cols)`.
#[derive(Clone)]
pub struct Fft2 {
    shape: (usize, usize),
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Fft2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft2").field("shape", &self.shape).finish()
    }
}

impl Fft2 {
    /// Plans transforms for `(rows, cols)`.
    pub fn new(shape: (usize, usize)) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            shape,
            row_forward: planner.plan_fft_forward(shape.1),
            row_inverse: planner.plan_fft_inverse(shape.1),
            col_forward: planner.plan_fft_forward(shape.0),
            col_inverse: planner.plan_fft_inverse(shape.0),
        }
    }

    /// The planned shape.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Spectrum of a real array.
    pub fn forward(&self, input: ArrayView2<'_, f64>) -> Array2<Complex64> {
        let mut data = input.mapv(|v| Complex64::new(v, 0.0));
        self.forward_in_place(&mut data);
        data
    }

    /// Forward transform in place.
    pub fn forward_in_place(&self, data: &mut Array2<Complex64>) {
        process_lanes(data, Axis(1), &self.row_forward);
        process_lanes(data, Axis(0), &self.col_forward);
    }

    /// Inverse transform, keeping the real part.
    ///
    /// Also returns the largest imaginary magnitude relative to
    /// `max(max |re|, 1)`, which is round-off for spectra of real signals.
    pub fn inverse(&self, mut spectrum: Array2<Complex64>) -> (Array2<f64>, f64) {
        process_lanes(&mut spectrum, Axis(1), &self.row_inverse);
        process_lanes(&mut spectrum, Axis(0), &self.col_inverse);
        let scale = 1.0 / (self.shape.0 * self.shape.1) as f64;
        let real = spectrum.mapv(|c| c.re * scale);
        let max_re = real.iter().fold(1.0_f64, |m, v| m.max(v.abs()));
        let max_im = spectrum.iter().fold(0.0_f64, |m, c| m.max((c.im * scale).abs()));
        (real, max_im / max_re)
    }
}

fn process_lanes(data: &mut Array2<Complex64>, axis: Axis, plan: &Arc<dyn Fft<f64>>) {
    Zip::from(data.lanes_mut(axis)).par_for_each(|mut lane| {
        let mut buffer: Vec<Complex64> = lane.to_vec();
        plan.process(&mut buffer);
        for (dst, src) in lane.iter_mut().zip(buffer) {
            *dst = src;
        }
    });
}
