//! Validated 2-D input arrays.

use ndarray::{Array2, ArrayD, ArrayView2, Ix2};

use crate::error::WaveletError;

/// A validated single-channel image: two non-zero dimensions, finite values.
///
/// # Example
///
/// ```ignore
/// use ndarray::Array2;
/// use trous_wavelet::Image;
///
/// let img = Image::new(Array2::zeros((32, 48)))?;
/// assert_eq!(img.shape(), (32, 48));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    data: Array2<f64>,
}

impl Image {
    /// Wraps a 2-D array.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::EmptyDimension`] | a dimension is zero |
    /// | [`WaveletError::NonFiniteData`] | NaN or infinity present |
    pub fn new(data: Array2<f64>) -> Result<Self, WaveletError> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(WaveletError::EmptyDimension { rows, cols });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(WaveletError::NonFiniteData);
        }
        Ok(Self { data })
    }

    /// Wraps a dynamic-dimensional array, rejecting anything that is not 2-D.
    ///
    /// Multi-channel data arrives here as a 3-D array and is refused; the
    /// caller iterates over channels.
    ///
    /// # Errors
    ///
    /// [`WaveletError::NotTwoDimensional`], plus everything [`Image::new`] returns.
    pub fn from_dyn(data: ArrayD<f64>) -> Result<Self, WaveletError> {
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix2>()
            .map_err(|_| WaveletError::NotTwoDimensional { ndim })?;
        Self::new(data)
    }

    /// Builds an image from row vectors.
    ///
    /// # Errors
    ///
    /// [`WaveletError::RaggedRows`] if rows differ in length, plus everything
    /// [`Image::new`] returns.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, WaveletError> {
        let expected = rows.first().map_or(0, Vec::len);
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(WaveletError::RaggedRows {
                row,
                len: r.len(),
                expected,
            });
        }
        let data = Array2::from_shape_fn((rows.len(), expected), |(i, j)| rows[i][j]);
        Self::new(data)
    }

    /// A unit impulse at `(0, 0)`.
    ///
    /// # Errors
    ///
    /// [`WaveletError::EmptyDimension`] if a dimension is zero.
    pub fn impulse(shape: (usize, usize)) -> Result<Self, WaveletError> {
        let mut data = Array2::zeros(shape);
        if let Some(v) = data.get_mut((0, 0)) {
            *v = 1.0;
        }
        Self::new(data)
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Borrows the pixels.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Borrows the underlying array.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consumes the image, returning the array.
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}

impl TryFrom<Array2<f64>> for Image {
    type Error = WaveletError;

    fn try_from(data: Array2<f64>) -> Result<Self, Self::Error> {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{IxDyn, array};

    #[test]
    fn accepts_finite_2d() {
        let img = Image::new(array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(img.shape(), (2, 2));
        assert_eq!(img.view()[[1, 0]], 3.0);
    }

    #[test]
    fn rejects_zero_dimension() {
        let err = Image::new(Array2::zeros((0, 5))).unwrap_err();
        assert_eq!(err, WaveletError::EmptyDimension { rows: 0, cols: 5 });
    }

    #[test]
    fn rejects_nan() {
        let err = Image::new(array![[1.0, f64::NAN]]).unwrap_err();
        assert_eq!(err, WaveletError::NonFiniteData);
    }

    #[test]
    fn from_dyn_rejects_three_channels() {
        let data = ArrayD::<f64>::zeros(IxDyn(&[8, 8, 3]));
        let err = Image::from_dyn(data).unwrap_err();
        assert_eq!(err, WaveletError::NotTwoDimensional { ndim: 3 });
    }

    #[test]
    fn from_dyn_rejects_one_dimension() {
        let data = ArrayD::<f64>::zeros(IxDyn(&[16]));
        let err = Image::from_dyn(data).unwrap_err();
        assert_eq!(err, WaveletError::NotTwoDimensional { ndim: 1 });
    }

    #[test]
    fn from_dyn_accepts_two_dimensions() {
        let data = ArrayD::<f64>::zeros(IxDyn(&[4, 6]));
        assert_eq!(Image::from_dyn(data).unwrap().shape(), (4, 6));
    }

    #[test]
    fn from_rows_checks_lengths() {
        let ok = Image::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(ok.as_array(), &array![[1.0, 2.0], [3.0, 4.0]]);

        let err = Image::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            WaveletError::RaggedRows {
                row: 1,
                len: 1,
                expected: 2
            }
        );
        assert!(Image::from_rows(&[]).is_err());
    }

    #[test]
    fn impulse_has_single_unit_entry() {
        let img = Image::impulse((4, 5)).unwrap();
        assert_eq!(img.view()[[0, 0]], 1.0);
        assert_eq!(img.view().sum(), 1.0);
    }
}
