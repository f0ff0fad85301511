//! Error types for the trous-wavelet crate.

/// Error type for all fallible operations in the trous-wavelet crate.
///
/// Only input-shape and wavelet problems are errors. Level capping and
/// spectral round-off are recovered and reported as
/// [`Diagnostic`](crate::Diagnostic)s instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WaveletError {
    /// Returned when the input array is not exactly two-dimensional.
    #[error("expected a 2-D single-channel array, got {ndim} dimensions")]
    NotTwoDimensional {
        /// Number of dimensions of the rejected array.
        ndim: usize,
    },

    /// Returned when one of the image dimensions is zero.
    #[error("image has a zero-length dimension: {rows}x{cols}")]
    EmptyDimension {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Returned when row-wise input has rows of different lengths.
    #[error("row {row} has {len} values, expected {expected}")]
    RaggedRows {
        /// Index of the offending row.
        row: usize,
        /// Its length.
        len: usize,
        /// Length of the first row.
        expected: usize,
    },

    /// Returned when the input data contains non-finite values (NaN or infinity).
    #[error("input data contains non-finite values")]
    NonFiniteData,

    /// Returned when an unsupported wavelet name is provided.
    #[error("unsupported wavelet filter: {0}")]
    UnsupportedFilter(String),

    /// Returned when explicit filter taps do not form a perfect-reconstruction bank.
    #[error("malformed filter taps: {0}")]
    MalformedFilter(String),

    /// Returned when a reconstruction level lies beyond the decomposition depth.
    #[error("reconstruction level {requested} exceeds decomposition depth {levels}")]
    ReconstructionLevel {
        /// Level that was requested.
        requested: usize,
        /// Number of levels in the pyramid.
        levels: usize,
    },

    /// Returned when arrays handed to the synthesis stage disagree in shape.
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Shape of the pyramid.
        expected: (usize, usize),
        /// Shape that was supplied.
        got: (usize, usize),
    },

    /// Returned when a configuration parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WaveletError {
    /// Returns `true` for errors caused by the shape or content of the input
    /// array rather than by the wavelet or configuration.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::NotTwoDimensional { .. }
                | Self::EmptyDimension { .. }
                | Self::RaggedRows { .. }
                | Self::NonFiniteData
                | Self::ShapeMismatch { .. }
        )
    }
}
