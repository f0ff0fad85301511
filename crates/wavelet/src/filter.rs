//! Wavelet filter definitions and perfect-reconstruction filter pairs.

use std::f64::consts::FRAC_1_SQRT_2;

use crate::error::WaveletError;

/// Absolute tolerance on the perfect-reconstruction product of explicit taps.
const PR_TOLERANCE: f64 = 1e-8;

const HAAR: [f64; 2] = [FRAC_1_SQRT_2, FRAC_1_SQRT_2];

const DB2: [f64; 4] = [
    0.48296291314453416,
    0.8365163037378079,
    0.2241438680420134,
    -0.12940952255126037,
];

const DB3: [f64; 6] = [
    0.33267055295008263,
    0.8068915093110925,
    0.45987750211849154,
    -0.13501102001025458,
    -0.08544127388202666,
    0.03522629188570953,
];

const DB4: [f64; 8] = [
    0.2303778133088965,
    0.7148465705529157,
    0.6308807679298589,
    -0.027983769416859854,
    -0.18703481171909309,
    0.030841381835560764,
    0.0328830116668852,
    -0.010597401785069032,
];

const SYM4: [f64; 8] = [
    0.032223100604051466,
    -0.012603967262031304,
    -0.09921954357663353,
    0.29785779560530606,
    0.8037387518051321,
    0.497618667632775,
    -0.029635527646002493,
    -0.07576571478950221,
];

const COIF1: [f64; 6] = [
    -0.015655728135791993,
    -0.07273261951252645,
    0.3848648468648577,
    0.8525720202116004,
    0.33789766245748176,
    -0.07273261951252645,
];

/// Built-in orthogonal wavelets.
///
/// # Example
///
/// ```ignore
/// use trous_wavelet::WaveletFilter;
///
/// let filter = WaveletFilter::Db2;
/// assert_eq!(filter.length(), 4);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveletFilter {
    /// Haar wavelet (length 2). Also known as `db1`.
    #[default]
    Haar,
    /// Daubechies wavelet with 2 vanishing moments (length 4).
    Db2,
    /// Daubechies wavelet with 3 vanishing moments (length 6).
    Db3,
    /// Daubechies wavelet with 4 vanishing moments (length 8).
    Db4,
    /// Symlet with 4 vanishing moments (length 8).
    Sym4,
    /// Coiflet of order 1 (length 6).
    Coif1,
}

impl WaveletFilter {
    /// All presets, in order of increasing support.
    pub const ALL: [WaveletFilter; 6] = [
        Self::Haar,
        Self::Db2,
        Self::Db3,
        Self::Coif1,
        Self::Db4,
        Self::Sym4,
    ];

    /// Returns the filter length (number of coefficients).
    pub fn length(&self) -> usize {
        self.scaling_coeffs().len()
    }

    /// Returns the canonical lower-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Haar => "haar",
            Self::Db2 => "db2",
            Self::Db3 => "db3",
            Self::Db4 => "db4",
            Self::Sym4 => "sym4",
            Self::Coif1 => "coif1",
        }
    }

    /// Returns the scaling (father wavelet) coefficients, normalised to unit
    /// energy and summing to `sqrt(2)`.
    pub fn scaling_coeffs(&self) -> &'static [f64] {
        match self {
            Self::Haar => &HAAR,
            Self::Db2 => &DB2,
            Self::Db3 => &DB3,
            Self::Db4 => &DB4,
            Self::Sym4 => &SYM4,
            Self::Coif1 => &COIF1,
        }
    }

    /// Returns the wavelet (mother wavelet) coefficients.
    ///
    /// Derived from the scaling coefficients via the quadrature mirror
    /// relation `g[n] = (-1)^n h[N-1-n]`.
    pub fn wavelet_coeffs(&self) -> Vec<f64> {
        quadrature_mirror(self.scaling_coeffs())
    }

    /// Parses a wavelet filter from a case-insensitive name string.
    ///
    /// # Supported Names
    ///
    /// | Input | Filter |
    /// |-------|--------|
    /// | `"haar"`, `"db1"` | [`WaveletFilter::Haar`] |
    /// | `"db2"` | [`WaveletFilter::Db2`] |
    /// | `"db3"` | [`WaveletFilter::Db3`] |
    /// | `"db4"` | [`WaveletFilter::Db4`] |
    /// | `"sym4"` | [`WaveletFilter::Sym4`] |
    /// | `"coif1"` | [`WaveletFilter::Coif1`] |
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::UnsupportedFilter`] if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self, WaveletError> {
        match name.trim().to_lowercase().as_str() {
            "haar" | "db1" => Ok(Self::Haar),
            "db2" => Ok(Self::Db2),
            "db3" => Ok(Self::Db3),
            "db4" => Ok(Self::Db4),
            "sym4" => Ok(Self::Sym4),
            "coif1" => Ok(Self::Coif1),
            _ => Err(WaveletError::UnsupportedFilter(name.to_string())),
        }
    }
}

fn quadrature_mirror(h: &[f64]) -> Vec<f64> {
    let n = h.len();
    (0..n)
        .map(|i| {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            sign * h[n - 1 - i]
        })
        .collect()
}

fn reversed(taps: &[f64]) -> Vec<f64> {
    taps.iter().rev().copied().collect()
}

/// A perfect-reconstruction filter bank: analysis and synthesis low/high-pass
/// sequences plus the delay their combined response introduces.
///
/// Immutable once built. Construct from a preset (`FilterPair::from(WaveletFilter::Db2)`),
/// from an orthogonal scaling filter, or from four explicit sequences.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterPair {
    name: String,
    dec_lo: Vec<f64>,
    dec_hi: Vec<f64>,
    rec_lo: Vec<f64>,
    rec_hi: Vec<f64>,
    delay: usize,
}

impl FilterPair {
    /// Builds a pair from four explicit sequences.
    ///
    /// The sequences must satisfy
    /// `rec_lo * dec_lo + rec_hi * dec_hi = 2 z^-d` (polynomial product) for
    /// a single delay `d`, which is what makes the undecimated transform
    /// invertible.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`WaveletError::MalformedFilter`] | empty, odd-length or non-finite taps |
    /// | [`WaveletError::MalformedFilter`] | the four sequences do not reconstruct perfectly |
    pub fn new(
        dec_lo: Vec<f64>,
        dec_hi: Vec<f64>,
        rec_lo: Vec<f64>,
        rec_hi: Vec<f64>,
    ) -> Result<Self, WaveletError> {
        for (label, taps) in [
            ("dec_lo", &dec_lo),
            ("dec_hi", &dec_hi),
            ("rec_lo", &rec_lo),
            ("rec_hi", &rec_hi),
        ] {
            if taps.is_empty() {
                return Err(WaveletError::MalformedFilter(format!("{label} is empty")));
            }
            if taps.len() % 2 != 0 {
                return Err(WaveletError::MalformedFilter(format!(
                    "{label} has odd length {}",
                    taps.len()
                )));
            }
            if taps.iter().any(|c| !c.is_finite()) {
                return Err(WaveletError::MalformedFilter(format!(
                    "{label} contains non-finite taps"
                )));
            }
        }
        let delay = reconstruction_delay(&dec_lo, &dec_hi, &rec_lo, &rec_hi)?;
        Ok(Self {
            name: "custom".to_string(),
            dec_lo,
            dec_hi,
            rec_lo,
            rec_hi,
            delay,
        })
    }

    /// Builds the orthogonal pair generated by a scaling filter `h`.
    ///
    /// `rec_lo = h`, `rec_hi[n] = (-1)^n h[N-1-n]`, and the analysis filters
    /// are their time reversals.
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::MalformedFilter`] if `h` is not an orthonormal
    /// scaling filter.
    pub fn orthogonal(scaling: &[f64]) -> Result<Self, WaveletError> {
        let rec_lo = scaling.to_vec();
        let rec_hi = quadrature_mirror(scaling);
        Self::new(reversed(&rec_lo), reversed(&rec_hi), rec_lo, rec_hi)
    }

    /// Looks up a preset by name and builds its pair.
    ///
    /// # Errors
    ///
    /// Returns [`WaveletError::UnsupportedFilter`] if the name is not recognized.
    pub fn from_name(name: &str) -> Result<Self, WaveletError> {
        WaveletFilter::from_name(name).map(Self::from)
    }

    /// Returns a short label: the preset name, or `"custom"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Analysis low-pass taps.
    pub fn dec_lo(&self) -> &[f64] {
        &self.dec_lo
    }

    /// Analysis high-pass taps.
    pub fn dec_hi(&self) -> &[f64] {
        &self.dec_hi
    }

    /// Synthesis low-pass taps.
    pub fn rec_lo(&self) -> &[f64] {
        &self.rec_lo
    }

    /// Synthesis high-pass taps.
    pub fn rec_hi(&self) -> &[f64] {
        &self.rec_hi
    }

    /// Delay `d` of the combined analysis/synthesis response `2 z^-d`.
    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Length of the longest of the four sequences.
    pub fn base_length(&self) -> usize {
        [&self.dec_lo, &self.dec_hi, &self.rec_lo, &self.rec_hi]
            .iter()
            .map(|t| t.len())
            .max()
            .unwrap_or(0)
    }
}

impl From<WaveletFilter> for FilterPair {
    fn from(filter: WaveletFilter) -> Self {
        let rec_lo = filter.scaling_coeffs().to_vec();
        let rec_hi = filter.wavelet_coeffs();
        Self {
            name: filter.name().to_string(),
            dec_lo: reversed(&rec_lo),
            dec_hi: reversed(&rec_hi),
            delay: rec_lo.len() - 1,
            rec_lo,
            rec_hi,
        }
    }
}

impl Default for FilterPair {
    /// The Haar pair.
    fn default() -> Self {
        Self::from(WaveletFilter::Haar)
    }
}

/// Finds `d` such that `rec_lo * dec_lo + rec_hi * dec_hi = 2 z^-d`.
fn reconstruction_delay(
    dec_lo: &[f64],
    dec_hi: &[f64],
    rec_lo: &[f64],
    rec_hi: &[f64],
) -> Result<usize, WaveletError> {
    let len = (rec_lo.len() + dec_lo.len()).max(rec_hi.len() + dec_hi.len()) - 1;
    let mut product = vec![0.0; len];
    for (a, b) in [(rec_lo, dec_lo), (rec_hi, dec_hi)] {
        for (i, &x) in a.iter().enumerate() {
            for (j, &y) in b.iter().enumerate() {
                product[i + j] += x * y;
            }
        }
    }

    let (delay, peak) = product
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(i, &v)| (i, v))
        .unwrap_or((0, 0.0));

    if (peak - 2.0).abs() > PR_TOLERANCE {
        return Err(WaveletError::MalformedFilter(format!(
            "no perfect reconstruction: combined response peaks at {peak}, expected 2"
        )));
    }
    if let Some((i, v)) = product
        .iter()
        .enumerate()
        .find(|&(i, v)| i != delay && v.abs() > PR_TOLERANCE)
    {
        return Err(WaveletError::MalformedFilter(format!(
            "no perfect reconstruction: residual {v} at lag {i}"
        )));
    }
    Ok(delay)
}
