//! The PURE-LET shrinkage nonlinearity and its analytic derivatives.
//!
//! With a smooth magnitude surrogate `w = y tanh(k y)` and a local variance
//! `t = scale * w + variance`,
//!
//! ```text
//! theta(x, y) = x * (1 - exp(-u)),   u = (x^2 / (r^2 t))^(p/2)
//! ```
//!
//! shrinks `x` toward zero when it is small against `r sqrt(t)` and tends to
//! the identity for large `|x|`.

use crate::error::DenoiseError;

/// Floor applied to the local variance `t`.
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// Parameters of one threshold evaluation (one band of one level).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThresholdParameters {
    variance: f64,
    scale: f64,
    steepness: f64,
    ratio: f64,
    exponent: u32,
}

impl Default for ThresholdParameters {
    fn default() -> Self {
        Self {
            variance: 0.0,
            scale: 0.0,
            steepness: 1e3,
            ratio: 12f64.sqrt(),
            exponent: 8,
        }
    }
}

impl ThresholdParameters {
    /// Creates parameters for a band with Gaussian noise `variance` (in the
    /// band domain) and signal-dependent `scale` (Poisson part).
    ///
    /// Shape defaults: `steepness = 1e3`, `ratio = sqrt(12)`, `exponent = 8`.
    pub fn new(variance: f64, scale: f64) -> Self {
        Self {
            variance,
            scale,
            ..Self::default()
        }
    }

    /// Same shape, new noise terms.
    pub fn with_noise(self, variance: f64, scale: f64) -> Self {
        Self {
            variance,
            scale,
            ..self
        }
    }

    /// Sets `k` in `w = y tanh(k y)`.
    pub fn with_steepness(mut self, steepness: f64) -> Self {
        self.steepness = steepness;
        self
    }

    /// Sets `r`, the threshold position in units of the local deviation.
    pub fn with_ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }

    /// Sets the even exponent `p`.
    pub fn with_exponent(mut self, exponent: u32) -> Self {
        self.exponent = exponent;
        self
    }

    /// Returns the Gaussian variance term.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Returns the signal-dependent scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Returns the surrogate steepness `k`.
    pub fn steepness(&self) -> f64 {
        self.steepness
    }

    /// Returns the ratio `r`.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Returns the exponent `p`.
    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`DenoiseError::InvalidThreshold`] for a non-finite or negative
    /// variance/scale, a non-positive steepness or ratio, or an exponent that
    /// is zero or odd.
    pub fn validate(&self) -> Result<(), DenoiseError> {
        for (name, v) in [("variance", self.variance), ("scale", self.scale)] {
            if !v.is_finite() || v < 0.0 {
                return Err(DenoiseError::InvalidThreshold(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        for (name, v) in [("steepness", self.steepness), ("ratio", self.ratio)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(DenoiseError::InvalidThreshold(format!(
                    "{name} must be finite and > 0, got {v}"
                )));
            }
        }
        if self.exponent == 0 || self.exponent % 2 != 0 {
            return Err(DenoiseError::InvalidThreshold(format!(
                "exponent must be even and > 0, got {}",
                self.exponent
            )));
        }
        Ok(())
    }

    /// Evaluates `theta` and its partial derivatives at `(x, y)`.
    ///
    /// Derivatives in `y` are taken through `w(y)`. A variance below
    /// [`VARIANCE_FLOOR`] is clamped (and the `y` derivatives vanish there);
    /// any non-finite result is replaced by zero.
    pub fn evaluate(&self, x: f64, y: f64) -> ThresholdDerivatives {
        let h = f64::from(self.exponent / 2);
        let k = self.steepness;

        let th = (k * y).tanh();
        let sech2 = 1.0 - th * th;
        let w = y * th;
        let w_y = th + k * y * sech2;
        let w_yy = 2.0 * k * sech2 - 2.0 * k * k * y * sech2 * th;

        let t_raw = self.scale * w + self.variance;
        let clamped = t_raw < VARIANCE_FLOOR;
        let t = if clamped { VARIANCE_FLOOR } else { t_raw };

        let c = 1.0 / (self.ratio * self.ratio * t);
        let v = c * x * x;
        let v_hm1 = v.powf(h - 1.0);
        let u = v_hm1 * v;
        let e = (-u).exp();

        let u_x = 2.0 * h * c * x * v_hm1;
        let u_xx = 2.0 * h * c * (2.0 * h - 1.0) * v_hm1;
        let u_t = -h * u / t;
        let u_tt = h * (h + 1.0) * u / (t * t);
        let u_xt = -h * u_x / t;

        let value = x * (1.0 - e);
        let dx = 1.0 - e + damp(e, x * u_x);
        let d2x = damp(e, 2.0 * u_x + x * u_xx - x * u_x * u_x);

        let (dy, dxdy, d2y) = if clamped {
            (0.0, 0.0, 0.0)
        } else {
            let d_t = damp(e, x * u_t);
            let d_tt = damp(e, x * (u_tt - u_t * u_t));
            let d_xt = damp(e, u_t + x * u_xt - x * u_x * u_t);
            let g = self.scale * w_y;
            (
                d_t * g,
                d_xt * g,
                d_tt * g * g + d_t * self.scale * w_yy,
            )
        };

        ThresholdDerivatives {
            value,
            dx,
            dy,
            dxdy,
            d2x,
            d2y,
        }
        .sanitized()
    }

    /// Evaluates `theta` only.
    pub fn value(&self, x: f64, y: f64) -> f64 {
        self.evaluate(x, y).value
    }
}

/// `e * f`, or zero once `e` has underflowed.
fn damp(e: f64, f: f64) -> f64 {
    if e == 0.0 { 0.0 } else { e * f }
}

/// `theta` and its first and second partial derivatives at one point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThresholdDerivatives {
    /// `theta(x, y)`.
    pub value: f64,
    /// `d theta / dx`.
    pub dx: f64,
    /// `d theta / dy`.
    pub dy: f64,
    /// `d^2 theta / dx dy`.
    pub dxdy: f64,
    /// `d^2 theta / dx^2`.
    pub d2x: f64,
    /// `d^2 theta / dy^2`.
    pub d2y: f64,
}

impl ThresholdDerivatives {
    /// The identity map `theta(x, y) = x`.
    pub fn identity(x: f64) -> Self {
        Self {
            value: x,
            dx: 1.0,
            ..Self::default()
        }
    }

    fn sanitized(self) -> Self {
        let clean = |v: f64| if v.is_finite() { v } else { 0.0 };
        Self {
            value: clean(self.value),
            dx: clean(self.dx),
            dy: clean(self.dy),
            dxdy: clean(self.dxdy),
            d2x: clean(self.d2x),
            d2y: clean(self.d2y),
        }
    }
}
