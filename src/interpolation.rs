//! One-dimensional interpolation and boundary extrapolation
//!
//! `Interp1d` fits an interpolant over `(x, y)` pairs and evaluates it inside
//! the fitted domain. Evaluation outside the domain is decided by the wrapper:
//! - `LinearExtrapolant` continues the boundary slope (used for section data)
//! - `FillExtrapolant` holds a constant value (used for the seafloor trace)
//!
//! Usage:
//! ```rust
//! use ctd_section::interpolation::{Interp1d, InterpolationKind, LinearExtrapolant, Interpolant};
//!
//! let f = Interp1d::fit(&[0.0, 1.0, 2.0], &[0.0, 10.0, 20.0], InterpolationKind::Linear)?;
//! let g = LinearExtrapolant::new(f);
//! assert_eq!(g.eval(3.0), 30.0);
//! # Ok::<(), ctd_section::SectionError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SectionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationKind {
    #[default]
    Linear,
    Nearest,
    Previous,
    Next,
    /// Natural cubic spline. Falls back to linear below three knots.
    Cubic,
}

impl FromStr for InterpolationKind {
    type Err = SectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "linear" | "slinear" => Ok(InterpolationKind::Linear),
            "nearest" => Ok(InterpolationKind::Nearest),
            "previous" | "zero" => Ok(InterpolationKind::Previous),
            "next" => Ok(InterpolationKind::Next),
            "cubic" => Ok(InterpolationKind::Cubic),
            other => Err(SectionError::UnknownInterpolationKind(other.to_string())),
        }
    }
}

impl fmt::Display for InterpolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InterpolationKind::Linear => "linear",
            InterpolationKind::Nearest => "nearest",
            InterpolationKind::Previous => "previous",
            InterpolationKind::Next => "next",
            InterpolationKind::Cubic => "cubic",
        };
        f.write_str(name)
    }
}

/// A fitted 1-D function that the extrapolation wrappers compose over.
pub trait Interpolant {
    /// Knot abscissae and ordinates, abscissae strictly increasing.
    fn knots(&self) -> (&[f64], &[f64]);

    /// Value at `x`. Outside the domain the result is implementation defined;
    /// wrap the interpolant to pick a boundary policy.
    fn eval(&self, x: f64) -> f64;

    fn domain(&self) -> (f64, f64) {
        let (xs, _) = self.knots();
        (xs[0], xs[xs.len() - 1])
    }

    fn eval_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.eval(x)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct Interp1d {
    xs: Vec<f64>,
    ys: Vec<f64>,
    kind: InterpolationKind,
    // Second derivatives at the knots, only filled for cubic fits.
    y2s: Vec<f64>,
}

impl Interp1d {
    /// Fit an interpolant over `(xs, ys)`.
    ///
    /// `xs` must be non-decreasing. Repeated abscissae (two stations at the
    /// same position) are merged into one knot holding the mean ordinate.
    pub fn fit(xs: &[f64], ys: &[f64], kind: InterpolationKind) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(SectionError::LengthMismatch {
                what: "interpolation ordinates".to_string(),
                expected: xs.len(),
                got: ys.len(),
            });
        }
        if xs.is_empty() {
            return Err(SectionError::InsufficientData(
                "cannot fit an interpolant to zero points".to_string(),
            ));
        }
        if let Some(i) = xs.iter().chain(ys).position(|v| !v.is_finite()) {
            return Err(SectionError::InvalidParameter(format!(
                "non-finite interpolation input at position {}",
                i % xs.len()
            )));
        }

        let mut knots_x: Vec<f64> = Vec::with_capacity(xs.len());
        let mut knots_y: Vec<f64> = Vec::with_capacity(ys.len());
        let mut run = 1.0;
        for i in 0..xs.len() {
            match knots_x.last() {
                Some(&last) if xs[i] < last => {
                    return Err(SectionError::NonMonotonicAxis {
                        axis: "interpolation".to_string(),
                        index: i,
                    });
                }
                Some(&last) if xs[i] == last => {
                    run += 1.0;
                    if let Some(mean) = knots_y.last_mut() {
                        *mean += (ys[i] - *mean) / run;
                    }
                }
                _ => {
                    knots_x.push(xs[i]);
                    knots_y.push(ys[i]);
                    run = 1.0;
                }
            }
        }

        let kind = if kind == InterpolationKind::Cubic && knots_x.len() < 3 {
            InterpolationKind::Linear
        } else {
            kind
        };

        let y2s = if kind == InterpolationKind::Cubic {
            natural_spline_second_derivatives(&knots_x, &knots_y)
        } else {
            Vec::new()
        };

        Ok(Interp1d {
            xs: knots_x,
            ys: knots_y,
            kind,
            y2s,
        })
    }

    /// Interpolation family actually used (cubic may have fallen back to linear).
    pub fn kind(&self) -> InterpolationKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

impl Interpolant for Interp1d {
    fn knots(&self) -> (&[f64], &[f64]) {
        (&self.xs, &self.ys)
    }

    /// Outside the domain the boundary knot value is returned. NaN in, NaN out.
    fn eval(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        let n = self.xs.len();
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        // First knot not below x; 1 <= hi <= n - 1 here
        let hi = self.xs.partition_point(|&v| v < x);
        let lo = hi - 1;
        if self.xs[hi] == x {
            return self.ys[hi];
        }

        let (x1, x2) = (self.xs[lo], self.xs[hi]);
        let (y1, y2) = (self.ys[lo], self.ys[hi]);

        match self.kind {
            InterpolationKind::Linear => {
                let t = (x - x1) / (x2 - x1);
                y1 + t * (y2 - y1)
            }
            InterpolationKind::Nearest => {
                if x - x1 <= x2 - x {
                    y1
                } else {
                    y2
                }
            }
            InterpolationKind::Previous => y1,
            InterpolationKind::Next => y2,
            InterpolationKind::Cubic => {
                let h = x2 - x1;
                let a = (x2 - x) / h;
                let b = (x - x1) / h;
                a * y1
                    + b * y2
                    + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h
                        / 6.0
            }
        }
    }
}

/// Second derivatives of the natural cubic spline through the knots.
fn natural_spline_second_derivatives(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let mut y2s = vec![0.0; n];
    let mut u = vec![0.0; n];

    for i in 1..n - 1 {
        let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
        let p = sig * y2s[i - 1] + 2.0;
        y2s[i] = (sig - 1.0) / p;
        let slope_diff = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
            - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
        u[i] = (6.0 * slope_diff / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
    }

    y2s[n - 1] = 0.0;
    for k in (0..n - 1).rev() {
        y2s[k] = y2s[k] * y2s[k + 1] + u[k];
    }
    y2s
}

/// Continues the wrapped interpolant past its domain along the slope of the
/// outermost knot interval on each side.
#[derive(Debug, Clone)]
pub struct LinearExtrapolant<I> {
    inner: I,
}

impl<I: Interpolant> LinearExtrapolant<I> {
    pub fn new(inner: I) -> Self {
        LinearExtrapolant { inner }
    }

    pub fn into_inner(self) -> I {
        self.inner
    }

    fn boundary_slope(&self, boundary: f64, inward: f64) -> f64 {
        let dx = inward - boundary;
        if dx == 0.0 {
            return 0.0;
        }
        (self.inner.eval(inward) - self.inner.eval(boundary)) / dx
    }
}

impl<I: Interpolant> Interpolant for LinearExtrapolant<I> {
    fn knots(&self) -> (&[f64], &[f64]) {
        self.inner.knots()
    }

    fn eval(&self, x: f64) -> f64 {
        let (xs, _) = self.inner.knots();
        let n = xs.len();
        let (x_min, x_max) = (xs[0], xs[n - 1]);

        if n < 2 || (x >= x_min && x <= x_max) {
            return self.inner.eval(x);
        }

        if x < x_min {
            let slope = self.boundary_slope(x_min, xs[1]);
            self.inner.eval(x_min) + slope * (x - x_min)
        } else {
            let slope = self.boundary_slope(x_max, xs[n - 2]);
            self.inner.eval(x_max) + slope * (x - x_max)
        }
    }
}

/// Holds constant values past the wrapped interpolant's domain.
#[derive(Debug, Clone)]
pub struct FillExtrapolant<I> {
    inner: I,
    below: f64,
    above: f64,
}

impl<I: Interpolant> FillExtrapolant<I> {
    /// Fill with explicit values below and above the domain.
    pub fn new(inner: I, below: f64, above: f64) -> Self {
        FillExtrapolant { inner, below, above }
    }

    /// Repeat the first knot value below the domain and the last one above it.
    pub fn flat(inner: I) -> Self {
        let (below, above) = {
            let (_, ys) = inner.knots();
            (ys[0], ys[ys.len() - 1])
        };
        FillExtrapolant { inner, below, above }
    }
}

impl<I: Interpolant> Interpolant for FillExtrapolant<I> {
    fn knots(&self) -> (&[f64], &[f64]) {
        self.inner.knots()
    }

    fn eval(&self, x: f64) -> f64 {
        let (x_min, x_max) = self.inner.domain();
        if x < x_min {
            self.below
        } else if x > x_max {
            self.above
        } else {
            self.inner.eval(x)
        }
    }
}
