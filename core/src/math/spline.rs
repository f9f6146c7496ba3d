//! Not-a-knot cubic spline interpolation.
//!
//! The interpolant is the classic `C2` cubic spline whose third derivative is also
//! continuous across the second and the second-to-last knot. With four knots it
//! degenerates to the single cubic through all of them, so cubic polynomials are
//! reproduced exactly.
//!
//! The spline stores the second derivatives `M_i` at every knot. Eliminating `M_0`
//! and `M_{n-1}` through the not-a-knot conditions leaves a tridiagonal system in
//! `M_1 .. M_{n-2}` that is solved with the Thomas algorithm.

/// Smallest number of knots a not-a-knot cubic is defined for.
pub const MIN_KNOTS: usize = 4;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SplineError {
    #[error("cubic interpolation needs at least {MIN_KNOTS} points, got {0}")]
    TooFewPoints(usize),
    #[error("abscissa and ordinate lengths differ ({0} vs {1})")]
    LengthMismatch(usize, usize),
    #[error("abscissa must be strictly increasing (index {0})")]
    NotIncreasing(usize),
    #[error("non-finite value at index {0}")]
    NonFinite(usize),
    #[error("singular spline system")]
    Singular,
    #[error("{value} lies outside the interpolation range [{min}, {max}]")]
    OutOfRange { value: f64, min: f64, max: f64 },
}

#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    second: Vec<f64>,
}

impl CubicSpline {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch(x.len(), y.len()));
        }
        let n = x.len();
        if n < MIN_KNOTS {
            return Err(SplineError::TooFewPoints(n));
        }
        if let Some(idx) = x.iter().zip(y).position(|(a, b)| !a.is_finite() || !b.is_finite()) {
            return Err(SplineError::NonFinite(idx));
        }
        if let Some(idx) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SplineError::NotIncreasing(idx + 1));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        // Unknowns M_1 .. M_{n-2}.
        let k = n - 2;
        let mut sub = vec![0.0; k];
        let mut diag = vec![0.0; k];
        let mut sup = vec![0.0; k];
        let mut rhs = vec![0.0; k];
        for j in 0..k {
            let i = j + 1;
            sub[j] = h[i - 1];
            diag[j] = 2.0 * (h[i - 1] + h[i]);
            sup[j] = h[i];
            rhs[j] = 6.0 * (slope[i] - slope[i - 1]);
        }

        let (h0, h1) = (h[0], h[1]);
        diag[0] = (h0 + h1) * (h0 + 2.0 * h1) / h1;
        sup[0] = (h1 * h1 - h0 * h0) / h1;

        let (a, b) = (h[n - 3], h[n - 2]);
        sub[k - 1] = (a * a - b * b) / a;
        diag[k - 1] = (a + b) * (2.0 * a + b) / a;

        let inner = solve_tridiagonal(&sub, &diag, &sup, &rhs)?;

        let mut second = Vec::with_capacity(n);
        second.push(((h0 + h1) * inner[0] - h0 * inner[1]) / h1);
        second.extend_from_slice(&inner);
        second.push(((a + b) * inner[k - 1] - b * inner[k - 2]) / a);

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            second,
        })
    }

    /// Closed interval the spline is defined on.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn evaluate(&self, t: f64) -> Result<f64, SplineError> {
        let (min, max) = self.domain();
        if !(min..=max).contains(&t) {
            return Err(SplineError::OutOfRange { value: t, min, max });
        }

        let i = self
            .x
            .partition_point(|&knot| knot <= t)
            .saturating_sub(1)
            .min(self.x.len() - 2);
        let h = self.x[i + 1] - self.x[i];
        let a = (self.x[i + 1] - t) / h;
        let b = (t - self.x[i]) / h;

        Ok(a * self.y[i]
            + b * self.y[i + 1]
            + ((a * a * a - a) * self.second[i] + (b * b * b - b) * self.second[i + 1]) * h * h
                / 6.0)
    }
}

fn solve_tridiagonal(
    sub: &[f64],
    diag: &[f64],
    sup: &[f64],
    rhs: &[f64],
) -> Result<Vec<f64>, SplineError> {
    let n = diag.len();
    let mut c = vec![0.0; n];
    let mut d = vec![0.0; n];

    if diag[0] == 0.0 {
        return Err(SplineError::Singular);
    }
    c[0] = sup[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for i in 1..n {
        let pivot = diag[i] - sub[i] * c[i - 1];
        if pivot == 0.0 || !pivot.is_finite() {
            return Err(SplineError::Singular);
        }
        c[i] = sup[i] / pivot;
        d[i] = (rhs[i] - sub[i] * d[i - 1]) / pivot;
    }

    let mut out = vec![0.0; n];
    out[n - 1] = d[n - 1];
    for i in (0..n - 1).rev() {
        out[i] = d[i] - c[i] * out[i + 1];
    }
    Ok(out)
}
