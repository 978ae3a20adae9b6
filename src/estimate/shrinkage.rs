//! # Shrinkage
//!
//! $$
//! \hat\Sigma=(1-\delta^\*)S+\delta^\* m I,\qquad \delta^\*=\frac{b^2}{d^2}
//! $$
//!
//! Ledoit-Wolf shrinkage of the sample covariance toward a scaled identity.
//! With the 30-to-250-day windows this engine works on, the sample matrix is
//! noisy relative to the number of assets; blending it with `m I` keeps the
//! estimate well conditioned for the downstream quadratic programs.
//!
//! Source:
//! - Ledoit & Wolf (2004), "A well-conditioned estimator for
//!   large-dimensional covariance matrices"
//!   https://doi.org/10.1016/S0047-259X(03)00096-4

use ndarray::Array2;
use ndarray::Axis;

/// Sample covariance of the columns of `x`, normalized by the row count.
pub fn sample_covariance(x: &Array2<f64>) -> Array2<f64> {
  let t = x.nrows() as f64;
  let mean = x.sum_axis(Axis(0)) / t;
  let centered = x - &mean;
  centered.t().dot(&centered) / t
}

/// Shrunk covariance matrix and the shrinkage intensity `delta` in `[0, 1]`.
///
/// `delta = 0` keeps the sample covariance untouched (plenty of data),
/// `delta = 1` collapses it onto the scaled identity.
pub fn ledoit_wolf(returns: &Array2<f64>) -> (Array2<f64>, f64) {
  let t = returns.nrows() as f64;
  let n = returns.ncols() as f64;
  assert!(
    returns.nrows() >= 2,
    "ledoit_wolf requires at least 2 observations"
  );

  let mean = returns.sum_axis(Axis(0)) / t;
  let centered = returns - &mean;
  let s = centered.t().dot(&centered) / t;

  // Target scale: mean of the diagonal of S.
  let m = s.diag().sum() / n;

  // d^2 = ||S - m I||^2 under the normalized Frobenius norm <A,A>/n.
  let mut d2 = 0.0;
  for i in 0..s.nrows() {
    for j in 0..s.ncols() {
      let target = if i == j { m } else { 0.0 };
      d2 += (s[[i, j]] - target).powi(2);
    }
  }
  d2 /= n;

  // sum_t ||x_t x_t' - S||_F^2 = sum_t ||x_t||^4 - T ||S||_F^2,
  // since sum_t x_t x_t' = T S.
  let quartic: f64 = centered
    .rows()
    .into_iter()
    .map(|row| {
      let q = row.dot(&row);
      q * q
    })
    .sum();
  let s_frob2: f64 = s.iter().map(|v| v * v).sum();
  let b2_bar = ((quartic - t * s_frob2) / (t * t * n)).max(0.0);

  let b2 = b2_bar.min(d2);
  let delta = if d2 > f64::EPSILON { b2 / d2 } else { 0.0 };

  let mut shrunk = s * (1.0 - delta);
  for i in 0..shrunk.nrows() {
    shrunk[[i, i]] += delta * m;
  }

  // Exact symmetry for the quadratic forms downstream.
  let shrunk = (&shrunk + &shrunk.t()) * 0.5;

  (shrunk, delta)
}
