//! # Ewma
//!
//! Exponentially-weighted mean of daily returns. Recent observations carry
//! more weight than old ones, which tracks drifting expected returns better
//! than the flat sample mean on the short windows this engine sees.

use ndarray::Array1;
use ndarray::Array2;

/// RiskMetrics daily decay factor.
pub const DEFAULT_DECAY: f64 = 0.94;

/// Column-wise exponentially-weighted mean with decay `lambda`.
///
/// Observation `t` out of `T` rows gets weight proportional to
/// `lambda^(T-1-t)`, so the last row is weighted highest; the weights are
/// normalized to sum to one.
pub fn ewma_mean(returns: &Array2<f64>, lambda: f64) -> Array1<f64> {
  assert!(
    lambda > 0.0 && lambda < 1.0,
    "decay factor must lie in (0, 1)"
  );
  let t = returns.nrows();
  assert!(t >= 1, "ewma_mean requires at least one observation");

  let mut weights = Array1::<f64>::zeros(t);
  for i in 0..t {
    weights[i] = lambda.powi((t - 1 - i) as i32);
  }
  let norm = weights.sum();

  let mut mu = Array1::<f64>::zeros(returns.ncols());
  for (j, col) in returns.columns().into_iter().enumerate() {
    mu[j] = col.dot(&weights) / norm;
  }
  mu
}
