//! # Optimize
//!
//! $$
//! \Delta^{n-1}=\{w\in\mathbb{R}^n: w_i\ge 0,\ \textstyle\sum_i w_i=1\}
//! $$
//!
//! The two competing weight searches over the long-only, fully-invested
//! simplex: the deterministic global-minimum-variance benchmark and the
//! quantum-inspired randomized search. Both consume the same `(mu, sigma)`
//! estimate and return a [`WeightVector`]; neither holds state between
//! requests.

pub mod classical;
pub mod quantum;

use ndarray::Array1;
use ndarray::Array2;

use crate::error::EngineError;
use crate::error::Result;

/// Tolerance on `sum(w) == 1` accepted from callers.
pub const WEIGHT_SUM_TOL: f64 = 1e-6;

/// Negative float noise tolerated in otherwise non-negative weights.
pub const WEIGHT_NEG_TOL: f64 = 1e-9;

/// A point on the weight simplex: non-negative entries summing to one.
///
/// Construction normalizes away float noise once; the vector is immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightVector(Array1<f64>);

impl WeightVector {
  pub fn try_new(raw: Array1<f64>) -> Result<Self> {
    if raw.is_empty() {
      return Err(EngineError::DegenerateInput(
        "weight vector must not be empty".to_string(),
      ));
    }
    if raw.iter().any(|w| !w.is_finite() || *w < -WEIGHT_NEG_TOL) {
      return Err(EngineError::DegenerateInput(
        "weights must be finite and non-negative".to_string(),
      ));
    }
    let clamped = raw.mapv(|w| w.max(0.0));
    let sum = clamped.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
      return Err(EngineError::DegenerateInput(format!(
        "weights must sum to 1, got {sum}"
      )));
    }
    Ok(Self(clamped / sum))
  }

  /// Equal-weight allocation, `1/n` per asset.
  pub fn equal(n: usize) -> Self {
    assert!(n >= 1, "equal weights need at least one asset");
    Self(Array1::from_elem(n, 1.0 / n as f64))
  }

  /// Internal constructor for vectors already on the simplex by
  /// construction (projection or normalized sampling).
  pub(crate) fn from_simplex(w: Array1<f64>) -> Self {
    debug_assert!(w.iter().all(|&x| x >= 0.0));
    debug_assert!((w.sum() - 1.0).abs() <= WEIGHT_SUM_TOL);
    Self(w)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn as_array(&self) -> &Array1<f64> {
    &self.0
  }

  pub fn to_vec(&self) -> Vec<f64> {
    self.0.to_vec()
  }
}

/// `w' \Sigma w`, the portfolio variance under covariance `sigma`.
pub(crate) fn portfolio_variance(w: &Array1<f64>, sigma: &Array2<f64>) -> f64 {
  w.dot(&sigma.dot(w))
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use ndarray::array;
  use ndarray::Array1;

  use super::portfolio_variance;
  use super::WeightVector;

  #[test]
  fn equal_weights_sum_to_one() {
    let w = WeightVector::equal(4);
    assert_relative_eq!(w.as_array().sum(), 1.0, max_relative = 1e-12);
    assert_relative_eq!(w.as_array()[0], 0.25, max_relative = 1e-12);
  }

  #[test]
  fn try_new_clamps_float_noise() {
    let w = WeightVector::try_new(array![0.5, 0.5 + 1e-10, -1e-10]).unwrap();
    assert!(w.as_array().iter().all(|&x| x >= 0.0));
    assert_relative_eq!(w.as_array().sum(), 1.0, max_relative = 1e-12);
  }

  #[test]
  fn try_new_rejects_bad_vectors() {
    assert!(WeightVector::try_new(Array1::zeros(0)).is_err());
    assert!(WeightVector::try_new(array![0.7, 0.2]).is_err());
    assert!(WeightVector::try_new(array![1.2, -0.2]).is_err());
    assert!(WeightVector::try_new(array![f64::NAN, 1.0]).is_err());
  }

  #[test]
  fn variance_of_known_portfolio() {
    let sigma = array![[0.04, 0.01], [0.01, 0.09]];
    let w = array![0.5, 0.5];
    // 0.25*0.04 + 0.25*0.09 + 2*0.25*0.01
    assert_relative_eq!(portfolio_variance(&w, &sigma), 0.0375, max_relative = 1e-12);
  }
}
