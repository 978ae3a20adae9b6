//! # Metrics
//!
//! $$
//! \text{sharpe}=\frac{w'\mu-r_f}{\sqrt{w'\Sigma w}}
//! $$
//!
//! Derived performance figures for a weight vector. Zero-risk portfolios get
//! a sharpe of zero instead of a division error, and a zero classical sharpe
//! defines the relative improvement as zero.

use ndarray::Array1;
use ndarray::Array2;
use serde::Serialize;

use crate::optimize::portfolio_variance;
use crate::optimize::WeightVector;

/// Expected return, volatility and sharpe ratio of one allocation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PortfolioMetrics {
  pub expected_return: f64,
  /// Annualized standard deviation of portfolio returns.
  pub risk: f64,
  pub sharpe: f64,
}

/// Computes the metrics of `w` under the estimate `(mu, sigma)`.
pub fn portfolio_metrics(
  w: &WeightVector,
  mu: &Array1<f64>,
  sigma: &Array2<f64>,
  risk_free_rate: f64,
) -> PortfolioMetrics {
  let w = w.as_array();
  let expected_return = w.dot(mu);
  let risk = portfolio_variance(w, sigma).max(0.0).sqrt();
  let sharpe = if risk > 0.0 {
    (expected_return - risk_free_rate) / risk
  } else {
    0.0
  };
  PortfolioMetrics {
    expected_return,
    risk,
    sharpe,
  }
}

/// Relative sharpe improvement of the quantum-inspired portfolio over the
/// classical benchmark, in percent.
pub fn improvement_percent(quantum: &PortfolioMetrics, classical: &PortfolioMetrics) -> f64 {
  if classical.sharpe == 0.0 {
    return 0.0;
  }
  (quantum.sharpe - classical.sharpe) / classical.sharpe.abs() * 100.0
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;
  use ndarray::array;

  use super::improvement_percent;
  use super::portfolio_metrics;
  use super::PortfolioMetrics;
  use crate::optimize::WeightVector;

  #[test]
  fn matches_hand_computation() {
    let w = WeightVector::try_new(array![0.6, 0.4]).unwrap();
    let mu = array![0.10, 0.05];
    let sigma = array![[0.04, 0.00], [0.00, 0.01]];
    let m = portfolio_metrics(&w, &mu, &sigma, 0.0);
    assert_relative_eq!(m.expected_return, 0.08, max_relative = 1e-12);
    // sqrt(0.36*0.04 + 0.16*0.01)
    assert_relative_eq!(m.risk, 0.016_f64.sqrt(), max_relative = 1e-12);
    assert_relative_eq!(m.sharpe, 0.08 / 0.016_f64.sqrt(), max_relative = 1e-12);
  }

  #[test]
  fn risk_free_rate_enters_the_sharpe_only() {
    let w = WeightVector::try_new(array![0.5, 0.5]).unwrap();
    let mu = array![0.10, 0.10];
    let sigma = array![[0.04, 0.0], [0.0, 0.04]];
    let m = portfolio_metrics(&w, &mu, &sigma, 0.02);
    assert_relative_eq!(m.expected_return, 0.10, max_relative = 1e-12);
    assert_relative_eq!(m.sharpe, 0.08 / m.risk, max_relative = 1e-12);
  }

  #[test]
  fn zero_risk_means_zero_sharpe() {
    let w = WeightVector::try_new(array![0.0, 1.0]).unwrap();
    let mu = array![0.10, 0.05];
    let sigma = array![[0.04, 0.0], [0.0, 0.0]];
    let m = portfolio_metrics(&w, &mu, &sigma, 0.0);
    assert_abs_diff_eq!(m.risk, 0.0, epsilon = 1e-15);
    assert_abs_diff_eq!(m.sharpe, 0.0, epsilon = 1e-15);
  }

  #[test]
  fn equal_sharpe_means_zero_improvement() {
    let a = PortfolioMetrics {
      expected_return: 0.1,
      risk: 0.2,
      sharpe: 0.5,
    };
    assert_abs_diff_eq!(improvement_percent(&a, &a), 0.0, epsilon = 1e-15);
  }

  #[test]
  fn improvement_is_signed_and_guards_zero_base() {
    let quantum = PortfolioMetrics {
      expected_return: 0.12,
      risk: 0.2,
      sharpe: 0.6,
    };
    let classical = PortfolioMetrics {
      expected_return: 0.1,
      risk: 0.2,
      sharpe: 0.5,
    };
    assert_relative_eq!(
      improvement_percent(&quantum, &classical),
      20.0,
      max_relative = 1e-12
    );
    assert_relative_eq!(
      improvement_percent(&classical, &quantum),
      -100.0 / 6.0,
      max_relative = 1e-12
    );

    let flat = PortfolioMetrics {
      expected_return: 0.0,
      risk: 0.0,
      sharpe: 0.0,
    };
    assert_abs_diff_eq!(improvement_percent(&quantum, &flat), 0.0, epsilon = 1e-15);

    // A negative benchmark sharpe keeps the sign of the numerator.
    let negative = PortfolioMetrics {
      expected_return: -0.1,
      risk: 0.2,
      sharpe: -0.5,
    };
    assert_relative_eq!(
      improvement_percent(&quantum, &negative),
      220.0,
      max_relative = 1e-12
    );
  }
}
