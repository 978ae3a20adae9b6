//! # Estimate
//!
//! $$
//! \hat\mu=252\cdot\sum_t \lambda^{T-1-t} r_t/\sum_t\lambda^{T-1-t},\qquad
//! \hat\Sigma=252\cdot\left[(1-\delta)S+\delta\, m I\right]
//! $$
//!
//! Turns a price matrix into annualized return and covariance estimates.
//! Expected returns use an exponentially-weighted mean of simple daily
//! returns; the covariance is the Ledoit-Wolf shrinkage of the sample
//! covariance toward a scaled identity. Pure functions of their input.

pub mod ewma;
pub mod shrinkage;

use ndarray::Array1;
use ndarray::Array2;

use crate::error::EngineError;
use crate::error::Result;
use crate::market::PriceMatrix;
use crate::market::TRADING_DAYS_PER_YEAR;

/// Annualized expected returns and covariance for one ticker universe.
///
/// Invariants: `mu.len() == sigma.nrows() == sigma.ncols()`, `sigma`
/// symmetric with a non-negative diagonal, `shrinkage` in `[0, 1]`.
#[derive(Clone, Debug)]
pub struct ReturnCovarianceEstimate {
  /// Annualized expected return per ticker.
  pub mu: Array1<f64>,
  /// Annualized covariance matrix, ticker by ticker.
  pub sigma: Array2<f64>,
  /// Ledoit-Wolf shrinkage intensity applied to the sample covariance.
  pub shrinkage: f64,
}

impl ReturnCovarianceEstimate {
  pub fn n_assets(&self) -> usize {
    self.mu.len()
  }
}

/// Estimates `(mu, sigma)` from aligned daily closes.
///
/// The price matrix has already enforced the minimum history length and the
/// absence of missing observations; this step only rejects universes whose
/// return history carries no variance at all, which would make every
/// downstream optimization degenerate.
pub fn estimate(prices: &PriceMatrix) -> Result<ReturnCovarianceEstimate> {
  let returns = prices.daily_returns();

  if returns.iter().all(|r| r.abs() < f64::EPSILON) {
    return Err(EngineError::DegenerateInput(
      "all assets have zero return variance over the requested range".to_string(),
    ));
  }

  let mu = ewma::ewma_mean(&returns, ewma::DEFAULT_DECAY) * TRADING_DAYS_PER_YEAR;
  let (daily_sigma, shrinkage) = shrinkage::ledoit_wolf(&returns);
  let sigma = daily_sigma * TRADING_DAYS_PER_YEAR;

  debug_assert_eq!(mu.len(), sigma.nrows());
  debug_assert_eq!(sigma.nrows(), sigma.ncols());

  Ok(ReturnCovarianceEstimate {
    mu,
    sigma,
    shrinkage,
  })
}
