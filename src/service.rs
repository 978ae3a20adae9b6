//! # Service
//!
//! Orchestration of one optimization request: estimate, run both weight
//! searches, derive metrics, and (for existing portfolios) turn target
//! weights into trades. Both public workflows are thin adapters over the
//! same internal engine path, so "new" and "existing" portfolios can never
//! diverge in optimization logic. The service is stateless; every
//! intermediate lives only for the duration of the call.

use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use ndarray::Array1;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::error::EngineError;
use crate::error::Result;
use crate::estimate;
use crate::estimate::ReturnCovarianceEstimate;
use crate::market::Holding;
use crate::market::PriceMatrix;
use crate::metrics::improvement_percent;
use crate::metrics::portfolio_metrics;
use crate::metrics::PortfolioMetrics;
use crate::optimize::classical;
use crate::optimize::classical::ClassicalConfig;
use crate::optimize::quantum;
use crate::optimize::quantum::QuantumInspiredConfig;
use crate::optimize::WeightVector;
use crate::rebalance::portfolio_value;
use crate::rebalance::rebalance;
use crate::rebalance::Trade;
use crate::rebalance::DEFAULT_TRADE_EPSILON;

/// Request to build a portfolio from scratch out of `investment_amount`.
#[derive(Clone, Debug, Deserialize)]
pub struct NewPortfolioRequest {
  pub tickers: Vec<String>,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub risk_tolerance: f64,
  pub investment_amount: f64,
}

/// Request to rebalance existing positions.
#[derive(Clone, Debug, Deserialize)]
pub struct ExistingPortfolioRequest {
  pub holdings: Vec<Holding>,
  pub start_date: NaiveDate,
  pub end_date: NaiveDate,
  pub risk_tolerance: f64,
}

/// One optimizer's allocation with its metrics.
#[derive(Clone, Debug, Serialize)]
pub struct AllocationReport {
  pub weights: Vec<f64>,
  pub expected_return: f64,
  pub risk: f64,
  pub sharpe: f64,
}

impl AllocationReport {
  fn from_parts(weights: &WeightVector, metrics: &PortfolioMetrics) -> Self {
    Self {
      weights: weights.to_vec(),
      expected_return: metrics.expected_return,
      risk: metrics.risk,
      sharpe: metrics.sharpe,
    }
  }
}

/// Estimation inputs echoed back for the caller's charts and audits.
#[derive(Clone, Debug, Serialize)]
pub struct CalculationDetails {
  pub tickers: Vec<String>,
  pub expected_returns: Vec<f64>,
  pub covariance_matrix: Vec<Vec<f64>>,
  /// Ledoit-Wolf shrinkage intensity applied to the sample covariance.
  pub shrinkage: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewPortfolioResponse {
  pub tickers: Vec<String>,
  pub classical: AllocationReport,
  pub quantum: AllocationReport,
  pub improvement_percent: f64,
  /// Orders that build each target allocation from cash.
  pub classical_trades: Vec<Trade>,
  pub quantum_trades: Vec<Trade>,
  pub calculation_details: CalculationDetails,
}

#[derive(Clone, Debug, Serialize)]
pub struct ExistingPortfolioResponse {
  pub quantum_trades: Vec<Trade>,
  pub classical_trades: Vec<Trade>,
  pub current_portfolio_metrics: PortfolioMetrics,
  pub quantum_portfolio_metrics: PortfolioMetrics,
  pub classical_portfolio_metrics: PortfolioMetrics,
  pub improvement_percent: f64,
}

/// The engine's entry point for the API layer.
#[derive(ImplNew, Clone, Debug)]
pub struct OptimizationService {
  pub classical: ClassicalConfig,
  pub quantum: QuantumInspiredConfig,
  pub risk_free_rate: f64,
  pub trade_epsilon: f64,
}

impl Default for OptimizationService {
  fn default() -> Self {
    Self {
      classical: ClassicalConfig::default(),
      quantum: QuantumInspiredConfig::default(),
      risk_free_rate: 0.0,
      trade_epsilon: DEFAULT_TRADE_EPSILON,
    }
  }
}

struct EngineRun {
  estimate: ReturnCovarianceEstimate,
  classical_weights: WeightVector,
  quantum_weights: WeightVector,
  classical_metrics: PortfolioMetrics,
  quantum_metrics: PortfolioMetrics,
  improvement_percent: f64,
}

impl OptimizationService {
  /// Optimizes a from-scratch portfolio and prices the resulting buy lists
  /// off the latest closes and the investment amount.
  pub fn optimize_new(
    &self,
    request: &NewPortfolioRequest,
    prices: &PriceMatrix,
  ) -> Result<NewPortfolioResponse> {
    validate_risk_tolerance(request.risk_tolerance)?;
    validate_date_range(request.start_date, request.end_date)?;
    if !request.investment_amount.is_finite() || request.investment_amount <= 0.0 {
      return Err(EngineError::InvalidRequest(format!(
        "investment amount must be positive, got {}",
        request.investment_amount
      )));
    }
    if request.tickers != prices.tickers() {
      return Err(EngineError::InvalidRequest(
        "price matrix columns do not match the requested tickers".to_string(),
      ));
    }

    let run = self.run_engine(prices, request.risk_tolerance)?;

    let latest = prices.latest_prices();
    let from_cash = Array1::zeros(prices.n_assets());
    let classical_trades = rebalance(
      prices.tickers(),
      &from_cash,
      &run.classical_weights,
      &latest,
      request.investment_amount,
      self.trade_epsilon,
    )?;
    let quantum_trades = rebalance(
      prices.tickers(),
      &from_cash,
      &run.quantum_weights,
      &latest,
      request.investment_amount,
      self.trade_epsilon,
    )?;

    Ok(NewPortfolioResponse {
      tickers: prices.tickers().to_vec(),
      classical: AllocationReport::from_parts(&run.classical_weights, &run.classical_metrics),
      quantum: AllocationReport::from_parts(&run.quantum_weights, &run.quantum_metrics),
      improvement_percent: run.improvement_percent,
      classical_trades,
      quantum_trades,
      calculation_details: calculation_details(prices, &run.estimate),
    })
  }

  /// Optimizes an existing portfolio and recommends the trades that move it
  /// to each target allocation.
  pub fn optimize_existing(
    &self,
    request: &ExistingPortfolioRequest,
    prices: &PriceMatrix,
  ) -> Result<ExistingPortfolioResponse> {
    validate_risk_tolerance(request.risk_tolerance)?;
    validate_date_range(request.start_date, request.end_date)?;

    let current_shares = align_holdings(&request.holdings, prices)?;
    let latest = prices.latest_prices();
    let total_value = portfolio_value(&current_shares, &latest);
    if total_value <= 0.0 {
      return Err(EngineError::InvalidRequest(
        "existing portfolio has zero market value".to_string(),
      ));
    }
    let current_weights = WeightVector::try_new(&current_shares * &latest / total_value)?;

    let run = self.run_engine(prices, request.risk_tolerance)?;

    let current_portfolio_metrics = portfolio_metrics(
      &current_weights,
      &run.estimate.mu,
      &run.estimate.sigma,
      self.risk_free_rate,
    );

    let quantum_trades = rebalance(
      prices.tickers(),
      &current_shares,
      &run.quantum_weights,
      &latest,
      total_value,
      self.trade_epsilon,
    )?;
    let classical_trades = rebalance(
      prices.tickers(),
      &current_shares,
      &run.classical_weights,
      &latest,
      total_value,
      self.trade_epsilon,
    )?;

    Ok(ExistingPortfolioResponse {
      quantum_trades,
      classical_trades,
      current_portfolio_metrics,
      quantum_portfolio_metrics: run.quantum_metrics,
      classical_portfolio_metrics: run.classical_metrics,
      improvement_percent: run.improvement_percent,
    })
  }

  /// The shared engine path: estimate, run both optimizers in parallel,
  /// derive metrics.
  fn run_engine(&self, prices: &PriceMatrix, risk_tolerance: f64) -> Result<EngineRun> {
    let est = estimate::estimate(prices)?;
    debug!(
      assets = est.n_assets(),
      shrinkage = est.shrinkage,
      "estimated return and covariance"
    );

    // Independent searches over the same read-only estimate.
    let (classical_solution, quantum_solution) = rayon::join(
      || classical::optimize(&est.sigma, &self.classical),
      || quantum::optimize(&est.mu, &est.sigma, risk_tolerance, &self.quantum),
    );

    let classical_metrics = portfolio_metrics(
      &classical_solution.weights,
      &est.mu,
      &est.sigma,
      self.risk_free_rate,
    );
    let quantum_metrics = portfolio_metrics(
      &quantum_solution.weights,
      &est.mu,
      &est.sigma,
      self.risk_free_rate,
    );
    let improvement = improvement_percent(&quantum_metrics, &classical_metrics);

    info!(
      classical_converged = classical_solution.converged,
      classical_sharpe = classical_metrics.sharpe,
      quantum_sharpe = quantum_metrics.sharpe,
      improvement_percent = improvement,
      "optimization run complete"
    );

    Ok(EngineRun {
      estimate: est,
      classical_weights: classical_solution.weights,
      quantum_weights: quantum_solution.weights,
      classical_metrics,
      quantum_metrics,
      improvement_percent: improvement,
    })
  }
}

fn validate_risk_tolerance(risk_tolerance: f64) -> Result<()> {
  if !(0.0..=1.0).contains(&risk_tolerance) {
    return Err(EngineError::InvalidRequest(format!(
      "risk tolerance must lie in [0, 1], got {risk_tolerance}"
    )));
  }
  Ok(())
}

fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
  if start >= end {
    return Err(EngineError::InvalidRequest(format!(
      "start date {start} must precede end date {end}"
    )));
  }
  Ok(())
}

/// Share counts in price-matrix column order. Every holding must map to a
/// column and every column must be held exactly once.
fn align_holdings(holdings: &[Holding], prices: &PriceMatrix) -> Result<Array1<f64>> {
  if holdings.len() != prices.n_assets() {
    return Err(EngineError::InvalidRequest(format!(
      "expected one holding per price column, got {} holdings for {} columns",
      holdings.len(),
      prices.n_assets()
    )));
  }

  let mut shares = Array1::from_elem(prices.n_assets(), f64::NAN);
  for holding in holdings {
    if !holding.shares.is_finite() || holding.shares < 0.0 {
      return Err(EngineError::InvalidRequest(format!(
        "holding {} has invalid share count {}",
        holding.ticker, holding.shares
      )));
    }
    let column = prices.column_index(&holding.ticker).ok_or_else(|| {
      EngineError::InvalidRequest(format!(
        "holding {} has no column in the price matrix",
        holding.ticker
      ))
    })?;
    if shares[column].is_finite() {
      return Err(EngineError::InvalidRequest(format!(
        "duplicate holding for ticker {}",
        holding.ticker
      )));
    }
    shares[column] = holding.shares;
  }
  Ok(shares)
}

fn calculation_details(prices: &PriceMatrix, est: &ReturnCovarianceEstimate) -> CalculationDetails {
  CalculationDetails {
    tickers: prices.tickers().to_vec(),
    expected_returns: est.mu.to_vec(),
    covariance_matrix: est
      .sigma
      .rows()
      .into_iter()
      .map(|row| row.to_vec())
      .collect(),
    shrinkage: est.shrinkage,
  }
}
