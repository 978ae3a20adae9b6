//! # Rebalance
//!
//! Maps continuous target weights onto concrete BUY/SELL/HOLD instructions
//! for a portfolio of share positions. The share delta per ticker is
//! `target_weight * total_value / latest_price - current_shares`; deltas
//! within an epsilon of zero are classified as HOLD so float noise never
//! generates a trade.

use ndarray::Array1;
use serde::Serialize;

use crate::error::EngineError;
use crate::error::Result;
use crate::optimize::WeightVector;

/// Default share-delta threshold below which a position is left alone.
pub const DEFAULT_TRADE_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
  Buy,
  Sell,
  Hold,
}

/// One rebalancing instruction. `amount` is in share units; use
/// [`Trade::notional`] for the currency view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trade {
  pub ticker: String,
  pub current_shares: f64,
  pub target_shares: f64,
  pub action: TradeAction,
  pub amount: f64,
}

impl Trade {
  /// Trade size in currency at the given price.
  pub fn notional(&self, latest_price: f64) -> f64 {
    self.amount * latest_price
  }
}

/// Market value of the current positions at the latest prices.
pub fn portfolio_value(current_shares: &Array1<f64>, latest_prices: &Array1<f64>) -> f64 {
  current_shares.dot(latest_prices)
}

/// Converts target weights into per-ticker trades.
///
/// `total_value` is the capital being allocated: the market value of the
/// current positions when rebalancing, or the investment amount when
/// starting from cash (all `current_shares` zero).
pub fn rebalance(
  tickers: &[String],
  current_shares: &Array1<f64>,
  target_weights: &WeightVector,
  latest_prices: &Array1<f64>,
  total_value: f64,
  epsilon: f64,
) -> Result<Vec<Trade>> {
  let n = tickers.len();
  if current_shares.len() != n || target_weights.len() != n || latest_prices.len() != n {
    return Err(EngineError::ShapeMismatch {
      expected: format!("{n} shares, weights and prices"),
      got: format!(
        "{} shares, {} weights, {} prices",
        current_shares.len(),
        target_weights.len(),
        latest_prices.len()
      ),
    });
  }
  if !total_value.is_finite() || total_value <= 0.0 {
    return Err(EngineError::InvalidRequest(format!(
      "total portfolio value must be positive, got {total_value}"
    )));
  }
  if latest_prices.iter().any(|&p| p <= 0.0) {
    return Err(EngineError::DegenerateInput(
      "latest prices must be strictly positive".to_string(),
    ));
  }

  let trades = tickers
    .iter()
    .enumerate()
    .map(|(i, ticker)| {
      let target_shares = target_weights.as_array()[i] * total_value / latest_prices[i];
      let delta = target_shares - current_shares[i];
      let action = if delta > epsilon {
        TradeAction::Buy
      } else if delta < -epsilon {
        TradeAction::Sell
      } else {
        TradeAction::Hold
      };
      Trade {
        ticker: ticker.clone(),
        current_shares: current_shares[i],
        target_shares,
        action,
        amount: delta.abs(),
      }
    })
    .collect();

  Ok(trades)
}
