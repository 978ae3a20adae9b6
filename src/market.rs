//! # Market
//!
//! Input data model for one optimization request: a validated matrix of
//! aligned daily closing prices and the caller's current holdings. The
//! engine performs no market-data I/O; the price matrix arrives from an
//! external collaborator already aligned and free of gaps.

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray::Slice;
use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineError;
use crate::error::Result;

/// Minimum number of aligned trading days required for estimation.
pub const MIN_TRADING_DAYS: usize = 30;

/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Aligned daily closing prices, one column per ticker.
///
/// Rows are trading days in calendar order. Validation happens once at
/// construction; afterwards the matrix is immutable.
#[derive(Clone, Debug)]
pub struct PriceMatrix {
  tickers: Vec<String>,
  calendar: Vec<NaiveDate>,
  closes: Array2<f64>,
}

impl PriceMatrix {
  pub fn try_new(
    tickers: Vec<String>,
    calendar: Vec<NaiveDate>,
    closes: Array2<f64>,
  ) -> Result<Self> {
    if tickers.len() < 2 {
      return Err(EngineError::DegenerateInput(format!(
        "a portfolio needs at least 2 tickers, got {}",
        tickers.len()
      )));
    }

    if closes.ncols() != tickers.len() {
      return Err(EngineError::ShapeMismatch {
        expected: format!("{} price columns", tickers.len()),
        got: format!("{}", closes.ncols()),
      });
    }

    if calendar.len() != closes.nrows() {
      return Err(EngineError::ShapeMismatch {
        expected: format!("{} calendar entries", closes.nrows()),
        got: format!("{}", calendar.len()),
      });
    }

    if closes.nrows() < MIN_TRADING_DAYS {
      return Err(EngineError::InsufficientData {
        rows: closes.nrows(),
        required: MIN_TRADING_DAYS,
      });
    }

    if calendar.windows(2).any(|w| w[0] >= w[1]) {
      return Err(EngineError::DegenerateInput(
        "trading-day calendar must be strictly increasing".to_string(),
      ));
    }

    // A NaN close is a missing observation the collaborator failed to fill.
    if closes.iter().any(|p| !p.is_finite()) {
      return Err(EngineError::InsufficientData {
        rows: closes.iter().filter(|p| p.is_finite()).count() / tickers.len(),
        required: MIN_TRADING_DAYS,
      });
    }

    if closes.iter().any(|&p| p <= 0.0) {
      return Err(EngineError::DegenerateInput(
        "all prices must be strictly positive".to_string(),
      ));
    }

    Ok(Self {
      tickers,
      calendar,
      closes,
    })
  }

  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  pub fn calendar(&self) -> &[NaiveDate] {
    &self.calendar
  }

  pub fn n_assets(&self) -> usize {
    self.tickers.len()
  }

  pub fn n_days(&self) -> usize {
    self.closes.nrows()
  }

  /// Column index of `ticker`, if present.
  pub fn column_index(&self, ticker: &str) -> Option<usize> {
    self.tickers.iter().position(|t| t == ticker)
  }

  /// Simple daily returns `p[t] / p[t-1] - 1`, one row fewer than prices.
  pub fn daily_returns(&self) -> Array2<f64> {
    let t = self.closes.nrows();
    let curr = self.closes.slice_axis(Axis(0), Slice::from(1..t));
    let prev = self.closes.slice_axis(Axis(0), Slice::from(0..t - 1));
    &curr / &prev - 1.0
  }

  /// Closing prices of the most recent trading day.
  pub fn latest_prices(&self) -> Array1<f64> {
    self.closes.row(self.closes.nrows() - 1).to_owned()
  }
}

/// A current position held by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
  pub ticker: String,
  pub shares: f64,
}

impl Holding {
  pub fn try_new(ticker: impl Into<String>, shares: f64) -> Result<Self> {
    let ticker = ticker.into();
    if !shares.is_finite() || shares < 0.0 {
      return Err(EngineError::InvalidRequest(format!(
        "holding {} has invalid share count {}",
        ticker, shares
      )));
    }
    Ok(Self { ticker, shares })
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use chrono::Duration;
  use chrono::NaiveDate;
  use ndarray::array;
  use ndarray::Array2;

  use super::Holding;
  use super::PriceMatrix;
  use super::MIN_TRADING_DAYS;
  use crate::error::EngineError;

  fn trading_days(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    (0..n).map(|i| start + Duration::days(i as i64)).collect()
  }

  fn matrix_of(rows: usize, base: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn((rows, base.len()), |(i, j)| base[j] + i as f64)
  }

  #[test]
  fn accepts_valid_matrix() {
    let m = PriceMatrix::try_new(
      vec!["AAPL".into(), "MSFT".into()],
      trading_days(40),
      matrix_of(40, &[150.0, 300.0]),
    )
    .unwrap();
    assert_eq!(m.n_assets(), 2);
    assert_eq!(m.n_days(), 40);
    assert_eq!(m.column_index("MSFT"), Some(1));
    assert_eq!(m.column_index("GOOG"), None);
  }

  #[test]
  fn rejects_single_ticker() {
    let err = PriceMatrix::try_new(
      vec!["AAPL".into()],
      trading_days(40),
      matrix_of(40, &[150.0]),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::DegenerateInput(_)));
  }

  #[test]
  fn rejects_short_history() {
    let err = PriceMatrix::try_new(
      vec!["AAPL".into(), "MSFT".into()],
      trading_days(MIN_TRADING_DAYS - 1),
      matrix_of(MIN_TRADING_DAYS - 1, &[150.0, 300.0]),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientData { .. }));
  }

  #[test]
  fn rejects_missing_observations() {
    let mut closes = matrix_of(40, &[150.0, 300.0]);
    closes[[10, 1]] = f64::NAN;
    let err = PriceMatrix::try_new(
      vec!["AAPL".into(), "MSFT".into()],
      trading_days(40),
      closes,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientData { .. }));
  }

  #[test]
  fn rejects_non_positive_prices() {
    let mut closes = matrix_of(40, &[150.0, 300.0]);
    closes[[0, 0]] = 0.0;
    let err = PriceMatrix::try_new(
      vec!["AAPL".into(), "MSFT".into()],
      trading_days(40),
      closes,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::DegenerateInput(_)));
  }

  #[test]
  fn rejects_misaligned_calendar() {
    let err = PriceMatrix::try_new(
      vec!["AAPL".into(), "MSFT".into()],
      trading_days(39),
      matrix_of(40, &[150.0, 300.0]),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::ShapeMismatch { .. }));
  }

  #[test]
  fn daily_returns_are_simple_returns() {
    let closes = array![[100.0, 200.0], [110.0, 190.0], [121.0, 190.0]];
    let m = PriceMatrix::try_new(
      vec!["A".into(), "B".into()],
      trading_days(3),
      closes.clone(),
    );
    // Too short for the engine, so compute on a padded copy instead.
    assert!(m.is_err());

    let mut padded = Array2::from_elem((MIN_TRADING_DAYS, 2), 1.0);
    for (i, row) in closes.rows().into_iter().enumerate() {
      padded.row_mut(i).assign(&row);
    }
    let m = PriceMatrix::try_new(
      vec!["A".into(), "B".into()],
      trading_days(MIN_TRADING_DAYS),
      padded,
    )
    .unwrap();
    let r = m.daily_returns();
    assert_eq!(r.nrows(), MIN_TRADING_DAYS - 1);
    assert_relative_eq!(r[[0, 0]], 0.10, max_relative = 1e-12);
    assert_relative_eq!(r[[1, 0]], 0.10, max_relative = 1e-12);
    assert_relative_eq!(r[[0, 1]], -0.05, max_relative = 1e-12);
  }

  #[test]
  fn latest_prices_is_last_row() {
    let m = PriceMatrix::try_new(
      vec!["AAPL".into(), "MSFT".into()],
      trading_days(40),
      matrix_of(40, &[150.0, 300.0]),
    )
    .unwrap();
    let latest = m.latest_prices();
    assert_relative_eq!(latest[0], 189.0, max_relative = 1e-12);
    assert_relative_eq!(latest[1], 339.0, max_relative = 1e-12);
  }

  #[test]
  fn holding_rejects_negative_shares() {
    assert!(Holding::try_new("AAPL", -1.0).is_err());
    assert!(Holding::try_new("AAPL", f64::NAN).is_err());
    assert!(Holding::try_new("AAPL", 10.0).is_ok());
  }
}
