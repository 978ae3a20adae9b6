//! # Error
//!
//! Engine error taxonomy. Classical solver non-convergence is not part of it:
//! that case is recovered locally with an equal-weight fallback and a logged
//! warning, and the request still succeeds.

use thiserror::Error;

/// Errors surfaced by the optimization engine.
#[derive(Debug, Error)]
pub enum EngineError {
  /// Fewer aligned trading days than the estimator requires, or a ticker
  /// column with missing (non-finite) observations.
  #[error("insufficient market data: {rows} trading days available, {required} required")]
  InsufficientData { rows: usize, required: usize },

  /// Input the engine refuses before estimation begins, e.g. fewer than two
  /// tickers or a non-positive price.
  #[error("degenerate input: {0}")]
  DegenerateInput(String),

  /// Dimension mismatch between related inputs.
  #[error("shape mismatch: expected {expected}, got {got}")]
  ShapeMismatch { expected: String, got: String },

  /// Request-level validation failure (risk tolerance, amounts, dates,
  /// holding tickers).
  #[error("invalid request: {0}")]
  InvalidRequest(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
