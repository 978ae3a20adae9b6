//! # Quantfolio
//!
//! A portfolio optimization engine that pits a classical risk-minimizing
//! optimizer against a quantum-inspired randomized search, under identical
//! long-only, fully-invested constraints, and turns the winning target
//! weights into concrete rebalancing trades.
//!
//! ## Modules
//!
//! | Module        | Description                                                                      |
//! |---------------|----------------------------------------------------------------------------------|
//! | [`market`]    | Validated price-matrix input model and current holdings.                         |
//! | [`estimate`]  | EWMA expected returns and Ledoit-Wolf shrinkage covariance, annualized.          |
//! | [`optimize`]  | The two weight searches: GMV projected gradient and the randomized trial search. |
//! | [`metrics`]   | Expected return, volatility, sharpe ratio and relative improvement.              |
//! | [`rebalance`] | BUY/SELL/HOLD trade instructions from target weights and share positions.        |
//! | [`service`]   | Request validation and orchestration of the two workflows.                       |
//! | [`error`]     | Engine error taxonomy.                                                           |
//!
//! ## Parallelism
//!
//! The two optimizers run as a `rayon::join` pair over the shared read-only
//! estimate, and the randomized search fans its trials out with rayon. Each
//! trial seeds its own random stream from the trial index, so results are
//! bit-for-bit reproducible for a fixed seed regardless of scheduling.
//!
//! ## Statelessness
//!
//! Every call is independent: the engine caches nothing, persists nothing,
//! and never returns partial results.

pub mod error;
pub mod estimate;
pub mod market;
pub mod metrics;
pub mod optimize;
pub mod rebalance;
pub mod service;

pub use error::EngineError;
pub use error::Result;
pub use service::OptimizationService;
