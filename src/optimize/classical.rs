//! # Classical
//!
//! $$
//! \min_{w\in\Delta^{n-1}} w'\Sigma w
//! $$
//!
//! The global-minimum-variance benchmark. Expected returns and risk
//! tolerance do not enter the objective; the solution depends on the
//! covariance alone, which is what makes it a stable yardstick for the
//! randomized search. Solved by projected gradient descent with the exact
//! Euclidean projection onto the simplex, seeded at equal weight. When the
//! iteration cap runs out before the objective settles, the optimizer
//! recovers with the equal-weight portfolio and a logged warning instead of
//! failing the request.
//!
//! Source:
//! - Duchi et al. (2008), "Efficient projections onto the l1-ball for
//!   learning in high dimensions" (sort-based simplex projection)
//!   https://doi.org/10.1145/1390156.1390191

use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::Array2;
use tracing::warn;

use crate::optimize::portfolio_variance;
use crate::optimize::WeightVector;

/// Iteration cap and stopping tolerance for the projected gradient loop.
#[derive(ImplNew, Clone, Debug)]
pub struct ClassicalConfig {
  /// Hard cap on gradient steps, bounding worst-case latency.
  pub max_iterations: usize,
  /// Stop once the objective improves by less than this between steps.
  pub tolerance: f64,
}

impl Default for ClassicalConfig {
  fn default() -> Self {
    Self {
      max_iterations: 500,
      tolerance: 1e-10,
    }
  }
}

/// Outcome of the minimum-variance search.
#[derive(Clone, Debug)]
pub struct ClassicalSolution {
  pub weights: WeightVector,
  /// False when the equal-weight fallback was used.
  pub converged: bool,
  pub iterations: usize,
  /// Portfolio variance at the returned weights.
  pub variance: f64,
}

/// Minimizes `w' sigma w` over the simplex.
pub fn optimize(sigma: &Array2<f64>, config: &ClassicalConfig) -> ClassicalSolution {
  let n = sigma.nrows();
  assert_eq!(n, sigma.ncols(), "covariance matrix must be square");
  assert!(n >= 1, "covariance matrix must not be empty");

  let equal = WeightVector::equal(n);

  let lipschitz = 2.0 * dominant_eigenvalue(sigma);
  if lipschitz <= f64::EPSILON {
    // sigma is (numerically) zero: every simplex point has zero variance.
    return ClassicalSolution {
      weights: equal,
      converged: true,
      iterations: 0,
      variance: 0.0,
    };
  }
  let step = 1.0 / lipschitz;

  let mut w = equal.as_array().to_owned();
  let mut prev_objective = portfolio_variance(&w, sigma);

  for iteration in 1..=config.max_iterations {
    let gradient = sigma.dot(&w) * 2.0;
    w = project_onto_simplex(&(&w - &(gradient * step)));
    let objective = portfolio_variance(&w, sigma);

    if (prev_objective - objective).abs() <= config.tolerance {
      return ClassicalSolution {
        weights: WeightVector::from_simplex(w),
        converged: true,
        iterations: iteration,
        variance: objective,
      };
    }
    prev_objective = objective;
  }

  warn!(
    max_iterations = config.max_iterations,
    "classical optimizer did not converge, falling back to equal weights"
  );
  let variance = portfolio_variance(equal.as_array(), sigma);
  ClassicalSolution {
    weights: equal,
    converged: false,
    iterations: config.max_iterations,
    variance,
  }
}

/// Euclidean projection of `v` onto the probability simplex.
fn project_onto_simplex(v: &Array1<f64>) -> Array1<f64> {
  let mut sorted = v.to_vec();
  sorted.sort_by(|a, b| b.total_cmp(a));

  let mut cumulative = 0.0;
  let mut theta = 0.0;
  for (i, &u) in sorted.iter().enumerate() {
    cumulative += u;
    let candidate = (cumulative - 1.0) / (i + 1) as f64;
    if u - candidate > 0.0 {
      theta = candidate;
    }
  }

  v.mapv(|x| (x - theta).max(0.0))
}

/// Largest eigenvalue of a symmetric PSD matrix by power iteration.
fn dominant_eigenvalue(sigma: &Array2<f64>) -> f64 {
  let n = sigma.nrows();
  let mut v = Array1::from_elem(n, (1.0 / n as f64).sqrt());
  let mut lambda = 0.0;
  for _ in 0..64 {
    let av = sigma.dot(&v);
    let norm = av.dot(&av).sqrt();
    if norm <= f64::EPSILON {
      return 0.0;
    }
    v = av / norm;
    lambda = v.dot(&sigma.dot(&v));
  }
  lambda.max(0.0)
}
