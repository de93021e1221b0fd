//! Damped Newton iteration.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SolverError, SolverResult};

/// Newton solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonConfig {
    pub max_iterations: usize,
    /// Absolute tolerance on the residual norm.
    pub abs_tol: f64,
    /// Line search backtracking factor.
    pub line_search_beta: f64,
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abs_tol: 1e-9,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewtonResult {
    pub x: DVector<f64>,
    pub residual_norm: f64,
    pub iterations: usize,
}

/// Solve `F(x) = 0` with LU steps and backtracking on the residual norm.
pub fn newton_solve<F, J>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
    J: Fn(&DVector<f64>) -> DMatrix<f64>,
{
    let mut x = x0;
    let mut r = residual_fn(&x);
    let mut r_norm = r.norm();

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }
        if !r_norm.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("non-finite residual at iteration {iter}"),
            });
        }

        let dx = jacobian_fn(&x)
            .lu()
            .solve(&(-r.clone()))
            .ok_or_else(|| SolverError::Numeric {
                what: "Jacobian solve failed".to_string(),
            })?;

        let mut alpha: f64 = 1.0;
        let mut x_new = &x + &dx;
        let mut r_new = residual_fn(&x_new);
        let mut r_new_norm = r_new.norm();
        for _ in 0..config.max_line_search_iters {
            if r_new_norm < r_norm {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = &x + alpha * &dx;
            r_new = residual_fn(&x_new);
            r_new_norm = r_new.norm();
        }

        debug!(iteration = iter, residual = r_new_norm, step = alpha, "newton step");
        x = x_new;
        r = r_new;
        r_norm = r_new_norm;

        if alpha < 1e-10 {
            return Err(SolverError::ConvergenceFailed {
                what: format!("line search stagnated at iteration {iter}, residual = {r_norm:e}"),
            });
        }
    }

    if r_norm < config.abs_tol {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }
    Err(SolverError::ConvergenceFailed {
        what: format!(
            "maximum iterations {} reached, residual = {r_norm:e}",
            config.max_iterations
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_quadratic() {
        let residual = |x: &DVector<f64>| DVector::from_element(1, x[0] * x[0] - 4.0);
        let jacobian = |x: &DVector<f64>| DMatrix::from_element(1, 1, 2.0 * x[0]);
        let result =
            newton_solve(DVector::from_element(1, 3.0), residual, jacobian, &NewtonConfig::default())
                .unwrap();
        assert!((result.x[0] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn iteration_cap_is_reported() {
        let residual = |x: &DVector<f64>| DVector::from_element(1, x[0] * x[0] - 4.0);
        let jacobian = |x: &DVector<f64>| DMatrix::from_element(1, 1, 2.0 * x[0]);
        let config = NewtonConfig {
            max_iterations: 1,
            ..Default::default()
        };
        let err = newton_solve(DVector::from_element(1, 100.0), residual, jacobian, &config)
            .unwrap_err();
        assert!(matches!(err, SolverError::ConvergenceFailed { .. }));
    }
}
