//! Derivative-free minimization
//!
//! Contains a bounded Nelder-Mead simplex search. The search is fully
//! deterministic: the initial simplex is built from the start point and a
//! per-coordinate step, and restarts rebuild the simplex around the best
//! point found so far.

use crate::{MathError, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Result of a minimization run
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    /// Location of the best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Total simplex iterations across all restarts
    pub iterations: usize,
    /// Whether the last run met the tolerance before `max_iter`
    pub converged: bool,
}

/// Nelder-Mead simplex minimizer with box constraints
///
/// Only the run settings are (de)serialized; missing fields take the
/// [`Default`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMead {
    /// Iteration cap per run
    pub max_iter: usize,
    /// Relative spread of objective values at which a run stops
    pub tolerance: f64,
    /// Number of additional runs restarted from the best point
    pub restarts: usize,
    #[serde(skip)]
    reflection: f64,
    #[serde(skip)]
    expansion: f64,
    #[serde(skip)]
    contraction: f64,
    #[serde(skip)]
    shrink: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-10,
            restarts: 3,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

impl NelderMead {
    /// Create a minimizer with the given iteration cap and tolerance
    pub fn new(max_iter: usize, tolerance: f64) -> Result<Self> {
        let minimizer = Self {
            max_iter,
            tolerance,
            ..Self::default()
        };
        minimizer.validate()?;
        Ok(minimizer)
    }

    /// Check the run settings, e.g. after loading them from configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(MathError::InvalidInput(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(MathError::InvalidInput(
                "tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the number of restarts
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Minimize `objective` starting at `start`.
    ///
    /// `steps` gives the initial simplex edge length per coordinate and
    /// `bounds` the inclusive `(lower, upper)` box for each coordinate
    /// (infinite bounds are allowed). Non-finite objective values are
    /// treated as `+inf`.
    pub fn minimize<F>(
        &self,
        objective: F,
        start: &[f64],
        steps: &[f64],
        bounds: &[(f64, f64)],
    ) -> Result<Minimum>
    where
        F: Fn(&[f64]) -> f64,
    {
        if start.is_empty() {
            return Err(MathError::InvalidInput(
                "start point must have at least one coordinate".to_string(),
            ));
        }
        if steps.len() != start.len() || bounds.len() != start.len() {
            return Err(MathError::InvalidInput(format!(
                "dimension mismatch: start has {}, steps {}, bounds {}",
                start.len(),
                steps.len(),
                bounds.len()
            )));
        }
        for (i, (lo, hi)) in bounds.iter().enumerate() {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(MathError::InvalidInput(format!(
                    "invalid bounds for coordinate {}: ({}, {})",
                    i, lo, hi
                )));
            }
        }

        let evaluate = |x: &[f64]| {
            let value = objective(x);
            if value.is_finite() {
                value
            } else {
                f64::INFINITY
            }
        };

        let mut best = start.to_vec();
        project(&mut best, bounds);
        let mut best_value = evaluate(&best);
        let mut iterations = 0;
        let mut converged = false;

        for round in 0..=self.restarts {
            let (point, value, used, done) = self.run(&evaluate, &best, steps, bounds);
            iterations += used;
            converged = done;

            let improvement = best_value - value;
            if value <= best_value {
                best = point;
                best_value = value;
            }

            debug!(
                "Nelder-Mead round {} finished after {} iterations (value {:.6e})",
                round, used, best_value
            );

            if round > 0 && improvement.abs() <= self.tolerance * (1.0 + best_value.abs()) {
                break;
            }
        }

        Ok(Minimum {
            point: best,
            value: best_value,
            iterations,
            converged,
        })
    }

    fn run<F>(
        &self,
        evaluate: &F,
        start: &[f64],
        steps: &[f64],
        bounds: &[(f64, f64)],
    ) -> (Vec<f64>, f64, usize, bool)
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = start.len();
        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), evaluate(start)));

        for i in 0..n {
            let mut vertex = start.to_vec();
            vertex[i] += steps[i];
            project(&mut vertex, bounds);
            // Pinned against an upper bound, step the other way instead
            if (vertex[i] - start[i]).abs() < f64::EPSILON {
                vertex[i] = start[i] - steps[i];
                project(&mut vertex, bounds);
            }
            let value = evaluate(&vertex);
            simplex.push((vertex, value));
        }

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            let best_value = simplex[0].1;
            let worst_value = simplex[n].1;
            if (worst_value - best_value).abs() <= self.tolerance * (1.0 + best_value.abs()) {
                converged = true;
                break;
            }
            iterations += 1;

            let mut centroid = vec![0.0; n];
            for (vertex, _) in simplex.iter().take(n) {
                for (c, v) in centroid.iter_mut().zip(vertex) {
                    *c += v / n as f64;
                }
            }

            let worst = simplex[n].0.clone();
            let reflected = blend(&centroid, &worst, -self.reflection, bounds);
            let reflected_value = evaluate(&reflected);

            if reflected_value < best_value {
                let expanded = blend(&centroid, &reflected, self.expansion, bounds);
                let expanded_value = evaluate(&expanded);
                simplex[n] = if expanded_value < reflected_value {
                    (expanded, expanded_value)
                } else {
                    (reflected, reflected_value)
                };
                continue;
            }

            if reflected_value < simplex[n - 1].1 {
                simplex[n] = (reflected, reflected_value);
                continue;
            }

            let (contracted, contracted_value) = if reflected_value < worst_value {
                let point = blend(&centroid, &reflected, self.contraction, bounds);
                let value = evaluate(&point);
                (point, value)
            } else {
                let point = blend(&centroid, &worst, self.contraction, bounds);
                let value = evaluate(&point);
                (point, value)
            };

            if contracted_value < reflected_value.min(worst_value) {
                simplex[n] = (contracted, contracted_value);
                continue;
            }

            let anchor = simplex[0].0.clone();
            for (vertex, value) in simplex.iter_mut().skip(1) {
                *vertex = blend(&anchor, vertex, self.shrink, bounds);
                *value = evaluate(vertex);
            }
        }

        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let (point, value) = simplex.swap_remove(0);
        (point, value, iterations, converged)
    }
}

/// `origin + factor * (target - origin)`, clamped into `bounds`
fn blend(origin: &[f64], target: &[f64], factor: f64, bounds: &[(f64, f64)]) -> Vec<f64> {
    let mut point: Vec<f64> = origin
        .iter()
        .zip(target)
        .map(|(o, t)| o + factor * (t - o))
        .collect();
    project(&mut point, bounds);
    point
}

fn project(point: &mut [f64], bounds: &[(f64, f64)]) {
    for (value, (lo, hi)) in point.iter_mut().zip(bounds) {
        *value = value.clamp(*lo, *hi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const FREE: (f64, f64) = (f64::NEG_INFINITY, f64::INFINITY);

    #[test]
    fn test_quadratic_bowl() {
        let optimizer = NelderMead::default();
        let result = optimizer
            .minimize(
                |x| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2),
                &[0.0, 0.0],
                &[1.0, 1.0],
                &[FREE, FREE],
            )
            .unwrap();

        assert_abs_diff_eq!(result.point[0], 3.0, epsilon = 1e-4);
        assert_abs_diff_eq!(result.point[1], -1.0, epsilon = 1e-4);
        assert!(result.value < 1e-8);
    }

    #[test]
    fn test_rosenbrock() {
        let optimizer = NelderMead::new(5000, 1e-14).unwrap();
        let result = optimizer
            .minimize(
                |x| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2),
                &[-1.2, 1.0],
                &[0.5, 0.5],
                &[FREE, FREE],
            )
            .unwrap();

        assert_abs_diff_eq!(result.point[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.point[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_bounds_are_respected() {
        let optimizer = NelderMead::default();
        let result = optimizer
            .minimize(|x| (x[0] - 5.0).powi(2), &[0.5], &[0.1], &[(0.0, 1.0)])
            .unwrap();

        assert!(result.point[0] <= 1.0);
        assert_abs_diff_eq!(result.point[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_non_finite_objective_is_avoided() {
        let optimizer = NelderMead::default();
        let result = optimizer
            .minimize(
                |x| if x[0] < 0.0 { f64::NAN } else { (x[0] - 2.0).powi(2) },
                &[1.0],
                &[0.5],
                &[FREE],
            )
            .unwrap();

        assert_abs_diff_eq!(result.point[0], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_deterministic() {
        let optimizer = NelderMead::default();
        let objective = |x: &[f64]| (x[0] - 0.3).powi(2) + (x[1] - 0.7).powi(4) + x[0] * x[1];
        let a = optimizer
            .minimize(objective, &[0.5, 0.5], &[0.1, 0.1], &[(0.0, 1.0), (0.0, 1.0)])
            .unwrap();
        let b = optimizer
            .minimize(objective, &[0.5, 0.5], &[0.1, 0.1], &[(0.0, 1.0), (0.0, 1.0)])
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_input() {
        let optimizer = NelderMead::default();
        assert!(optimizer.minimize(|_| 0.0, &[], &[], &[]).is_err());
        assert!(optimizer
            .minimize(|_| 0.0, &[1.0, 2.0], &[0.1], &[FREE, FREE])
            .is_err());
        assert!(optimizer
            .minimize(|_| 0.0, &[1.0], &[0.1], &[(2.0, 1.0)])
            .is_err());
        assert!(NelderMead::new(0, 1e-6).is_err());
        assert!(NelderMead::new(10, 0.0).is_err());
    }

    #[test]
    fn test_restarts() {
        let bowl = |x: &[f64]| (x[0] - 3.0).powi(2) + (x[1] + 1.0).powi(2);
        let single = NelderMead::default()
            .with_restarts(0)
            .minimize(bowl, &[0.0, 0.0], &[1.0, 1.0], &[FREE, FREE])
            .unwrap();
        let repeated = NelderMead::default()
            .with_restarts(2)
            .minimize(bowl, &[0.0, 0.0], &[1.0, 1.0], &[FREE, FREE])
            .unwrap();

        assert_abs_diff_eq!(single.point[0], 3.0, epsilon = 1e-4);
        assert!(repeated.iterations >= single.iterations);
        assert!(repeated.value <= single.value);
    }
}
