//! Least-squares polynomial regression
//!
//! Used to draw trend lines over historical sales and to report how much
//! of the variance the trend explains.

use crate::{MathError, Result};

/// Polynomial fitted by ordinary least squares
///
/// Coefficients are stored in ascending powers of `x`, so
/// `coefficients()[0]` is the intercept.
#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialFit {
    coefficients: Vec<f64>,
}

impl PolynomialFit {
    /// Fit a polynomial of the given degree through `(x, y)` pairs
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        if x.len() <= degree {
            return Err(MathError::InsufficientData(format!(
                "degree {} fit needs at least {} points, got {}",
                degree,
                degree + 1,
                x.len()
            )));
        }

        let size = degree + 1;
        let mut power_sums = vec![0.0; 2 * degree + 1];
        let mut rhs = vec![0.0; size];

        for (&xi, &yi) in x.iter().zip(y) {
            let mut power = 1.0;
            for (k, sum) in power_sums.iter_mut().enumerate() {
                *sum += power;
                if k < size {
                    rhs[k] += yi * power;
                }
                power *= xi;
            }
        }

        let mut matrix: Vec<Vec<f64>> = (0..size)
            .map(|row| power_sums[row..row + size].to_vec())
            .collect();

        let coefficients = solve(&mut matrix, &mut rhs)?;
        Ok(Self { coefficients })
    }

    /// Fit against the positions `0, 1, 2, ...` of `y`
    pub fn fit_indexed(y: &[f64], degree: usize) -> Result<Self> {
        let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
        Self::fit(&x, y, degree)
    }

    /// Coefficients in ascending powers of x
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Degree of the polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluate the polynomial at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    /// Evaluate the polynomial at every point of `x`
    pub fn predict_all(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.predict(xi)).collect()
    }

    /// Coefficient of determination of this fit against `(x, y)`
    pub fn r_squared(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        if x.len() != y.len() || y.is_empty() {
            return Err(MathError::InvalidInput(
                "x and y must have the same non-zero length".to_string(),
            ));
        }

        let y_mean = y.iter().sum::<f64>() / y.len() as f64;
        let mut ss_total = 0.0;
        let mut ss_residual = 0.0;

        for (&xi, &yi) in x.iter().zip(y) {
            ss_total += (yi - y_mean).powi(2);
            ss_residual += (yi - self.predict(xi)).powi(2);
        }

        if ss_total.abs() < 1e-10 {
            return Err(MathError::CalculationError(
                "Cannot calculate R-squared: total sum of squares is too small".to_string(),
            ));
        }

        Ok(1.0 - ss_residual / ss_total)
    }
}

/// Gaussian elimination with partial pivoting
fn solve(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> Result<Vec<f64>> {
    let n = rhs.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);

        if matrix[pivot][col].abs() < 1e-12 {
            return Err(MathError::CalculationError(
                "normal equations are singular; x values are too similar".to_string(),
            ));
        }

        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| matrix[row][k] * solution[k]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_exact_quadratic() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 + 0.5 * v - 0.25 * v * v).collect();

        let fit = PolynomialFit::fit(&x, &y, 2).unwrap();
        let c = fit.coefficients();

        assert_eq!(fit.degree(), 2);
        assert_abs_diff_eq!(c[0], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(c[1], 0.5, epsilon = 1e-8);
        assert_abs_diff_eq!(c[2], -0.25, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.r_squared(&x, &y).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_linear_trend_on_noisy_data() {
        let y = vec![1.0, 3.0, 2.0, 4.0, 3.0, 5.0];
        let fit = PolynomialFit::fit_indexed(&y, 1).unwrap();
        let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();

        assert!(fit.coefficients()[1] > 0.0);
        let r2 = fit.r_squared(&x, &y).unwrap();
        assert!(r2 > 0.0 && r2 < 1.0);
        assert_eq!(fit.predict_all(&x).len(), y.len());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            PolynomialFit::fit(&[1.0, 2.0], &[1.0], 1),
            Err(MathError::InvalidInput(_))
        ));
        assert!(matches!(
            PolynomialFit::fit(&[1.0, 2.0], &[1.0, 2.0], 2),
            Err(MathError::InsufficientData(_))
        ));
        assert!(matches!(
            PolynomialFit::fit(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], 1),
            Err(MathError::CalculationError(_))
        ));

        let flat = PolynomialFit::fit_indexed(&[4.0, 4.0, 4.0], 1).unwrap();
        assert!(flat.r_squared(&[0.0, 1.0, 2.0], &[4.0, 4.0, 4.0]).is_err());
    }
}
