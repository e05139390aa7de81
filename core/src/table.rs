//! Piecewise-linear interpolation tables.
//!
//! Outside the tabulated range the nearest edge segment is extended, so a
//! table never clamps and never fails to evaluate.

use crate::error::ValidationError;
use serde::{Serialize, Serializer};

/// Parallel `x`/`y` breakpoints with strictly increasing `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedTable {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl InterpolatedTable {
    /// Build a table, checking the breakpoints.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, ValidationError> {
        if x.len() != y.len() {
            return Err(ValidationError::new(format!(
                "x & y should be same length (got {} and {})",
                x.len(),
                y.len()
            )));
        }
        if x.len() < 2 {
            return Err(ValidationError::new(format!(
                "a table needs at least 2 points, got {}",
                x.len()
            )));
        }
        if let Some(v) = x.iter().chain(y.iter()).find(|v| !v.is_finite()) {
            return Err(ValidationError::new(format!("table values must be finite, got {}", v)));
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ValidationError::new(format!(
                "x must be strictly increasing (x[{}] = {} is not greater than x[{}] = {})",
                i + 1,
                x[i + 1],
                i,
                x[i]
            )));
        }
        Ok(Self { x, y })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Tabulated domain `[x.first, x.last]`.
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Interpolate (or linearly extrapolate) at `x0`.
    pub fn evaluate(&self, x0: f64) -> f64 {
        let n = self.x.len();
        // Index of the segment [x[i], x[i + 1]] to use; edge segments extend outward.
        let upper = self.x.partition_point(|&xi| xi <= x0).clamp(1, n - 1);
        let i = upper - 1;
        let t = (x0 - self.x[i]) / (self.x[i + 1] - self.x[i]);
        // This form returns the breakpoint values exactly at t = 0 and t = 1.
        self.y[i] * (1.0 - t) + self.y[i + 1] * t
    }

    /// Evaluate at each point of `xs`.
    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x0| self.evaluate(x0)).collect()
    }
}

#[derive(Serialize)]
struct TableShape<'a> {
    x: &'a [f64],
    y: &'a [f64],
}

impl Serialize for InterpolatedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TableShape {
            x: &self.x,
            y: &self.y,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod table_tests {
    use super::*;

    fn ocp_table() -> InterpolatedTable {
        InterpolatedTable::new(vec![0.0, 0.1, 1.0], vec![1.72, 1.2, 0.06]).unwrap()
    }

    #[test]
    fn test_breakpoints_are_exact() {
        let table = ocp_table();
        for (x, y) in table.x().iter().zip(table.y()) {
            assert_eq!(table.evaluate(*x), *y);
        }
    }

    #[test]
    fn test_midpoint_is_average() {
        let table = InterpolatedTable::new(vec![1.0, 2.0, 4.0], vec![2.3, 4.5, 0.5]).unwrap();
        assert!((table.evaluate(1.5) - 3.4).abs() < 1e-12);
        assert!((table.evaluate(3.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_extrapolates_with_edge_slope() {
        let table = InterpolatedTable::new(vec![1.0, 2.0, 4.0], vec![2.0, 4.0, 0.0]).unwrap();
        // left edge slope is +2
        assert!((table.evaluate(0.0) - 0.0).abs() < 1e-12);
        assert!((table.evaluate(0.5) - 1.0).abs() < 1e-12);
        // right edge slope is -2
        assert!((table.evaluate(5.0) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_vector_evaluation() {
        let table = ocp_table();
        let ys = table.evaluate_many(&[0.0, 0.05, 1.0]);
        assert_eq!(ys.len(), 3);
        assert_eq!(ys[0], 1.72);
        assert!((ys[1] - 1.46).abs() < 1e-12);
        assert_eq!(ys[2], 0.06);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let err = InterpolatedTable::new(vec![1.0, 2.0], vec![2.3]).unwrap_err();
        assert!(err.0.contains("same length"));
    }

    #[test]
    fn test_too_few_points_rejected() {
        assert!(InterpolatedTable::new(vec![1.0], vec![2.0]).is_err());
        assert!(InterpolatedTable::new(vec![], vec![]).is_err());
    }

    #[test]
    fn test_non_increasing_x_rejected() {
        assert!(InterpolatedTable::new(vec![0.0, 0.5, 0.5], vec![1.0, 2.0, 3.0]).is_err());
        assert!(InterpolatedTable::new(vec![1.0, 0.0], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_serializes_as_xy_object() {
        let json = serde_json::to_value(ocp_table()).unwrap();
        assert_eq!(json, serde_json::json!({"x": [0.0, 0.1, 1.0], "y": [1.72, 1.2, 0.06]}));
    }
}
