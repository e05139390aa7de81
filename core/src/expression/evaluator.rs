//! Expression evaluator with scalar and elementwise array semantics.
//!
//! Every intermediate result is checked: a NaN is reported as a domain error
//! and an infinity as an overflow, so a failed evaluation can never leak out
//! as a quiet non-finite number.

use super::parser::{BinaryOperator, Expr, UnaryOperator, Variable};
use thiserror::Error;

/// Evaluation error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Division by zero")]
    DivisionByZero,
    /// Function or operator applied outside its domain (e.g. log of a negative)
    #[error("Domain error: {0}")]
    Domain(String),
    /// Finite inputs produced an infinite result
    #[error("Overflow: {0}")]
    Overflow(String),
    /// The expression references a variable that was not bound
    #[error("Unbound variable: {0}")]
    UnboundVariable(Variable),
    #[error("Non-finite value {value} bound to {variable}")]
    NonFiniteInput { variable: Variable, value: f64 },
    /// Elementwise operation over arrays of different lengths
    #[error("Array length mismatch: {0} vs {1}")]
    LengthMismatch(usize, usize),
}

/// A scalar or a vector of samples.
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Numeric {
    /// Number of samples, or `None` for a scalar.
    pub fn len(&self) -> Option<usize> {
        match self {
            Numeric::Scalar(_) => None,
            Numeric::Array(values) => Some(values.len()),
        }
    }

    fn at(&self, index: usize) -> f64 {
        match self {
            Numeric::Scalar(v) => *v,
            Numeric::Array(values) => values[index],
        }
    }

    /// Values as a vector of length `len`, repeating a scalar.
    pub fn into_vec(self, len: usize) -> Vec<f64> {
        match self {
            Numeric::Scalar(v) => vec![v; len],
            Numeric::Array(values) => values,
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Numeric::Scalar(v) => Some(*v),
            Numeric::Array(_) => None,
        }
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Scalar(value)
    }
}

impl From<Vec<f64>> for Numeric {
    fn from(values: Vec<f64>) -> Self {
        Numeric::Array(values)
    }
}

impl From<&[f64]> for Numeric {
    fn from(values: &[f64]) -> Self {
        Numeric::Array(values.to_vec())
    }
}

/// Values for the expression variables.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    x: Option<Numeric>,
    t: Option<Numeric>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `x`
    pub fn x(mut self, value: impl Into<Numeric>) -> Self {
        self.x = Some(value.into());
        self
    }

    /// Bind the temperature `T`
    pub fn temperature(mut self, value: impl Into<Numeric>) -> Self {
        self.t = Some(value.into());
        self
    }

    fn get(&self, variable: Variable) -> Option<&Numeric> {
        match variable {
            Variable::X => self.x.as_ref(),
            Variable::T => self.t.as_ref(),
        }
    }

    fn check_finite(&self) -> Result<(), EvalError> {
        for variable in [Variable::X, Variable::T] {
            let values: &[f64] = match self.get(variable) {
                None => &[],
                Some(Numeric::Scalar(v)) => std::slice::from_ref(v),
                Some(Numeric::Array(values)) => values,
            };
            if let Some(&value) = values.iter().find(|v| !v.is_finite()) {
                return Err(EvalError::NonFiniteInput { variable, value });
            }
        }
        Ok(())
    }
}

/// Turn a raw floating point result into a checked one.
fn checked(value: f64, what: impl FnOnce() -> String) -> Result<f64, EvalError> {
    if value.is_nan() {
        Err(EvalError::Domain(what()))
    } else if value.is_infinite() {
        Err(EvalError::Overflow(what()))
    } else {
        Ok(value)
    }
}

/// Apply `f` elementwise across operands, broadcasting scalars.
fn broadcast<F>(operands: &[Numeric], mut f: F) -> Result<Numeric, EvalError>
where
    F: FnMut(&[f64]) -> Result<f64, EvalError>,
{
    let mut len: Option<usize> = None;
    for operand in operands {
        if let Some(n) = operand.len() {
            match len {
                Some(m) if m != n => return Err(EvalError::LengthMismatch(m, n)),
                _ => len = Some(n),
            }
        }
    }

    let mut args = Vec::with_capacity(operands.len());
    match len {
        None => {
            args.extend(operands.iter().map(|o| o.at(0)));
            Ok(Numeric::Scalar(f(&args)?))
        }
        Some(n) => {
            let mut out = Vec::with_capacity(n);
            for i in 0..n {
                args.clear();
                args.extend(operands.iter().map(|o| o.at(i)));
                out.push(f(&args)?);
            }
            Ok(Numeric::Array(out))
        }
    }
}

fn apply_binary(op: BinaryOperator, l: f64, r: f64) -> Result<f64, EvalError> {
    let raw = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Sub => l - r,
        BinaryOperator::Mul => l * r,
        BinaryOperator::Div => {
            if r == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            l / r
        }
        BinaryOperator::Pow => {
            if l == 0.0 && r < 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            l.powf(r)
        }
    };
    checked(raw, || format!("{} {} {}", l, op, r))
}

fn eval_expr(expr: &Expr, bindings: &Bindings) -> Result<Numeric, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Numeric::Scalar(*n)),

        Expr::Variable(var) => bindings
            .get(*var)
            .cloned()
            .ok_or(EvalError::UnboundVariable(*var)),

        Expr::UnaryOp { op, operand } => {
            let val = eval_expr(operand, bindings)?;
            match op {
                UnaryOperator::Neg => broadcast(&[val], |a| Ok(-a[0])),
            }
        }

        Expr::BinaryOp { op, left, right } => {
            let l = eval_expr(left, bindings)?;
            let r = eval_expr(right, bindings)?;
            broadcast(&[l, r], |a| apply_binary(*op, a[0], a[1]))
        }

        Expr::Call { function, args } => {
            let values = args
                .iter()
                .map(|arg| eval_expr(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            broadcast(&values, |a| {
                let raw = function.call(a)?;
                checked(raw, || format!("{}({:?})", function.name, a))
            })
        }
    }
}

/// Evaluate a parsed expression against bound variables.
///
/// Arrays broadcast against scalars; two arrays must have equal length. The
/// result is a scalar only when every referenced variable is a scalar.
pub fn evaluate(expr: &Expr, bindings: &Bindings) -> Result<Numeric, EvalError> {
    bindings.check_finite()?;
    eval_expr(expr, bindings)
}

#[cfg(test)]
mod evaluator_tests {
    use super::*;
    use crate::expression::parser::parse_expression;

    fn eval_at(text: &str, x: f64) -> Result<f64, EvalError> {
        let expr = parse_expression(text).unwrap();
        let out = evaluate(&expr, &Bindings::new().x(x))?;
        Ok(out.as_scalar().unwrap())
    }

    #[test]
    fn test_eval_simple() {
        assert!((eval_at("2 + 3", 0.0).unwrap() - 5.0).abs() < 1e-12);
        assert!((eval_at("2 + 3 * 4", 0.0).unwrap() - 14.0).abs() < 1e-12);
        assert!((eval_at("(2 + 3) * 4", 0.0).unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_eval_power() {
        assert!((eval_at("2 ** 3 ** 2", 0.0).unwrap() - 512.0).abs() < 1e-9);
        assert!((eval_at("-2 ** 2", 0.0).unwrap() + 4.0).abs() < 1e-12);
        assert!((eval_at("2 ** -1", 0.0).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_eval_variable() {
        assert!((eval_at("3.5 - 0.1 * x", 0.1).unwrap() - 3.49).abs() < 1e-12);
    }

    #[test]
    fn test_eval_division_by_zero() {
        assert_eq!(eval_at("1 / x", 0.0), Err(EvalError::DivisionByZero));
        assert_eq!(eval_at("0 ** -1", 0.0), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_eval_domain_errors() {
        assert!(matches!(eval_at("sqrt(x)", -1.0), Err(EvalError::Domain(_))));
        assert!(matches!(eval_at("log(x)", 0.0), Err(EvalError::Domain(_))));
        // Negative base with fractional exponent would be NaN
        assert!(matches!(eval_at("x ** 1.5", -2.0), Err(EvalError::Domain(_))));
    }

    #[test]
    fn test_eval_overflow() {
        assert!(matches!(eval_at("exp(x)", 1000.0), Err(EvalError::Overflow(_))));
        assert!(matches!(eval_at("1e300 * 1e300", 0.0), Err(EvalError::Overflow(_))));
    }

    #[test]
    fn test_eval_unbound_temperature() {
        let expr = parse_expression("x * exp(-1000 / T)").unwrap();
        let result = evaluate(&expr, &Bindings::new().x(1.0));
        assert_eq!(result, Err(EvalError::UnboundVariable(Variable::T)));

        let ok = evaluate(&expr, &Bindings::new().x(2.0).temperature(1000.0)).unwrap();
        assert!((ok.as_scalar().unwrap() - 2.0 * (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_eval_non_finite_binding() {
        let expr = parse_expression("x").unwrap();
        let result = evaluate(&expr, &Bindings::new().x(f64::NAN));
        assert!(matches!(result, Err(EvalError::NonFiniteInput { variable: Variable::X, .. })));
    }

    #[test]
    fn test_eval_array_broadcast() {
        let expr = parse_expression("2 * x + 1").unwrap();
        let out = evaluate(&expr, &Bindings::new().x(vec![0.0, 1.0, 2.5])).unwrap();
        assert_eq!(out, Numeric::Array(vec![1.0, 3.0, 6.0]));
    }

    #[test]
    fn test_eval_array_matches_scalar() {
        let text = "0.1297 * (x / 1000) ** 3 - 2.51 * (x / 1000) ** 1.5 + 3.329 * (x / 1000)";
        let expr = parse_expression(text).unwrap();
        let xs = vec![100.0, 500.0, 1000.0, 1500.0];
        let out = evaluate(&expr, &Bindings::new().x(xs.clone())).unwrap();
        let out = out.into_vec(xs.len());
        for (x, y) in xs.iter().zip(out) {
            let scalar = evaluate(&expr, &Bindings::new().x(*x)).unwrap();
            assert_eq!(scalar.as_scalar(), Some(y));
        }
    }

    #[test]
    fn test_eval_array_length_mismatch() {
        let expr = parse_expression("x * T").unwrap();
        let bindings = Bindings::new().x(vec![1.0, 2.0]).temperature(vec![1.0, 2.0, 3.0]);
        assert_eq!(evaluate(&expr, &bindings), Err(EvalError::LengthMismatch(2, 3)));
    }

    #[test]
    fn test_eval_constant_expression_is_scalar_with_array_binding() {
        let expr = parse_expression("4.2").unwrap();
        let out = evaluate(&expr, &Bindings::new().x(vec![1.0, 2.0])).unwrap();
        assert_eq!(out, Numeric::Scalar(4.2));
    }

    #[test]
    fn test_eval_array_error_reports_first_failure() {
        let expr = parse_expression("log(x)").unwrap();
        let out = evaluate(&expr, &Bindings::new().x(vec![1.0, -1.0]));
        assert!(matches!(out, Err(EvalError::Domain(_))));
    }
}
