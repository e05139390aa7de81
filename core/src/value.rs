//! Parameter values: a constant, an expression or an interpolation table.
//!
//! Every numeric leaf of a BPX document that may vary with an operating
//! point is a [`Value`]. All three representations answer the same
//! `evaluate` / `as_callable` calls.

use crate::error::ValidationError;
use crate::expression::{evaluate, parse_expression, Bindings, EvalError, Expr, Numeric, SyntaxError, Variable};
use crate::table::InterpolatedTable;
use serde::{Serialize, Serializer};
use serde_json::Value as Json;
use std::collections::BTreeSet;
use thiserror::Error;

/// Why a JSON leaf could not become a [`Value`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    #[error("Invalid expression: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("Invalid table: {0}")]
    Table(#[from] ValidationError),
    /// Not a number, string or `{"x": [...], "y": [...]}` object
    #[error("{0}")]
    Shape(String),
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
    variables: BTreeSet<Variable>,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let ast = parse_expression(source)?;
        let variables = ast.variables();
        Ok(Self {
            source: source.to_string(),
            ast,
            variables,
        })
    }

    /// The text the expression was parsed from; this is what gets serialized.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Free variables referenced by the expression.
    pub fn variables(&self) -> &BTreeSet<Variable> {
        &self.variables
    }

    pub fn uses_temperature(&self) -> bool {
        self.variables.contains(&Variable::T)
    }

    pub fn evaluate(&self, bindings: &Bindings) -> Result<Numeric, EvalError> {
        evaluate(&self.ast, bindings)
    }
}

/// Closed set of parameter representations.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Constant(f64),
    Expression(Expression),
    Table(InterpolatedTable),
}

impl Value {
    /// Build a value from a raw JSON leaf.
    pub fn from_json(json: &Json) -> Result<Self, ValueError> {
        match json {
            Json::Number(n) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Value::Constant)
                .ok_or_else(|| ValueError::Shape(format!("number {} is out of range", n))),
            Json::String(text) => Ok(Value::Expression(Expression::parse(text)?)),
            Json::Object(map) => {
                if let Some(key) = map.keys().find(|k| *k != "x" && *k != "y") {
                    return Err(ValueError::Shape(format!(
                        "table objects only take 'x' and 'y', found '{}'",
                        key
                    )));
                }
                let x = number_list(map.get("x"), "x")?;
                let y = number_list(map.get("y"), "y")?;
                Ok(Value::Table(InterpolatedTable::new(x, y)?))
            }
            other => Err(ValueError::Shape(format!(
                "expected a number, an expression string or an {{\"x\", \"y\"}} table, found {}",
                json_kind(other)
            ))),
        }
    }

    /// Evaluate at `x`, with an optional temperature `t`.
    ///
    /// Constants ignore both arguments and tables ignore `t`.
    pub fn evaluate(&self, x: f64, t: Option<f64>) -> Result<f64, EvalError> {
        match self {
            Value::Constant(c) => Ok(*c),
            Value::Expression(expr) => {
                let mut bindings = Bindings::new().x(x);
                if let Some(t) = t {
                    bindings = bindings.temperature(t);
                }
                let out = expr.evaluate(&bindings)?;
                // Scalar bindings always give a scalar
                Ok(out.into_vec(1)[0])
            }
            Value::Table(table) => {
                check_table_input(&[x])?;
                Ok(table.evaluate(x))
            }
        }
    }

    /// Evaluate at every point of `xs`.
    pub fn evaluate_many(&self, xs: &[f64], t: Option<f64>) -> Result<Vec<f64>, EvalError> {
        match self {
            Value::Constant(c) => Ok(vec![*c; xs.len()]),
            Value::Expression(expr) => {
                let mut bindings = Bindings::new().x(xs);
                if let Some(t) = t {
                    bindings = bindings.temperature(t);
                }
                Ok(expr.evaluate(&bindings)?.into_vec(xs.len()))
            }
            Value::Table(table) => {
                check_table_input(xs)?;
                Ok(table.evaluate_many(xs))
            }
        }
    }

    /// A function of `x` alone.
    pub fn as_callable(&self) -> impl Fn(f64) -> Result<f64, EvalError> + '_ {
        move |x| self.evaluate(x, None)
    }

    /// A function of `x` and temperature.
    pub fn as_callable_with_temperature(&self) -> impl Fn(f64, f64) -> Result<f64, EvalError> + '_ {
        move |x, t| self.evaluate(x, Some(t))
    }

    /// The canonical JSON form of this value.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Constant(c) => Json::from(*c),
            Value::Expression(expr) => Json::String(expr.source.clone()),
            Value::Table(table) => serde_json::json!({ "x": table.x(), "y": table.y() }),
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Value::Expression(expr) => Some(expr),
            Value::Constant(_) | Value::Table(_) => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Constant(c) => serializer.serialize_f64(*c),
            Value::Expression(expr) => serializer.serialize_str(&expr.source),
            Value::Table(table) => table.serialize(serializer),
        }
    }
}

// Same input contract as expression evaluation.
fn check_table_input(xs: &[f64]) -> Result<(), EvalError> {
    match xs.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(EvalError::NonFiniteInput {
            variable: Variable::X,
            value,
        }),
        None => Ok(()),
    }
}

fn number_list(json: Option<&Json>, key: &str) -> Result<Vec<f64>, ValueError> {
    let items = json
        .and_then(Json::as_array)
        .ok_or_else(|| ValueError::Shape(format!("table is missing a '{}' list", key)))?;
    items
        .iter()
        .map(|item| {
            item.as_f64()
                .ok_or_else(|| ValueError::Shape(format!("'{}' must only contain numbers", key)))
        })
        .collect()
}

/// Short description of a JSON value's type, for messages.
pub(crate) fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "a list",
        Json::Object(_) => "an object",
    }
}
