//! Restricted arithmetic expressions.
//!
//! Provides a small, closed expression language for parameter functions:
//! - Numbers, the variables `x` and `T`, `+ - * / **`, unary minus
//! - Calls into a fixed, read-only function registry
//! - Scalar or elementwise-array evaluation with checked arithmetic

pub mod evaluator;
pub mod functions;
pub mod parser;

#[cfg(test)]
mod tests;

pub use evaluator::{evaluate, Bindings, EvalError, Numeric};
pub use functions::{Builtin, FunctionRegistry};
pub use parser::{parse_expression, parse_with, BinaryOperator, Expr, SyntaxError, UnaryOperator, Variable};
