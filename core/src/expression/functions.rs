//! The fixed registry of functions an expression may call.
//!
//! Expressions come from untrusted JSON, so this table is the only way to
//! reach numeric code from expression text. It is built once and never
//! mutated.

use super::evaluator::EvalError;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Numeric implementation of a builtin. Receives exactly `arity` arguments.
pub type BuiltinFn = fn(&[f64]) -> Result<f64, EvalError>;

/// A callable builtin: name, arity and implementation.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    func: BuiltinFn,
}

impl Builtin {
    /// Apply the builtin to already evaluated arguments.
    pub fn call(&self, args: &[f64]) -> Result<f64, EvalError> {
        (self.func)(args)
    }
}

// Two builtins are the same function iff they share a name; the registry
// guarantees names are unique.
impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

fn domain(name: &str, value: f64) -> EvalError {
    EvalError::Domain(format!("{}({}) is undefined", name, value))
}

fn log(args: &[f64]) -> Result<f64, EvalError> {
    if args[0] <= 0.0 {
        return Err(domain("log", args[0]));
    }
    Ok(args[0].ln())
}

fn log10(args: &[f64]) -> Result<f64, EvalError> {
    if args[0] <= 0.0 {
        return Err(domain("log10", args[0]));
    }
    Ok(args[0].log10())
}

fn sqrt(args: &[f64]) -> Result<f64, EvalError> {
    if args[0] < 0.0 {
        return Err(domain("sqrt", args[0]));
    }
    Ok(args[0].sqrt())
}

fn arccosh(args: &[f64]) -> Result<f64, EvalError> {
    if args[0] < 1.0 {
        return Err(domain("arccosh", args[0]));
    }
    Ok(args[0].acosh())
}

fn arctanh(args: &[f64]) -> Result<f64, EvalError> {
    if args[0].abs() >= 1.0 {
        return Err(domain("arctanh", args[0]));
    }
    Ok(args[0].atanh())
}

fn arcsin(args: &[f64]) -> Result<f64, EvalError> {
    if args[0].abs() > 1.0 {
        return Err(domain("arcsin", args[0]));
    }
    Ok(args[0].asin())
}

fn arccos(args: &[f64]) -> Result<f64, EvalError> {
    if args[0].abs() > 1.0 {
        return Err(domain("arccos", args[0]));
    }
    Ok(args[0].acos())
}

static STANDARD_FUNCTIONS: &[Builtin] = &[
    Builtin { name: "exp", arity: 1, func: |a| Ok(a[0].exp()) },
    Builtin { name: "log", arity: 1, func: log },
    Builtin { name: "log10", arity: 1, func: log10 },
    Builtin { name: "sqrt", arity: 1, func: sqrt },
    Builtin { name: "abs", arity: 1, func: |a| Ok(a[0].abs()) },
    Builtin { name: "sin", arity: 1, func: |a| Ok(a[0].sin()) },
    Builtin { name: "cos", arity: 1, func: |a| Ok(a[0].cos()) },
    Builtin { name: "tan", arity: 1, func: |a| Ok(a[0].tan()) },
    Builtin { name: "arcsin", arity: 1, func: arcsin },
    Builtin { name: "arccos", arity: 1, func: arccos },
    Builtin { name: "arctan", arity: 1, func: |a| Ok(a[0].atan()) },
    Builtin { name: "sinh", arity: 1, func: |a| Ok(a[0].sinh()) },
    Builtin { name: "cosh", arity: 1, func: |a| Ok(a[0].cosh()) },
    Builtin { name: "tanh", arity: 1, func: |a| Ok(a[0].tanh()) },
    Builtin { name: "arcsinh", arity: 1, func: |a| Ok(a[0].asinh()) },
    Builtin { name: "arccosh", arity: 1, func: arccosh },
    Builtin { name: "arctanh", arity: 1, func: arctanh },
    Builtin { name: "min", arity: 2, func: |a| Ok(a[0].min(a[1])) },
    Builtin { name: "max", arity: 2, func: |a| Ok(a[0].max(a[1])) },
];

/// Name → builtin lookup used by the parser.
#[derive(Debug)]
pub struct FunctionRegistry {
    functions: HashMap<&'static str, Builtin>,
}

impl FunctionRegistry {
    /// Build a registry from an explicit list of builtins.
    pub fn from_builtins(builtins: &[Builtin]) -> Self {
        Self {
            functions: builtins.iter().map(|b| (b.name, *b)).collect(),
        }
    }

    /// The shared standard registry, constructed on first use.
    pub fn standard() -> &'static FunctionRegistry {
        static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| Self::from_builtins(STANDARD_FUNCTIONS))
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(name)
    }

    /// Sorted function names, for error messages and the schema export.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod function_tests {
    use super::*;

    #[test]
    fn test_standard_registry_contains_battery_functions() {
        let registry = FunctionRegistry::standard();
        for name in ["exp", "log", "sqrt", "tanh", "sinh", "cosh", "arcsinh", "arctanh", "abs"] {
            assert_eq!(registry.get(name).map(|b| b.arity), Some(1), "{}", name);
        }
        assert_eq!(registry.get("min").map(|b| b.arity), Some(2));
        assert_eq!(registry.get("max").map(|b| b.arity), Some(2));
        assert!(registry.get("eval").is_none());
    }

    #[test]
    fn test_domain_errors() {
        let registry = FunctionRegistry::standard();
        let log = registry.get("log").unwrap();
        assert!(matches!(log.call(&[0.0]), Err(EvalError::Domain(_))));
        let arctanh = registry.get("arctanh").unwrap();
        assert!(matches!(arctanh.call(&[1.0]), Err(EvalError::Domain(_))));
        assert!((arctanh.call(&[0.5]).unwrap() - 0.5f64.atanh()).abs() < 1e-15);
    }

    #[test]
    fn test_names_sorted() {
        let names = FunctionRegistry::standard().names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
