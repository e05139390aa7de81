//! Integration tests for the expression language.

use super::*;

const NMC_OCP: &str = "-3.04420906 * x + 10.04892207 - \
    0.65637536 * tanh(-4.02134095 * (x - 0.80063948)) + \
    4.24678547 * tanh(12.17805062 * (x - 7.57659337)) - \
    0.3757068 * tanh(59.33067782 * (x - 0.99784492))";

const ELECTROLYTE_DIFFUSIVITY: &str =
    "8.794e-11 * (x / 1000) ** 2 - 3.972e-10 * (x / 1000) + 4.862e-10";

fn scalar(text: &str, x: f64) -> f64 {
    let expr = parse_expression(text).unwrap();
    evaluate(&expr, &Bindings::new().x(x)).unwrap().as_scalar().unwrap()
}

#[test]
fn test_positive_electrode_ocp_is_plausible() {
    let v = scalar(NMC_OCP, 0.42424);
    assert!(v > 4.0 && v < 4.5, "unexpected OCP {}", v);
    // OCP decreases with lithiation
    assert!(scalar(NMC_OCP, 0.9621) < v);
}

#[test]
fn test_electrolyte_diffusivity_matches_closed_form() {
    let x: f64 = 1000.0;
    let expected = 8.794e-11 - 3.972e-10 + 4.862e-10;
    assert!((scalar(ELECTROLYTE_DIFFUSIVITY, x) - expected).abs() < 1e-22);
}

#[test]
fn test_arrhenius_style_temperature_dependence() {
    let expr = parse_expression("3.3e-14 * exp(30000 / 8.314 * (1 / 298.15 - 1 / T))").unwrap();
    let at_ref = evaluate(&expr, &Bindings::new().x(0.5).temperature(298.15)).unwrap();
    assert!((at_ref.as_scalar().unwrap() - 3.3e-14).abs() < 1e-26);

    let temps = vec![273.15, 298.15, 323.15];
    let swept = evaluate(&expr, &Bindings::new().x(0.5).temperature(temps)).unwrap();
    let values = swept.into_vec(3);
    assert!(values[0] < values[1] && values[1] < values[2]);
}

#[test]
fn test_custom_registry_restricts_functions() {
    let exp_only = FunctionRegistry::from_builtins(&[*FunctionRegistry::standard().get("exp").unwrap()]);
    assert!(parse_with("exp(x)", &exp_only).is_ok());
    let err = parse_with("tanh(x)", &exp_only).unwrap_err();
    assert!(err.message.contains("Unknown function"));
}

#[test]
fn test_evaluation_is_deterministic() {
    let expr = parse_expression(NMC_OCP).unwrap();
    let bindings = Bindings::new().x(vec![0.1, 0.5, 0.9]);
    let first = evaluate(&expr, &bindings).unwrap();
    let second = evaluate(&expr, &bindings).unwrap();
    assert_eq!(first, second);
}
