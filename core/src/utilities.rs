//! Helpers for setting up a simulation from a parsed document.

use crate::error::ValidationError;
use crate::schema::{ParameterDocument, Particle};

fn particles(doc: &ParameterDocument) -> Result<(&Particle, &Particle), ValidationError> {
    let p = &doc.parameterisation;
    match (p.negative_electrode.particle(), p.positive_electrode.particle()) {
        (Some(n), Some(pos)) => Ok((n, pos)),
        _ => Err(ValidationError::new(
            "blended electrodes have no single stoichiometry window",
        )),
    }
}

/// Negative and positive electrode stoichiometries at a state of charge.
///
/// The negative electrode fills from its minimum stoichiometry as `soc`
/// rises while the positive electrode empties from its maximum.
pub fn electrode_stoichiometries(doc: &ParameterDocument, soc: f64) -> Result<(f64, f64), ValidationError> {
    if !(0.0..=1.0).contains(&soc) {
        return Err(ValidationError::new(format!(
            "target SOC should be between 0 and 1, got {}",
            soc
        )));
    }
    let (n, p) = particles(doc)?;
    let sto_n = n.minimum_stoichiometry + (n.maximum_stoichiometry - n.minimum_stoichiometry) * soc;
    let sto_p = p.maximum_stoichiometry - (p.maximum_stoichiometry - p.minimum_stoichiometry) * soc;
    Ok((sto_n, sto_p))
}

/// Lithium concentrations [mol.m-3] in each electrode at a state of charge.
pub fn electrode_concentrations(doc: &ParameterDocument, soc: f64) -> Result<(f64, f64), ValidationError> {
    let (sto_n, sto_p) = electrode_stoichiometries(doc, soc)?;
    let (n, p) = particles(doc)?;
    Ok((sto_n * n.maximum_concentration, sto_p * p.maximum_concentration))
}

#[cfg(test)]
mod utility_tests {
    use super::*;
    use crate::schema::parse_document;

    fn doc() -> ParameterDocument {
        let json = serde_json::from_str(include_str!("../tests/data/linear_ocp_spm.json")).unwrap();
        parse_document(&json).unwrap()
    }

    #[test]
    fn test_stoichiometries_at_limits() {
        let d = doc();
        assert_eq!(electrode_stoichiometries(&d, 0.0).unwrap(), (0.1, 0.9));
        let (n, p) = electrode_stoichiometries(&d, 1.0).unwrap();
        assert!((n - 0.9).abs() < 1e-12);
        assert!((p - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_concentrations_scale_by_maximum() {
        let d = doc();
        let (c_n, c_p) = electrode_concentrations(&d, 0.5).unwrap();
        assert!((c_n - 0.5 * 33133.0).abs() < 1e-6);
        assert!((c_p - 0.5 * 63104.0).abs() < 1e-6);
    }

    #[test]
    fn test_soc_out_of_range() {
        let d = doc();
        assert!(electrode_stoichiometries(&d, -0.1).is_err());
        let err = electrode_concentrations(&d, 1.1).unwrap_err();
        assert!(err.0.contains("between 0 and 1"));
    }
}
