//! Consistency checks on a structurally valid document.
//!
//! Nothing here fails: every finding is a [`Warning`]. The facade decides
//! whether warnings are escalated.

use crate::schema::fields::{electrode, parameterisation, Field};
use crate::schema::{ModelType, ParameterDocument, Particle};
use crate::settings::{Tolerances, VOLTAGE_CHECK};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};


/// Which voltage cut-off a mismatch concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoltageLimit {
    #[serde(rename = "Upper voltage cut-off [V]")]
    Upper,
    #[serde(rename = "Lower voltage cut-off [V]")]
    Lower,
}

impl fmt::Display for VoltageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoltageLimit::Upper => f.write_str("upper voltage cut-off"),
            VoltageLimit::Lower => f.write_str("lower voltage cut-off"),
        }
    }
}

/// A non-fatal finding about a parsed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Fields that play no part in the declared model.
    UnusedFields { model: ModelType, fields: Vec<String> },
    /// A cut-off predicted from the OCPs at the stoichiometry limits
    /// disagrees with the declared one.
    VoltageMismatch {
        limit: VoltageLimit,
        /// Positive electrode stoichiometry and OCP used for the prediction.
        positive_stoichiometry: f64,
        positive_ocp: f64,
        /// Negative electrode stoichiometry and OCP used for the prediction.
        negative_stoichiometry: f64,
        negative_ocp: f64,
        predicted: f64,
        declared: f64,
        mismatch: f64,
        tolerance: f64,
    },
    /// An OCP could not be evaluated at a stoichiometry limit.
    OcpEvaluation {
        electrode: String,
        stoichiometry: f64,
        message: String,
    },
    /// The `BPX` version is a bare number.
    DeprecatedVersion { version: String },
}

impl Warning {
    /// Consistency findings, as opposed to deprecation notices. Only these
    /// are escalated by strict parsing.
    pub fn is_consistency(&self) -> bool {
        !matches!(self, Warning::DeprecatedVersion { .. })
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnusedFields { model, fields } => write!(
                f,
                "fields not used by the {} model were provided: {}",
                model,
                fields.join(", ")
            ),
            Warning::VoltageMismatch {
                limit,
                positive_stoichiometry,
                positive_ocp,
                negative_stoichiometry,
                negative_ocp,
                predicted,
                declared,
                mismatch,
                tolerance,
            } => write!(
                f,
                "the {} computed from the Positive electrode OCP at stoichiometry {} ({} V) and the Negative electrode OCP at stoichiometry {} ({} V) is {} V, which differs from the declared {} V by {:.4} V, above the tolerance of {} V",
                limit,
                positive_stoichiometry,
                positive_ocp,
                negative_stoichiometry,
                negative_ocp,
                predicted,
                declared,
                mismatch,
                tolerance
            ),
            Warning::OcpEvaluation {
                electrode,
                stoichiometry,
                message,
            } => write!(
                f,
                "could not evaluate the {} OCP at stoichiometry {}: {}",
                electrode, stoichiometry, message
            ),
            Warning::DeprecatedVersion { version } => write!(
                f,
                "BPX version {} is a bare number; use a MAJOR.MINOR.PATCH string",
                version
            ),
        }
    }
}

/// Run every check and return the findings in a stable order.
pub fn validate(doc: &ParameterDocument, tolerances: &Tolerances) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if doc.header.bpx.is_legacy() {
        warnings.push(Warning::DeprecatedVersion {
            version: doc.header.bpx.to_string(),
        });
    }
    warnings.extend(check_completeness(doc));
    warnings.extend(check_voltage_limits(doc, tolerances));

    for w in &warnings {
        warn!(kind = kind_name(w), "{}", w);
    }
    warnings
}

fn kind_name(w: &Warning) -> &'static str {
    match w {
        Warning::UnusedFields { .. } => "unused_fields",
        Warning::VoltageMismatch { .. } => "voltage_mismatch",
        Warning::OcpEvaluation { .. } => "ocp_evaluation",
        Warning::DeprecatedVersion { .. } => "deprecated_version",
    }
}

/// Report fields present in the document that the declared model never uses.
pub fn check_completeness(doc: &ParameterDocument) -> Option<Warning> {
    let model = doc.model();
    let p = &doc.parameterisation;
    let mut fields = Vec::new();
    let mut note = |field: &Field, present: bool, prefix: Option<&str>| {
        if present && field.need.is_unused(model) {
            fields.push(match prefix {
                Some(prefix) => format!("{}/{}", prefix, field.key),
                None => field.key.to_string(),
            });
        }
    };

    note(&parameterisation::ELECTROLYTE, p.electrolyte.is_some(), None);
    for (section, e) in p.electrodes() {
        let prefix = Some(section.key);
        note(&electrode::POROSITY, e.porosity.is_some(), prefix);
        note(&electrode::TRANSPORT_EFFICIENCY, e.transport_efficiency.is_some(), prefix);
        note(&electrode::CONDUCTIVITY, e.conductivity.is_some(), prefix);
    }
    note(&parameterisation::SEPARATOR, p.separator.is_some(), None);

    if fields.is_empty() {
        None
    } else {
        Some(Warning::UnusedFields { model, fields })
    }
}

/// Compare the cut-offs implied by the OCPs at the stoichiometry limits
/// against the declared ones.
///
/// Only runs when both electrodes are single-material with expression
/// OCPs. Tables and blends are skipped.
pub fn check_voltage_limits(doc: &ParameterDocument, tolerances: &Tolerances) -> Vec<Warning> {
    let p = &doc.parameterisation;
    let (Some(negative), Some(positive)) = (p.negative_electrode.particle(), p.positive_electrode.particle()) else {
        debug!("voltage check skipped: blended electrode");
        return Vec::new();
    };
    if negative.ocp.as_expression().is_none() || positive.ocp.as_expression().is_none() {
        debug!("voltage check skipped: OCP is not an expression");
        return Vec::new();
    }

    // OCPs are given at the reference temperature
    let t = p.cell.reference_temperature.unwrap_or(p.cell.ambient_temperature);
    let ocp = |name: &Field, particle: &Particle, sto: f64| {
        particle.ocp.evaluate(sto, Some(t)).map_err(|err| Warning::OcpEvaluation {
            electrode: name.key.to_string(),
            stoichiometry: sto,
            message: err.to_string(),
        })
    };
    let n = &parameterisation::NEGATIVE_ELECTRODE;
    let pos = &parameterisation::POSITIVE_ELECTRODE;

    // (limit, positive stoichiometry, negative stoichiometry, declared)
    let limits = [
        (
            VoltageLimit::Upper,
            positive.minimum_stoichiometry,
            negative.maximum_stoichiometry,
            p.cell.upper_voltage_cutoff,
        ),
        (
            VoltageLimit::Lower,
            positive.maximum_stoichiometry,
            negative.minimum_stoichiometry,
            p.cell.lower_voltage_cutoff,
        ),
    ];

    let tolerance = tolerances.voltage();
    let mut warnings = Vec::new();
    for (limit, sto_p, sto_n, declared) in limits {
        let (ocp_p, ocp_n) = match (ocp(pos, positive, sto_p), ocp(n, negative, sto_n)) {
            (Ok(a), Ok(b)) => (a, b),
            (a, b) => {
                warnings.extend(a.err());
                warnings.extend(b.err());
                continue;
            }
        };
        let predicted = ocp_p - ocp_n;
        let mismatch = (predicted - declared).abs();
        debug!(check = VOLTAGE_CHECK, %limit, predicted, declared, "voltage check");
        if mismatch > tolerance {
            warnings.push(Warning::VoltageMismatch {
                limit,
                positive_stoichiometry: sto_p,
                positive_ocp: ocp_p,
                negative_stoichiometry: sto_n,
                negative_ocp: ocp_n,
                predicted,
                declared,
                mismatch,
                tolerance,
            });
        }
    }
    warnings
}
