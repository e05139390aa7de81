//! Typed BPX parameter document.
//!
//! [`parse_document`] walks a decoded JSON tree against the field tables in
//! [`fields`], rejecting unknown keys and collecting every structural problem
//! into one [`SchemaError`]. A document is only returned when the whole tree
//! is valid, and it is immutable from then on.

pub mod export;
pub mod fields;
mod reader;
mod sections;
mod user_defined;

#[cfg(test)]
mod tests;

pub use reader::{IssueKind, SchemaError, SchemaIssue};
pub use sections::{
    ActiveMaterial, Blend, BlendComponent, Cell, Electrode, Electrolyte, Experiment, Particle, Separator,
    BLEND_FRACTION_TOLERANCE,
};
pub use user_defined::{UserDefined, UserEntry, DESCRIPTION_KEY};

use crate::error::ValidationError;
use crate::value::{json_kind, Value};
use fields::{document, experiment, header, parameterisation, Field};
use reader::{join_path, Issues, Section, SectionWriter};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as Json;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Battery model a parameter set targets, ordered by fidelity.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelType {
    SPM,
    SPMe,
    DFN,
}

impl ModelType {
    pub const ALL: [ModelType; 3] = [ModelType::SPM, ModelType::SPMe, ModelType::DFN];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::SPM => "SPM",
            ModelType::SPMe => "SPMe",
            ModelType::DFN => "DFN",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ValidationError::new(format!("unknown model '{}', expected one of SPM, SPMe, DFN", s)))
    }
}

/// Version tag from the `BPX` header field.
#[derive(Debug, Clone, PartialEq)]
pub enum BpxVersion {
    /// `MAJOR.MINOR.PATCH`
    Semantic(String),
    /// Bare number from early files; still read but deprecated.
    Legacy(f64),
}

impl BpxVersion {
    pub fn from_json(json: &Json) -> Result<Self, String> {
        match json {
            Json::String(s) if is_semver(s) => Ok(BpxVersion::Semantic(s.clone())),
            Json::String(s) => Err(format!("'{}' is not a MAJOR.MINOR.PATCH version", s)),
            Json::Number(n) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(BpxVersion::Legacy)
                .ok_or_else(|| format!("version {} is out of range", n)),
            other => Err(format!("expected a version string, found {}", json_kind(other))),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, BpxVersion::Legacy(_))
    }

    pub fn to_json(&self) -> Json {
        match self {
            BpxVersion::Semantic(s) => Json::String(s.clone()),
            BpxVersion::Legacy(v) => Json::from(*v),
        }
    }
}

impl fmt::Display for BpxVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BpxVersion::Semantic(s) => f.write_str(s),
            BpxVersion::Legacy(v) => write!(f, "{}", v),
        }
    }
}

fn is_semver(s: &str) -> bool {
    let parts: Vec<&str> = s.split('.').collect();
    parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub bpx: BpxVersion,
    pub title: Option<String>,
    pub description: Option<String>,
    pub references: Option<String>,
    pub model: ModelType,
}

impl Header {
    fn read(s: &mut Section) -> Self {
        let bpx = match s.raw(&header::BPX) {
            Some(json) => BpxVersion::from_json(json).unwrap_or_else(|message| {
                let path = s.child_path(&header::BPX);
                s.issues().push(path, IssueKind::WrongType, message);
                BpxVersion::Semantic(String::new())
            }),
            None => BpxVersion::Semantic(String::new()),
        };
        let title = s.opt_text(&header::TITLE);
        let description = s.opt_text(&header::DESCRIPTION);
        let references = s.opt_text(&header::REFERENCES);
        let model = match s.opt_text(&header::MODEL) {
            Some(name) => name.parse().unwrap_or_else(|err: ValidationError| {
                let path = s.child_path(&header::MODEL);
                s.issues().push(path, IssueKind::Validation, err.0);
                ModelType::SPM
            }),
            None => ModelType::SPM,
        };
        Self {
            bpx,
            title,
            description,
            references,
            model,
        }
    }

    fn write(&self, w: &mut SectionWriter) {
        w.json(&header::BPX, self.bpx.to_json())
            .opt_text(&header::TITLE, self.title.as_deref())
            .opt_text(&header::DESCRIPTION, self.description.as_deref())
            .opt_text(&header::REFERENCES, self.references.as_deref())
            .json(&header::MODEL, Json::String(self.model.to_string()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameterisation {
    pub cell: Cell,
    pub electrolyte: Option<Electrolyte>,
    pub negative_electrode: Electrode,
    pub positive_electrode: Electrode,
    pub separator: Option<Separator>,
    pub user_defined: Option<UserDefined>,
}

impl Parameterisation {
    fn read(s: &mut Section) -> Option<Self> {
        let cell = s
            .child(&parameterisation::CELL, &[fields::cell::FIELDS])
            .map(|mut c| Cell::read(&mut c));
        let electrolyte = s
            .child(&parameterisation::ELECTROLYTE, &[fields::electrolyte::FIELDS])
            .map(|mut c| Electrolyte::read(&mut c));
        let negative_electrode = read_electrode(s, &parameterisation::NEGATIVE_ELECTRODE);
        let positive_electrode = read_electrode(s, &parameterisation::POSITIVE_ELECTRODE);
        let separator = s
            .child(&parameterisation::SEPARATOR, &[fields::separator::FIELDS])
            .map(|mut c| Separator::read(&mut c));
        let user_defined = s.raw(&parameterisation::USER_DEFINED).map(|json| {
            let path = s.child_path(&parameterisation::USER_DEFINED);
            UserDefined::read(json, path, s.issues())
        });

        Some(Self {
            cell: cell?,
            electrolyte,
            negative_electrode: negative_electrode?,
            positive_electrode: positive_electrode?,
            separator,
            user_defined,
        })
    }

    fn write(&self, w: &mut SectionWriter) {
        let mut cell = SectionWriter::new();
        self.cell.write(&mut cell);
        w.json(&parameterisation::CELL, cell.finish());

        if let Some(electrolyte) = &self.electrolyte {
            let mut section = SectionWriter::new();
            electrolyte.write(&mut section);
            w.json(&parameterisation::ELECTROLYTE, section.finish());
        }
        for (field, electrode) in self.electrodes() {
            let mut section = SectionWriter::new();
            electrode.write(&mut section);
            w.json(field, section.finish());
        }
        if let Some(separator) = &self.separator {
            let mut section = SectionWriter::new();
            separator.write(&mut section);
            w.json(&parameterisation::SEPARATOR, section.finish());
        }
        if let Some(user_defined) = &self.user_defined {
            w.json(&parameterisation::USER_DEFINED, user_defined.to_json());
        }
    }

    /// Negative then positive electrode, with their fields.
    pub fn electrodes(&self) -> [(&'static Field, &Electrode); 2] {
        [
            (&parameterisation::NEGATIVE_ELECTRODE, &self.negative_electrode),
            (&parameterisation::POSITIVE_ELECTRODE, &self.positive_electrode),
        ]
    }
}

fn read_electrode(s: &mut Section, field: &Field) -> Option<Electrode> {
    let json = s.raw(field)?;
    let blended = json.get(fields::electrode::PARTICLE.key).is_some();
    let mut section = s.nested(json, field.key, Electrode::tables(blended));
    Some(Electrode::read(&mut section, blended))
}

/// A structurally valid BPX document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDocument {
    pub header: Header,
    pub parameterisation: Parameterisation,
    pub validation: Option<BTreeMap<String, Experiment>>,
}

impl ParameterDocument {
    pub fn model(&self) -> ModelType {
        self.header.model
    }

    /// Canonical JSON, using the wire names of the standard.
    pub fn to_json(&self) -> Json {
        let mut head = SectionWriter::new();
        self.header.write(&mut head);
        let mut params = SectionWriter::new();
        self.parameterisation.write(&mut params);

        let mut root = SectionWriter::new();
        root.json(&document::HEADER, head.finish())
            .json(&document::PARAMETERISATION, params.finish());
        if let Some(experiments) = &self.validation {
            let mut all = SectionWriter::new();
            for (name, experiment) in experiments {
                let mut e = SectionWriter::new();
                experiment.write(&mut e);
                all.entry(name, e.finish());
            }
            root.json(&document::VALIDATION, all.finish());
        }
        root.finish()
    }

    /// Every Value-typed field with its `/`-joined wire path.
    pub fn values(&self) -> Vec<(String, &Value)> {
        let p = &self.parameterisation;
        let base = document::PARAMETERISATION.key;
        let mut out = Vec::new();

        if let Some(electrolyte) = &p.electrolyte {
            let prefix = join_path(base, parameterisation::ELECTROLYTE.key);
            for (field, value) in electrolyte.values() {
                out.push((join_path(&prefix, field.key), value));
            }
        }
        for (field, electrode) in p.electrodes() {
            let prefix = join_path(base, field.key);
            for (path, value) in electrode.values() {
                out.push((join_path(&prefix, &path), value));
            }
        }
        if let Some(user_defined) = &p.user_defined {
            out.extend(user_defined.values(&join_path(base, parameterisation::USER_DEFINED.key)));
        }
        out
    }

    /// Look up one Value by the path [`values`](Self::values) reports.
    pub fn value(&self, path: &str) -> Option<&Value> {
        self.values().into_iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }
}

impl Serialize for ParameterDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Model named in the header, if readable. Requirements depend on it before
/// the header itself has been checked.
fn declared_model(json: &Json) -> ModelType {
    json.get(document::HEADER.key)
        .and_then(|h| h.get(header::MODEL.key))
        .and_then(Json::as_str)
        .and_then(|m| m.parse().ok())
        .unwrap_or(ModelType::SPM)
}

/// Structurally validate a decoded JSON tree.
pub fn parse_document(json: &Json) -> Result<ParameterDocument, SchemaError> {
    let model = declared_model(json);
    let mut issues = Issues::default();

    let mut root = Section::open(json, String::new(), &[document::FIELDS], model, &mut issues);
    let head = root
        .child(&document::HEADER, &[header::FIELDS])
        .map(|mut s| Header::read(&mut s));
    let parameterisation = root
        .child(&document::PARAMETERISATION, &[parameterisation::FIELDS])
        .and_then(|mut s| Parameterisation::read(&mut s));
    let validation = root
        .raw(&document::VALIDATION)
        .map(|json| read_validation(&mut root, json));

    let result = match (head, parameterisation) {
        (Some(header), Some(parameterisation)) => issues.into_result(ParameterDocument {
            header,
            parameterisation,
            validation,
        }),
        _ => Err(issues.into_error()),
    };
    match &result {
        Ok(doc) => debug!(model = %doc.model(), "document is structurally valid"),
        Err(err) => debug!(issues = err.issues.len(), "document failed structural validation"),
    }
    result
}

fn read_validation<'a>(root: &mut Section<'a>, json: &'a Json) -> BTreeMap<String, Experiment> {
    let mut experiments = BTreeMap::new();
    let Some(map) = json.as_object() else {
        let path = root.child_path(&document::VALIDATION);
        root.issues().push(
            path,
            IssueKind::WrongType,
            format!("expected an object of named experiments, found {}", json_kind(json)),
        );
        return experiments;
    };
    for (name, entry) in map {
        let key = join_path(document::VALIDATION.key, name);
        let mut section = root.nested(entry, &key, &[experiment::FIELDS]);
        if let Some(e) = Experiment::read(&mut section) {
            experiments.insert(name.clone(), e);
        }
    }
    experiments
}
