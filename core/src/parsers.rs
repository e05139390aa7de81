//! Entry points: raw JSON in, validated document (or diagnostics) out.

use crate::error::{BpxError, BpxResult};
use crate::schema::{parse_document, ParameterDocument};
use crate::settings::ParseOptions;
use crate::validation::{validate, Warning};
use serde::Serialize;
use serde_json::Value as Json;
use std::path::Path;
use tracing::debug;

/// A structurally valid document plus its consistency findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parsed {
    pub document: ParameterDocument,
    pub warnings: Vec<Warning>,
}

impl Parsed {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Parse BPX JSON text.
pub fn parse_str(text: &str, options: &ParseOptions) -> BpxResult<Parsed> {
    options.validate()?;
    debug!(bytes = text.len(), "parsing BPX text");
    let json: Json = serde_json::from_str(text)?;
    finish(&json, options)
}

/// Parse an already decoded JSON tree.
pub fn parse_json(json: &Json, options: &ParseOptions) -> BpxResult<Parsed> {
    options.validate()?;
    debug!("parsing BPX object");
    finish(json, options)
}

/// Read and parse a BPX JSON file.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> BpxResult<Parsed> {
    options.validate()?;
    let path = path.as_ref();
    debug!(path = %path.display(), "parsing BPX file");
    let text = std::fs::read_to_string(path)?;
    let json: Json = serde_json::from_str(&text)?;
    finish(&json, options)
}

fn finish(json: &Json, options: &ParseOptions) -> BpxResult<Parsed> {
    let document = parse_document(json)?;
    let warnings = validate(&document, &options.tolerances);

    if options.strict && warnings.iter().any(Warning::is_consistency) {
        debug!(warnings = warnings.len(), "strict mode: escalating warnings");
        return Err(BpxError::Consistency {
            warnings,
            document: Box::new(document),
        });
    }
    debug!(model = %document.model(), warnings = warnings.len(), "parsed BPX document");
    Ok(Parsed { document, warnings })
}
