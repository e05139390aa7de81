//! Machine-readable description of the document shape.
//!
//! Generated from the same field tables the reader uses, so the export can
//! never drift from what [`parse_document`](super::parse_document) accepts.

use super::fields::{
    cell, document, electrode, electrolyte, experiment, header, parameterisation, particle, separator, Field, Kind,
    Need,
};
use super::ModelType;
use crate::expression::FunctionRegistry;
use serde_json::{json, Map, Value as Json};

fn need_label(need: Need) -> String {
    match need {
        Need::Always => "always".to_string(),
        Need::Optional => "optional".to_string(),
        Need::From(model) => format!("from {}", model),
    }
}

fn kind_schema(field: &Field) -> Json {
    match field.kind {
        Kind::Number => json!({"type": "number"}),
        Kind::Count => json!({"type": "integer", "minimum": 1}),
        Kind::Text => json!({"type": "string"}),
        Kind::Version => json!({
            "anyOf": [
                {"type": "string", "pattern": "^\\d+\\.\\d+\\.\\d+$"},
                {"type": "number", "deprecated": true}
            ]
        }),
        Kind::Model => {
            let names: Vec<&str> = ModelType::ALL.iter().map(|m| m.as_str()).collect();
            json!({ "enum": names })
        }
        Kind::Value => json!({"$ref": "#/$defs/Value"}),
        Kind::NumberList => json!({"type": "array", "items": {"type": "number"}}),
        Kind::Section | Kind::Mapping => json!({"$ref": format!("#/$defs/{}", def_name(field))}),
    }
}

/// Definition name for a field holding a nested object.
fn def_name(field: &Field) -> &'static str {
    match field.key {
        "Negative electrode" | "Positive electrode" => "Electrode",
        "User-defined" => "UserDefined",
        key => key,
    }
}

fn property(field: &Field) -> Json {
    let mut schema = kind_schema(field);
    if let Json::Object(map) = &mut schema {
        map.insert("title".into(), json!(field.name));
        map.insert("description".into(), json!(field.description));
        map.insert("x-requirement".into(), json!(need_label(field.need)));
    }
    schema
}

/// An object whose keys come from `tables`.
fn object(tables: &[&[Field]]) -> Json {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in tables.iter().flat_map(|t| t.iter()) {
        properties.insert(field.key.to_string(), property(field));
        if field.need == Need::Always {
            required.push(field.key);
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// JSON-Schema-style description of a BPX document.
pub fn export() -> Json {
    let single = object(&[electrode::FIELDS, particle::FIELDS]);
    let blended = object(&[electrode::FIELDS, electrode::BLEND_FIELDS]);
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "BPX",
        "type": "object",
        "properties": object(&[document::FIELDS])["properties"].clone(),
        "required": [document::HEADER.key, document::PARAMETERISATION.key],
        "additionalProperties": false,
        "$defs": {
            "Value": {
                "anyOf": [
                    {"type": "number"},
                    {
                        "type": "string",
                        "description": "Expression in x (and optionally T)",
                        "x-functions": FunctionRegistry::standard().names()
                    },
                    {"$ref": "#/$defs/InterpolatedTable"}
                ]
            },
            "InterpolatedTable": {
                "type": "object",
                "properties": {
                    "x": {"type": "array", "items": {"type": "number"}, "minItems": 2},
                    "y": {"type": "array", "items": {"type": "number"}, "minItems": 2}
                },
                "required": ["x", "y"],
                "additionalProperties": false
            },
            "Header": object(&[header::FIELDS]),
            "Parameterisation": object(&[parameterisation::FIELDS]),
            "Cell": object(&[cell::FIELDS]),
            "Electrolyte": object(&[electrolyte::FIELDS]),
            "Electrode": {"oneOf": [single, blended]},
            "Particle": {
                "type": "object",
                "additionalProperties": object(&[particle::FIELDS, particle::BLEND_FIELDS]),
                "minProperties": 1
            },
            "Separator": object(&[separator::FIELDS]),
            "Experiment": object(&[experiment::FIELDS]),
            "Validation": {
                "type": "object",
                "additionalProperties": {"$ref": "#/$defs/Experiment"}
            },
            "UserDefined": {
                "type": "object",
                "properties": {"description": {"type": "string"}},
                "additionalProperties": {
                    "anyOf": [{"$ref": "#/$defs/Value"}, {"$ref": "#/$defs/UserDefined"}]
                }
            }
        }
    })
}
