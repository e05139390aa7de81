pub mod error;
pub mod expression;
pub mod parsers;
pub mod schema;
pub mod settings;
pub mod table;
pub mod utilities;
pub mod validation;
pub mod value;

pub use error::{BpxError, BpxResult, ValidationError};
pub use parsers::{parse_file, parse_json, parse_str, Parsed};
pub use schema::{ModelType, ParameterDocument};
pub use settings::{ParseOptions, Tolerances};
pub use validation::Warning;
pub use value::Value;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
