//! Serialization of extracted documents.

mod json;

pub use json::{to_json, to_json_value, JsonFormat};
