pub mod error;
pub mod form;
pub mod xml;

pub use error::MarshalError;

use serde_json::Value;

/// Text form of a scalar value, `None` for records and sequences.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}
