//! Marshaler for application/x-www-form-urlencoded data.
//!
//! Form records are flat: every field either holds a scalar, a sequence of
//! scalars, or null. Null fields travel as a bare key without `=`, sequence
//! fields as one `key=value` entry per element in sequence order. Keys and
//! values are percent-encoded with the same character set a browser's
//! `encodeURIComponent` uses, so spaces become `%20` rather than `+`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::marshal::error::MarshalError;
use crate::marshal::scalar_text;

// everything except the unreserved characters of encodeURIComponent
const FORM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Marshals the given flat record into form-encoded text, preserving the
/// record's key order. Fails with [`MarshalError::InvalidArgument`] if the
/// value is null, a sequence, or contains nested records or sequences.
pub fn marshal(object: &Value) -> Result<String, MarshalError> {
    let Value::Object(map) = object else {
        return Err(MarshalError::InvalidArgument(
            "only a flat record may be form encoded",
        ));
    };

    let mut entries = Vec::new();
    for (key, value) in map {
        let prefix = utf8_percent_encode(key, FORM_ENCODE_SET).to_string();
        match value {
            Value::Null => entries.push(prefix),
            Value::Array(elements) => {
                for element in elements {
                    entries.push(encode_entry(&prefix, element)?);
                }
            }
            _ => entries.push(encode_entry(&prefix, value)?),
        }
    }

    Ok(entries.join("&"))
}

/// Unmarshals the given form-encoded text into a record. A key without `=`
/// yields a null value; repeated keys accumulate into a sequence in encounter
/// order.
pub fn unmarshal(text: &str) -> Result<Value, MarshalError> {
    let mut object = Map::new();

    for entry in text.split('&') {
        let (key, value) = match entry.split_once('=') {
            Some((key, value)) => (decode(key)?, Value::String(decode(value)?)),
            None => (decode(entry)?, Value::Null),
        };

        match object.entry(key) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Value::Array(elements) => elements.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(value);
            }
        }
    }

    Ok(Value::Object(object))
}

fn encode_entry(prefix: &str, value: &Value) -> Result<String, MarshalError> {
    let text = scalar_text(value).ok_or(MarshalError::InvalidArgument(
        "form values must be scalar or sequences of scalars",
    ))?;
    Ok(format!(
        "{prefix}={}",
        utf8_percent_encode(&text, FORM_ENCODE_SET)
    ))
}

fn decode(text: &str) -> Result<String, MarshalError> {
    Ok(percent_decode_str(text).decode_utf8()?.into_owned())
}
