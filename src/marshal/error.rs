use std::str::Utf8Error;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarshalError {
    #[error("illegal argument: {0}")]
    InvalidArgument(&'static str),

    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("malformed percent encoding")]
    Encoding(#[from] Utf8Error),
}

impl MarshalError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        MarshalError::Syntax {
            offset,
            message: message.into(),
        }
    }
}
