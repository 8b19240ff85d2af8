use std::string::FromUtf8Error;

use http::HeaderMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestError {
    /// Response status outside the 200..=299 success range; carries the raw
    /// response headers for callers that need them.
    #[error("HTTP {status} {reason}")]
    Http {
        status: u16,
        reason: String,
        headers: HeaderMap,
    },

    #[error("HTTP exchange failed")]
    Transport(#[from] reqwest::Error),

    #[error("invalid resource URI")]
    Uri(#[from] url::ParseError),

    #[error("error decoding response body")]
    Decode(#[from] serde_json::Error),

    #[error("error reading response as text")]
    Utf8(#[from] FromUtf8Error),
}

impl RestError {
    /// The response status code, if this is an HTTP status failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
