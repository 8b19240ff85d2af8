use thiserror::Error;

use crate::cache::CacheError;
use crate::marshal::MarshalError;
use crate::rest::RestError;

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("sign-on required")]
    SessionRequired,

    #[error("error exchanging with the service")]
    Rest(#[from] RestError),

    #[error("error resolving entity")]
    Cache(#[from] CacheError),

    #[error("error marshaling request data")]
    Marshal(#[from] MarshalError),

    #[error("error converting entity data")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(&'static str),
}
