use thiserror::Error;

use crate::rest::RestError;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("entity lacks a scalar identity field")]
    MissingIdentity,

    #[error("error retrieving entity")]
    Rest(#[from] RestError),
}
