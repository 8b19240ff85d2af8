//! REST backed entity cache.
//!
//! Fronts the service's polymorphic entity read endpoint with a keyed
//! in-memory mapping: a hit resolves immediately without touching the
//! network, a miss issues a single GET and stores the decoded entity. There
//! is no expiry and no eviction; entries only leave the cache through
//! [`EntityCache::remove`], [`EntityCache::clear`], or by being overwritten.

pub mod error;

pub use error::CacheError;

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::marshal::scalar_text;
use crate::rest::RestClient;

pub struct EntityCache {
    rest: Arc<RestClient>,
    request_path: String,
    content: Mutex<HashMap<String, Value>>,
}

impl EntityCache {
    /// Creates a cache fetching missing entities from the given
    /// service-relative path, fixed for the cache's lifetime.
    pub fn new(rest: Arc<RestClient>, request_path: impl Into<String>) -> Self {
        Self {
            rest,
            request_path: request_path.into(),
            content: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the entity with the given identity, resolving from the cache
    /// without a network call whenever possible. A miss GETs
    /// `{request_path}/{identity}` and stores the decoded entity under the
    /// identity key before returning it.
    ///
    /// The mapping lock is not held across the fetch, so concurrent gets for
    /// the same missing identity each issue their own request; the mapping
    /// is simply overwritten with the latest result.
    pub async fn get(&self, identity: impl Display) -> Result<Value, CacheError> {
        let key = identity.to_string();

        {
            let content = self.content.lock().await;
            if let Some(entity) = content.get(&key) {
                return Ok(entity.clone());
            }
        }

        debug!(identity = %key, "entity cache miss");
        let entity: Value = self
            .rest
            .get_json(&format!("{}/{}", self.request_path, key))
            .await?;

        self.content.lock().await.insert(key, entity.clone());
        Ok(entity)
    }

    /// Adds the given entity to the cache, keyed by its own identity field;
    /// an existing entry for that identity is overwritten.
    pub async fn put(&self, entity: Value) -> Result<(), CacheError> {
        let key = entity
            .get("identity")
            .and_then(scalar_text)
            .ok_or(CacheError::MissingIdentity)?;
        self.content.lock().await.insert(key, entity);
        Ok(())
    }

    /// Removes the entity with the given identity, if present.
    pub async fn remove(&self, identity: impl Display) {
        self.content.lock().await.remove(&identity.to_string());
    }

    /// Discards every cached entity.
    pub async fn clear(&self) {
        self.content.lock().await.clear();
    }
}
