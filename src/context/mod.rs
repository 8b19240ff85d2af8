//! Session-scoped application context.
//!
//! One context instance owns everything the view controllers share: the REST
//! client, the entity cache, and the signed-on person. Contexts are explicit
//! objects handed to each controller at construction, created at session
//! start and torn down at sign-off; nothing here is process-wide.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::cache::EntityCache;
use crate::model::Person;
use crate::rest::{RestClient, RestError};

pub struct ApplicationContext {
    rest: Arc<RestClient>,
    entity_cache: EntityCache,
    session_owner: RwLock<Option<Person>>,
}

impl ApplicationContext {
    /// Creates a context for the given service base URI with no established
    /// session.
    pub fn new(service_uri: &str) -> Result<Self, RestError> {
        let rest = Arc::new(RestClient::new(service_uri)?);
        let entity_cache = EntityCache::new(rest.clone(), "entities");

        Ok(Self {
            rest,
            entity_cache,
            session_owner: RwLock::new(None),
        })
    }

    pub fn rest(&self) -> &Arc<RestClient> {
        &self.rest
    }

    pub fn entity_cache(&self) -> &EntityCache {
        &self.entity_cache
    }

    pub async fn session_owner(&self) -> Option<Person> {
        self.session_owner.read().await.clone()
    }

    /// Establishes a session: stores the credentials and resolves the
    /// requester as session owner. A failed sign-on leaves the context
    /// without credentials and without a session.
    pub async fn sign_on(&self, email: &str, password: &str) -> Result<Person, RestError> {
        self.rest.set_credentials(email, password).await;

        match self.rest.get_json::<Person>("people/requester").await {
            Ok(owner) => {
                info!(identity = owner.identity, "session established");
                *self.session_owner.write().await = Some(owner.clone());
                Ok(owner)
            }
            Err(error) => {
                self.rest.clear_credentials().await;
                Err(error)
            }
        }
    }

    /// Tears the session down: drops the owner, the credentials, and every
    /// cached entity.
    pub async fn sign_off(&self) {
        info!("session closed");
        *self.session_owner.write().await = None;
        self.rest.clear_credentials().await;
        self.entity_cache.clear().await;
    }

    /// Re-reads the session owner from the service, replacing the retained
    /// copy; returns `None` when no session is established.
    pub async fn refresh_session_owner(&self) -> Result<Option<Person>, RestError> {
        let identity = match self.session_owner.read().await.as_ref() {
            Some(owner) => owner.identity,
            None => return Ok(None),
        };

        let owner: Person = self.rest.get_json(&format!("people/{identity}")).await?;
        *self.session_owner.write().await = Some(owner.clone());
        Ok(Some(owner))
    }

    pub(crate) async fn replace_session_owner(&self, owner: Person) {
        *self.session_owner.write().await = Some(owner);
    }
}
