//! Preferences view controller: session owner editing and avatar upload.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method};

use crate::context::ApplicationContext;
use crate::controller::{Controller, ControllerError};
use crate::model::Person;

/// Editable preference fields; unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct PreferencesUpdate {
    pub email: Option<String>,
    pub given: Option<String>,
    pub family: Option<String>,
    pub street: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
}

pub struct PreferencesController {
    context: Arc<ApplicationContext>,
}

impl PreferencesController {
    pub fn new(context: Arc<ApplicationContext>) -> Self {
        Self { context }
    }

    /// Persists the session owner with the given field updates, optionally
    /// setting a new password, then re-establishes the session so the
    /// retained owner and the ambient credentials match the persisted state.
    pub async fn persist(
        &self,
        update: &PreferencesUpdate,
        new_password: Option<&str>,
    ) -> Result<Person, ControllerError> {
        let mut owner = self.require_session_owner().await?;

        if let Some(email) = &update.email {
            owner.email = email.clone();
        }
        if let Some(given) = &update.given {
            owner.name.given = given.clone();
        }
        if let Some(family) = &update.family {
            owner.name.family = family.clone();
        }
        if let Some(street) = &update.street {
            owner.address.street = street.clone();
        }
        if let Some(postcode) = &update.postcode {
            owner.address.postcode = postcode.clone();
        }
        if let Some(city) = &update.city {
            owner.address.city = city.clone();
        }

        let mut document = serde_json::to_value(&owner)?;
        if let Some(fields) = document.as_object_mut() {
            // the service derives the observation references from its own state
            fields.remove("peopleObservedReferences");
            fields.remove("peopleObservingReferences");
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(password) = new_password {
            headers.insert(
                "Set-Password",
                HeaderValue::from_str(password).map_err(|_| {
                    ControllerError::InvalidInput("the password is not a legal header value")
                })?,
            );
        }

        self.context
            .rest()
            .send(
                Method::POST,
                "people",
                headers,
                Some(Bytes::from(serde_json::to_vec(&document)?)),
            )
            .await?;

        match new_password {
            Some(password) => Ok(self.context.sign_on(&owner.email, password).await?),
            None => {
                let refreshed: Person = self.context.rest().get_json("people/requester").await?;
                self.context.replace_session_owner(refreshed.clone()).await;
                Ok(refreshed)
            }
        }
    }

    /// Replaces the session owner's avatar with the given content and
    /// refreshes the retained owner.
    pub async fn persist_avatar(
        &self,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ControllerError> {
        let owner = self.require_session_owner().await?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(content_type).map_err(|_| {
                ControllerError::InvalidInput("the content type is not a legal header value")
            })?,
        );
        self.context
            .rest()
            .send(
                Method::PUT,
                &format!("people/{}/avatar", owner.identity),
                headers,
                Some(Bytes::from(content)),
            )
            .await?;

        self.context.refresh_session_owner().await?;
        Ok(())
    }
}

#[async_trait]
impl Controller for PreferencesController {
    type View = Person;

    fn context(&self) -> &ApplicationContext {
        &self.context
    }

    async fn display(&self) -> Result<Self::View, ControllerError> {
        self.require_session_owner().await
    }
}
