//! People view controller: filter queries and observation management.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method};
use serde_json::{json, Map, Value};

use crate::context::ApplicationContext;
use crate::controller::{AvatarTile, Controller, ControllerError};
use crate::marshal::form;
use crate::model::Person;
use crate::rest::resource_with_query;

/// Filter criteria for the people query; unset and empty fields are not
/// transmitted.
#[derive(Debug, Clone, Default)]
pub struct PersonFilter {
    pub email: Option<String>,
    pub forename: Option<String>,
    pub surname: Option<String>,
    pub street: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub result_offset: Option<u32>,
    pub result_limit: Option<u32>,
}

impl PersonFilter {
    fn criteria(&self) -> Value {
        let mut criteria = Map::new();

        let fields = [
            ("email", &self.email),
            ("forename", &self.forename),
            ("surname", &self.surname),
            ("street", &self.street),
            ("postcode", &self.postcode),
            ("city", &self.city),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                if !value.is_empty() {
                    criteria.insert(name.to_string(), Value::String(value.clone()));
                }
            }
        }

        if let Some(offset) = self.result_offset {
            criteria.insert("resultOffset".to_string(), json!(offset));
        }
        if let Some(limit) = self.result_limit {
            criteria.insert("resultLimit".to_string(), json!(limit));
        }

        Value::Object(criteria)
    }
}

/// Avatar sliders for the people observing the session owner and the people
/// the owner observes.
#[derive(Debug, Clone)]
pub struct PeopleView {
    pub observing: Vec<AvatarTile>,
    pub observed: Vec<AvatarTile>,
}

pub struct PeopleController {
    context: Arc<ApplicationContext>,
}

impl PeopleController {
    pub fn new(context: Arc<ApplicationContext>) -> Self {
        Self { context }
    }

    /// Queries people matching the given filter criteria and resolves the
    /// hits into avatar slider entries.
    pub async fn query_people(
        &self,
        filter: &PersonFilter,
    ) -> Result<Vec<AvatarTile>, ControllerError> {
        self.require_session_owner().await?;

        let resource = resource_with_query("people", &filter.criteria())?;
        let people: Vec<Person> = self.context.rest().get_json(&resource).await?;

        let identities: Vec<i64> = people.iter().map(|person| person.identity).collect();
        self.refresh_avatar_slider(&identities).await
    }

    /// Adds the given person to the session owner's observed people, or
    /// removes them if already observed, then refreshes the session owner
    /// from the service.
    pub async fn toggle_observation(
        &self,
        person_identity: i64,
    ) -> Result<Person, ControllerError> {
        let owner = self.require_session_owner().await?;

        let mut observed = owner.people_observed_references.clone();
        match observed.iter().position(|&identity| identity == person_identity) {
            Some(index) => {
                observed.remove(index);
            }
            None => observed.push(person_identity),
        }

        let body = form::marshal(&json!({ "peopleObserved": observed }))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        self.context
            .rest()
            .send(
                Method::PUT,
                &format!("people/{}/peopleObserved", owner.identity),
                headers,
                Some(Bytes::from(body)),
            )
            .await?;

        self.context
            .refresh_session_owner()
            .await?
            .ok_or(ControllerError::SessionRequired)
    }
}

#[async_trait]
impl Controller for PeopleController {
    type View = PeopleView;

    fn context(&self) -> &ApplicationContext {
        &self.context
    }

    async fn display(&self) -> Result<Self::View, ControllerError> {
        let owner = self.require_session_owner().await?;

        Ok(PeopleView {
            observing: self
                .refresh_avatar_slider(&owner.people_observing_references)
                .await?,
            observed: self
                .refresh_avatar_slider(&owner.people_observed_references)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_skips_unset_and_empty_fields() {
        let filter = PersonFilter {
            forename: Some("Ann".to_string()),
            surname: Some(String::new()),
            result_limit: Some(25),
            ..PersonFilter::default()
        };

        assert_eq!(
            filter.criteria(),
            json!({"forename": "Ann", "resultLimit": 25})
        );
    }
}
