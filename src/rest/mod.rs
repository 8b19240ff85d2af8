//! Asynchronous REST exchange helper.
//!
//! Wraps the HTTP client with the conventions every service call shares:
//! resources are addressed relative to an immutable base URI, responses
//! outside the 2xx range fail with the status, reason and raw headers, and
//! HTTP Basic credentials are applied ambiently once a session is
//! established.

pub mod error;

pub use error::RestError;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use crate::marshal::{form, MarshalError};

#[derive(Debug, Clone)]
struct Credentials {
    alias: String,
    password: String,
}

pub struct RestClient {
    base_uri: String,
    http: reqwest::Client,
    credentials: RwLock<Option<Credentials>>,
}

impl RestClient {
    /// Creates a client for the given service base URI, which stays fixed
    /// for the client's lifetime.
    pub fn new(base_uri: &str) -> Result<Self, RestError> {
        Url::parse(base_uri)?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("messenger-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            http,
            credentials: RwLock::new(None),
        })
    }

    /// The absolute URI of the given service-relative path.
    pub fn resource(&self, path: &str) -> String {
        format!("{}/{}", self.base_uri, path.trim_start_matches('/'))
    }

    /// Stores credentials to be applied to every subsequent request.
    pub async fn set_credentials(&self, alias: &str, password: &str) {
        *self.credentials.write().await = Some(Credentials {
            alias: alias.to_string(),
            password: password.to_string(),
        });
    }

    pub async fn clear_credentials(&self) {
        *self.credentials.write().await = None;
    }

    pub async fn has_credentials(&self) -> bool {
        self.credentials.read().await.is_some()
    }

    /// Sends a request and awaits the complete response. A status outside
    /// 200..=299 fails with [`RestError::Http`]; network failures surface as
    /// [`RestError::Transport`]. No retries are performed.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<RestResponse, RestError> {
        let resource = self.resource(path);
        debug!(%method, resource, "sending request");

        let mut request = self.http.request(method, resource.as_str()).headers(headers);
        if let Some(credentials) = self.credentials.read().await.clone() {
            request = request.basic_auth(&credentials.alias, Some(&credentials.password));
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(RestError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                headers,
            });
        }

        Ok(RestResponse {
            status,
            headers,
            body,
        })
    }

    /// GET the given resource as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RestError> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        self.send(Method::GET, path, headers, None).await?.json()
    }
}

/// A complete, buffered service response.
pub struct RestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: Bytes,
}

impl RestResponse {
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> Result<String, RestError> {
        Ok(String::from_utf8(self.body.to_vec())?)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Appends the given criteria record to the path as a form-encoded query
/// string; an empty record leaves the path untouched.
pub fn resource_with_query(path: &str, criteria: &Value) -> Result<String, MarshalError> {
    let query = form::marshal(criteria)?;
    Ok(if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_joins_relative_paths() {
        let client = RestClient::new("http://localhost:8001/services/").unwrap();
        assert_eq!(
            client.resource("people/7/avatar"),
            "http://localhost:8001/services/people/7/avatar"
        );
        assert_eq!(
            client.resource("/people/requester"),
            "http://localhost:8001/services/people/requester"
        );
    }

    #[test]
    fn test_new_rejects_malformed_base_uris() {
        assert!(matches!(
            RestClient::new("not a uri"),
            Err(RestError::Uri(_))
        ));
    }

    #[test]
    fn test_resource_with_query_skips_empty_criteria() {
        assert_eq!(resource_with_query("people", &json!({})).unwrap(), "people");
        assert_eq!(
            resource_with_query("people", &json!({"forename": "Ann", "city": "Berlin"})).unwrap(),
            "people?forename=Ann&city=Berlin"
        );
    }
}
