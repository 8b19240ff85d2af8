//! Messages view controller: threaded message display and posting.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future;
use http::{header, HeaderMap, HeaderValue, Method};
use serde_json::from_value;
use tracing::debug;

use crate::context::ApplicationContext;
use crate::controller::{Controller, ControllerError};
use crate::model::{Message, Person};

/// One rendered message: the entity plus its author's resolved address.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub message: Message,
    pub author_email: String,
}

pub struct MessagesController {
    context: Arc<ApplicationContext>,
}

impl MessagesController {
    pub fn new(context: Arc<ApplicationContext>) -> Self {
        Self { context }
    }

    /// The root messages of the session owner's subjects: everything caused
    /// by the owner or one of the people the owner observes, merged and
    /// sorted by ascending identity. The per-subject requests are issued
    /// concurrently; subjects the owner may not read are skipped.
    pub async fn root_messages(&self) -> Result<Vec<MessageView>, ControllerError> {
        let owner = self.require_session_owner().await?;

        let mut references = owner.people_observed_references.clone();
        references.push(owner.identity);

        let requests = references.iter().map(|identity| {
            let rest = self.context.rest().clone();
            let resource = format!("entities/{identity}/messagesCaused");
            async move { rest.get_json::<Vec<Message>>(&resource).await }
        });

        let mut messages: Vec<Message> = future::join_all(requests)
            .await
            .into_iter()
            .filter_map(Result::ok)
            .flatten()
            .collect();
        messages.sort_by_key(|message| message.identity);

        self.resolve_authors(messages).await
    }

    /// The direct child messages of the given message, for thread expansion.
    pub async fn child_messages(
        &self,
        message_identity: i64,
    ) -> Result<Vec<MessageView>, ControllerError> {
        let messages: Vec<Message> = self
            .context
            .rest()
            .get_json(&format!("entities/{message_identity}/messagesCaused"))
            .await?;
        self.resolve_authors(messages).await
    }

    /// Persists a new message about the given subject and returns the new
    /// message's identity.
    pub async fn post_message(
        &self,
        subject_identity: i64,
        body: &str,
    ) -> Result<i64, ControllerError> {
        self.require_session_owner().await?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let response = self
            .context
            .rest()
            .send(
                Method::POST,
                &format!("messages?subjectReference={subject_identity}"),
                headers,
                Some(Bytes::from(body.to_string())),
            )
            .await?;

        let identity = response
            .text()?
            .trim()
            .parse::<i64>()
            .map_err(|_| ControllerError::UnexpectedResponse("expected the new message identity"))?;
        debug!(identity, "message persisted");
        Ok(identity)
    }

    async fn resolve_authors(
        &self,
        messages: Vec<Message>,
    ) -> Result<Vec<MessageView>, ControllerError> {
        let mut views = Vec::with_capacity(messages.len());
        for message in messages {
            let entity = self
                .context
                .entity_cache()
                .get(message.author_reference)
                .await?;
            let author: Person = from_value(entity)?;
            views.push(MessageView {
                message,
                author_email: author.email,
            });
        }
        Ok(views)
    }
}

#[async_trait]
impl Controller for MessagesController {
    type View = Vec<MessageView>;

    fn context(&self) -> &ApplicationContext {
        &self.context
    }

    async fn display(&self) -> Result<Self::View, ControllerError> {
        self.root_messages().await
    }
}
