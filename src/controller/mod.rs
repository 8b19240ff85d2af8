//! View controllers.
//!
//! Each controller owns the data flow behind one view of the application:
//! it builds requests, calls the REST service, resolves entities through the
//! shared cache, and yields a view model. Rendering the view models is the
//! front end's concern, not the controllers'.

pub mod error;
pub mod messages;
pub mod people;
pub mod preferences;

pub use error::ControllerError;
pub use messages::{MessageView, MessagesController};
pub use people::{PeopleController, PeopleView, PersonFilter};
pub use preferences::{PreferencesController, PreferencesUpdate};

use async_trait::async_trait;
use serde_json::from_value;
use tracing::error;

use crate::context::ApplicationContext;
use crate::model::Person;

/// One entry of an avatar slider: the resolved person plus the data a view
/// needs to render the icon.
#[derive(Debug, Clone)]
pub struct AvatarTile {
    pub person: Person,
    pub avatar_uri: String,
    pub caption: String,
    pub title: String,
}

#[async_trait]
pub trait Controller {
    type View;

    fn context(&self) -> &ApplicationContext;

    /// Produces the view model for this controller's view.
    async fn display(&self) -> Result<Self::View, ControllerError>;

    /// Surfaces the given error where the view renders failures.
    fn display_error(&self, error: &ControllerError) {
        error!("{error}");
    }

    /// Resolves the given people through the shared entity cache into avatar
    /// slider entries, preserving input order.
    async fn refresh_avatar_slider(
        &self,
        person_identities: &[i64],
    ) -> Result<Vec<AvatarTile>, ControllerError> {
        let mut tiles = Vec::with_capacity(person_identities.len());
        for &identity in person_identities {
            let entity = self.context().entity_cache().get(identity).await?;
            let person: Person = from_value(entity)?;

            tiles.push(AvatarTile {
                avatar_uri: self
                    .context()
                    .rest()
                    .resource(&format!("people/{}/avatar", person.identity)),
                caption: person.name.given.clone(),
                title: format!("{} {}", person.name.given, person.name.family),
                person,
            });
        }
        Ok(tiles)
    }

    /// The signed-on person, or [`ControllerError::SessionRequired`].
    async fn require_session_owner(&self) -> Result<Person, ControllerError> {
        self.context()
            .session_owner()
            .await
            .ok_or(ControllerError::SessionRequired)
    }
}
