//! Entity model matching the service's JSON wire shapes (camelCase keys).
//! Every record declares its fields statically; absent collections decode as
//! empty, so callers never branch on missing keys.

use serde::{Deserialize, Serialize};

/// Anything addressable by an identity field, usable as an entity cache key.
pub trait Entity {
    fn identity(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub identity: i64,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub creation_timestamp: i64,
    pub email: String,
    #[serde(default)]
    pub group: Group,
    pub name: Name,
    pub address: Address,
    #[serde(default)]
    pub avatar_reference: i64,
    #[serde(default)]
    pub people_observing_references: Vec<i64>,
    #[serde(default)]
    pub people_observed_references: Vec<i64>,
    #[serde(default)]
    pub messages_authored_references: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Name {
    #[serde(default)]
    pub given: String,
    #[serde(default)]
    pub family: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Group {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub identity: i64,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub creation_timestamp: i64,
    pub body: String,
    pub author_reference: i64,
    pub subject_reference: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub identity: i64,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub creation_timestamp: i64,
    pub content_type: String,
    // base64 transport form of the SHA-256 content hash
    #[serde(default)]
    pub content_hash: String,
}

impl Entity for Person {
    fn identity(&self) -> i64 {
        self.identity
    }
}

impl Entity for Message {
    fn identity(&self) -> i64 {
        self.identity
    }
}

impl Entity for Document {
    fn identity(&self) -> i64 {
        self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_decodes_wire_json() {
        let person: Person = serde_json::from_str(
            r#"{
                "identity": 5,
                "version": 1,
                "creationTimestamp": 1380000000000,
                "email": "ann@example.org",
                "group": "USER",
                "name": {"given": "Ann", "family": "Lee"},
                "address": {"street": "Main 1", "postcode": "10115", "city": "Berlin"},
                "avatarReference": 1,
                "peopleObservedReferences": [3, 4]
            }"#,
        )
        .unwrap();

        assert_eq!(person.identity, 5);
        assert_eq!(person.group, Group::User);
        assert_eq!(person.name.given, "Ann");
        assert_eq!(person.people_observed_references, vec![3, 4]);
        // absent collections decode as empty
        assert!(person.people_observing_references.is_empty());
        assert!(person.messages_authored_references.is_empty());
    }

    #[test]
    fn test_person_serializes_camel_case() {
        let person = Person {
            identity: 5,
            version: 1,
            creation_timestamp: 0,
            email: "ann@example.org".to_string(),
            group: Group::Admin,
            name: Name::default(),
            address: Address::default(),
            avatar_reference: 1,
            people_observing_references: Vec::new(),
            people_observed_references: vec![3],
            messages_authored_references: Vec::new(),
        };

        let value = serde_json::to_value(&person).unwrap();
        assert_eq!(value["creationTimestamp"], 0);
        assert_eq!(value["group"], "ADMIN");
        assert_eq!(value["peopleObservedReferences"][0], 3);
    }

    #[test]
    fn test_document_decodes_wire_json() {
        let document: Document = serde_json::from_str(
            r#"{"identity": 1, "contentType": "image/png", "contentHash": "RBNvo1WzZ4oRRq0W9+hknpT7T8If536DEMBg9hyq/4o="}"#,
        )
        .unwrap();

        assert_eq!(document.identity(), 1);
        assert_eq!(document.content_type, "image/png");
        assert!(!document.content_hash.is_empty());
    }

    #[test]
    fn test_message_decodes_wire_json() {
        let message: Message = serde_json::from_str(
            r#"{"identity": 9, "body": "hello", "authorReference": 5, "subjectReference": 3}"#,
        )
        .unwrap();

        assert_eq!(message.identity(), 9);
        assert_eq!(message.author_reference, 5);
        assert_eq!(message.subject_reference, 3);
    }
}
