//! Undo activity.

use activitypub_federation::kinds::activity::UndoType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// The activity being undone, as embedded by the sender.
///
/// `kind` stays a plain string here: the undone activity can be any of the
/// kinds we ingest and the processor dispatches on the recorded value.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedActivity {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Url,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Url>,

    /// The inner object; a bare IRI or an object with an `id`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,

    /// Emoji content for `EmojiReact` undos.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl EmbeddedActivity {
    /// Extract the inner object IRI, whether embedded or referenced.
    #[must_use]
    pub fn object_iri(&self) -> Option<Url> {
        match self.object.as_ref()? {
            Value::String(s) => Url::parse(s).ok(),
            Value::Object(map) => map
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| Url::parse(s).ok()),
            _ => None,
        }
    }
}

/// The object of an Undo: the full undone activity, or a bare reference.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UndoObject {
    Embedded(EmbeddedActivity),
    Reference(Url),
}

/// `ActivityPub` Undo activity.
/// Used to retract a previous activity (unfollow, unlike, unreact, ...).
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoActivity {
    #[serde(rename = "type")]
    pub kind: UndoType,
    pub id: Url,
    pub actor: Url,
    pub object: UndoObject,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_follow() {
        let json = r#"{
            "type": "Undo",
            "id": "https://remote.example/activities/u1",
            "actor": "https://remote.example/users/bob",
            "object": {
                "type": "Follow",
                "id": "https://remote.example/f/1",
                "actor": "https://remote.example/users/bob",
                "object": "https://blog.example/users/alice"
            }
        }"#;

        let activity: UndoActivity = serde_json::from_str(json).unwrap();
        match activity.object {
            UndoObject::Embedded(inner) => {
                assert_eq!(inner.kind, "Follow");
                assert_eq!(inner.id.as_str(), "https://remote.example/f/1");
                assert_eq!(
                    inner.object_iri().unwrap().as_str(),
                    "https://blog.example/users/alice"
                );
            }
            UndoObject::Reference(_) => panic!("expected embedded activity"),
        }
    }

    #[test]
    fn test_bare_reference() {
        let json = r#"{
            "type": "Undo",
            "id": "https://remote.example/activities/u2",
            "actor": "https://remote.example/users/bob",
            "object": "https://remote.example/l/9"
        }"#;

        let activity: UndoActivity = serde_json::from_str(json).unwrap();
        match activity.object {
            UndoObject::Reference(iri) => {
                assert_eq!(iri.as_str(), "https://remote.example/l/9");
            }
            UndoObject::Embedded(_) => panic!("expected bare reference"),
        }
    }

    #[test]
    fn test_embedded_object_with_nested_id() {
        let json = r#"{
            "type": "Undo",
            "id": "https://remote.example/activities/u3",
            "actor": "https://remote.example/users/bob",
            "object": {
                "type": "Like",
                "id": "https://remote.example/l/9",
                "object": {"id": "https://blog.example/objects/01post", "type": "Article"}
            }
        }"#;

        let activity: UndoActivity = serde_json::from_str(json).unwrap();
        match activity.object {
            UndoObject::Embedded(inner) => {
                assert_eq!(
                    inner.object_iri().unwrap().as_str(),
                    "https://blog.example/objects/01post"
                );
            }
            UndoObject::Reference(_) => panic!("expected embedded activity"),
        }
    }
}
