//! `EmojiReact` activity (Pleroma/Akkoma style emoji reactions).
//!
//! See: <https://docs.akkoma.dev/stable/development/ap_extensions/#emoji-reactions>

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

use super::create::ObjectTag;

/// Custom type marker for `EmojiReact` activities.
///
/// `activitypub_federation` ships no kind for this extension, so the marker
/// is hand-rolled in the same shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmojiReactType;

impl Serialize for EmojiReactType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("EmojiReact")
    }
}

impl<'de> Deserialize<'de> for EmojiReactType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "EmojiReact" {
            Ok(Self)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected 'EmojiReact', got '{s}'"
            )))
        }
    }
}

/// `ActivityPub` EmojiReact activity (Pleroma/Akkoma extension).
///
/// Carries a specific emoji, unlike Like. Custom emoji reactions reference
/// their image through an Emoji tag.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmojiReactActivity {
    #[serde(rename = "type")]
    pub kind: EmojiReactType,

    pub id: Url,

    pub actor: Url,

    /// The object being reacted to.
    pub object: Url,

    /// The emoji glyph or `:shortcode:`.
    pub content: String,

    /// Custom emoji definitions for shortcode reactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Vec<ObjectTag>>,
}

impl EmojiReactActivity {
    /// Create a new `EmojiReact` activity.
    #[must_use]
    pub const fn new(id: Url, actor: Url, object: Url, content: String) -> Self {
        Self {
            kind: EmojiReactType,
            id,
            actor,
            object,
            content,
            tag: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization() {
        let activity = EmojiReactActivity::new(
            Url::parse("https://remote.example/activities/react/1").unwrap(),
            Url::parse("https://remote.example/users/carol").unwrap(),
            Url::parse("https://blog.example/objects/01post").unwrap(),
            "👍".to_string(),
        );

        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "EmojiReact");
        assert_eq!(json["content"], "👍");
    }

    #[test]
    fn test_deserialization() {
        let json = r#"{
            "type": "EmojiReact",
            "id": "https://remote.example/activities/react/1",
            "actor": "https://remote.example/users/carol",
            "object": "https://blog.example/objects/01post",
            "content": "🎉"
        }"#;

        let activity: EmojiReactActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.content, "🎉");
    }

    #[test]
    fn test_wrong_type_marker_rejected() {
        let json = r#"{
            "type": "Like",
            "id": "https://remote.example/activities/react/1",
            "actor": "https://remote.example/users/carol",
            "object": "https://blog.example/objects/01post",
            "content": "🎉"
        }"#;

        assert!(serde_json::from_str::<EmojiReactActivity>(json).is_err());
    }
}
