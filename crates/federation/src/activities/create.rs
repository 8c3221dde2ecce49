//! Create activity and the Note/Article objects it carries.

use activitypub_federation::kinds::activity::CreateType;
use serde::{Deserialize, Serialize};
use url::Url;

/// Object kinds we ingest from Create activities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ObjectKind {
    Note,
    Article,
}

/// A tag attached to an object: Mention, Hashtag, or custom Emoji.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectTag {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<TagIcon>,
}

/// Icon of a custom emoji tag.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagIcon {
    #[serde(rename = "type")]
    pub kind: String,

    pub url: Url,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// The Note or Article wrapped by a Create activity.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateObject {
    #[serde(rename = "type")]
    pub kind: ObjectKind,

    pub id: Url,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributed_to: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Reply target, when the object answers another object.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<Url>,

    /// Quoted object (Misskey/Fedibird `quoteUrl` extension).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_url: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Vec<ObjectTag>>,
}

impl CreateObject {
    /// Mention tag hrefs carried by this object.
    #[must_use]
    pub fn mention_hrefs(&self) -> Vec<&Url> {
        self.tag
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|tag| tag.kind == "Mention")
            .filter_map(|tag| tag.href.as_ref())
            .collect()
    }
}

/// `ActivityPub` Create activity.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivity {
    #[serde(rename = "type")]
    pub kind: CreateType,
    pub id: Url,
    pub actor: Url,
    pub object: CreateObject,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<Url>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<Url>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_reply_note() {
        let json = r#"{
            "type": "Create",
            "id": "https://remote.example/activities/1",
            "actor": "https://remote.example/users/carol",
            "object": {
                "type": "Note",
                "id": "https://remote.example/notes/9",
                "content": "<p>nice post</p>",
                "inReplyTo": "https://blog.example/objects/01post",
                "tag": [
                    {"type": "Mention", "name": "@alice@blog.example", "href": "https://blog.example/users/alice"}
                ]
            }
        }"#;

        let activity: CreateActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.object.kind, ObjectKind::Note);
        assert_eq!(
            activity.object.in_reply_to.as_ref().unwrap().as_str(),
            "https://blog.example/objects/01post"
        );
        assert_eq!(activity.object.mention_hrefs().len(), 1);
    }

    #[test]
    fn test_deserialize_quote_article() {
        let json = r#"{
            "type": "Create",
            "id": "https://remote.example/activities/2",
            "actor": "https://remote.example/users/carol",
            "object": {
                "type": "Article",
                "id": "https://remote.example/articles/5",
                "content": "<p>quoting</p>",
                "quoteUrl": "https://blog.example/objects/01post"
            }
        }"#;

        let activity: CreateActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.object.kind, ObjectKind::Article);
        assert!(activity.object.quote_url.is_some());
        assert!(activity.object.in_reply_to.is_none());
    }

    #[test]
    fn test_unknown_object_kind_rejected() {
        let json = r#"{
            "type": "Create",
            "id": "https://remote.example/activities/3",
            "actor": "https://remote.example/users/carol",
            "object": {"type": "Video", "id": "https://remote.example/videos/1"}
        }"#;

        assert!(serde_json::from_str::<CreateActivity>(json).is_err());
    }
}
