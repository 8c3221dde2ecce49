//! Accept activity.

use activitypub_federation::kinds::activity::AcceptType;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use url::Url;

use super::FollowActivity;

/// `ActivityPub` Accept activity, sent back in reply to an inbound Follow.
///
/// Embeds the accepted Follow so the remote side can correlate by the
/// original activity id.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptActivity {
    #[serde(rename = "@context")]
    pub context: Value,
    #[serde(rename = "type")]
    pub kind: AcceptType,
    pub id: Url,
    pub actor: Url,
    pub object: FollowActivity,
}

impl AcceptActivity {
    /// Create a new Accept activity wrapping the given Follow.
    #[must_use]
    pub fn new(id: Url, actor: Url, object: FollowActivity) -> Self {
        Self {
            context: json!("https://www.w3.org/ns/activitystreams"),
            kind: AcceptType::Accept,
            id,
            actor,
            object,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_embeds_follow() {
        let follow = FollowActivity::new(
            Url::parse("https://remote.example/f/1").unwrap(),
            Url::parse("https://remote.example/users/bob").unwrap(),
            Url::parse("https://blog.example/users/alice").unwrap(),
        );
        let accept = AcceptActivity::new(
            Url::parse("https://blog.example/users/alice#accepts/follows/1").unwrap(),
            Url::parse("https://blog.example/users/alice").unwrap(),
            follow,
        );

        let json = serde_json::to_value(&accept).unwrap();
        assert_eq!(json["type"], "Accept");
        assert_eq!(json["object"]["type"], "Follow");
        assert_eq!(json["object"]["id"], "https://remote.example/f/1");
    }
}
