//! Update activity.

use activitypub_federation::kinds::activity::UpdateType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// `ActivityPub` Update activity.
///
/// The object stays untyped: remote servers send Updates for actors and for
/// objects alike, and the processor inspects the embedded `type`.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivity {
    #[serde(rename = "type")]
    pub kind: UpdateType,
    pub id: Url,
    pub actor: Url,
    pub object: Value,
}

impl UpdateActivity {
    /// The embedded object's `type`, when present.
    #[must_use]
    pub fn object_type(&self) -> Option<&str> {
        self.object.get("type").and_then(Value::as_str)
    }

    /// The embedded object's `id`, when present.
    #[must_use]
    pub fn object_id(&self) -> Option<Url> {
        self.object
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Url::parse(s).ok())
    }
}
