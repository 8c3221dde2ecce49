//! Announce activity (share/boost).

use activitypub_federation::kinds::activity::AnnounceType;
use serde::{Deserialize, Serialize};
use url::Url;

/// `ActivityPub` Announce activity.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnounceActivity {
    #[serde(rename = "type")]
    pub kind: AnnounceType,
    pub id: Url,
    pub actor: Url,
    /// The shared object.
    pub object: Url,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<Url>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<Url>>,
}
