//! Delete activity.

use activitypub_federation::kinds::activity::DeleteType;
use serde::{Deserialize, Serialize};
use url::Url;

/// The object of a Delete: a Tombstone or a bare IRI.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DeleteObject {
    Tombstone {
        #[serde(rename = "type")]
        kind: String,
        id: Url,
    },
    Reference(Url),
}

impl DeleteObject {
    /// The IRI of the deleted object.
    #[must_use]
    pub const fn id(&self) -> &Url {
        match self {
            Self::Tombstone { id, .. } | Self::Reference(id) => id,
        }
    }
}

/// `ActivityPub` Delete activity.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteActivity {
    #[serde(rename = "type")]
    pub kind: DeleteType,
    pub id: Url,
    pub actor: Url,
    pub object: DeleteObject,
}
