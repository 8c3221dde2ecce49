//! Update activity processor.

use letterpress_common::AppResult;
use tracing::{debug, info};

use crate::activities::UpdateActivity;
use crate::store::ActorStore;

/// Result of processing an Update activity.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The signer's cached actor profile was refreshed.
    ActorRefreshed,
    /// The update did not apply to anything cached locally; dropped.
    Ignored,
}

/// Actor document types an Update may refresh.
const ACTOR_TYPES: [&str; 5] = ["Person", "Service", "Group", "Organization", "Application"];

/// Processor for Update activities.
#[derive(Clone)]
pub struct UpdateProcessor {
    store: ActorStore,
}

impl UpdateProcessor {
    /// Create a new update processor.
    #[must_use]
    pub const fn new(store: ActorStore) -> Self {
        Self { store }
    }

    /// Process an incoming Update activity.
    ///
    /// Actor profile updates re-persist the embedded document; only the
    /// actor itself may update its own profile. Object updates have no
    /// local cache to refresh and are dropped.
    pub async fn process(&self, activity: &UpdateActivity) -> AppResult<UpdateOutcome> {
        let Some(object_type) = activity.object_type() else {
            return Ok(UpdateOutcome::Ignored);
        };

        if !ACTOR_TYPES.contains(&object_type) {
            debug!(object_type = %object_type, "Update for non-actor object, ignoring");
            return Ok(UpdateOutcome::Ignored);
        }

        let Some(object_iri) = activity.object_id() else {
            return Ok(UpdateOutcome::Ignored);
        };

        if object_iri != activity.actor {
            debug!(
                actor = %activity.actor,
                object = %object_iri,
                "Update actor does not own the updated profile, ignoring"
            );
            return Ok(UpdateOutcome::Ignored);
        }

        let refreshed = self
            .store
            .persist_actor_document(&activity.object, &object_iri, 0)
            .await?;

        if refreshed.is_some() {
            info!(actor = %object_iri, "Refreshed actor profile from Update");
            Ok(UpdateOutcome::ActorRefreshed)
        } else {
            Ok(UpdateOutcome::Ignored)
        }
    }
}
