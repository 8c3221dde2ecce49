//! Actor keypair repository.

use std::sync::Arc;

use crate::entities::{ActorKeypair, actor_keypair};
use letterpress_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};

/// Actor keypair repository for database operations.
#[derive(Clone)]
pub struct ActorKeypairRepository {
    db: Arc<DatabaseConnection>,
}

impl ActorKeypairRepository {
    /// Create a new actor keypair repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the keypair for a local actor. Remote actors have none.
    pub async fn find_by_actor_id(
        &self,
        actor_id: &str,
    ) -> AppResult<Option<actor_keypair::Model>> {
        ActorKeypair::find_by_id(actor_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a keypair for a local actor.
    pub async fn create(&self, model: actor_keypair::ActiveModel) -> AppResult<actor_keypair::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
