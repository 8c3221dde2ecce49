//! Following repository.

use std::sync::Arc;

use crate::entities::{Following, following};
use letterpress_common::{AppError, AppResult};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

/// Following repository for database operations.
#[derive(Clone)]
pub struct FollowingRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowingRepository {
    /// Create a new following repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow edge by the Follow activity IRI.
    pub async fn find_by_iri(&self, iri: &str) -> AppResult<Option<following::Model>> {
        Following::find_by_id(iri)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a follow edge by activity IRI and the claimed follower.
    ///
    /// Undo(Follow) resolves through both keys so a spoofed object id
    /// naming someone else's follow cannot remove their edge.
    pub async fn find_by_iri_and_follower(
        &self,
        iri: &str,
        follower_id: &str,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::Iri.eq(iri))
            .filter(following::Column::FollowerId.eq(follower_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a follow edge by follower and followee.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<following::Model>> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a follow edge, absorbing duplicates.
    ///
    /// Returns `true` when a row was actually inserted. Duplicate Follow
    /// deliveries (same activity IRI, or same pair under a new IRI) hit the
    /// primary key or the unique pair index and come back as a zero-row
    /// no-op; the caller must only touch counters on `true`.
    pub async fn insert_if_absent(&self, model: following::ActiveModel) -> AppResult<bool> {
        let rows = Following::insert(model)
            .on_conflict(OnConflict::new().do_nothing().to_owned())
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows > 0)
    }

    /// Delete a follow edge by its activity IRI. Returns affected row count.
    pub async fn delete_by_iri(&self, iri: &str) -> AppResult<u64> {
        let result = Following::delete_many()
            .filter(following::Column::Iri.eq(iri))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Get the accepted followers of an actor, oldest first.
    pub async fn find_accepted_followers(
        &self,
        followee_id: &str,
    ) -> AppResult<Vec<following::Model>> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(followee_id))
            .filter(following::Column::Accepted.is_not_null())
            .order_by_asc(following::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count accepted followers of an actor.
    pub async fn count_accepted_followers(&self, followee_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FolloweeId.eq(followee_id))
            .filter(following::Column::Accepted.is_not_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count actors an actor follows (accepted edges only).
    pub async fn count_accepted_followees(&self, follower_id: &str) -> AppResult<u64> {
        Following::find()
            .filter(following::Column::FollowerId.eq(follower_id))
            .filter(following::Column::Accepted.is_not_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
