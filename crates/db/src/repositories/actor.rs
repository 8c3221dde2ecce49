//! Actor repository.

use std::sync::Arc;

use crate::entities::{Actor, Following, actor, following};
use letterpress_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};

/// Actor repository for database operations.
#[derive(Clone)]
pub struct ActorRepository {
    db: Arc<DatabaseConnection>,
}

impl ActorRepository {
    /// Create a new actor repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an actor by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<actor::Model>> {
        Actor::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an actor by its canonical IRI. No network I/O.
    pub async fn find_by_iri(&self, iri: &str) -> AppResult<Option<actor::Model>> {
        Actor::find()
            .filter(actor::Column::Iri.eq(iri))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find several actors by ID.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<actor::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Actor::find()
            .filter(actor::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the actor backing a blog.
    pub async fn find_by_blog_id(&self, blog_id: &str) -> AppResult<Option<actor::Model>> {
        Actor::find()
            .filter(actor::Column::BlogId.eq(blog_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an actor by username and host.
    pub async fn find_by_username_and_host(
        &self,
        username: &str,
        host: &str,
    ) -> AppResult<Option<actor::Model>> {
        Actor::find()
            .filter(actor::Column::Username.eq(username))
            .filter(actor::Column::InstanceHost.eq(host))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a blog-backed actor by its username (the blog slug).
    pub async fn find_local_by_username(&self, username: &str) -> AppResult<Option<actor::Model>> {
        Actor::find()
            .filter(actor::Column::Username.eq(username))
            .filter(actor::Column::BlogId.is_not_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count blog-backed actors on this instance.
    pub async fn count_local(&self) -> AppResult<u64> {
        Actor::find()
            .filter(actor::Column::BlogId.is_not_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new actor.
    pub async fn create(&self, model: actor::ActiveModel) -> AppResult<actor::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an actor.
    pub async fn update(&self, model: actor::ActiveModel) -> AppResult<actor::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Recompute a local actor's followers count from accepted Following rows.
    ///
    /// Live recomputation keeps the counter consistent with row existence
    /// even if a concurrent request dies between edge write and counter
    /// write. Returns the new count.
    pub async fn recalculate_followers_count(&self, actor_id: &str) -> AppResult<i32> {
        let count = Following::find()
            .filter(following::Column::FolloweeId.eq(actor_id))
            .filter(following::Column::Accepted.is_not_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = i32::try_from(count).unwrap_or(i32::MAX);

        Actor::update_many()
            .col_expr(actor::Column::FollowersCount, Expr::value(count))
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Recompute a local actor's followees count from accepted Following rows.
    pub async fn recalculate_followees_count(&self, actor_id: &str) -> AppResult<i32> {
        let count = Following::find()
            .filter(following::Column::FollowerId.eq(actor_id))
            .filter(following::Column::Accepted.is_not_null())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = i32::try_from(count).unwrap_or(i32::MAX);

        Actor::update_many()
            .col_expr(actor::Column::FolloweesCount, Expr::value(count))
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count)
    }

    /// Apply a signed delta to a remote actor's cached followers count.
    ///
    /// Remote rows are snapshots, not a source of truth; a cheap delta is
    /// enough and the next profile re-fetch restores the authoritative value.
    pub async fn adjust_followers_count(&self, actor_id: &str, delta: i32) -> AppResult<()> {
        let expr = if delta < 0 {
            Expr::cust(format!("GREATEST(followers_count - {}, 0)", delta.abs()))
        } else {
            Expr::col(actor::Column::FollowersCount).add(delta)
        };

        Actor::update_many()
            .col_expr(actor::Column::FollowersCount, expr)
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Apply a signed delta to a remote actor's cached followees count.
    pub async fn adjust_followees_count(&self, actor_id: &str, delta: i32) -> AppResult<()> {
        let expr = if delta < 0 {
            Expr::cust(format!("GREATEST(followees_count - {}, 0)", delta.abs()))
        } else {
            Expr::col(actor::Column::FolloweesCount).add(delta)
        };

        Actor::update_many()
            .col_expr(actor::Column::FolloweesCount, expr)
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment a local actor's posts count atomically.
    pub async fn increment_posts_count(&self, actor_id: &str) -> AppResult<()> {
        Actor::update_many()
            .col_expr(
                actor::Column::PostsCount,
                Expr::col(actor::Column::PostsCount).add(1),
            )
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement a local actor's posts count atomically.
    pub async fn decrement_posts_count(&self, actor_id: &str) -> AppResult<()> {
        Actor::update_many()
            .col_expr(
                actor::Column::PostsCount,
                Expr::cust("GREATEST(posts_count - 1, 0)"),
            )
            .filter(actor::Column::Id.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
