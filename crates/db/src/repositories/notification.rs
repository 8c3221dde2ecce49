//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification, post};
use letterpress_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use notification::NotificationType;

/// Notification repository for database operations.
///
/// Written by the federation core; read and marked by the blog dashboard.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete notifications matching an Undo of a reaction.
    ///
    /// Matching is by recorded values only, never by re-resolving the remote
    /// object: type + post + actor, and content when the reaction kind keys
    /// on it (empty string for announces, the emoji for reactions). Pass
    /// `None` to ignore content (likes). Returns affected row count.
    pub async fn delete_matching(
        &self,
        notification_type: NotificationType,
        post_id: &str,
        actor_id: &str,
        content: Option<&str>,
    ) -> AppResult<u64> {
        let mut query = Notification::delete_many()
            .filter(notification::Column::NotificationType.eq(notification_type))
            .filter(notification::Column::PostId.eq(post_id))
            .filter(notification::Column::ActorId.eq(actor_id));

        if let Some(content) = content {
            query = query.filter(notification::Column::Content.eq(content));
        }

        let result = query
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete notifications recorded under an activity IRI for an actor.
    ///
    /// Used when an Undo carries only a bare reference to the undone
    /// activity.
    pub async fn delete_by_activity(&self, activity_iri: &str, actor_id: &str) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::ActivityIri.eq(activity_iri))
            .filter(notification::Column::ActorId.eq(actor_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every notification whose object IRI matches a deleted object.
    /// Blanket cleanup, independent of notification type.
    pub async fn delete_by_object_iri(&self, object_iri: &str) -> AppResult<u64> {
        let result = Notification::delete_many()
            .filter(notification::Column::ObjectIri.eq(object_iri))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Get notifications for a blog's posts (paginated, newest first).
    pub async fn find_for_blog(
        &self,
        blog_id: &str,
        limit: u64,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find()
            .join(JoinType::InnerJoin, notification::Relation::Post.def())
            .filter(post::Column::BlogId.eq(blog_id))
            .order_by_desc(notification::Column::Id);

        if let Some(id) = until_id {
            query = query.filter(notification::Column::Id.lt(id));
        }

        if unread_only {
            query = query.filter(notification::Column::IsRead.eq(false));
        }

        query
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a notification as read.
    pub async fn mark_as_read(&self, id: &str) -> AppResult<()> {
        let notification = self.find_by_id(id).await?;
        if let Some(n) = notification {
            let mut active: notification::ActiveModel = n.into();
            active.is_read = Set(true);
            active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }
        Ok(())
    }

    /// Mark all notifications for a blog as read. Returns affected count.
    pub async fn mark_all_as_read(&self, blog_id: &str) -> AppResult<u64> {
        use sea_orm::sea_query::Query;

        // Subquery over post rather than a joined UPDATE; sea-orm's
        // update_many has no join support.
        let post_ids = Query::select()
            .column(post::Column::Id)
            .from(post::Entity)
            .and_where(sea_orm::sea_query::Expr::col(post::Column::BlogId).eq(blog_id))
            .to_owned();

        let result = Notification::update_many()
            .filter(notification::Column::PostId.in_subquery(post_ids))
            .filter(notification::Column::IsRead.eq(false))
            .col_expr(notification::Column::IsRead, true.into())
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications for a blog.
    pub async fn count_unread(&self, blog_id: &str) -> AppResult<u64> {
        Notification::find()
            .join(JoinType::InnerJoin, notification::Relation::Post.def())
            .filter(post::Column::BlogId.eq(blog_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
