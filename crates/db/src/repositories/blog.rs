//! Blog repository.

use std::sync::Arc;

use crate::entities::{Blog, blog};
use letterpress_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Blog repository for database operations.
#[derive(Clone)]
pub struct BlogRepository {
    db: Arc<DatabaseConnection>,
}

impl BlogRepository {
    /// Create a new blog repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a blog by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<blog::Model>> {
        Blog::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a blog by its slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<blog::Model>> {
        Blog::find()
            .filter(blog::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new blog.
    pub async fn create(&self, model: blog::ActiveModel) -> AppResult<blog::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
