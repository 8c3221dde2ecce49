//! Instance repository for federation management.

use std::sync::Arc;

use crate::entities::{Instance, instance};
use letterpress_common::{AppError, AppResult, IdGenerator};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Instance repository for database operations.
#[derive(Clone)]
pub struct InstanceRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl InstanceRepository {
    /// Create a new instance repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Find an instance by hostname.
    pub async fn find_by_host(&self, host: &str) -> AppResult<Option<instance::Model>> {
        Instance::find()
            .filter(instance::Column::Host.eq(host.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert or update an instance row by hostname.
    ///
    /// An existing row gets its software fields overwritten and `updated_at`
    /// bumped; a new row is created otherwise.
    pub async fn upsert(
        &self,
        host: &str,
        software_name: Option<String>,
        software_version: Option<String>,
    ) -> AppResult<instance::Model> {
        let host_lower = host.to_lowercase();
        let now = chrono::Utc::now().fixed_offset();

        if let Some(existing) = self.find_by_host(&host_lower).await? {
            let mut active: instance::ActiveModel = existing.into();
            active.software_name = Set(software_name);
            active.software_version = Set(software_version);
            active.updated_at = Set(Some(now));
            return active
                .update(self.db.as_ref())
                .await
                .map_err(|e| AppError::Database(e.to_string()));
        }

        let model = instance::ActiveModel {
            id: Set(self.id_gen.generate()),
            host: Set(host_lower),
            software_name: Set(software_name),
            software_version: Set(software_version),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_instance(id: &str, host: &str) -> instance::Model {
        instance::Model {
            id: id.to_string(),
            host: host.to_string(),
            software_name: Some("mastodon".to_string()),
            software_version: Some("4.2.0".to_string()),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_host_lowercases() {
        let model = create_test_instance("i1", "remote.example");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[model.clone()]])
                .into_connection(),
        );

        let repo = InstanceRepository::new(db);
        let found = repo.find_by_host("Remote.Example").await.unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().software_name.as_deref(), Some("mastodon"));
    }
}
