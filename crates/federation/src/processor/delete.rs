//! Delete activity processor.

use letterpress_common::AppResult;
use letterpress_db::repositories::NotificationRepository;
use tracing::info;

use crate::activities::DeleteActivity;

/// Processor for Delete activities.
#[derive(Clone)]
pub struct DeleteProcessor {
    notification_repo: NotificationRepository,
}

impl DeleteProcessor {
    /// Create a new delete processor.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self { notification_repo }
    }

    /// Process an incoming Delete activity.
    ///
    /// Blanket cleanup by recorded object IRI, independent of notification
    /// type. The deleted object is never re-fetched; it is usually already
    /// gone. Returns the number of removed notifications.
    pub async fn process(&self, activity: &DeleteActivity) -> AppResult<u64> {
        let object_iri = activity.object.id();

        let removed = self
            .notification_repo
            .delete_by_object_iri(object_iri.as_str())
            .await?;

        if removed > 0 {
            info!(
                object = %object_iri,
                removed = removed,
                "Removed notifications for deleted object"
            );
        }

        Ok(removed)
    }
}
