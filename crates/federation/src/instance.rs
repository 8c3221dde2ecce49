//! Instance registry.
//!
//! Records remote server host plus detected federation software, upserted
//! lazily on first contact with an actor from that host.

use letterpress_common::{AppError, AppResult};
use letterpress_db::{entities::instance, repositories::InstanceRepository};
use tracing::{debug, info};

use crate::client::ApClient;

/// Instance registry service.
#[derive(Clone)]
pub struct InstanceService {
    instance_repo: InstanceRepository,
    client: ApClient,
}

impl InstanceService {
    /// Create a new instance service.
    #[must_use]
    pub const fn new(instance_repo: InstanceRepository, client: ApClient) -> Self {
        Self {
            instance_repo,
            client,
        }
    }

    /// Find an instance by hostname.
    pub async fn find_by_host(&self, host: &str) -> AppResult<Option<instance::Model>> {
        self.instance_repo.find_by_host(host).await
    }

    /// Record a remote instance, probing its software via nodeinfo.
    ///
    /// With `skip_update` an existing row is returned unchanged, saving the
    /// network probe on hot paths. The probe itself is best-effort: any
    /// failure stores no software rather than failing the caller.
    pub async fn persist_instance(
        &self,
        host: &str,
        skip_update: bool,
    ) -> AppResult<instance::Model> {
        let host = host.trim().to_lowercase();
        if host.is_empty() || host.contains('@') {
            return Err(AppError::BadRequest(format!("Invalid host: {host}")));
        }

        if skip_update {
            if let Some(existing) = self.instance_repo.find_by_host(&host).await? {
                return Ok(existing);
            }
        }

        let (software_name, software_version) = match self.client.fetch_nodeinfo(&host).await {
            Ok(software) => {
                let version = software.version.as_deref().and_then(normalize_version);
                (software.name, version)
            }
            Err(e) => {
                debug!(host = %host, error = %e, "Nodeinfo probe failed");
                (None, None)
            }
        };

        let instance = self
            .instance_repo
            .upsert(&host, software_name, software_version)
            .await?;

        info!(
            host = %instance.host,
            software = ?instance.software_name,
            version = ?instance.software_version,
            "Recorded instance"
        );

        Ok(instance)
    }
}

/// Normalize a reported version to exactly three dot-separated numeric
/// components, padding missing components with zeros.
///
/// Malformed or effectively-empty versions normalize to `None` so a bogus
/// `"0.0.0"` never reaches a display surface.
#[must_use]
pub fn normalize_version(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    for piece in raw.split('.') {
        let n: u64 = piece.parse().ok()?;
        parts.push(n);
        if parts.len() == 3 {
            break;
        }
    }

    while parts.len() < 3 {
        parts.insert(0, 0);
    }

    if parts.iter().all(|n| *n == 0) {
        return None;
    }

    Some(format!("{}.{}.{}", parts[0], parts[1], parts[2]))
}
