use crate::error::MonitorError;
use crate::model::{ApiSpec, Id};
use crate::store::traits::Store;
use log::info;

/// Decides which prior snapshot a freshly fetched descriptor is compared
/// against: the pinned baseline always wins, otherwise the snapshot
/// immediately preceding the latest one.
pub struct BaselineResolver;

impl BaselineResolver {
    pub async fn resolve_comparison_target<S: Store>(
        store: &S,
        service_name: &str,
    ) -> anyhow::Result<Option<ApiSpec>> {
        if let Some(baseline) = store.baseline_spec(service_name).await? {
            info!("Using baseline spec for comparison for {service_name}");
            return Ok(Some(baseline));
        }

        info!("No baseline found, using previous spec for comparison for {service_name}");
        let history = store.spec_history(service_name).await?;
        if history.len() >= 2 {
            Ok(Some(history[1].clone()))
        } else {
            Ok(None)
        }
    }

    pub async fn baseline<S: Store>(
        store: &S,
        service_name: &str,
    ) -> anyhow::Result<Option<ApiSpec>> {
        store.baseline_spec(service_name).await
    }

    /// Pin a snapshot as the service's baseline. Clearing the previous flag
    /// and setting the new one happen in a single store operation.
    pub async fn set_baseline<S: Store>(
        store: &S,
        service_name: &str,
        spec_id: &Id,
    ) -> Result<ApiSpec, MonitorError> {
        info!("Setting baseline for {service_name} to spec {spec_id}");

        let spec = store
            .get_spec(spec_id)
            .await?
            .ok_or_else(|| MonitorError::NotFound(format!("spec not found: {spec_id}")))?;

        if spec.service_name != service_name {
            return Err(MonitorError::InvalidInput(format!(
                "spec {spec_id} does not belong to service {service_name}"
            )));
        }

        let updated = store
            .set_baseline(service_name, spec_id)
            .await?
            .ok_or_else(|| MonitorError::NotFound(format!("spec not found: {spec_id}")))?;

        info!(
            "Successfully set baseline for {service_name} at version {}",
            updated.version
        );
        Ok(updated)
    }

    pub async fn set_latest_as_baseline<S: Store>(
        store: &S,
        service_name: &str,
    ) -> Result<ApiSpec, MonitorError> {
        let latest = store.latest_spec(service_name).await?.ok_or_else(|| {
            MonitorError::NotFound(format!("no specs found for service: {service_name}"))
        })?;
        Self::set_baseline(store, service_name, &latest.id).await
    }

    pub async fn clear_baseline<S: Store>(
        store: &S,
        service_name: &str,
    ) -> Result<(), MonitorError> {
        info!("Clearing baseline for {service_name}");
        store.clear_baseline(service_name).await?;
        Ok(())
    }
}
