use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::store::traits::Store;

/// Builds the full HTTP surface. Generic over the store so tests can run
/// the same router against an in-memory backend.
pub fn create_router<S: Store + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Health
        .route("/api/monitor/health", get(handlers::health_check))
        // Analysis
        .route(
            "/api/monitor/analyze/:service",
            post(handlers::analyze_service::<S>),
        )
        .route(
            "/api/monitor/analyze-all",
            post(handlers::analyze_all_services::<S>),
        )
        .route(
            "/api/monitor/report/:service",
            get(handlers::get_latest_report::<S>),
        )
        .route(
            "/api/monitor/reports/:service",
            get(handlers::get_report_history::<S>),
        )
        .route(
            "/api/monitor/status/:service",
            get(handlers::check_service_status::<S>),
        )
        .route(
            "/api/monitor/status",
            get(handlers::check_all_services_status::<S>),
        )
        // Specs
        .route(
            "/api/specs/:service/latest",
            get(handlers::get_latest_spec::<S>),
        )
        .route(
            "/api/specs/:service/history",
            get(handlers::get_spec_history::<S>),
        )
        .route(
            "/api/specs/:service/version/:version",
            get(handlers::get_spec_by_version::<S>),
        )
        .route(
            "/api/specs/:service/fetch",
            post(handlers::fetch_and_save_spec::<S>),
        )
        .route(
            "/api/specs/:service/exists",
            get(handlers::has_specs::<S>),
        )
        .route("/api/specs/count", get(handlers::get_total_spec_count::<S>))
        .route(
            "/api/specs/:service/cleanup",
            delete(handlers::cleanup_old_specs::<S>),
        )
        // Baselines
        .route(
            "/api/specs/:service/baseline",
            get(handlers::get_baseline::<S>).delete(handlers::clear_baseline::<S>),
        )
        .route(
            "/api/specs/:service/baseline/:spec_id",
            post(handlers::set_baseline::<S>),
        )
        .route(
            "/api/specs/:service/baseline/latest",
            post(handlers::set_latest_as_baseline::<S>),
        )
        // Breaking changes
        .route(
            "/api/breaking-changes",
            get(handlers::get_all_breaking_changes::<S>),
        )
        .route(
            "/api/breaking-changes/statistics",
            get(handlers::get_statistics::<S>),
        )
        .route(
            "/api/breaking-changes/service/:service",
            get(handlers::get_breaking_changes::<S>),
        )
        .route(
            "/api/breaking-changes/service/:service/type/:change_type",
            get(handlers::get_changes_by_type::<S>),
        )
        .route(
            "/api/breaking-changes/service/:service/status/:status",
            get(handlers::get_changes_by_status::<S>),
        )
        .route(
            "/api/breaking-changes/service/:service/active",
            get(handlers::get_active_changes::<S>),
        )
        .route(
            "/api/breaking-changes/service/:service/recent",
            get(handlers::get_recent_changes::<S>),
        )
        .route(
            "/api/breaking-changes/service/:service/count",
            get(handlers::get_change_count::<S>),
        )
        .route(
            "/api/breaking-changes/service/:service/summary",
            get(handlers::get_changes_summary::<S>),
        )
        .route(
            "/api/breaking-changes/:id/status",
            put(handlers::update_change_status::<S>),
        )
        .route(
            "/api/breaking-changes/:id/acknowledge",
            post(handlers::acknowledge_change::<S>),
        )
        .route(
            "/api/breaking-changes/:id/resolve",
            post(handlers::resolve_change::<S>),
        )
        .route(
            "/api/breaking-changes/:id/ignore",
            post(handlers::ignore_change::<S>),
        )
}
