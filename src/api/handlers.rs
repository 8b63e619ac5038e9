use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::MonitorError;
use crate::logic::analysis::{AnalysisRunner, BatchAnalysisResult};
use crate::logic::baseline::BaselineResolver;
use crate::logic::ledger::{ChangeLedger, ChangeStatistics, ServiceChangeSummary};
use crate::model::{AnalysisReport, ApiSpec, BreakingChange, ChangeKind, ChangeStatus, Id};
use crate::store::traits::Store;

/// Shared server state: the store plus the configured analysis runner.
pub struct AppContext<S> {
    pub store: Arc<S>,
    pub runner: AnalysisRunner<S>,
    pub retention_keep_default: usize,
}

pub type AppState<S> = Arc<AppContext<S>>;

const SYSTEM_ACTOR: &str = "system";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn monitor_error(err: MonitorError) -> ApiError {
    let status = match &err {
        MonitorError::NotFound(_) => StatusCode::NOT_FOUND,
        MonitorError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        MonitorError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        MonitorError::EnrichmentFailed(_) | MonitorError::AnalysisFailed(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn internal_error(err: anyhow::Error) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn not_found(message: String) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: message }),
    )
}

fn bad_request(message: String) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: message }),
    )
}

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AnalysisTriggerResponse {
    pub message: String,
    pub report: AnalysisReport,
}

pub async fn analyze_service<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<AnalysisTriggerResponse>, ApiError> {
    let report = ctx
        .runner
        .analyze(&service_name)
        .await
        .map_err(monitor_error)?;
    Ok(Json(AnalysisTriggerResponse {
        message: "Analysis completed successfully".to_string(),
        report,
    }))
}

pub async fn analyze_all_services<S: Store>(
    State(ctx): State<AppState<S>>,
) -> Json<BatchAnalysisResult> {
    Json(ctx.runner.analyze_all().await)
}

pub async fn get_latest_report<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let report = ctx
        .store
        .latest_report(&service_name)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found(format!("No analysis reports found for {service_name}")))?;
    Ok(Json(report))
}

pub async fn get_report_history<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<Vec<AnalysisReport>>, ApiError> {
    let history = ctx
        .store
        .report_history(&service_name)
        .await
        .map_err(internal_error)?;
    Ok(Json(history))
}

#[derive(Debug, Serialize)]
pub struct ServiceStatusResponse {
    pub service_name: String,
    pub available: bool,
    pub status: String,
}

pub async fn check_service_status<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Json<ServiceStatusResponse> {
    let available = ctx.runner.service_available(&service_name).await;
    Json(ServiceStatusResponse {
        service_name,
        available,
        status: if available { "online" } else { "offline" }.to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct ServicesStatusResponse {
    pub services: HashMap<String, bool>,
    pub online_count: usize,
    pub total_count: usize,
}

pub async fn check_all_services_status<S: Store>(
    State(ctx): State<AppState<S>>,
) -> Json<ServicesStatusResponse> {
    let mut services = HashMap::new();
    for service in ctx.runner.known_services() {
        services.insert(
            service.clone(),
            ctx.runner.service_available(service).await,
        );
    }
    let online_count = services.values().filter(|up| **up).count();
    let total_count = services.len();
    Json(ServicesStatusResponse {
        services,
        online_count,
        total_count,
    })
}

// ---------------------------------------------------------------------------
// Specs
// ---------------------------------------------------------------------------

pub async fn get_latest_spec<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<ApiSpec>, ApiError> {
    let spec = ctx
        .store
        .latest_spec(&service_name)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found(format!("No specs found for {service_name}")))?;
    Ok(Json(spec))
}

pub async fn get_spec_history<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<Vec<ApiSpec>>, ApiError> {
    let history = ctx
        .store
        .spec_history(&service_name)
        .await
        .map_err(internal_error)?;
    Ok(Json(history))
}

pub async fn get_spec_by_version<S: Store>(
    State(ctx): State<AppState<S>>,
    Path((service_name, version)): Path<(String, String)>,
) -> Result<Json<ApiSpec>, ApiError> {
    let spec = ctx
        .store
        .spec_by_version(&service_name, &version)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| {
            not_found(format!("No spec found for {service_name} version {version}"))
        })?;
    Ok(Json(spec))
}

#[derive(Debug, Serialize)]
pub struct FetchSpecResponse {
    pub message: String,
    pub spec: ApiSpec,
}

pub async fn fetch_and_save_spec<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<FetchSpecResponse>, ApiError> {
    let spec = ctx
        .runner
        .fetch_and_save(&service_name)
        .await
        .map_err(monitor_error)?;
    Ok(Json(FetchSpecResponse {
        message: "Spec fetched and saved successfully".to_string(),
        spec,
    }))
}

#[derive(Debug, Serialize)]
pub struct SpecExistsResponse {
    pub service_name: String,
    pub has_specs: bool,
}

pub async fn has_specs<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<SpecExistsResponse>, ApiError> {
    let exists = ctx
        .store
        .has_specs(&service_name)
        .await
        .map_err(internal_error)?;
    Ok(Json(SpecExistsResponse {
        service_name,
        has_specs: exists,
    }))
}

#[derive(Debug, Serialize)]
pub struct SpecCountResponse {
    pub total_specs: usize,
}

pub async fn get_total_spec_count<S: Store>(
    State(ctx): State<AppState<S>>,
) -> Result<Json<SpecCountResponse>, ApiError> {
    let count = ctx.store.total_spec_count().await.map_err(internal_error)?;
    Ok(Json(SpecCountResponse { total_specs: count }))
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub keep: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub message: String,
    pub service_name: String,
    pub kept_versions: usize,
    pub deleted: usize,
}

pub async fn cleanup_old_specs<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let keep = query.keep.unwrap_or(ctx.retention_keep_default);
    let deleted = ctx
        .store
        .cleanup_old_specs(&service_name, keep)
        .await
        .map_err(internal_error)?;
    Ok(Json(CleanupResponse {
        message: "Cleanup completed successfully".to_string(),
        service_name,
        kept_versions: keep,
        deleted,
    }))
}

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct BaselineResponse {
    pub service_name: String,
    pub has_baseline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<ApiSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn get_baseline<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<BaselineResponse>, ApiError> {
    let baseline = BaselineResolver::baseline(&*ctx.store, &service_name)
        .await
        .map_err(internal_error)?;
    let response = match baseline {
        Some(baseline) => BaselineResponse {
            service_name,
            has_baseline: true,
            baseline: Some(baseline),
            message: None,
        },
        None => BaselineResponse {
            service_name,
            has_baseline: false,
            baseline: None,
            message: Some("No baseline set for this service".to_string()),
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Serialize)]
pub struct SetBaselineResponse {
    pub message: String,
    pub service_name: String,
    pub baseline: ApiSpec,
}

pub async fn set_baseline<S: Store>(
    State(ctx): State<AppState<S>>,
    Path((service_name, spec_id)): Path<(String, Id)>,
) -> Result<Json<SetBaselineResponse>, ApiError> {
    let baseline = BaselineResolver::set_baseline(&*ctx.store, &service_name, &spec_id)
        .await
        .map_err(monitor_error)?;
    Ok(Json(SetBaselineResponse {
        message: "Baseline set successfully".to_string(),
        service_name,
        baseline,
    }))
}

pub async fn set_latest_as_baseline<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<SetBaselineResponse>, ApiError> {
    let baseline = BaselineResolver::set_latest_as_baseline(&*ctx.store, &service_name)
        .await
        .map_err(monitor_error)?;
    Ok(Json(SetBaselineResponse {
        message: "Latest spec set as baseline successfully".to_string(),
        service_name,
        baseline,
    }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub service_name: String,
}

pub async fn clear_baseline<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    BaselineResolver::clear_baseline(&*ctx.store, &service_name)
        .await
        .map_err(monitor_error)?;
    Ok(Json(MessageResponse {
        message: "Baseline cleared successfully".to_string(),
        service_name,
    }))
}

// ---------------------------------------------------------------------------
// Breaking changes
// ---------------------------------------------------------------------------

pub async fn get_all_breaking_changes<S: Store>(
    State(ctx): State<AppState<S>>,
) -> Result<Json<Vec<BreakingChange>>, ApiError> {
    let changes = ctx.store.all_changes().await.map_err(internal_error)?;
    Ok(Json(changes))
}

pub async fn get_statistics<S: Store>(
    State(ctx): State<AppState<S>>,
) -> Result<Json<ChangeStatistics>, ApiError> {
    let stats = ChangeLedger::statistics(&*ctx.store)
        .await
        .map_err(internal_error)?;
    Ok(Json(stats))
}

pub async fn get_breaking_changes<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<Vec<BreakingChange>>, ApiError> {
    let changes = ctx
        .store
        .changes_for_service(&service_name)
        .await
        .map_err(internal_error)?;
    Ok(Json(changes))
}

pub async fn get_changes_by_type<S: Store>(
    State(ctx): State<AppState<S>>,
    Path((service_name, change_type)): Path<(String, String)>,
) -> Result<Json<Vec<BreakingChange>>, ApiError> {
    let kind: ChangeKind = change_type.parse().map_err(bad_request)?;
    let changes = ctx
        .store
        .changes_by_kind(&service_name, kind)
        .await
        .map_err(internal_error)?;
    Ok(Json(changes))
}

pub async fn get_changes_by_status<S: Store>(
    State(ctx): State<AppState<S>>,
    Path((service_name, status)): Path<(String, String)>,
) -> Result<Json<Vec<BreakingChange>>, ApiError> {
    let status: ChangeStatus = status.parse().map_err(bad_request)?;
    let changes = ctx
        .store
        .changes_by_status(&service_name, status)
        .await
        .map_err(internal_error)?;
    Ok(Json(changes))
}

pub async fn get_active_changes<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<Vec<BreakingChange>>, ApiError> {
    let changes = ChangeLedger::active_changes(&*ctx.store, &service_name)
        .await
        .map_err(internal_error)?;
    Ok(Json(changes))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

pub async fn get_recent_changes<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<BreakingChange>>, ApiError> {
    let changes = ChangeLedger::recent_changes(&*ctx.store, &service_name, query.limit.unwrap_or(10))
        .await
        .map_err(internal_error)?;
    Ok(Json(changes))
}

#[derive(Debug, Serialize)]
pub struct ChangeCountResponse {
    pub service_name: String,
    pub breaking_changes_count: usize,
}

pub async fn get_change_count<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<ChangeCountResponse>, ApiError> {
    let count = ctx
        .store
        .count_changes_for_service(&service_name)
        .await
        .map_err(internal_error)?;
    Ok(Json(ChangeCountResponse {
        service_name,
        breaking_changes_count: count,
    }))
}

pub async fn get_changes_summary<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(service_name): Path<String>,
) -> Result<Json<ServiceChangeSummary>, ApiError> {
    let summary = ChangeLedger::summary(&*ctx.store, &service_name)
        .await
        .map_err(internal_error)?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct ChangeUpdateResponse {
    pub message: String,
    pub breaking_change: BreakingChange,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    pub resolved_by: Option<String>,
    pub notes: Option<String>,
}

pub async fn update_change_status<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
    request: Option<RequestJson<StatusUpdateRequest>>,
) -> Result<Json<ChangeUpdateResponse>, ApiError> {
    let request = request
        .map(|RequestJson(r)| r)
        .ok_or_else(|| bad_request("Status is required".to_string()))?;
    let status = request
        .status
        .ok_or_else(|| bad_request("Status is required".to_string()))?;
    let status: ChangeStatus = status.parse().map_err(bad_request)?;
    let actor = request.resolved_by.unwrap_or_else(|| SYSTEM_ACTOR.to_string());

    let updated = ChangeLedger::update_status(&*ctx.store, &id, status, &actor, request.notes)
        .await
        .map_err(monitor_error)?;
    Ok(Json(ChangeUpdateResponse {
        message: "Status updated successfully".to_string(),
        breaking_change: updated,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    pub acknowledged_by: Option<String>,
}

pub async fn acknowledge_change<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
    request: Option<RequestJson<AcknowledgeRequest>>,
) -> Result<Json<ChangeUpdateResponse>, ApiError> {
    let actor = request
        .and_then(|RequestJson(r)| r.acknowledged_by)
        .unwrap_or_else(|| SYSTEM_ACTOR.to_string());

    let updated = ChangeLedger::acknowledge(&*ctx.store, &id, &actor)
        .await
        .map_err(monitor_error)?;
    Ok(Json(ChangeUpdateResponse {
        message: "Breaking change acknowledged".to_string(),
        breaking_change: updated,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolved_by: Option<String>,
    pub notes: Option<String>,
}

pub async fn resolve_change<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
    request: Option<RequestJson<ResolveRequest>>,
) -> Result<Json<ChangeUpdateResponse>, ApiError> {
    let request = request.map(|RequestJson(r)| r).unwrap_or(ResolveRequest {
        resolved_by: None,
        notes: None,
    });
    let actor = request.resolved_by.unwrap_or_else(|| SYSTEM_ACTOR.to_string());

    let updated = ChangeLedger::resolve(&*ctx.store, &id, &actor, request.notes)
        .await
        .map_err(monitor_error)?;
    Ok(Json(ChangeUpdateResponse {
        message: "Breaking change resolved".to_string(),
        breaking_change: updated,
    }))
}

#[derive(Debug, Deserialize)]
pub struct IgnoreRequest {
    pub ignored_by: Option<String>,
    pub reason: Option<String>,
}

pub async fn ignore_change<S: Store>(
    State(ctx): State<AppState<S>>,
    Path(id): Path<Id>,
    request: Option<RequestJson<IgnoreRequest>>,
) -> Result<Json<ChangeUpdateResponse>, ApiError> {
    let request = request.map(|RequestJson(r)| r).unwrap_or(IgnoreRequest {
        ignored_by: None,
        reason: None,
    });
    let actor = request.ignored_by.unwrap_or_else(|| SYSTEM_ACTOR.to_string());

    let updated = ChangeLedger::ignore(&*ctx.store, &id, &actor, request.reason)
        .await
        .map_err(monitor_error)?;
    Ok(Json(ChangeUpdateResponse {
        message: "Breaking change ignored".to_string(),
        breaking_change: updated,
    }))
}
