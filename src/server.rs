use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::catalog::cache::get_or_load;
use crate::catalog::loader::LoadedCatalog;
use crate::catalog::{CatalogReport, Program};
use crate::config::Config;
use crate::criteria::Subject;
use crate::eligibility::Tier;
use crate::profile::{Allocation, SchoolFilter, StudentProfile};
use crate::session::store::{SessionStore, SubmitStatus};
use crate::session::{RemovalOutcome, SessionError, SessionView};

#[derive(Clone)]
pub struct ApiState {
    config: Config,
    catalog: Arc<LoadedCatalog>,
    sessions: SessionStore,
}

impl ApiState {
    pub fn new(config: Config, catalog: Arc<LoadedCatalog>) -> Self {
        Self {
            config,
            catalog,
            sessions: SessionStore::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        Self::not_found(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

/// Wire form of a student profile. Subject keys accept any alias the
/// dataset uses.
#[derive(Debug, Clone, Default, Deserialize)]
struct ProfileRequest {
    #[serde(default)]
    scores: BTreeMap<String, i64>,
    #[serde(default)]
    interests: Vec<String>,
    school: Option<String>,
    allocation: Option<Allocation>,
    total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct RemoveRequest {
    tier: String,
    item_id: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct CatalogResponse<'a> {
    fingerprint: &'a str,
    groups: &'a [String],
    schools: &'a [String],
    programs: &'a [Program],
    report: &'a CatalogReport,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    status: SubmitStatus,
    session: SessionView,
}

#[derive(Debug, Serialize)]
struct DeleteResponse {
    deleted: bool,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let catalog = get_or_load(config.resolved_catalog_path().as_deref())?;
    info!(
        "serving {} programs from {}",
        catalog.catalog.len(),
        catalog.report.source
    );
    let app = build_router(ApiState::new(config, catalog));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/config", get(show_config))
        .route("/v1/catalog", get(show_catalog))
        .route("/v1/sessions", post(create_session))
        .route(
            "/v1/sessions/:id",
            get(show_session).put(submit_session).delete(delete_session),
        )
        .route("/v1/sessions/:id/remove", post(remove_item))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config)
}

async fn show_catalog(State(state): State<ApiState>) -> Response {
    let loaded = &state.catalog;
    ok(CatalogResponse {
        fingerprint: &loaded.catalog.fingerprint,
        groups: &loaded.catalog.groups,
        schools: &loaded.catalog.schools,
        programs: &loaded.catalog.programs,
        report: &loaded.report,
    })
    .into_response()
}

async fn create_session(
    State(state): State<ApiState>,
    Json(request): Json<ProfileRequest>,
) -> ApiResult<SessionView> {
    let (profile, total) = resolve_profile(&state, request)?;
    Ok(ok(state
        .sessions
        .create(&state.catalog.catalog, profile, total)))
}

async fn show_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<SessionView> {
    Ok(ok(state.sessions.view(&id)?))
}

async fn submit_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<ProfileRequest>,
) -> ApiResult<SubmitResponse> {
    let (profile, total) = resolve_profile(&state, request)?;
    let (status, session) = state
        .sessions
        .submit(&id, &state.catalog.catalog, profile, total)?;
    Ok(ok(SubmitResponse { status, session }))
}

async fn delete_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<DeleteResponse> {
    if !state.sessions.delete(&id) {
        return Err(SessionError::SessionNotFound(id).into());
    }
    Ok(ok(DeleteResponse { deleted: true }))
}

async fn remove_item(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<RemoveRequest>,
) -> ApiResult<RemovalOutcome> {
    let tier = Tier::from_str(&request.tier).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let outcome = state.sessions.remove_item(&id, tier, &request.item_id)?;
    Ok(ok(outcome))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn resolve_profile(
    state: &ApiState,
    request: ProfileRequest,
) -> std::result::Result<(StudentProfile, u32), ApiError> {
    let mut profile = StudentProfile::new()
        .with_school(SchoolFilter::from(request.school))
        .with_allocation(
            request
                .allocation
                .unwrap_or_else(|| state.config.default_allocation()),
        );
    let mut seen = BTreeSet::new();
    for (key, level) in request.scores {
        let subject = Subject::from_str(&key).map_err(|e| ApiError::bad_request(e.to_string()))?;
        if !seen.insert(subject) {
            return Err(ApiError::bad_request(format!(
                "subject {subject} given more than once"
            )));
        }
        profile = profile.with_score(subject, level);
    }
    for interest in &request.interests {
        if !state.catalog.catalog.groups.contains(interest) {
            warn!("interest {interest} matches no group in the catalog");
        }
        profile = profile.with_interest(interest);
    }
    let total = request.total.unwrap_or(state.config.allocation.total);
    Ok((profile, total))
}
