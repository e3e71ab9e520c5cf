//! # API Endpoint Handlers
//!
//! The concept resource controller. Each handler takes the session lock,
//! calls one engine operation and projects the result.

use super::{
    AppState,
    types::{ApiError, DeleteParams, HealthResponse, ListParams, RetrieveParams, StatusResponse},
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use lexis_core::{
    ConceptPatch, ConceptView, NewConcept, Page, Representation, SearchFilter, SearchOptions,
    Window,
};

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Concept counts and the active backend.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = state.session.read().await;
    let backend = if session.is_persistent() {
        "redb"
    } else {
        "memory"
    };
    Ok(Json(StatusResponse::new(backend, session.counts()?)))
}

// =============================================================================
// LIST / SEARCH
// =============================================================================

/// `GET /concept`: list, or search when `q`, `memberOf` or `answerTo` is given.
///
/// Results default to the `ref` representation.
pub async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<ConceptView>>, ApiError> {
    let Query(params) = params?;
    let ctx = state.request_context(&headers);
    let level = Representation::for_listing(params.v.as_deref())?;

    let session = state.session.read().await;
    let window = Window::resolve(params.start_index, params.limit, session.paging())?;

    let page = if params.is_search() {
        let filter =
            SearchFilter::from_params(params.member_of.as_deref(), params.answer_to.as_deref())?;
        let options = SearchOptions {
            include_retired: params.include_all,
        };
        let query = params.q.as_deref().unwrap_or_default();
        session.search(&ctx, query, filter, options, window)?
    } else {
        session.list(params.include_all, window)?
    };

    let page = page.try_map(|concept| session.project(&ctx, &concept, level))?;
    Ok(Json(page))
}

// =============================================================================
// RETRIEVE
// =============================================================================

/// `GET /concept/{id}` by uuid or name.
pub async fn retrieve_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    params: Result<Query<RetrieveParams>, QueryRejection>,
) -> Result<Json<ConceptView>, ApiError> {
    let Query(params) = params?;
    let ctx = state.request_context(&headers);
    let session = state.session.read().await;
    let view = session.retrieve(&ctx, &id, params.v.as_deref())?;
    Ok(Json(view))
}

// =============================================================================
// CREATE / UPDATE
// =============================================================================

/// `POST /concept`. Responds 201 with the default representation.
pub async fn create_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<NewConcept>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(spec) = payload?;
    let ctx = state.request_context(&headers);

    let mut session = state.session.write().await;
    let concept = session.create(&ctx, spec)?;
    let view = session.project(&ctx, &concept, Representation::Default)?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// `POST /concept/{id}`: partial update.
pub async fn update_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<ConceptPatch>, JsonRejection>,
) -> Result<Json<ConceptView>, ApiError> {
    let Json(patch) = payload?;
    let ctx = state.request_context(&headers);

    let mut session = state.session.write().await;
    let target = session.resolve(&id)?;
    let concept = session.update(&ctx, target.id, patch)?;
    Ok(Json(session.project(&ctx, &concept, Representation::Default)?))
}

// =============================================================================
// DELETE
// =============================================================================

/// `DELETE /concept/{id}?reason=...` retires; `?purge=true` removes.
pub async fn delete_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(params) = params?;
    let ctx = state.request_context(&headers);

    let mut session = state.session.write().await;
    let target = session.resolve(&id)?;
    if params.purge {
        session.purge(target.id)?;
    } else {
        session.retire(&ctx, target.id, params.reason.as_deref().unwrap_or_default())?;
    }
    Ok(StatusCode::NO_CONTENT)
}
