//! # API Request/Response Types
//!
//! Query parameter structs, response bodies and the error type the handlers
//! return. Concept bodies themselves are the core's `ConceptView`,
//! `NewConcept` and `ConceptPatch`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lexis_core::{ConceptCounts, LexisError};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Dictionary status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub backend: String,
    pub total: usize,
    pub active: usize,
    pub retired: usize,
}

impl StatusResponse {
    #[must_use]
    pub fn new(backend: &str, counts: ConceptCounts) -> Self {
        Self {
            backend: backend.to_string(),
            total: counts.total,
            active: counts.active,
            retired: counts.retired,
        }
    }
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// `GET /concept` parameters. `q`, `memberOf` or `answerTo` switch the
/// listing into a search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub v: Option<String>,
    pub q: Option<String>,
    pub member_of: Option<String>,
    pub answer_to: Option<String>,
    pub start_index: Option<usize>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub include_all: bool,
}

impl ListParams {
    /// True when any search parameter is present.
    #[must_use]
    pub fn is_search(&self) -> bool {
        self.q.is_some() || self.member_of.is_some() || self.answer_to.is_some()
    }
}

/// `GET /concept/{id}` parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrieveParams {
    pub v: Option<String>,
}

/// `DELETE /concept/{id}` parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteParams {
    pub reason: Option<String>,
    #[serde(default)]
    pub purge: bool,
}

// =============================================================================
// ERRORS
// =============================================================================

/// JSON error body: `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

/// Handler error. Wraps the engine error and picks the HTTP status.
#[derive(Debug)]
pub struct ApiError(pub LexisError);

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LexisError::NotFound(_) => StatusCode::NOT_FOUND,
            LexisError::AmbiguousName { .. }
            | LexisError::InvalidName(_)
            | LexisError::Validation(_)
            | LexisError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            LexisError::InvalidStateTransition { .. } | LexisError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            LexisError::Storage(_) | LexisError::Serialization(_) | LexisError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LexisError> for ApiError {
    fn from(err: LexisError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(LexisError::Validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(LexisError::InvalidArgument(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(kind = self.0.kind(), error = %self.0, "request rejected");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.0.kind().to_string(),
                message: self.0.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (LexisError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (LexisError::InvalidName("x".into()), StatusCode::BAD_REQUEST),
            (LexisError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                LexisError::InvalidStateTransition {
                    from: "retired",
                    to: "retired",
                },
                StatusCode::CONFLICT,
            ),
            (LexisError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn search_detection() {
        assert!(!ListParams::default().is_search());
        let params = ListParams {
            member_of: Some("x".into()),
            ..ListParams::default()
        };
        assert!(params.is_search());
    }
}
