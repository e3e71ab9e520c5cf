//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum::response::IntoResponse;
use lexis::api::{ApiError, ErrorBody, HealthResponse, ListParams, StatusResponse};
use lexis_core::{ConceptCounts, LexisError};

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_status_response_from_counts() {
    let status = StatusResponse::new(
        "redb",
        ConceptCounts {
            total: 10,
            active: 7,
            retired: 3,
        },
    );
    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["backend"], "redb");
    assert_eq!(json["retired"], 3);
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

#[test]
fn test_list_params_camel_case() {
    let params: ListParams = serde_json::from_value(serde_json::json!({
        "q": "food",
        "memberOf": "0f97e14e-cdc2-49ac-9255-b5126f8a5147",
        "startIndex": 5,
        "includeAll": true
    }))
    .unwrap();

    assert_eq!(params.q.as_deref(), Some("food"));
    assert_eq!(params.start_index, Some(5));
    assert!(params.include_all);
    assert!(params.is_search());
}

#[test]
fn test_list_params_defaults() {
    let params: ListParams = serde_json::from_str("{}").unwrap();
    assert!(!params.include_all);
    assert!(params.limit.is_none());
    assert!(!params.is_search());
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_error_body_shape() {
    let body = ErrorBody {
        error: lexis::api::ErrorDetail {
            kind: "not_found".to_string(),
            message: "Concept not found: x".to_string(),
        },
    };
    let json = serde_json::to_string(&body).unwrap();
    assert_eq!(
        json,
        r#"{"error":{"kind":"not_found","message":"Concept not found: x"}}"#
    );
}

#[test]
fn test_api_error_statuses() {
    let response = ApiError(LexisError::AmbiguousName {
        name: "COUGH".to_string(),
        count: 2,
    })
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ApiError(LexisError::Io("disk".to_string())).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
