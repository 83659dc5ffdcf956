use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::{DomainError, ReferentialError, ValidationErrors};

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(errors) => validation_response(errors),
        DomainError::Referential(e) => {
            let message = e.to_string();
            match e {
                ReferentialError::SupplierNotFound { supplier_id } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    axum::Json(json!({
                        "error": "supplier_not_found",
                        "message": message,
                        "supplierId": supplier_id,
                    })),
                )
                    .into_response(),
                ReferentialError::HasDependents { supplier_id, count } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    axum::Json(json!({
                        "error": "has_dependents",
                        "message": message,
                        "supplierId": supplier_id,
                        "count": count,
                    })),
                )
                    .into_response(),
            }
        }
        e @ DomainError::NotFound { .. } => {
            json_error(StatusCode::NOT_FOUND, "not_found", e.to_string())
        }
        e @ DomainError::Conflict { .. } => {
            json_error(StatusCode::CONFLICT, "conflict", e.to_string())
        }
        DomainError::Storage(msg) => {
            tracing::error!(error = %msg, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "the storage backend failed; the request was not applied",
            )
        }
    }
}

pub fn validation_response(errors: ValidationErrors) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "message": errors.to_string(),
            "errors": errors,
        })),
    )
        .into_response()
}

/// Malformed or non-JSON request bodies.
pub fn json_rejection_to_response(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_body", rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
