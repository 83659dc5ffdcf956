use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::Value;

use stockroom_infra::SupplierQuery;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier)
                .put(replace_supplier)
                .patch(patch_supplier)
                .delete(delete_supplier),
        )
        .route("/:id/items", get(supplier_items))
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::SupplierListParams>,
) -> axum::response::Response {
    let query = match SupplierQuery::try_from(params) {
        Ok(q) => q,
        Err(e) => return errors::validation_response(e),
    };

    match services.list_suppliers(&query).await {
        Ok(suppliers) => {
            (StatusCode::OK, Json(dto::ListResponse::from(suppliers))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    let payload = match dto::payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.create_supplier(&payload).await {
        Ok(supplier) => (StatusCode::CREATED, Json(supplier)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.get_supplier(&id).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn supplier_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.supplier_items(&id).await {
        Ok(items) => (StatusCode::OK, Json(dto::ListResponse::from(items))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn replace_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    let payload = match dto::payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.replace_supplier(&id, &payload).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn patch_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    let payload = match dto::payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.patch_supplier(&id, &payload).await {
        Ok(supplier) => (StatusCode::OK, Json(supplier)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.delete_supplier(&id).await {
        Ok(supplier) => (
            StatusCode::OK,
            Json(dto::Deleted {
                id: supplier.id,
                deleted: true,
            }),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
