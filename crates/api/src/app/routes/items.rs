use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::Value;

use stockroom_infra::ItemQuery;
use stockroom_inventory::{ItemFilterParams, ItemFilters};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/search", get(search_items))
        .route("/categories", get(list_categories))
        .route("/report", get(inventory_report))
        .route("/low-stock", get(low_stock))
        .route(
            "/:id",
            get(get_item)
                .put(replace_item)
                .patch(patch_item)
                .delete(delete_item),
        )
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ItemListParams>,
) -> axum::response::Response {
    let query = match ItemQuery::try_from(params) {
        Ok(q) => q,
        Err(e) => return errors::validation_response(e),
    };

    match services.list_items(&query).await {
        Ok(items) => (StatusCode::OK, Json(dto::ListResponse::from(items))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    let payload = match dto::payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.create_item(&payload).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn search_items(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<ItemFilterParams>,
) -> axum::response::Response {
    let filters = match ItemFilters::try_from(params) {
        Ok(f) => f,
        Err(e) => return errors::validation_response(e),
    };

    match services.search_items(&filters).await {
        Ok(items) => (StatusCode::OK, Json(dto::ListResponse::from(items))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.categories().await {
        Ok(categories) => {
            (StatusCode::OK, Json(serde_json::json!({ "categories": categories }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn inventory_report(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.report().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn low_stock(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.low_stock().await {
        Ok(items) => (StatusCode::OK, Json(dto::ListResponse::from(items))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.get_item(&id).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn replace_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    let payload = match dto::payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.replace_item(&id, &payload).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn patch_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> axum::response::Response {
    let payload = match dto::payload(body) {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match services.patch_item(&id, &payload).await {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match services.delete_item(&id).await {
        Ok(item) => (
            StatusCode::OK,
            Json(dto::Deleted {
                id: item.id,
                deleted: true,
            }),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
