use axum::Router;

pub mod items;
pub mod suppliers;
pub mod system;

/// Router for the resource endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/items", items::router())
        .nest("/suppliers", suppliers::router())
}
