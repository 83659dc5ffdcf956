use axum::Json;
use axum::extract::rejection::JsonRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stockroom_core::{FieldError, Payload, RecordId, ValidationErrors};
use stockroom_infra::{ItemQuery, Page, SupplierQuery};
use stockroom_inventory::{Category, Item};
use stockroom_suppliers::{Supplier, SupplierStatus};

use crate::app::errors;

/// Page size used when only `page` is given.
pub const DEFAULT_LIMIT: u64 = 20;

// -------------------------
// Request DTOs
// -------------------------

/// Turn an extracted JSON body into a field map.
pub fn payload(body: Result<Json<Value>, JsonRejection>) -> Result<Payload, axum::response::Response> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => {
            let mut errs = ValidationErrors::new();
            errs.push(FieldError::new("body", "must be a JSON object"));
            Err(errors::validation_response(errs))
        }
        Err(rejection) => Err(errors::json_rejection_to_response(rejection)),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListParams {
    pub category: Option<String>,
    pub supplier: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TryFrom<ItemListParams> for ItemQuery {
    type Error = ValidationErrors;

    fn try_from(params: ItemListParams) -> Result<Self, Self::Error> {
        let mut errs = ValidationErrors::new();

        let category = non_blank(params.category).and_then(|raw| {
            raw.parse::<Category>()
                .map_err(|_| {
                    errs.push(FieldError::new(
                        "category",
                        format!("must be one of: {}", Category::NAMES.join(", ")),
                    ))
                })
                .ok()
        });
        let supplier = non_blank(params.supplier).and_then(|raw| {
            stockroom_core::parse_id("supplier", &raw)
                .map_err(|_| errs.push(FieldError::new("supplier", "must be a valid identifier")))
                .ok()
        });
        let page = page_params(params.page, params.limit, &mut errs);

        errs.into_result(ItemQuery {
            category,
            supplier,
            page,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplierListParams {
    pub status: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TryFrom<SupplierListParams> for SupplierQuery {
    type Error = ValidationErrors;

    fn try_from(params: SupplierListParams) -> Result<Self, Self::Error> {
        let mut errs = ValidationErrors::new();

        let status = non_blank(params.status).and_then(|raw| {
            raw.parse::<SupplierStatus>()
                .map_err(|_| {
                    errs.push(FieldError::new(
                        "status",
                        format!("must be one of: {}", SupplierStatus::NAMES.join(", ")),
                    ))
                })
                .ok()
        });
        let page = page_params(params.page, params.limit, &mut errs);

        errs.into_result(SupplierQuery {
            status,
            name_contains: non_blank(params.q),
            page,
        })
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn page_params(
    page: Option<String>,
    limit: Option<String>,
    errs: &mut ValidationErrors,
) -> Option<Page> {
    let page = positive(non_blank(page), "page", errs);
    let limit = positive(non_blank(limit), "limit", errs);
    match (page, limit) {
        (None, None) => None,
        (page, limit) => Some(Page::new(page.unwrap_or(1), limit.unwrap_or(DEFAULT_LIMIT))),
    }
}

fn positive(raw: Option<String>, field: &str, errs: &mut ValidationErrors) -> Option<u64> {
    let raw = raw?;
    match raw.parse::<u64>() {
        Ok(n) if n >= 1 => Some(n),
        _ => {
            errs.push(FieldError::new(field, "must be a positive integer"));
            None
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

/// An item's supplier reference as returned to clients: `{id, name}` when the
/// supplier resolves, the bare id when it does not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SupplierRef {
    Populated { id: RecordId, name: String },
    Unresolved(RecordId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: RecordId,
    pub name: String,
    pub category: Category,
    pub stock: i64,
    pub price: f64,
    pub supplier: SupplierRef,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ItemView {
    pub fn new(item: Item, supplier: Option<&Supplier>) -> Self {
        let supplier = match supplier {
            Some(s) if s.id == item.supplier => SupplierRef::Populated {
                id: s.id.clone(),
                name: s.name.clone(),
            },
            _ => SupplierRef::Unresolved(item.supplier),
        };
        Self {
            id: item.id,
            name: item.name,
            category: item.category,
            stock: item.stock,
            price: item.price,
            supplier,
            description: item.description,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub count: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: RecordId,
    pub deleted: bool,
}
