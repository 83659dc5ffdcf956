//! Item search filters.

use serde::Deserialize;

use stockroom_core::{FieldError, ValidationErrors};

use crate::report::StockRecord;

/// Raw search parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilterParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_stock: Option<String>,
    pub max_stock: Option<String>,
}

/// Parsed item filters. Absent filters impose no constraint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemFilters {
    /// Case-insensitive substring matched against name OR category.
    pub q: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Inclusive lower bound on stock.
    pub min_stock: Option<i64>,
    /// Inclusive upper bound on stock.
    pub max_stock: Option<i64>,
}

impl ItemFilters {
    pub fn matches<R: StockRecord>(&self, item: &R) -> bool {
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            let hit = item.name().to_lowercase().contains(&q)
                || item.category().to_lowercase().contains(&q);
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if item.category() != category {
                return false;
            }
        }
        let stock = item.stock_or_zero();
        if self.min_stock.is_some_and(|min| stock < min) {
            return false;
        }
        if self.max_stock.is_some_and(|max| stock > max) {
            return false;
        }
        true
    }
}

impl TryFrom<ItemFilterParams> for ItemFilters {
    type Error = ValidationErrors;

    fn try_from(params: ItemFilterParams) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::new();

        let min_stock = parse_bound("minStock", params.min_stock, &mut errors);
        let max_stock = parse_bound("maxStock", params.max_stock, &mut errors);
        if let (Some(min), Some(max)) = (min_stock, max_stock) {
            if min > max {
                errors.push(FieldError::new(
                    "minStock",
                    "minStock must not be greater than maxStock",
                ));
            }
        }

        errors.into_result(ItemFilters {
            q: non_blank(params.q),
            category: non_blank(params.category),
            min_stock,
            max_stock,
        })
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_bound(field: &str, raw: Option<String>, errors: &mut ValidationErrors) -> Option<i64> {
    let raw = non_blank(raw)?;
    match raw.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(FieldError::new(field, format!("{field} must be an integer")));
            None
        }
    }
}

/// The subset of `items` satisfying every supplied filter, in input order.
pub fn search_items<R, I>(items: I, filters: &ItemFilters) -> Vec<R>
where
    R: StockRecord,
    I: IntoIterator<Item = R>,
{
    items.into_iter().filter(|i| filters.matches(i)).collect()
}
