//! Inventory report aggregation.
//!
//! Pure reduction over a set of item records: overall totals, a per-category
//! breakdown in first-occurrence order, and the low-stock subset.

use serde::{Deserialize, Serialize};

use stockroom_core::RecordId;

/// Items at or below this stock level are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// The view of an item record the aggregator needs.
///
/// `stock`/`price` are optional so records with missing values (e.g. rows
/// edited out of band) aggregate as zero instead of failing.
pub trait StockRecord {
    fn record_id(&self) -> &RecordId;
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn stock(&self) -> Option<i64>;
    fn price(&self) -> Option<f64>;

    fn stock_or_zero(&self) -> i64 {
        self.stock().unwrap_or(0)
    }

    /// `stock × price`, unrounded.
    fn value_or_zero(&self) -> f64 {
        self.stock_or_zero() as f64 * self.price().unwrap_or(0.0)
    }
}

impl<T: StockRecord + ?Sized> StockRecord for &T {
    fn record_id(&self) -> &RecordId {
        (**self).record_id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn category(&self) -> &str {
        (**self).category()
    }

    fn stock(&self) -> Option<i64> {
        (**self).stock()
    }

    fn price(&self) -> Option<f64> {
        (**self).price()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_items: u64,
    pub total_stock: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub category: String,
    pub item_count: u64,
    pub total_stock: i64,
    pub total_value: f64,
}

/// Low-stock projection of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockEntry {
    pub id: RecordId,
    pub name: String,
    pub stock: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub summary: ReportSummary,
    pub by_category: Vec<CategoryBreakdown>,
    pub low_stock: Vec<LowStockEntry>,
}

/// Compute the inventory report for `items`.
pub fn aggregate_inventory_report<R, I>(items: I) -> InventoryReport
where
    R: StockRecord,
    I: IntoIterator<Item = R>,
{
    let mut report = InventoryReport::default();

    for item in items {
        let stock = item.stock_or_zero();
        let value = item.value_or_zero();

        report.summary.total_items += 1;
        report.summary.total_stock = report.summary.total_stock.saturating_add(stock);
        report.summary.total_value += value;

        // Linear scan keeps first-occurrence order; the category set is tiny.
        match report
            .by_category
            .iter_mut()
            .find(|c| c.category == item.category())
        {
            Some(group) => {
                group.item_count += 1;
                group.total_stock = group.total_stock.saturating_add(stock);
                group.total_value += value;
            }
            None => report.by_category.push(CategoryBreakdown {
                category: item.category().to_string(),
                item_count: 1,
                total_stock: stock,
                total_value: value,
            }),
        }

        if stock <= LOW_STOCK_THRESHOLD {
            report.low_stock.push(low_stock_entry(&item));
        }
    }

    report
}

/// Only the low-stock projection of `items`.
pub fn low_stock<R, I>(items: I) -> Vec<LowStockEntry>
where
    R: StockRecord,
    I: IntoIterator<Item = R>,
{
    items
        .into_iter()
        .filter(|i| i.stock_or_zero() <= LOW_STOCK_THRESHOLD)
        .map(|i| low_stock_entry(&i))
        .collect()
}

fn low_stock_entry<R: StockRecord>(item: &R) -> LowStockEntry {
    LowStockEntry {
        id: item.record_id().clone(),
        name: item.name().to_string(),
        stock: item.stock_or_zero(),
    }
}
