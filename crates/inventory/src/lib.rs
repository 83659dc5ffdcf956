//! Inventory domain module.
//!
//! This crate contains business rules for items, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage): the item record and
//! its field rules, report aggregation and search filtering.

pub mod item;
pub mod report;
pub mod search;

pub use item::{Category, ITEM_RULES, Item, ItemPatch, NewItem, validate_item};
pub use report::{
    CategoryBreakdown, InventoryReport, LOW_STOCK_THRESHOLD, LowStockEntry, ReportSummary,
    StockRecord, aggregate_inventory_report, low_stock,
};
pub use search::{ItemFilterParams, ItemFilters, search_items};
