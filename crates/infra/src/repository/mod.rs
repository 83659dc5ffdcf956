//! Persistence interface for items and suppliers.
//!
//! The service layer depends on these traits only; backends are injected as
//! `Arc<dyn ItemRepository>` / `Arc<dyn SupplierRepository>`. Not-found is an
//! `Ok(None)`, a unique-key violation is [`RepositoryError::Duplicate`], and
//! everything else is an opaque [`RepositoryError::Storage`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::RecordId;
use stockroom_inventory::{Category, Item, ItemPatch, NewItem};
use stockroom_suppliers::{NewSupplier, Supplier, SupplierPatch, SupplierStatus};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryItemRepository, InMemoryStore, InMemorySupplierRepository};
pub use postgres::{PgItemRepository, PgSupplierRepository};

pub type RepoResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A unique constraint rejected the write.
    #[error("duplicate {field}: '{value}'")]
    Duplicate { field: String, value: String },

    /// Connectivity, timeout, decoding or any other backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Duplicate {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

/// Offset/limit window over a result set.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Page {
    pub const MAX_LIMIT: u64 = 100;

    /// 1-based page number; `limit` is clamped to `1..=MAX_LIMIT`.
    pub fn new(page: u64, limit: u64) -> Self {
        let limit = limit.clamp(1, Self::MAX_LIMIT);
        Self {
            offset: page.saturating_sub(1).saturating_mul(limit),
            limit,
        }
    }

    pub fn apply<T>(page: Option<Page>, rows: Vec<T>) -> Vec<T> {
        match page {
            Some(p) => rows
                .into_iter()
                .skip(usize::try_from(p.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(p.limit).unwrap_or(usize::MAX))
                .collect(),
            None => rows,
        }
    }
}

/// Item selection. Results are ordered by creation time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemQuery {
    pub category: Option<Category>,
    pub supplier: Option<RecordId>,
    pub page: Option<Page>,
}

impl ItemQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_supplier(supplier: RecordId) -> Self {
        Self {
            supplier: Some(supplier),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.category.is_none_or(|c| item.category == c)
            && self.supplier.as_ref().is_none_or(|s| &item.supplier == s)
    }
}

/// Supplier selection. Results are ordered by creation time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SupplierQuery {
    pub status: Option<SupplierStatus>,
    /// Case-insensitive substring of the supplier name.
    pub name_contains: Option<String>,
    pub page: Option<Page>,
}

impl SupplierQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, supplier: &Supplier) -> bool {
        self.status.is_none_or(|s| supplier.status == s)
            && self
                .name_contains
                .as_ref()
                .is_none_or(|q| supplier.name.to_lowercase().contains(&q.to_lowercase()))
    }
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Backend name, for diagnostics.
    fn backend(&self) -> &'static str;

    /// Round-trip to the backend.
    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }

    async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Item>>;

    async fn find(&self, query: &ItemQuery) -> RepoResult<Vec<Item>>;

    /// Persist a new item, minting its id and timestamps.
    async fn insert(&self, item: NewItem) -> RepoResult<Item>;

    /// Apply `patch` and refresh `updatedAt`. `None` if no such item.
    async fn update_by_id(&self, id: &RecordId, patch: ItemPatch) -> RepoResult<Option<Item>>;

    /// Remove and return the item. `None` if no such item.
    async fn delete_by_id(&self, id: &RecordId) -> RepoResult<Option<Item>>;

    /// Number of items whose `supplier` field equals `supplier`.
    async fn count_by_supplier(&self, supplier: &RecordId) -> RepoResult<u64>;

    /// Distinct `category` values in use, sorted.
    async fn distinct_categories(&self) -> RepoResult<Vec<String>>;
}

#[async_trait]
pub trait SupplierRepository: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> RepoResult<()> {
        Ok(())
    }

    async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Supplier>>;

    async fn find(&self, query: &SupplierQuery) -> RepoResult<Vec<Supplier>>;

    async fn insert(&self, supplier: NewSupplier) -> RepoResult<Supplier>;

    async fn update_by_id(
        &self,
        id: &RecordId,
        patch: SupplierPatch,
    ) -> RepoResult<Option<Supplier>>;

    async fn delete_by_id(&self, id: &RecordId) -> RepoResult<Option<Supplier>>;
}

#[async_trait]
impl<R> ItemRepository for Arc<R>
where
    R: ItemRepository + ?Sized,
{
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn ping(&self) -> RepoResult<()> {
        (**self).ping().await
    }

    async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Item>> {
        (**self).find_by_id(id).await
    }

    async fn find(&self, query: &ItemQuery) -> RepoResult<Vec<Item>> {
        (**self).find(query).await
    }

    async fn insert(&self, item: NewItem) -> RepoResult<Item> {
        (**self).insert(item).await
    }

    async fn update_by_id(&self, id: &RecordId, patch: ItemPatch) -> RepoResult<Option<Item>> {
        (**self).update_by_id(id, patch).await
    }

    async fn delete_by_id(&self, id: &RecordId) -> RepoResult<Option<Item>> {
        (**self).delete_by_id(id).await
    }

    async fn count_by_supplier(&self, supplier: &RecordId) -> RepoResult<u64> {
        (**self).count_by_supplier(supplier).await
    }

    async fn distinct_categories(&self) -> RepoResult<Vec<String>> {
        (**self).distinct_categories().await
    }
}

#[async_trait]
impl<R> SupplierRepository for Arc<R>
where
    R: SupplierRepository + ?Sized,
{
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn ping(&self) -> RepoResult<()> {
        (**self).ping().await
    }

    async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Supplier>> {
        (**self).find_by_id(id).await
    }

    async fn find(&self, query: &SupplierQuery) -> RepoResult<Vec<Supplier>> {
        (**self).find(query).await
    }

    async fn insert(&self, supplier: NewSupplier) -> RepoResult<Supplier> {
        (**self).insert(supplier).await
    }

    async fn update_by_id(
        &self,
        id: &RecordId,
        patch: SupplierPatch,
    ) -> RepoResult<Option<Supplier>> {
        (**self).update_by_id(id, patch).await
    }

    async fn delete_by_id(&self, id: &RecordId) -> RepoResult<Option<Supplier>> {
        (**self).delete_by_id(id).await
    }
}
