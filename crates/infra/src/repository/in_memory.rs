//! In-memory repositories for tests/dev.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use stockroom_core::{Entity, RecordId};
use stockroom_inventory::{Item, ItemPatch, NewItem};
use stockroom_suppliers::{NewSupplier, Supplier, SupplierPatch};

use super::{
    ItemQuery, ItemRepository, Page, RepoResult, RepositoryError, SupplierQuery,
    SupplierRepository,
};

/// Insertion-ordered record store with a single unique text key.
///
/// The uniqueness check and the write happen under one write guard, so two
/// concurrent inserts with the same key cannot both succeed.
#[derive(Debug)]
pub struct InMemoryStore<E> {
    inner: RwLock<Vec<E>>,
    unique_field: &'static str,
    unique_key: fn(&E) -> &str,
}

impl<E> InMemoryStore<E>
where
    E: Entity + Clone,
{
    pub fn new(unique_field: &'static str, unique_key: fn(&E) -> &str) -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
            unique_field,
            unique_key,
        }
    }

    pub fn get(&self, id: &RecordId) -> RepoResult<Option<E>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.iter().find(|e| e.id() == id).cloned())
    }

    pub fn list(&self, filter: impl Fn(&E) -> bool) -> RepoResult<Vec<E>> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.iter().filter(|e| filter(e)).cloned().collect())
    }

    pub fn count(&self, filter: impl Fn(&E) -> bool) -> RepoResult<u64> {
        let rows = self.inner.read().map_err(poisoned)?;
        Ok(rows.iter().filter(|e| filter(e)).count() as u64)
    }

    pub fn insert(&self, entity: E) -> RepoResult<E> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        self.ensure_unique(&rows, &entity)?;
        rows.push(entity.clone());
        Ok(entity)
    }

    /// Mutate a copy of the record, re-check uniqueness, then store it.
    pub fn update(&self, id: &RecordId, mutate: impl FnOnce(&mut E)) -> RepoResult<Option<E>> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        let Some(pos) = rows.iter().position(|e| e.id() == id) else {
            return Ok(None);
        };

        let mut updated = rows[pos].clone();
        mutate(&mut updated);
        self.ensure_unique(&rows, &updated)?;

        rows[pos] = updated.clone();
        Ok(Some(updated))
    }

    pub fn remove(&self, id: &RecordId) -> RepoResult<Option<E>> {
        let mut rows = self.inner.write().map_err(poisoned)?;
        Ok(rows
            .iter()
            .position(|e| e.id() == id)
            .map(|pos| rows.remove(pos)))
    }

    fn ensure_unique(&self, rows: &[E], candidate: &E) -> RepoResult<()> {
        let key = (self.unique_key)(candidate);
        let taken = rows
            .iter()
            .any(|e| e.id() != candidate.id() && (self.unique_key)(e) == key);
        if taken {
            return Err(RepositoryError::duplicate(self.unique_field, key));
        }
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> RepositoryError {
    RepositoryError::storage("in-memory store lock poisoned")
}

fn item_name(item: &Item) -> &str {
    &item.name
}

fn supplier_name(supplier: &Supplier) -> &str {
    &supplier.name
}

#[derive(Debug)]
pub struct InMemoryItemRepository {
    store: InMemoryStore<Item>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("name", item_name),
        }
    }

    /// Store a fully-formed record as-is, bypassing validation and the
    /// supplier check (fixtures, imports).
    pub fn insert_raw(&self, item: Item) -> RepoResult<Item> {
        self.store.insert(item)
    }
}

impl Default for InMemoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Item>> {
        self.store.get(id)
    }

    async fn find(&self, query: &ItemQuery) -> RepoResult<Vec<Item>> {
        let rows = self.store.list(|i| query.matches(i))?;
        Ok(Page::apply(query.page, rows))
    }

    async fn insert(&self, item: NewItem) -> RepoResult<Item> {
        self.store.insert(item.into_item(RecordId::new(), Utc::now()))
    }

    async fn update_by_id(&self, id: &RecordId, patch: ItemPatch) -> RepoResult<Option<Item>> {
        let now = Utc::now();
        self.store.update(id, |item| patch.apply(item, now))
    }

    async fn delete_by_id(&self, id: &RecordId) -> RepoResult<Option<Item>> {
        self.store.remove(id)
    }

    async fn count_by_supplier(&self, supplier: &RecordId) -> RepoResult<u64> {
        self.store.count(|i| &i.supplier == supplier)
    }

    async fn distinct_categories(&self) -> RepoResult<Vec<String>> {
        let mut categories: Vec<String> = self
            .store
            .list(|_| true)?
            .into_iter()
            .map(|i| i.category.as_str().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}

#[derive(Debug)]
pub struct InMemorySupplierRepository {
    store: InMemoryStore<Supplier>,
}

impl InMemorySupplierRepository {
    pub fn new() -> Self {
        Self {
            store: InMemoryStore::new("name", supplier_name),
        }
    }
}

impl Default for InMemorySupplierRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SupplierRepository for InMemorySupplierRepository {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Supplier>> {
        self.store.get(id)
    }

    async fn find(&self, query: &SupplierQuery) -> RepoResult<Vec<Supplier>> {
        let rows = self.store.list(|s| query.matches(s))?;
        Ok(Page::apply(query.page, rows))
    }

    async fn insert(&self, supplier: NewSupplier) -> RepoResult<Supplier> {
        self.store
            .insert(supplier.into_supplier(RecordId::new(), Utc::now()))
    }

    async fn update_by_id(
        &self,
        id: &RecordId,
        patch: SupplierPatch,
    ) -> RepoResult<Option<Supplier>> {
        let now = Utc::now();
        self.store.update(id, |supplier| patch.apply(supplier, now))
    }

    async fn delete_by_id(&self, id: &RecordId) -> RepoResult<Option<Supplier>> {
        self.store.remove(id)
    }
}
