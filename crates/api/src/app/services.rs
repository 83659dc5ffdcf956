//! Service orchestration: validate → consistency checks → repository → view.
//!
//! Handlers only translate HTTP in and out; every rule lives behind these
//! methods so the router can be exercised with any repository backend.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument};

use stockroom_core::{
    DomainError, DomainResult, EntityKind, Mode, Payload, RecordId, decode, parse_id,
};
use stockroom_infra::{
    ConsistencyChecker, InMemoryItemRepository, InMemorySupplierRepository, ItemQuery,
    ItemRepository, PgItemRepository, PgSupplierRepository, SupplierQuery, SupplierRepository,
    reclassify, repository::postgres::migrate, validate,
};
use stockroom_inventory::{
    InventoryReport, Item, ItemFilters, ItemPatch, LowStockEntry, NewItem,
    aggregate_inventory_report, low_stock, search_items,
};
use stockroom_suppliers::{NewSupplier, Supplier, SupplierPatch};

use crate::app::dto::ItemView;
use crate::config::AppConfig;

/// Repository handles shared by every request.
#[derive(Clone)]
pub struct AppServices {
    items: Arc<dyn ItemRepository>,
    suppliers: Arc<dyn SupplierRepository>,
    consistency: ConsistencyChecker,
}

/// Result of a health probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub backend: &'static str,
    pub database: &'static str,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.database == "up"
    }
}

/// Pick the backend from configuration.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let Some(url) = config.database_url.as_deref() else {
        info!("DATABASE_URL not set; using in-memory repositories");
        return Ok(AppServices::in_memory());
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;
    migrate(&pool)
        .await
        .context("failed to apply database schema")?;
    info!(
        max_connections = config.database_max_connections,
        "using Postgres repositories"
    );

    Ok(AppServices::new(
        Arc::new(PgItemRepository::new(pool.clone())),
        Arc::new(PgSupplierRepository::new(pool)),
    ))
}

impl AppServices {
    pub fn new(items: Arc<dyn ItemRepository>, suppliers: Arc<dyn SupplierRepository>) -> Self {
        let consistency = ConsistencyChecker::new(items.clone(), suppliers.clone());
        Self {
            items,
            suppliers,
            consistency,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryItemRepository::new()),
            Arc::new(InMemorySupplierRepository::new()),
        )
    }

    pub async fn health(&self) -> HealthReport {
        let up = self.items.ping().await.is_ok() && self.suppliers.ping().await.is_ok();
        HealthReport {
            status: if up { "ok" } else { "degraded" },
            backend: self.items.backend(),
            database: if up { "up" } else { "down" },
        }
    }

    // ------------------------------------------------------------ items

    #[instrument(skip(self, payload), err(level = "warn"))]
    pub async fn create_item(&self, payload: &Payload) -> DomainResult<ItemView> {
        let new: NewItem = validated(payload, EntityKind::Item, Mode::Full)?;
        self.consistency
            .check_item_supplier_exists(&new.supplier)
            .await?;

        let item = self
            .items
            .insert(new)
            .await
            .map_err(reclassify::<Item>)?;
        info!(item_id = %item.id, "item created");
        self.populate_one(item).await
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn get_item(&self, raw_id: &str) -> DomainResult<ItemView> {
        let id = parse_id("id", raw_id)?;
        let item = self
            .items
            .find_by_id(&id)
            .await
            .map_err(reclassify::<Item>)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Item, id))?;
        self.populate_one(item).await
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn list_items(&self, query: &ItemQuery) -> DomainResult<Vec<ItemView>> {
        let items = self.all_items(query).await?;
        self.populate(items).await
    }

    /// Full replacement: every field is re-validated as on create.
    #[instrument(skip(self, payload), err(level = "warn"))]
    pub async fn replace_item(&self, raw_id: &str, payload: &Payload) -> DomainResult<ItemView> {
        let id = parse_id("id", raw_id)?;
        let new: NewItem = validated(payload, EntityKind::Item, Mode::Full)?;
        self.consistency
            .check_item_supplier_exists(&new.supplier)
            .await?;
        self.apply_item_patch(id, new.into_patch()).await
    }

    #[instrument(skip(self, payload), err(level = "warn"))]
    pub async fn patch_item(&self, raw_id: &str, payload: &Payload) -> DomainResult<ItemView> {
        let id = parse_id("id", raw_id)?;
        let patch: ItemPatch = validated(payload, EntityKind::Item, Mode::Partial)?;
        if let Some(supplier) = &patch.supplier {
            self.consistency.check_item_supplier_exists(supplier).await?;
        }
        self.apply_item_patch(id, patch).await
    }

    async fn apply_item_patch(&self, id: RecordId, patch: ItemPatch) -> DomainResult<ItemView> {
        let item = self
            .items
            .update_by_id(&id, patch)
            .await
            .map_err(reclassify::<Item>)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Item, id))?;
        info!(item_id = %item.id, "item updated");
        self.populate_one(item).await
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn delete_item(&self, raw_id: &str) -> DomainResult<Item> {
        let id = parse_id("id", raw_id)?;
        let item = self
            .items
            .delete_by_id(&id)
            .await
            .map_err(reclassify::<Item>)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Item, id))?;
        info!(item_id = %item.id, "item deleted");
        Ok(item)
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn search_items(&self, filters: &ItemFilters) -> DomainResult<Vec<ItemView>> {
        let items = self.all_items(&ItemQuery::all()).await?;
        self.populate(search_items(items, filters)).await
    }

    pub async fn categories(&self) -> DomainResult<Vec<String>> {
        self.items
            .distinct_categories()
            .await
            .map_err(reclassify::<Item>)
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn report(&self) -> DomainResult<InventoryReport> {
        let items = self.all_items(&ItemQuery::all()).await?;
        Ok(aggregate_inventory_report(items.iter()))
    }

    pub async fn low_stock(&self) -> DomainResult<Vec<LowStockEntry>> {
        let items = self.all_items(&ItemQuery::all()).await?;
        Ok(low_stock(items.iter()))
    }

    async fn all_items(&self, query: &ItemQuery) -> DomainResult<Vec<Item>> {
        self.items
            .find(query)
            .await
            .map_err(reclassify::<Item>)
    }

    async fn populate_one(&self, item: Item) -> DomainResult<ItemView> {
        let supplier = self.lookup_supplier(&item.supplier).await?;
        Ok(ItemView::new(item, supplier.as_ref()))
    }

    /// Resolve each distinct supplier once; unresolved references stay bare.
    async fn populate(&self, items: Vec<Item>) -> DomainResult<Vec<ItemView>> {
        let mut resolved: HashMap<RecordId, Option<Supplier>> = HashMap::new();
        for item in &items {
            if !resolved.contains_key(&item.supplier) {
                let supplier = self.lookup_supplier(&item.supplier).await?;
                resolved.insert(item.supplier.clone(), supplier);
            }
        }

        Ok(items
            .into_iter()
            .map(|item| {
                let supplier = resolved.get(&item.supplier).and_then(Option::as_ref);
                ItemView::new(item, supplier)
            })
            .collect())
    }

    async fn lookup_supplier(&self, id: &RecordId) -> DomainResult<Option<Supplier>> {
        self.suppliers
            .find_by_id(id)
            .await
            .map_err(reclassify::<Supplier>)
    }

    // -------------------------------------------------------- suppliers

    #[instrument(skip(self, payload), err(level = "warn"))]
    pub async fn create_supplier(&self, payload: &Payload) -> DomainResult<Supplier> {
        let new: NewSupplier = validated(payload, EntityKind::Supplier, Mode::Full)?;
        let supplier = self
            .suppliers
            .insert(new)
            .await
            .map_err(reclassify::<Supplier>)?;
        info!(supplier_id = %supplier.id, "supplier created");
        Ok(supplier)
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn get_supplier(&self, raw_id: &str) -> DomainResult<Supplier> {
        let id = parse_id("id", raw_id)?;
        self.require_supplier(id).await
    }

    #[instrument(skip(self), err(level = "warn"))]
    pub async fn list_suppliers(&self, query: &SupplierQuery) -> DomainResult<Vec<Supplier>> {
        self.suppliers
            .find(query)
            .await
            .map_err(reclassify::<Supplier>)
    }

    /// Items referencing the supplier. 404 if the supplier itself is absent.
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn supplier_items(&self, raw_id: &str) -> DomainResult<Vec<ItemView>> {
        let id = parse_id("id", raw_id)?;
        let supplier = self.require_supplier(id.clone()).await?;
        let items = self.all_items(&ItemQuery::by_supplier(id)).await?;
        Ok(items
            .into_iter()
            .map(|item| ItemView::new(item, Some(&supplier)))
            .collect())
    }

    #[instrument(skip(self, payload), err(level = "warn"))]
    pub async fn replace_supplier(&self, raw_id: &str, payload: &Payload) -> DomainResult<Supplier> {
        let id = parse_id("id", raw_id)?;
        let new: NewSupplier = validated(payload, EntityKind::Supplier, Mode::Full)?;
        self.apply_supplier_patch(id, new.into_patch()).await
    }

    #[instrument(skip(self, payload), err(level = "warn"))]
    pub async fn patch_supplier(&self, raw_id: &str, payload: &Payload) -> DomainResult<Supplier> {
        let id = parse_id("id", raw_id)?;
        let patch: SupplierPatch = validated(payload, EntityKind::Supplier, Mode::Partial)?;
        self.apply_supplier_patch(id, patch).await
    }

    async fn apply_supplier_patch(&self, id: RecordId, patch: SupplierPatch) -> DomainResult<Supplier> {
        let supplier = self
            .suppliers
            .update_by_id(&id, patch)
            .await
            .map_err(reclassify::<Supplier>)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Supplier, id))?;
        info!(supplier_id = %supplier.id, "supplier updated");
        Ok(supplier)
    }

    /// 404 if absent, referential error while items still point at it.
    #[instrument(skip(self), err(level = "warn"))]
    pub async fn delete_supplier(&self, raw_id: &str) -> DomainResult<Supplier> {
        let id = parse_id("id", raw_id)?;
        self.require_supplier(id.clone()).await?;
        self.consistency.check_supplier_deletable(&id).await?;

        let supplier = self
            .suppliers
            .delete_by_id(&id)
            .await
            .map_err(reclassify::<Supplier>)?
            .ok_or_else(|| DomainError::not_found(EntityKind::Supplier, id))?;
        info!(supplier_id = %supplier.id, "supplier deleted");
        Ok(supplier)
    }

    async fn require_supplier(&self, id: RecordId) -> DomainResult<Supplier> {
        self.lookup_supplier(&id)
            .await?
            .ok_or_else(|| DomainError::not_found(EntityKind::Supplier, id))
    }
}

/// Validate `payload` for `kind` and decode the normalised result.
fn validated<T: DeserializeOwned>(payload: &Payload, kind: EntityKind, mode: Mode) -> DomainResult<T> {
    let normalized = validate(payload, kind, mode)?;
    Ok(decode(normalized)?)
}
