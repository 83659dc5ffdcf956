//! Cross-entity checks between items and suppliers.
//!
//! Runs after field validation and before the mutating repository call. The
//! checks are read-then-act and not linearisable with concurrent writers.

use std::sync::Arc;

use tracing::warn;

use stockroom_core::{DomainError, DomainResult, Entity, RecordId, ReferentialError};
use stockroom_inventory::Item;
use stockroom_suppliers::Supplier;

use crate::repository::{ItemRepository, RepositoryError, SupplierRepository};

#[derive(Clone)]
pub struct ConsistencyChecker {
    items: Arc<dyn ItemRepository>,
    suppliers: Arc<dyn SupplierRepository>,
}

impl ConsistencyChecker {
    pub fn new(items: Arc<dyn ItemRepository>, suppliers: Arc<dyn SupplierRepository>) -> Self {
        Self { items, suppliers }
    }

    /// The supplier an item points at must exist.
    pub async fn check_item_supplier_exists(&self, supplier_id: &RecordId) -> DomainResult<()> {
        let found = self
            .suppliers
            .find_by_id(supplier_id)
            .await
            .map_err(reclassify::<Supplier>)?;

        match found {
            Some(_) => Ok(()),
            None => {
                warn!(supplier_id = %supplier_id, "item references unknown supplier");
                Err(ReferentialError::SupplierNotFound {
                    supplier_id: supplier_id.clone(),
                }
                .into())
            }
        }
    }

    /// A supplier with dependent items cannot be deleted.
    pub async fn check_supplier_deletable(&self, supplier_id: &RecordId) -> DomainResult<()> {
        let count = self
            .items
            .count_by_supplier(supplier_id)
            .await
            .map_err(reclassify::<Item>)?;

        if count > 0 {
            warn!(supplier_id = %supplier_id, count, "supplier still has dependent items");
            return Err(ReferentialError::HasDependents {
                supplier_id: supplier_id.clone(),
                count,
            }
            .into());
        }
        Ok(())
    }
}

/// Map a repository failure for records of type `E` onto the domain error model.
pub fn reclassify<E: Entity>(err: RepositoryError) -> DomainError {
    match err {
        RepositoryError::Duplicate { field, value } => DomainError::conflict(E::KIND, field, value),
        RepositoryError::Storage(msg) => DomainError::storage(msg),
    }
}
