//! Infrastructure layer: repositories, storage backends and the
//! cross-entity consistency checks that sit in front of them.

pub mod consistency;
pub mod repository;
pub mod validation;

pub use consistency::{ConsistencyChecker, reclassify};
pub use repository::{
    InMemoryItemRepository, InMemoryStore, InMemorySupplierRepository, ItemQuery, ItemRepository,
    Page, PgItemRepository, PgSupplierRepository, RepoResult, RepositoryError, SupplierQuery,
    SupplierRepository,
};
pub use validation::validate;
