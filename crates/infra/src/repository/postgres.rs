//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx error | Code | `RepositoryError` |
//! |---|---|---|
//! | Database (unique violation on a write) | `23505` | `Duplicate { field: "name", .. }` |
//! | Database (unique violation elsewhere) | `23505` | `Storage` |
//! | Database (check violation) | `23514` | `Storage` |
//! | Pool closed / IO / decode / other | - | `Storage` |
//!
//! Ids are minted in the application ([`RecordId::new`]) so both backends
//! produce the same 24-hex format. Result sets are ordered by
//! `(created_at, id)`, which is creation order.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use tracing::instrument;

use stockroom_core::RecordId;
use stockroom_inventory::{Category, Item, ItemPatch, NewItem};
use stockroom_suppliers::{NewSupplier, PaymentTerms, Supplier, SupplierPatch, SupplierStatus};

use super::{
    ItemQuery, ItemRepository, Page, RepoResult, RepositoryError, SupplierQuery,
    SupplierRepository,
};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS suppliers (
        id            CHAR(24)     PRIMARY KEY,
        name          VARCHAR(100) NOT NULL UNIQUE,
        contact       VARCHAR(100),
        phone         VARCHAR(17),
        email         TEXT,
        address       VARCHAR(200),
        website       TEXT,
        status        TEXT         NOT NULL DEFAULT 'Active',
        payment_terms TEXT         NOT NULL DEFAULT 'Net 30',
        created_at    TIMESTAMPTZ  NOT NULL,
        updated_at    TIMESTAMPTZ  NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id          CHAR(24)         PRIMARY KEY,
        name        VARCHAR(100)     NOT NULL UNIQUE,
        category    TEXT             NOT NULL DEFAULT 'General',
        stock       BIGINT           NOT NULL DEFAULT 0 CHECK (stock >= 0),
        price       DOUBLE PRECISION NOT NULL DEFAULT 0 CHECK (price >= 0),
        supplier    CHAR(24)         NOT NULL,
        description VARCHAR(500),
        created_at  TIMESTAMPTZ      NOT NULL,
        updated_at  TIMESTAMPTZ      NOT NULL
    )
    "#,
    // No FK on items.supplier: orphans are tolerated and reported by id.
    "CREATE INDEX IF NOT EXISTS items_supplier_idx ON items (supplier)",
];

/// Create the tables if they do not exist yet.
#[instrument(skip(pool), err)]
pub async fn migrate(pool: &PgPool) -> RepoResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
    }
    Ok(())
}

async fn ping(pool: &PgPool) -> RepoResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(|e| map_sqlx_error("ping", e))
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Option<Page>) {
    if let Some(p) = page {
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(p.limit).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(p.offset).unwrap_or(i64::MAX));
    }
}

// ---------------------------------------------------------------- items

const ITEM_COLUMNS: &str =
    "id, name, category, stock, price, supplier, description, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgItemRepository {
    pool: Arc<PgPool>,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn write_item(tx: &mut Transaction<'_, Postgres>, item: &Item) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE items SET
                name = $2,
                category = $3,
                stock = $4,
                price = $5,
                supplier = $6,
                description = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(item.id.as_str())
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(item.stock)
        .bind(item.price)
        .bind(item.supplier.as_str())
        .bind(item.description.as_deref())
        .bind(item.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error("update_item", &item.name, e))?;
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> RepoResult<()> {
        ping(&self.pool).await
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Item>> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = $1"))
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find(&self, query: &ItemQuery) -> RepoResult<Vec<Item>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE TRUE"
        ));
        if let Some(category) = query.category {
            qb.push(" AND category = ").push_bind(category.as_str());
        }
        if let Some(supplier) = &query.supplier {
            qb.push(" AND supplier = ").push_bind(supplier.as_str().to_string());
        }
        qb.push(" ORDER BY created_at ASC, id ASC");
        push_page(&mut qb, query.page);

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_items", e))?;

        rows.iter().map(item_from_row).collect()
    }

    #[instrument(skip(self, item), fields(name = %item.name), err)]
    async fn insert(&self, item: NewItem) -> RepoResult<Item> {
        let item = item.into_item(RecordId::new(), Utc::now());

        sqlx::query(&format!(
            "INSERT INTO items ({ITEM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(item.id.as_str())
        .bind(&item.name)
        .bind(item.category.as_str())
        .bind(item.stock)
        .bind(item.price)
        .bind(item.supplier.as_str())
        .bind(item.description.as_deref())
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_write_error("insert_item", &item.name, e))?;

        Ok(item)
    }

    #[instrument(skip(self, patch), fields(id = %id), err)]
    async fn update_by_id(&self, id: &RecordId, patch: ItemPatch) -> RepoResult<Option<Item>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_item", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut item = item_from_row(&row)?;
        patch.apply(&mut item, Utc::now());
        Self::write_item(&mut tx, &item).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(Some(item))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete_by_id(&self, id: &RecordId) -> RepoResult<Option<Item>> {
        let row = sqlx::query(&format!(
            "DELETE FROM items WHERE id = $1 RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    #[instrument(skip(self), fields(supplier = %supplier), err)]
    async fn count_by_supplier(&self, supplier: &RecordId) -> RepoResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM items WHERE supplier = $1")
            .bind(supplier.as_str())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_items_by_supplier", e))?;

        let n: i64 = row
            .try_get("n")
            .map_err(|e| map_sqlx_error("count_items_by_supplier", e))?;
        Ok(n.max(0) as u64)
    }

    #[instrument(skip(self), err)]
    async fn distinct_categories(&self) -> RepoResult<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT category FROM items ORDER BY category")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("distinct_categories", e))?;

        rows.iter()
            .map(|r| {
                r.try_get::<String, _>("category")
                    .map_err(|e| map_sqlx_error("distinct_categories", e))
            })
            .collect()
    }
}

fn item_from_row(row: &sqlx::postgres::PgRow) -> RepoResult<Item> {
    let decode = |e| map_sqlx_error("decode_item", e);

    let category: String = row.try_get("category").map_err(decode)?;
    Ok(Item {
        id: record_id(row, "id")?,
        name: row.try_get("name").map_err(decode)?,
        category: category
            .parse::<Category>()
            .map_err(|e| RepositoryError::storage(e.to_string()))?,
        stock: row.try_get("stock").map_err(decode)?,
        price: row.try_get("price").map_err(decode)?,
        supplier: record_id(row, "supplier")?,
        description: row.try_get("description").map_err(decode)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode)?,
    })
}

// ------------------------------------------------------------ suppliers

const SUPPLIER_COLUMNS: &str = "id, name, contact, phone, email, address, website, status, \
                                payment_terms, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgSupplierRepository {
    pool: Arc<PgPool>,
}

impl PgSupplierRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl SupplierRepository for PgSupplierRepository {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> RepoResult<()> {
        ping(&self.pool).await
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_by_id(&self, id: &RecordId) -> RepoResult<Option<Supplier>> {
        let row = sqlx::query(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_supplier", e))?;

        row.as_ref().map(supplier_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find(&self, query: &SupplierQuery) -> RepoResult<Vec<Supplier>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE TRUE"
        ));
        if let Some(status) = query.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(q) = &query.name_contains {
            qb.push(" AND POSITION(LOWER(")
                .push_bind(q.clone())
                .push(") IN LOWER(name)) > 0");
        }
        qb.push(" ORDER BY created_at ASC, id ASC");
        push_page(&mut qb, query.page);

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_suppliers", e))?;

        rows.iter().map(supplier_from_row).collect()
    }

    #[instrument(skip(self, supplier), fields(name = %supplier.name), err)]
    async fn insert(&self, supplier: NewSupplier) -> RepoResult<Supplier> {
        let s = supplier.into_supplier(RecordId::new(), Utc::now());

        sqlx::query(&format!(
            "INSERT INTO suppliers ({SUPPLIER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(s.id.as_str())
        .bind(&s.name)
        .bind(s.contact.as_deref())
        .bind(s.phone.as_deref())
        .bind(s.email.as_deref())
        .bind(s.address.as_deref())
        .bind(s.website.as_deref())
        .bind(s.status.as_str())
        .bind(s.payment_terms.as_str())
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_write_error("insert_supplier", &s.name, e))?;

        Ok(s)
    }

    #[instrument(skip(self, patch), fields(id = %id), err)]
    async fn update_by_id(
        &self,
        id: &RecordId,
        patch: SupplierPatch,
    ) -> RepoResult<Option<Supplier>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("lock_supplier", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut s = supplier_from_row(&row)?;
        patch.apply(&mut s, Utc::now());

        sqlx::query(
            r#"
            UPDATE suppliers SET
                name = $2,
                contact = $3,
                phone = $4,
                email = $5,
                address = $6,
                website = $7,
                status = $8,
                payment_terms = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(s.id.as_str())
        .bind(&s.name)
        .bind(s.contact.as_deref())
        .bind(s.phone.as_deref())
        .bind(s.email.as_deref())
        .bind(s.address.as_deref())
        .bind(s.website.as_deref())
        .bind(s.status.as_str())
        .bind(s.payment_terms.as_str())
        .bind(s.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error("update_supplier", &s.name, e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(Some(s))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete_by_id(&self, id: &RecordId) -> RepoResult<Option<Supplier>> {
        let row = sqlx::query(&format!(
            "DELETE FROM suppliers WHERE id = $1 RETURNING {SUPPLIER_COLUMNS}"
        ))
        .bind(id.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_supplier", e))?;

        row.as_ref().map(supplier_from_row).transpose()
    }
}

fn supplier_from_row(row: &sqlx::postgres::PgRow) -> RepoResult<Supplier> {
    let decode = |e| map_sqlx_error("decode_supplier", e);

    let status: String = row.try_get("status").map_err(decode)?;
    let terms: String = row.try_get("payment_terms").map_err(decode)?;
    Ok(Supplier {
        id: record_id(row, "id")?,
        name: row.try_get("name").map_err(decode)?,
        contact: row.try_get("contact").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        address: row.try_get("address").map_err(decode)?,
        website: row.try_get("website").map_err(decode)?,
        status: status
            .parse::<SupplierStatus>()
            .map_err(|e| RepositoryError::storage(e.to_string()))?,
        payment_terms: terms
            .parse::<PaymentTerms>()
            .map_err(|e| RepositoryError::storage(e.to_string()))?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(decode)?,
    })
}

// -------------------------------------------------------------- helpers

fn record_id(row: &sqlx::postgres::PgRow, column: &str) -> RepoResult<RecordId> {
    let raw: String = row
        .try_get(column)
        .map_err(|e| map_sqlx_error("decode_id", e))?;
    RecordId::try_from(raw.trim().to_string())
        .map_err(|e| RepositoryError::storage(format!("bad {column} in row: {e}")))
}

/// Like [`map_sqlx_error`], but a unique violation reports the offending name.
fn map_write_error(operation: &str, name: &str, err: sqlx::Error) -> RepositoryError {
    if is_unique_violation(&err) {
        return RepositoryError::duplicate("name", name);
    }
    map_sqlx_error(operation, err)
}

/// Map SQLx errors to RepositoryError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        // Name conflicts only surface through `map_write_error`.
        sqlx::Error::Database(db_err) => RepositoryError::storage(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            RepositoryError::storage(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            RepositoryError::storage(format!("connection pool timed out in {}", operation))
        }
        _ => RepositoryError::storage(format!("sqlx error in {}: {}", operation, err)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::DatabaseError;

    #[test]
    fn non_database_errors_become_storage() {
        let err = map_sqlx_error("find_item", sqlx::Error::PoolClosed);
        assert_eq!(
            err,
            RepositoryError::storage("connection pool closed in find_item")
        );
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[derive(Debug)]
    struct UniqueViolation;

    impl std::fmt::Display for UniqueViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.message())
        }
    }

    impl std::error::Error for UniqueViolation {}

    impl sqlx::error::DatabaseError for UniqueViolation {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"items_name_key\""
        }

        fn code(&self) -> Option<std::borrow::Cow<'_, str>> {
            Some(std::borrow::Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    fn unique_violation() -> sqlx::Error {
        sqlx::Error::Database(Box::new(UniqueViolation))
    }

    #[test]
    fn unique_violation_on_write_names_the_record() {
        let err = map_write_error("insert_item", "Laptop", unique_violation());
        assert_eq!(err, RepositoryError::duplicate("name", "Laptop"));
    }

    #[test]
    fn unique_violation_outside_writes_is_storage() {
        let err = map_sqlx_error("find_items", unique_violation());
        assert_eq!(
            err,
            RepositoryError::storage(
                "database error in find_items: duplicate key value violates unique constraint \"items_name_key\""
            )
        );
    }

    #[test]
    fn write_errors_without_unique_violation_stay_storage() {
        let err = map_write_error("insert_item", "Laptop", sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepositoryError::Storage(_)));
    }

    #[test]
    fn schema_creates_both_tables() {
        let joined = SCHEMA.join("\n");
        assert!(joined.contains("CREATE TABLE IF NOT EXISTS suppliers"));
        assert!(joined.contains("CREATE TABLE IF NOT EXISTS items"));
        assert!(!joined.contains("REFERENCES"));
    }
}
