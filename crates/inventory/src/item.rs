use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    DomainError, Entity, EntityKind, FieldKind, FieldRule, Mode, Payload, RecordId, decode,
    validate_with,
};

use crate::report::StockRecord;

pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 500;
/// Upper bound on a single item's stock level.
pub const STOCK_MAX: i64 = 1_000_000_000;

/// Product category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Electronics,
    Clothing,
    Food,
    Books,
    #[default]
    General,
    #[serde(rename = "Office Supplies")]
    OfficeSupplies,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Electronics,
        Category::Clothing,
        Category::Food,
        Category::Books,
        Category::General,
        Category::OfficeSupplies,
    ];

    /// Wire names, in declaration order.
    pub const NAMES: &'static [&'static str] = &[
        "Electronics",
        "Clothing",
        "Food",
        "Books",
        "General",
        "Office Supplies",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::Food => "Food",
            Category::Books => "Books",
            Category::General => "General",
            Category::OfficeSupplies => "Office Supplies",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                DomainError::invalid(
                    "category",
                    format!("category must be one of: {}", Category::NAMES.join(", ")),
                )
            })
    }
}

/// Field rules for item payloads.
pub const ITEM_RULES: &[FieldRule] = &[
    FieldRule::required(
        "name",
        FieldKind::Text {
            max: NAME_MAX_LEN,
            non_empty: true,
        },
    ),
    FieldRule::required("category", FieldKind::OneOf(Category::NAMES)),
    FieldRule::required(
        "stock",
        FieldKind::Integer {
            min: 0,
            max: STOCK_MAX,
        },
    ),
    FieldRule::required("price", FieldKind::Number { min: 0.0 }),
    FieldRule::required("supplier", FieldKind::Identifier),
    FieldRule::optional(
        "description",
        FieldKind::Text {
            max: DESCRIPTION_MAX_LEN,
            non_empty: false,
        },
    ),
];

/// Validate an item payload.
pub fn validate_item(payload: &Payload, mode: Mode) -> Result<Payload, DomainError> {
    Ok(validate_with(ITEM_RULES, payload, mode)?)
}

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: RecordId,
    pub name: String,
    pub category: Category,
    pub stock: i64,
    pub price: f64,
    pub supplier: RecordId,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Stock × price.
    pub fn value(&self) -> f64 {
        self.stock as f64 * self.price
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= crate::report::LOW_STOCK_THRESHOLD
    }
}

impl Entity for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl StockRecord for Item {
    fn record_id(&self) -> &RecordId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> &str {
        self.category.as_str()
    }

    fn stock(&self) -> Option<i64> {
        Some(self.stock)
    }

    fn price(&self) -> Option<f64> {
        Some(self.price)
    }
}

/// Input for creating (or fully replacing) an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub price: f64,
    pub supplier: RecordId,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewItem {
    /// Validate a full payload and decode it.
    pub fn from_payload(payload: &Payload) -> Result<Self, DomainError> {
        let normalized = validate_item(payload, Mode::Full)?;
        Ok(decode(normalized)?)
    }

    pub fn into_item(self, id: RecordId, now: DateTime<Utc>) -> Item {
        Item {
            id,
            name: self.name,
            category: self.category,
            stock: self.stock,
            price: self.price,
            supplier: self.supplier,
            description: self.description.filter(|d| !d.is_empty()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Express a full replacement as a patch that touches every field.
    pub fn into_patch(self) -> ItemPatch {
        ItemPatch {
            name: Some(self.name),
            category: Some(self.category),
            stock: Some(self.stock),
            price: Some(self.price),
            supplier: Some(self.supplier),
            description: Some(self.description.unwrap_or_default()),
        }
    }
}

/// Partial update of an item. `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub supplier: Option<RecordId>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ItemPatch {
    /// Validate a partial payload and decode it.
    pub fn from_payload(payload: &Payload) -> Result<Self, DomainError> {
        let normalized = validate_item(payload, Mode::Partial)?;
        Ok(decode(normalized)?)
    }

    /// Apply the patch in place and refresh `updated_at`.
    pub fn apply(self, item: &mut Item, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(stock) = self.stock {
            item.stock = stock;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(supplier) = self.supplier {
            item.supplier = supplier;
        }
        if let Some(description) = self.description {
            item.description = if description.is_empty() {
                None
            } else {
                Some(description)
            };
        }
        item.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    const SUPPLIER: &str = "507f1f77bcf86cd799439011";

    fn payload(v: Value) -> Payload {
        match v {
            Value::Object(m) => m,
            _ => panic!("test payload must be an object"),
        }
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn full_payload() -> Payload {
        payload(json!({
            "name": "  Laptop  ",
            "category": "Electronics",
            "stock": 12,
            "price": "999.5",
            "supplier": SUPPLIER,
            "description": "14 inch",
        }))
    }

    fn validation_fields(err: DomainError) -> Vec<String> {
        match err {
            DomainError::Validation(errors) => {
                errors.fields().into_iter().map(str::to_string).collect()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn new_item_from_full_payload() {
        let new = NewItem::from_payload(&full_payload()).unwrap();
        assert_eq!(new.name, "Laptop");
        assert_eq!(new.category, Category::Electronics);
        assert_eq!(new.stock, 12);
        assert_eq!(new.price, 999.5);
        assert_eq!(new.supplier.as_str(), SUPPLIER);
        assert_eq!(new.description.as_deref(), Some("14 inch"));
    }

    #[test]
    fn full_mode_requires_every_required_field() {
        for field in ["name", "category", "stock", "price", "supplier"] {
            let mut p = full_payload();
            p.remove(field);
            let err = NewItem::from_payload(&p).unwrap_err();
            assert_eq!(validation_fields(err), vec![field.to_string()]);
        }
    }

    #[test]
    fn description_is_optional() {
        let mut p = full_payload();
        p.remove("description");
        let new = NewItem::from_payload(&p).unwrap();
        assert_eq!(new.description, None);
    }

    #[test]
    fn rejects_out_of_range_values_all_at_once() {
        let p = payload(json!({
            "name": "x".repeat(101),
            "category": "Toys",
            "stock": -1,
            "price": -0.01,
            "supplier": "nope",
            "description": "d".repeat(501),
        }));
        let err = NewItem::from_payload(&p).unwrap_err();
        assert_eq!(
            validation_fields(err),
            vec!["name", "category", "stock", "price", "supplier", "description"]
        );
    }

    #[test]
    fn stock_is_capped() {
        let mut p = full_payload();
        p.insert("stock".into(), json!(STOCK_MAX));
        assert_eq!(NewItem::from_payload(&p).unwrap().stock, STOCK_MAX);

        p.insert("stock".into(), json!(i64::MAX));
        let err = NewItem::from_payload(&p).unwrap_err();
        assert_eq!(validation_fields(err), vec!["stock"]);
    }

    #[test]
    fn unknown_category_name_is_a_validation_error() {
        let err = "Toys".parse::<Category>().unwrap_err();
        assert_eq!(validation_fields(err), vec!["category"]);
        assert_eq!("Office Supplies".parse::<Category>(), Ok(Category::OfficeSupplies));
    }

    #[test]
    fn office_supplies_uses_spaced_wire_name() {
        let mut p = full_payload();
        p.insert("category".into(), json!("Office Supplies"));
        let new = NewItem::from_payload(&p).unwrap();
        assert_eq!(new.category, Category::OfficeSupplies);
        assert_eq!(serde_json::to_value(new.category).unwrap(), json!("Office Supplies"));
    }

    #[test]
    fn decoding_without_validator_fills_defaults() {
        let new: NewItem = serde_json::from_value(json!({
            "name": "Stapler",
            "supplier": SUPPLIER,
        }))
        .unwrap();
        assert_eq!(new.category, Category::General);
        assert_eq!(new.stock, 0);
        assert_eq!(new.price, 0.0);
    }

    #[test]
    fn patch_only_checks_present_fields() {
        let patch = ItemPatch::from_payload(&payload(json!({ "stock": "3" }))).unwrap();
        assert_eq!(patch.stock, Some(3));
        assert_eq!(patch.name, None);

        let err = ItemPatch::from_payload(&payload(json!({ "name": "   " }))).unwrap_err();
        assert_eq!(validation_fields(err), vec!["name"]);
    }

    #[test]
    fn patch_apply_touches_only_present_fields() {
        let created = test_time();
        let mut item = NewItem::from_payload(&full_payload())
            .unwrap()
            .into_item(RecordId::new(), created);

        let later = created + chrono::Duration::minutes(5);
        ItemPatch {
            price: Some(10.0),
            description: Some(String::new()),
            ..ItemPatch::default()
        }
        .apply(&mut item, later);

        assert_eq!(item.name, "Laptop");
        assert_eq!(item.price, 10.0);
        assert_eq!(item.description, None);
        assert_eq!(item.created_at, created);
        assert_eq!(item.updated_at, later);
    }

    #[test]
    fn item_serializes_to_camel_case_record_shape() {
        let item = NewItem::from_payload(&full_payload())
            .unwrap()
            .into_item(RecordId::new(), test_time());
        let v = serde_json::to_value(&item).unwrap();
        for key in [
            "id",
            "name",
            "category",
            "stock",
            "price",
            "supplier",
            "description",
            "createdAt",
            "updatedAt",
        ] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn value_and_low_stock() {
        let mut item = NewItem::from_payload(&full_payload())
            .unwrap()
            .into_item(RecordId::new(), test_time());
        item.stock = 5;
        item.price = 2.5;
        assert_eq!(item.value(), 12.5);
        assert!(item.is_low_stock());
        item.stock = 6;
        assert!(!item.is_low_stock());
    }
}
