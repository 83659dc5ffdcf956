use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    DomainError, Entity, EntityKind, FieldKind, FieldRule, Mode, Payload, RecordId, decode,
    validate_with,
};

pub const NAME_MAX_LEN: usize = 100;
pub const CONTACT_MAX_LEN: usize = 100;
pub const ADDRESS_MAX_LEN: usize = 200;

/// Supplier status. Caller-set data, not a managed lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SupplierStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl SupplierStatus {
    pub const NAMES: &'static [&'static str] = &["Active", "Inactive", "Pending"];

    pub fn as_str(self) -> &'static str {
        match self {
            SupplierStatus::Active => "Active",
            SupplierStatus::Inactive => "Inactive",
            SupplierStatus::Pending => "Pending",
        }
    }
}

impl core::str::FromStr for SupplierStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(SupplierStatus::Active),
            "Inactive" => Ok(SupplierStatus::Inactive),
            "Pending" => Ok(SupplierStatus::Pending),
            other => Err(DomainError::invalid(
                "status",
                format!("unknown supplier status '{other}'"),
            )),
        }
    }
}

/// Agreed payment terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentTerms {
    #[default]
    #[serde(rename = "Net 30")]
    Net30,
    #[serde(rename = "Net 60")]
    Net60,
    #[serde(rename = "COD")]
    Cod,
    Advance,
}

impl PaymentTerms {
    pub const NAMES: &'static [&'static str] = &["Net 30", "Net 60", "COD", "Advance"];

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentTerms::Net30 => "Net 30",
            PaymentTerms::Net60 => "Net 60",
            PaymentTerms::Cod => "COD",
            PaymentTerms::Advance => "Advance",
        }
    }
}

impl core::str::FromStr for PaymentTerms {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Net 30" => Ok(PaymentTerms::Net30),
            "Net 60" => Ok(PaymentTerms::Net60),
            "COD" => Ok(PaymentTerms::Cod),
            "Advance" => Ok(PaymentTerms::Advance),
            other => Err(DomainError::invalid(
                "paymentTerms",
                format!("unknown payment terms '{other}'"),
            )),
        }
    }
}

/// Field rules for supplier payloads.
pub const SUPPLIER_RULES: &[FieldRule] = &[
    FieldRule::required(
        "name",
        FieldKind::Text {
            max: NAME_MAX_LEN,
            non_empty: true,
        },
    ),
    FieldRule::optional(
        "contact",
        FieldKind::Text {
            max: CONTACT_MAX_LEN,
            non_empty: false,
        },
    ),
    FieldRule::optional("phone", FieldKind::Phone),
    FieldRule::optional("email", FieldKind::Email),
    FieldRule::optional(
        "address",
        FieldKind::Text {
            max: ADDRESS_MAX_LEN,
            non_empty: false,
        },
    ),
    FieldRule::optional("website", FieldKind::Url),
    FieldRule::optional("status", FieldKind::OneOf(SupplierStatus::NAMES)),
    FieldRule::optional("paymentTerms", FieldKind::OneOf(PaymentTerms::NAMES)),
];

/// Validate a supplier payload.
pub fn validate_supplier(payload: &Payload, mode: Mode) -> Result<Payload, DomainError> {
    Ok(validate_with(SUPPLIER_RULES, payload, mode)?)
}

/// A vendor that supplies items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: RecordId,
    pub name: String,
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub status: SupplierStatus,
    pub payment_terms: PaymentTerms,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Supplier {
    const KIND: EntityKind = EntityKind::Supplier;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

/// Input for creating (or fully replacing) a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub status: SupplierStatus,
    #[serde(default)]
    pub payment_terms: PaymentTerms,
}

impl NewSupplier {
    /// Validate a full payload and decode it.
    pub fn from_payload(payload: &Payload) -> Result<Self, DomainError> {
        let normalized = validate_supplier(payload, Mode::Full)?;
        Ok(decode(normalized)?)
    }

    pub fn into_supplier(self, id: RecordId, now: DateTime<Utc>) -> Supplier {
        Supplier {
            id,
            name: self.name,
            contact: non_empty(self.contact),
            phone: non_empty(self.phone),
            email: non_empty(self.email),
            address: non_empty(self.address),
            website: non_empty(self.website),
            status: self.status,
            payment_terms: self.payment_terms,
            created_at: now,
            updated_at: now,
        }
    }

    /// Express a full replacement as a patch that touches every field.
    ///
    /// Omitted optional fields are cleared and enums reset to their defaults.
    pub fn into_patch(self) -> SupplierPatch {
        SupplierPatch {
            name: Some(self.name),
            contact: Some(self.contact.unwrap_or_default()),
            phone: Some(self.phone.unwrap_or_default()),
            email: Some(self.email.unwrap_or_default()),
            address: Some(self.address.unwrap_or_default()),
            website: Some(self.website.unwrap_or_default()),
            status: Some(self.status),
            payment_terms: Some(self.payment_terms),
        }
    }
}

/// Partial update of a supplier. `None` leaves the field unchanged; an empty
/// string clears an optional field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub status: Option<SupplierStatus>,
    #[serde(default)]
    pub payment_terms: Option<PaymentTerms>,
}

impl SupplierPatch {
    /// Validate a partial payload and decode it.
    pub fn from_payload(payload: &Payload) -> Result<Self, DomainError> {
        let normalized = validate_supplier(payload, Mode::Partial)?;
        Ok(decode(normalized)?)
    }

    /// Apply the patch in place and refresh `updated_at`.
    pub fn apply(self, supplier: &mut Supplier, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            supplier.name = name;
        }
        replace_optional(&mut supplier.contact, self.contact);
        replace_optional(&mut supplier.phone, self.phone);
        replace_optional(&mut supplier.email, self.email);
        replace_optional(&mut supplier.address, self.address);
        replace_optional(&mut supplier.website, self.website);
        if let Some(status) = self.status {
            supplier.status = status;
        }
        if let Some(terms) = self.payment_terms {
            supplier.payment_terms = terms;
        }
        supplier.updated_at = now;
    }
}

fn replace_optional(slot: &mut Option<String>, update: Option<String>) {
    if let Some(value) = update {
        *slot = non_empty(Some(value));
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn payload(v: Value) -> Payload {
        match v {
            Value::Object(m) => m,
            _ => panic!("test payload must be an object"),
        }
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
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
    fn name_only_supplier_gets_defaults() {
        let new = NewSupplier::from_payload(&payload(json!({ "name": " Acme " }))).unwrap();
        assert_eq!(new.name, "Acme");
        assert_eq!(new.status, SupplierStatus::Active);
        assert_eq!(new.payment_terms, PaymentTerms::Net30);
    }

    #[test]
    fn full_mode_requires_name() {
        let err = NewSupplier::from_payload(&payload(json!({ "contact": "Jo" }))).unwrap_err();
        assert_eq!(validation_fields(err), vec!["name"]);
    }

    #[test]
    fn validates_contact_formats() {
        let new = NewSupplier::from_payload(&payload(json!({
            "name": "Acme",
            "contact": "Jo Bloggs",
            "phone": "+4420794601",
            "email": "Sales@Acme.Example",
            "address": "1 Main St",
            "website": "https://acme.example",
            "status": "Pending",
            "paymentTerms": "COD",
        })))
        .unwrap();
        assert_eq!(new.email.as_deref(), Some("sales@acme.example"));
        assert_eq!(new.status, SupplierStatus::Pending);
        assert_eq!(new.payment_terms, PaymentTerms::Cod);
    }

    #[test]
    fn reports_every_bad_field() {
        let err = NewSupplier::from_payload(&payload(json!({
            "name": "",
            "contact": "c".repeat(101),
            "phone": "+1 555 0100",
            "email": "not-an-email",
            "address": "a".repeat(201),
            "website": "acme.example",
            "status": "Retired",
            "paymentTerms": "Net 90",
        })))
        .unwrap_err();
        assert_eq!(
            validation_fields(err),
            vec!["name", "contact", "phone", "email", "address", "website", "status", "paymentTerms"]
        );
    }

    #[test]
    fn unknown_status_and_terms_are_validation_errors() {
        let err = "Sleeping".parse::<SupplierStatus>().unwrap_err();
        assert_eq!(validation_fields(err), vec!["status"]);
        let err = "Net 90".parse::<PaymentTerms>().unwrap_err();
        assert_eq!(validation_fields(err), vec!["paymentTerms"]);
        assert_eq!("COD".parse::<PaymentTerms>(), Ok(PaymentTerms::Cod));
    }

    #[test]
    fn phone_allows_up_to_sixteen_digits() {
        let ok = payload(json!({ "phone": "1234567890123456" }));
        assert!(SupplierPatch::from_payload(&ok).is_ok());
        let too_long = payload(json!({ "phone": "+12345678901234567" }));
        assert!(SupplierPatch::from_payload(&too_long).is_err());
        let arabic_indic = payload(json!({ "phone": "+\u{0661}\u{0662}\u{0663}\u{0664}\u{0665}\u{0666}" }));
        assert!(SupplierPatch::from_payload(&arabic_indic).is_err());
    }

    #[test]
    fn patch_can_clear_optional_fields() {
        let mut supplier = NewSupplier {
            name: "Acme".into(),
            phone: Some("5550100".into()),
            email: Some("a@b.co".into()),
            ..NewSupplier::default()
        }
        .into_supplier(RecordId::new(), test_time());

        let patch =
            SupplierPatch::from_payload(&payload(json!({ "phone": "", "status": "Inactive" })))
                .unwrap();
        patch.apply(&mut supplier, test_time());

        assert_eq!(supplier.phone, None);
        assert_eq!(supplier.email.as_deref(), Some("a@b.co"));
        assert_eq!(supplier.status, SupplierStatus::Inactive);
    }

    #[test]
    fn replacement_resets_omitted_fields() {
        let mut supplier = NewSupplier {
            name: "Acme".into(),
            contact: Some("Jo".into()),
            payment_terms: PaymentTerms::Advance,
            ..NewSupplier::default()
        }
        .into_supplier(RecordId::new(), test_time());

        NewSupplier {
            name: "Acme Ltd".into(),
            ..NewSupplier::default()
        }
        .into_patch()
        .apply(&mut supplier, test_time());

        assert_eq!(supplier.name, "Acme Ltd");
        assert_eq!(supplier.contact, None);
        assert_eq!(supplier.payment_terms, PaymentTerms::Net30);
    }

    #[test]
    fn supplier_serializes_to_camel_case_record_shape() {
        let supplier = NewSupplier {
            name: "Acme".into(),
            ..NewSupplier::default()
        }
        .into_supplier(RecordId::new(), test_time());
        let v = serde_json::to_value(&supplier).unwrap();
        assert_eq!(v["paymentTerms"], json!("Net 30"));
        assert_eq!(v["status"], json!("Active"));
        assert!(v.get("createdAt").is_some());
        assert!(v.get("website").is_some());
    }
}
