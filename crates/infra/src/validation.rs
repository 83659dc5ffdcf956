//! Kind-dispatched entry point over the per-entity rule tables.

use stockroom_core::{EntityKind, Mode, Payload, ValidationErrors, validate_with};
use stockroom_inventory::ITEM_RULES;
use stockroom_suppliers::SUPPLIER_RULES;

/// Validate and normalise `payload` against the rules for `kind`.
pub fn validate(payload: &Payload, kind: EntityKind, mode: Mode) -> Result<Payload, ValidationErrors> {
    let rules = match kind {
        EntityKind::Item => ITEM_RULES,
        EntityKind::Supplier => SUPPLIER_RULES,
    };
    validate_with(rules, payload, mode)
}
