//! `stockroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error model and the table-driven validation engine.

pub mod entity;
pub mod error;
pub mod id;
pub mod validation;

pub use entity::{Entity, EntityKind};
pub use error::{DomainError, DomainResult, ReferentialError};
pub use id::{RecordId, parse_id};
pub use validation::{
    FieldError, FieldKind, FieldRule, Mode, Payload, ValidationErrors, decode, validate_with,
};
