//! Table-driven payload validation.
//!
//! One engine serves every record type: each entity publishes a static table of
//! [`FieldRule`]s and [`validate_with`] checks an untyped JSON payload against it.
//!
//! - `Mode::Full` requires every `required` rule to be present.
//! - `Mode::Partial` treats every field as optional but still checks the ones
//!   that are present.
//!
//! Validation is a pure function of the payload and the table. It collects every
//! violation in one pass (one error per field, in table order) and, on success,
//! returns a normalized payload: text trimmed, numbers coerced to their JSON
//! form, unknown fields dropped. Normalizing an already-normalized payload is a
//! no-op.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::id::RecordId;

/// Untyped request payload (field name → JSON value).
pub type Payload = Map<String, Value>;

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9]{1,16}$").unwrap());
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://[^\s/$.?#][^\s]*$").unwrap());

/// Whether all required fields must be present.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Create / replace: required fields must be present.
    Full,
    /// Patch: only present fields are checked.
    Partial,
}

/// How a single field is checked and normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Trimmed string with a maximum length in characters.
    Text { max: usize, non_empty: bool },
    /// Trimmed string that must equal one of the listed values.
    OneOf(&'static [&'static str]),
    /// Whole number within `min..=max`. Accepts integral JSON numbers and numeric strings.
    Integer { min: i64, max: i64 },
    /// Finite number with a lower bound. Accepts JSON numbers and numeric strings.
    Number { min: f64 },
    /// Record identifier (24 hex characters).
    Identifier,
    /// Optional leading `+` followed by 1-16 ASCII digits.
    Phone,
    /// `local@domain.tld`; normalized to lower case.
    Email,
    /// `http://` or `https://` URL.
    Url,
}

/// A rule for one field of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub field: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldRule {
    pub const fn required(field: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            required: true,
            kind,
        }
    }

    pub const fn optional(field: &'static str, kind: FieldKind) -> Self {
        Self {
            field,
            required: false,
            kind,
        }
    }
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Ordered, non-empty list of field-level violations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Field names in reporting order.
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn into_result<T>(self, ok: T) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(ok) } else { Err(self) }
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(value: Vec<FieldError>) -> Self {
        Self(value)
    }
}

impl core::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for e in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{}: {}", e.field, e.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate `payload` against `rules`.
pub fn validate_with(
    rules: &[FieldRule],
    payload: &Payload,
    mode: Mode,
) -> Result<Payload, ValidationErrors> {
    let mut normalized = Payload::new();
    let mut errors = ValidationErrors::new();

    for rule in rules {
        // `null` means "not supplied".
        let value = payload.get(rule.field).filter(|v| !v.is_null());

        let Some(value) = value else {
            if rule.required && mode == Mode::Full {
                errors.push(FieldError::new(rule.field, format!("{} is required", rule.field)));
            }
            continue;
        };

        match check_field(rule, value) {
            Ok(v) => {
                normalized.insert(rule.field.to_string(), v);
            }
            Err(message) => errors.push(FieldError::new(rule.field, message)),
        }
    }

    errors.into_result(normalized)
}

/// Decode a normalized payload into a typed record input.
///
/// Only fails if the payload did not come out of [`validate_with`] with a
/// matching rule table.
pub fn decode<T: serde::de::DeserializeOwned>(payload: Payload) -> Result<T, ValidationErrors> {
    serde_json::from_value(Value::Object(payload))
        .map_err(|e| ValidationErrors::from(vec![FieldError::new("body", e.to_string())]))
}

/// Check one present value and return its normalized form.
fn check_field(rule: &FieldRule, value: &Value) -> Result<Value, String> {
    let field = rule.field;
    match &rule.kind {
        FieldKind::Text { max, non_empty } => {
            let s = expect_str(field, value)?;
            if *non_empty && s.is_empty() {
                return Err(format!("{field} cannot be empty"));
            }
            if s.chars().count() > *max {
                return Err(format!("{field} must be at most {max} characters"));
            }
            Ok(Value::String(s.to_string()))
        }
        FieldKind::OneOf(allowed) => {
            let s = expect_str(field, value)?;
            if allowed.contains(&s) {
                Ok(Value::String(s.to_string()))
            } else {
                Err(format!("{field} must be one of: {}", allowed.join(", ")))
            }
        }
        FieldKind::Integer { min, max } => {
            let n = coerce_integer(value).ok_or_else(|| format!("{field} must be an integer"))?;
            if n < *min {
                return Err(format!("{field} must be at least {min}"));
            }
            if n > *max {
                return Err(format!("{field} must be at most {max}"));
            }
            Ok(Value::Number(Number::from(n)))
        }
        FieldKind::Number { min } => {
            let n = coerce_number(value).ok_or_else(|| format!("{field} must be a number"))?;
            if n < *min {
                return Err(format!("{field} must be at least {min}"));
            }
            Number::from_f64(n)
                .map(Value::Number)
                .ok_or_else(|| format!("{field} must be a number"))
        }
        FieldKind::Identifier => {
            let s = expect_str(field, value)?;
            if !RecordId::is_valid(s) {
                return Err(format!("{field} must be a valid identifier"));
            }
            Ok(Value::String(s.to_ascii_lowercase()))
        }
        FieldKind::Phone => format_field(rule, value, &PHONE_RE, "a valid phone number", false),
        FieldKind::Email => format_field(rule, value, &EMAIL_RE, "a valid email address", true),
        FieldKind::Url => format_field(
            rule,
            value,
            &URL_RE,
            "a valid URL starting with http:// or https://",
            false,
        ),
    }
}

fn format_field(
    rule: &FieldRule,
    value: &Value,
    re: &Regex,
    what: &str,
    lowercase: bool,
) -> Result<Value, String> {
    let field = rule.field;
    let s = expect_str(field, value)?;
    // An empty optional value is how callers clear the field.
    if s.is_empty() && !rule.required {
        return Ok(Value::String(String::new()));
    }
    if !re.is_match(s) {
        return Err(format!("{field} must be {what}"));
    }
    let s = if lowercase { s.to_lowercase() } else { s.to_string() };
    Ok(Value::String(s))
}

fn expect_str<'a>(field: &str, value: &'a Value) -> Result<&'a str, String> {
    value
        .as_str()
        .map(str::trim)
        .ok_or_else(|| format!("{field} must be a string"))
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i)
            } else {
                // u64 beyond i64::MAX, or a float.
                let f = n.as_f64()?;
                if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Some(f as i64)
                } else {
                    None
                }
            }
        }
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}
