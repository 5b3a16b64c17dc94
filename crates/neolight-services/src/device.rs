//! Device fields of a Neolight document.
//!
//! The status document is shared by the update loop (weather and clock
//! fields) and the lamp controller (mode, brightness, LED health, energy).
//! Updates from the controller are cast to each field's type the way a
//! loosely typed client expects: `"40"` is a number, `"false"` a flag, and an
//! explicit `null` clears the field.

use serde_json::{Number, Value};
use thiserror::Error;

use crate::document_store::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Number,
    Flag,
}

impl FieldKind {
    fn describe(self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Number => "a number",
            FieldKind::Flag => "a boolean",
        }
    }
}

/// Known fields of a device document. `name` is the key and never updated.
const DEVICE_FIELDS: &[(&str, FieldKind)] = &[
    ("currentMode", FieldKind::Text),
    ("appControlDuration", FieldKind::Number),
    ("baseBrightness", FieldKind::Number),
    ("motionBrightness", FieldKind::Number),
    ("led1Working", FieldKind::Flag),
    ("led2Working", FieldKind::Flag),
    ("led3Working", FieldKind::Flag),
    ("currentPower", FieldKind::Number),
    ("totalEnergy", FieldKind::Number),
    ("time", FieldKind::Text),
    ("weather", FieldKind::Text),
    ("sunrise", FieldKind::Text),
    ("sunset", FieldKind::Text),
    ("date", FieldKind::Text),
];

#[derive(Debug, Error, PartialEq)]
pub enum DeviceFieldError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Cast to {expected} failed for value {value} at path \"{field}\"")]
    InvalidValue {
        field: String,
        expected: &'static str,
        value: String,
    },
}

/// A validated update of device fields.
///
/// Unknown keys and `name` are dropped; known keys are cast to their type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceDocument {
    fields: Document,
}

impl DeviceDocument {
    /// Validate an arbitrary JSON body against the known fields.
    pub fn from_json(value: Value) -> Result<Self, DeviceFieldError> {
        let Value::Object(body) = value else {
            return Err(DeviceFieldError::NotAnObject);
        };

        let mut fields = Document::new();
        for (key, value) in body {
            let Some(&(_, kind)) = DEVICE_FIELDS.iter().find(|(field, _)| *field == key) else {
                tracing::debug!("Ignoring unknown device field '{}'", key);
                continue;
            };
            let cast = cast(kind, &value).ok_or_else(|| DeviceFieldError::InvalidValue {
                field: key.clone(),
                expected: kind.describe(),
                value: value.to_string(),
            })?;
            fields.insert(key, cast);
        }

        Ok(Self { fields })
    }

    /// Fields present in this update, ready for a `$set` upsert.
    pub fn into_fields(self) -> Document {
        self.fields
    }
}

fn cast(kind: FieldKind, value: &Value) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    match kind {
        FieldKind::Text => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        FieldKind::Number => match value {
            Value::Number(_) => Some(value.clone()),
            Value::Bool(b) => Some(Value::from(u8::from(*b))),
            Value::String(s) => parse_number(s.trim()),
            _ => None,
        },
        FieldKind::Flag => match value {
            Value::Bool(_) => Some(value.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(v) if v == 1.0 => Some(Value::Bool(true)),
                Some(v) if v == 0.0 => Some(Value::Bool(false)),
                _ => None,
            },
            Value::String(s) => match s.trim() {
                "true" | "1" | "yes" => Some(Value::Bool(true)),
                "false" | "0" | "no" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

fn parse_number(s: &str) -> Option<Value> {
    if s.is_empty() {
        return Some(Value::Null);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
