//! Dictionary form of model entities.
//!
//! Entities derive `serde` and are decoded from a `serde_json::Value`. Nulls
//! count as absent: optional fields fall back to their default, so payloads
//! written by older versions keep loading, and a null required field fails
//! with `MissingField` like a missing one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Conversion to and from the plain nested-map representation.
pub trait DictRepr: Serialize + DeserializeOwned {
    /// Entity name used in decode errors.
    const ENTITY: &'static str;

    /// Serialize into maps, sequences, strings, numbers, booleans and nulls.
    fn to_dict(&self) -> Value {
        // model types only hold strings, numbers, booleans and string-keyed maps
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Rebuild the entity from its dictionary form.
    fn from_dict(value: &Value) -> Result<Self> {
        decode(Self::ENTITY, value)
    }
}

pub(crate) fn decode<T: DeserializeOwned>(entity: &'static str, value: &Value) -> Result<T> {
    serde_json::from_value(without_nulls(value)).map_err(|err| decode_error(entity, err))
}

fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}

/// Map serde's missing-field and unknown-variant failures onto the model's
/// own variants. `Language` is the only enum in the model.
fn decode_error(entity: &'static str, err: serde_json::Error) -> Error {
    let message = err.to_string();
    if let Some(field) = quoted_after(&message, "missing field `") {
        return Error::MissingField(field);
    }
    if let Some(tag) = quoted_after(&message, "unknown variant `") {
        return Error::UnknownLanguage(tag);
    }
    Error::Decode { entity, message }
}

fn quoted_after(message: &str, prefix: &str) -> Option<String> {
    let rest = message.strip_prefix(prefix)?;
    rest.split_once('`').map(|(quoted, _)| quoted.to_string())
}
