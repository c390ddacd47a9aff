//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore wraps every value in a single-key object naming its type, for
//! example `{"stringValue": "Acme"}` or `{"integerValue": "42"}`. Records
//! outside this module are plain JSON.
//!
//! Encoding never produces `timestampValue`, `referenceValue`, `bytesValue`
//! or `geoPointValue`: plain JSON cannot tell those apart from strings and
//! objects. Decoding accepts every type. Timestamps, references and bytes
//! come back as strings; geo points come back as
//! `{"latitude": .., "longitude": ..}`.

use serde_json::{Map, Number, Value, json};

use crate::domain::ports::DocumentStoreError;

/// Encode a plain JSON value.
///
/// # Examples
/// ```
/// use ledger_client::outbound::firestore::codec::encode_value;
/// use serde_json::json;
///
/// assert_eq!(encode_value(&json!(42)), json!({"integerValue": "42"}));
/// assert_eq!(
///     encode_value(&json!(["a"])),
///     json!({"arrayValue": {"values": [{"stringValue": "a"}]}})
/// );
/// ```
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({"nullValue": null}),
        Value::Bool(flag) => json!({"booleanValue": flag}),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => json!({"integerValue": integer.to_string()}),
            None => json!({"doubleValue": number}),
        },
        Value::String(text) => json!({"stringValue": text}),
        Value::Array(items) if items.is_empty() => json!({"arrayValue": {}}),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({"arrayValue": {"values": values}})
        }
        Value::Object(fields) if fields.is_empty() => json!({"mapValue": {}}),
        Value::Object(fields) => json!({"mapValue": {"fields": encode_fields(fields)}}),
    }
}

/// Encode every field of a record.
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

/// Decode a typed Firestore value into plain JSON.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Decode`] when the value is not a single-key
/// typed object or its payload does not match the named type.
pub fn decode_value(value: &Value) -> Result<Value, DocumentStoreError> {
    let Value::Object(typed) = value else {
        return Err(DocumentStoreError::decode(format!(
            "expected a typed value object, got {value}"
        )));
    };
    let mut entries = typed.iter();
    let (Some((kind, inner)), None) = (entries.next(), entries.next()) else {
        return Err(DocumentStoreError::decode(
            "typed values must carry exactly one type key",
        ));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| mismatch(kind, inner)),
        "integerValue" => decode_integer(inner).ok_or_else(|| mismatch(kind, inner)),
        "doubleValue" => decode_double(inner).ok_or_else(|| mismatch(kind, inner)),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner
            .as_str()
            .map(|text| Value::String(text.to_owned()))
            .ok_or_else(|| mismatch(kind, inner)),
        "geoPointValue" => decode_geo_point(inner).ok_or_else(|| mismatch(kind, inner)),
        "arrayValue" => decode_array(inner),
        "mapValue" => match inner.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            Some(_) => Err(mismatch(kind, inner)),
        },
        other => Err(DocumentStoreError::decode(format!(
            "unsupported value type `{other}`"
        ))),
    }
}

/// Decode every field of a Firestore document.
///
/// # Errors
///
/// Returns the first field that fails to decode.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, DocumentStoreError> {
    fields
        .iter()
        .map(|(key, value)| {
            decode_value(value)
                .map(|decoded| (key.clone(), decoded))
                .map_err(|error| DocumentStoreError::decode(format!("field `{key}`: {error}")))
        })
        .collect()
}

fn mismatch(kind: &str, inner: &Value) -> DocumentStoreError {
    DocumentStoreError::decode(format!("`{kind}` payload {inner} has the wrong shape"))
}

// Integers travel as decimal strings so they survive 64-bit precision.
fn decode_integer(inner: &Value) -> Option<Value> {
    let integer = match inner {
        Value::String(text) => text.parse::<i64>().ok()?,
        Value::Number(number) => number.as_i64()?,
        _ => return None,
    };
    Some(Value::Number(integer.into()))
}

// NaN and the infinities have no JSON form and decode as null.
fn decode_double(inner: &Value) -> Option<Value> {
    match inner {
        Value::Number(number) => Some(Value::Number(number.clone())),
        Value::String(text) if matches!(text.as_str(), "NaN" | "Infinity" | "-Infinity") => {
            Some(Value::Null)
        }
        _ => None,
    }
}

fn decode_geo_point(inner: &Value) -> Option<Value> {
    let Value::Object(point) = inner else {
        return None;
    };
    let coordinate = |name: &str| -> Option<Number> {
        match point.get(name) {
            None => Some(Number::from(0)),
            Some(Value::Number(number)) => Some(number.clone()),
            Some(_) => None,
        }
    };
    Some(json!({
        "latitude": coordinate("latitude")?,
        "longitude": coordinate("longitude")?,
    }))
}

fn decode_array(inner: &Value) -> Result<Value, DocumentStoreError> {
    match inner.get("values") {
        None => Ok(Value::Array(Vec::new())),
        Some(Value::Array(values)) => values
            .iter()
            .map(decode_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Some(_) => Err(mismatch("arrayValue", inner)),
    }
}
