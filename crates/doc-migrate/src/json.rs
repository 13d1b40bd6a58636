//! JSON codec: raw documents are UTF-8 JSON byte buffers.
//!
//! Numbers have no integer type of their own in JSON, so a version written
//! as `2.0` is read as version 2. Field order of exported documents follows
//! the record's field order with the version field appended. Floats are
//! parsed with `float_roundtrip`, so an exported `f64` reads back bit for bit.

use std::borrow::Cow;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::codec::{Codec, RawVersion, Record};
use crate::error::{MigrateError, Result};
use crate::migrator::Migrator;
use crate::step::MigrationStep;
use crate::VERSION_FIELD;

/// Codec marker for JSON byte buffers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec;

/// A migrator reading and writing JSON byte buffers.
pub type JsonMigrator<T> = Migrator<T, JsonCodec>;

/// A migration step over JSON byte buffers.
pub type JsonStep = MigrationStep<JsonCodec>;

impl Codec for JsonCodec {
    type Raw = Vec<u8>;
    type Fields = Map<String, Value>;

    const NAME: &'static str = "json";

    fn decode_generic(raw: &Vec<u8>) -> Result<Cow<'_, Map<String, Value>>> {
        decode_slice(raw).map(Cow::Owned)
    }

    fn read_version(raw: &Vec<u8>) -> Result<Option<RawVersion>> {
        let fields = Self::decode_generic(raw)?;
        Ok(fields.get(VERSION_FIELD).map(raw_version))
    }

    fn decode<X: Record>(raw: &Vec<u8>) -> Result<X> {
        decode_filled(raw)
    }

    fn encode<X: Serialize + ?Sized>(value: &X) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(MigrateError::encode_failure)
    }

    fn inject_version(raw: Vec<u8>, version: u32) -> Result<Vec<u8>> {
        let mut document: Value =
            serde_json::from_slice(&raw).map_err(MigrateError::encode_failure)?;
        let fields = match &mut document {
            Value::Object(fields) => fields,
            other => {
                return Err(MigrateError::encode_failure(format!(
                    "cannot set `{VERSION_FIELD}` on a JSON {}",
                    type_name(other)
                )))
            }
        };
        fields.insert(VERSION_FIELD.to_owned(), Value::from(version));
        serde_json::to_vec(&document).map_err(MigrateError::encode_failure)
    }
}

/// [`wrap`](crate::wrap) for JSON byte slices.
///
/// ```
/// use doc_migrate::{json, MigrateError};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct V1 { name: String }
/// #[derive(Serialize)]
/// struct V2 { name: String, tags: Vec<String> }
///
/// let out = json::wrap(br#"{"name":"x"}"#, |v1: V1| {
///     Ok::<_, MigrateError>(V2 { name: v1.name, tags: Vec::new() })
/// })
/// .unwrap();
/// assert_eq!(out, br#"{"name":"x","tags":[]}"#);
/// ```
pub fn wrap<A, B, E, F>(raw: &[u8], transform: F) -> Result<Vec<u8>>
where
    A: Record,
    B: Serialize,
    E: Into<MigrateError>,
    F: FnOnce(A) -> core::result::Result<B, E>,
{
    let old: A = decode_filled(raw)?;
    let new = transform(old).map_err(Into::into)?;
    JsonCodec::encode(&new)
}

fn decode_slice<X: DeserializeOwned>(raw: &[u8]) -> Result<X> {
    serde_json::from_slice(raw).map_err(MigrateError::malformed)
}

/// Decode `raw` as `X`, taking absent fields from `X::default()`.
fn decode_filled<X: Record>(raw: &[u8]) -> Result<X> {
    let document: Value = decode_slice(raw)?;
    let zero = serde_json::to_value(X::default()).map_err(MigrateError::encode_failure)?;
    let document = match (zero, document) {
        (Value::Object(mut zero), Value::Object(fields)) => {
            overlay(&mut zero, fields);
            Value::Object(zero)
        }
        (_, document) => document,
    };
    serde_json::from_value(document).map_err(MigrateError::malformed)
}

/// Write `fields` over `zero`, merging objects present on both sides.
fn overlay(zero: &mut Map<String, Value>, fields: Map<String, Value>) {
    for (key, value) in fields {
        match value {
            Value::Object(patch) => match zero.get_mut(&key) {
                Some(Value::Object(nested)) => overlay(nested, patch),
                _ => {
                    zero.insert(key, Value::Object(patch));
                }
            },
            value => {
                zero.insert(key, value);
            }
        }
    }
}

fn raw_version(value: &Value) -> RawVersion {
    match value {
        Value::Number(number) => {
            if let Some(version) = number.as_i64() {
                RawVersion::Int(version)
            } else if let Some(version) = number.as_u64() {
                RawVersion::Other(format!("integer {version} out of range"))
            } else {
                RawVersion::Float(number.as_f64().unwrap_or(f64::NAN))
            }
        }
        other => RawVersion::Other(type_name(other).to_owned()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
