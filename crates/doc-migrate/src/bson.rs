//! BSON codec: raw documents are ordered [`bson::Document`]s.
//!
//! The version field is accepted as `Int32`, `Int64`, or an integral
//! `Double`, and written as `Int32` (or `Int64` when it does not fit).

use std::borrow::Cow;

use ::bson::{Bson, Document};
use serde::Serialize;

use crate::codec::{Codec, RawVersion, Record};
use crate::error::{MigrateError, Result};
use crate::migrator::Migrator;
use crate::step::{self, MigrationStep};
use crate::VERSION_FIELD;

/// Codec marker for BSON documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BsonCodec;

/// A migrator reading and writing BSON documents.
pub type BsonMigrator<T> = Migrator<T, BsonCodec>;

/// A migration step over BSON documents.
pub type BsonStep = MigrationStep<BsonCodec>;

impl Codec for BsonCodec {
    type Raw = Document;
    type Fields = Document;

    const NAME: &'static str = "bson";

    fn decode_generic(raw: &Document) -> Result<Cow<'_, Document>> {
        Ok(Cow::Borrowed(raw))
    }

    fn read_version(raw: &Document) -> Result<Option<RawVersion>> {
        let fields = Self::decode_generic(raw)?;
        Ok(fields.get(VERSION_FIELD).map(raw_version))
    }

    fn decode<X: Record>(raw: &Document) -> Result<X> {
        let zero = ::bson::to_bson(&X::default()).map_err(MigrateError::encode_failure)?;
        let document = match zero {
            Bson::Document(mut zero) => {
                overlay(&mut zero, raw);
                zero
            }
            _ => raw.clone(),
        };
        ::bson::from_document(document).map_err(MigrateError::malformed)
    }

    fn encode<X: Serialize + ?Sized>(value: &X) -> Result<Document> {
        ::bson::to_document(value).map_err(MigrateError::encode_failure)
    }

    fn inject_version(mut raw: Document, version: u32) -> Result<Document> {
        let value = i32::try_from(version).map_or(Bson::Int64(i64::from(version)), Bson::Int32);
        raw.insert(VERSION_FIELD, value);
        Ok(raw)
    }
}

/// [`wrap`](crate::wrap) for BSON documents.
pub fn wrap<A, B, E, F>(raw: &Document, transform: F) -> Result<Document>
where
    A: Record,
    B: Serialize,
    E: Into<MigrateError>,
    F: FnOnce(A) -> core::result::Result<B, E>,
{
    step::wrap::<BsonCodec, A, B, E, F>(raw, transform)
}

/// Write `fields` over `zero`, merging documents present on both sides.
fn overlay(zero: &mut Document, fields: &Document) {
    for (key, value) in fields {
        match (zero.get_mut(key), value) {
            (Some(Bson::Document(nested)), Bson::Document(patch)) => overlay(nested, patch),
            _ => {
                zero.insert(key.clone(), value.clone());
            }
        }
    }
}

fn raw_version(value: &Bson) -> RawVersion {
    match value {
        Bson::Int32(version) => RawVersion::Int(i64::from(*version)),
        Bson::Int64(version) => RawVersion::Int(*version),
        Bson::Double(version) => RawVersion::Float(*version),
        other => RawVersion::Other(format!("{:?}", other.element_type()).to_lowercase()),
    }
}
