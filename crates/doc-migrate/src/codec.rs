use std::borrow::Cow;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{MigrateError, Result};

/// A record type the engine can decode into.
///
/// `Default` supplies the zero value of every field a stored document does
/// not carry; `Serialize` turns that zero value into a field map the
/// document is overlaid on.
pub trait Record: Serialize + DeserializeOwned + Default {}

impl<T: Serialize + DeserializeOwned + Default> Record for T {}

/// Encoding-specific primitives the migration engine is built on.
///
/// One implementation exists per supported encoding. Codecs are stateless:
/// every method is an associated function, and the implementing type is only
/// a marker used to pick the encoding at the type level.
pub trait Codec: 'static {
    /// The serialized document exchanged with storage.
    type Raw;
    /// Generic field map produced by [`Codec::decode_generic`].
    type Fields: Clone;

    /// Short encoding name used in diagnostics.
    const NAME: &'static str;

    /// Lenient decode into the encoding's generic field map.
    ///
    /// Used to peek at field values without committing to a record shape.
    /// Encodings whose raw form already is a field map borrow it.
    /// Fails with [`MigrateError::Malformed`] if the document is not a map.
    fn decode_generic(raw: &Self::Raw) -> Result<Cow<'_, Self::Fields>>;

    /// Read the [`VERSION_FIELD`](crate::VERSION_FIELD) of a document in its
    /// encoding-native numeric form. `None` if the field is absent.
    fn read_version(raw: &Self::Raw) -> Result<Option<RawVersion>>;

    /// Decode a document into the record type `X`.
    ///
    /// Unknown fields are ignored. Fields the document lacks take their
    /// value from `X::default()`, nested maps included. Type mismatches fail
    /// with [`MigrateError::Malformed`].
    fn decode<X: Record>(raw: &Self::Raw) -> Result<X>;

    /// Encode a record value. Fails with [`MigrateError::EncodeFailure`].
    fn encode<X: Serialize + ?Sized>(value: &X) -> Result<Self::Raw>;

    /// Set the version field of an encoded document, adding it if absent and
    /// overwriting it in place if present. The document must be a map;
    /// anything else fails with [`MigrateError::EncodeFailure`].
    fn inject_version(raw: Self::Raw, version: u32) -> Result<Self::Raw>;
}

/// A version field value as the encoding represents it.
///
/// Encodings disagree on how numbers are stored (JSON has no integer type of
/// its own, BSON has `Int32`, `Int64` and `Double`), so codecs report what
/// they found and [`RawVersion::resolve`] applies one rule for all of them.
#[derive(Debug, Clone, PartialEq)]
pub enum RawVersion {
    /// An integer-native value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// Anything else, described by its type name.
    Other(String),
}

impl RawVersion {
    /// Convert to an integer version.
    ///
    /// Integers pass through unchanged, including negative ones; the range
    /// check belongs to the migrator. Floats are accepted only when finite,
    /// with a zero fractional part, and inside the `i64` range.
    ///
    /// ```
    /// use doc_migrate::RawVersion;
    ///
    /// assert_eq!(RawVersion::Int(2).resolve().unwrap(), 2);
    /// assert_eq!(RawVersion::Float(3.0).resolve().unwrap(), 3);
    /// assert!(RawVersion::Float(3.5).resolve().is_err());
    /// ```
    pub fn resolve(self) -> Result<i64> {
        match self {
            Self::Int(version) => Ok(version),
            Self::Float(value) if is_integral(value) => Ok(value as i64),
            Self::Float(value) => Err(MigrateError::InvalidVersionFormat {
                found: format!("float {value}"),
            }),
            Self::Other(found) => Err(MigrateError::InvalidVersionFormat { found }),
        }
    }
}

// 2^63 is exactly representable, so the upper bound is exclusive.
fn is_integral(value: f64) -> bool {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    value.is_finite() && value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value)
}
