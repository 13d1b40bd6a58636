//! # doc-migrate
//!
//! Lazy schema migrations for versioned serialized documents.
//!
//! Stored documents carry an integer schema version in a reserved field.
//! When a document is read, `doc-migrate` upgrades it to the current record
//! shape one version at a time. There is no one-shot migration of the whole
//! corpus and no downtime.
//!
//! ## How It Works
//!
//! 1. Every exported document is stamped with [`VERSION_FIELD`].
//! 2. On import, the stamped version is read back from the raw document.
//! 3. The migration chain is sliced from that version onward and each
//!    step runs in order, raw document in, raw document out.
//! 4. The fully migrated document is decoded into the current record type.
//!
//! ## Key Concepts
//!
//! - **Lazy migration**: Data is migrated on read, not eagerly.
//! - **Linear chain**: Step `i` migrates version `i + 1` to `i + 2`; the
//!   latest version is always `chain.len() + 1`.
//! - **Typed steps**: A step is written as a plain `A -> B` function between
//!   two record types and lifted into a raw-to-raw step by
//!   [`MigrationStep::typed`].
//! - **Zero-filled decode**: Fields an old document never had take their
//!   value from the record's `Default`, so records are plain
//!   `#[derive(Default, Serialize, Deserialize)]` types (see [`Record`]).
//! - **Pluggable encodings**: The engine is generic over a [`Codec`];
//!   JSON ([`json::JsonCodec`]) and BSON ([`bson::BsonCodec`]) ship with the
//!   crate.
//!
//! ## Example
//!
//! ```
//! # #[cfg(feature = "json")] {
//! use doc_migrate::{json::JsonMigrator, MigrateError, MigrationStep};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct UserV1 { first: String, last: String }
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct UserV2 { name: String }
//!
//! fn join_names(old: UserV1) -> Result<UserV2, MigrateError> {
//!     Ok(UserV2 { name: format!("{} {}", old.first, old.last) })
//! }
//!
//! let migrator: JsonMigrator<UserV2> = JsonMigrator::builder()
//!     .label("users")
//!     .step(MigrationStep::typed("join_names", join_names))
//!     .build();
//!
//! let stored = br#"{"first":"Ada","last":"Lovelace","__schema_version":1}"#.to_vec();
//! let user = migrator.import(&stored).unwrap();
//! assert_eq!(user.name, "Ada Lovelace");
//!
//! let exported = migrator.export(&user).unwrap();
//! assert_eq!(exported, br#"{"name":"Ada Lovelace","__schema_version":2}"#);
//! # }
//! ```

mod chain;
mod codec;
mod error;
mod migrator;
mod step;

#[cfg(feature = "bson")]
pub mod bson;
#[cfg(feature = "json")]
pub mod json;

pub use chain::MigrationChain;
pub use codec::{Codec, RawVersion, Record};
pub use error::{BoxError, ErrorKind, MigrateError, Result};
pub use migrator::{Migrator, MigratorBuilder};
pub use step::{wrap, MigrationStep};

// Re-export proc macros when the `macros` feature is enabled.
#[cfg(feature = "macros")]
pub use doc_migrate_macros::migration;

/// Reserved field holding the schema version of a serialized document.
///
/// Shared by every codec. [`Migrator::export`] always writes it and
/// [`Migrator::import`] refuses documents without it.
pub const VERSION_FIELD: &str = "__schema_version";
