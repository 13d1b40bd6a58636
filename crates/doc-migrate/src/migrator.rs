//! The migrator: imports raw documents of any known version into the
//! current record type and exports records stamped with the latest version.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use tracing::{debug, trace};

use crate::chain::MigrationChain;
use crate::codec::{Codec, Record};
use crate::error::{MigrateError, Result};
use crate::step::MigrationStep;

/// The label used when none is configured.
const DEFAULT_LABEL: &str = "default";

/// Imports raw documents into `T` and exports `T` back, for one codec.
///
/// A migrator owns its [`MigrationChain`] and never changes after
/// construction, so it can be shared freely between threads. `T` is the
/// record type of the latest schema version: the only type `import` decodes
/// into and `export` encodes from.
///
/// # Example
///
/// ```
/// # #[cfg(feature = "bson")] {
/// use bson::doc;
/// use doc_migrate::{bson::BsonMigrator, MigrateError, MigrationStep};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct SensorV1 { celsius: f64 }
///
/// #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
/// struct SensorV2 { celsius: f64, humidity: Option<f64> }
///
/// let migrator: BsonMigrator<SensorV2> = BsonMigrator::builder()
///     .step(MigrationStep::typed("add_humidity", |old: SensorV1| {
///         Ok::<_, MigrateError>(SensorV2 { celsius: old.celsius, humidity: None })
///     }))
///     .build();
///
/// let stored = doc! { "celsius": 21.5, "__schema_version": 1 };
/// let sensor = migrator.import(&stored).unwrap();
/// assert_eq!(sensor, SensorV2 { celsius: 21.5, humidity: None });
///
/// let exported = migrator.export(&sensor).unwrap();
/// assert_eq!(exported.get_i32("__schema_version").unwrap(), 2);
/// # }
/// ```
pub struct Migrator<T, C: Codec> {
    chain: MigrationChain<C>,
    label: Cow<'static, str>,
    _record: PhantomData<fn() -> T>,
}

/// Builder for constructing a [`Migrator`] step by step.
pub struct MigratorBuilder<T, C: Codec> {
    chain: MigrationChain<C>,
    label: Cow<'static, str>,
    _record: PhantomData<fn() -> T>,
}

impl<T, C: Codec> MigratorBuilder<T, C> {
    /// Set the label reported in diagnostics, typically the collection or
    /// record name.
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Append a migration step.
    pub fn step(mut self, step: MigrationStep<C>) -> Self {
        self.chain.push(step);
        self
    }

    /// Append several migration steps, in order.
    pub fn steps(mut self, steps: impl IntoIterator<Item = MigrationStep<C>>) -> Self {
        self.chain.extend(steps);
        self
    }

    /// Build the migrator. The chain is fixed from here on.
    pub fn build(self) -> Migrator<T, C> {
        Migrator {
            chain: self.chain,
            label: self.label,
            _record: PhantomData,
        }
    }
}

impl<T, C: Codec> Migrator<T, C> {
    /// Create a migrator over `chain`.
    pub fn new(chain: MigrationChain<C>) -> Self {
        Self {
            chain,
            label: Cow::Borrowed(DEFAULT_LABEL),
            _record: PhantomData,
        }
    }

    /// Create a builder for a migrator with a label and steps.
    pub fn builder() -> MigratorBuilder<T, C> {
        MigratorBuilder {
            chain: MigrationChain::new(),
            label: Cow::Borrowed(DEFAULT_LABEL),
            _record: PhantomData,
        }
    }

    /// The latest schema version: number of steps plus one.
    pub fn last_version(&self) -> u32 {
        self.chain.last_version()
    }

    /// The migration chain.
    pub fn chain(&self) -> &MigrationChain<C> {
        &self.chain
    }

    /// The diagnostic label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Read the schema version stamped on a raw document.
    ///
    /// Fails with [`MigrateError::NoVersion`] if the version field is absent
    /// and [`MigrateError::InvalidVersionFormat`] if it is not an integer.
    /// The returned version is not range-checked.
    pub fn detect_version(&self, raw: &C::Raw) -> Result<i64> {
        C::read_version(raw)?
            .ok_or(MigrateError::NoVersion { codec: C::NAME })?
            .resolve()
    }

    /// The steps a document at `version` still has to go through.
    ///
    /// Fails with [`MigrateError::VersionNotFound`] unless
    /// `1 <= version <= last_version()`.
    pub fn steps_from(&self, version: i64) -> Result<&[MigrationStep<C>]> {
        self.chain
            .from_version(version)
            .ok_or_else(|| MigrateError::VersionNotFound {
                version,
                latest: self.last_version(),
            })
    }

    /// Number of steps `import` would run on this document.
    pub fn pending_steps(&self, raw: &C::Raw) -> Result<usize> {
        let version = self.detect_version(raw)?;
        Ok(self.steps_from(version)?.len())
    }

    /// Check if a document is older than the latest version.
    pub fn needs_migration(&self, raw: &C::Raw) -> Result<bool> {
        Ok(self.pending_steps(raw)? > 0)
    }
}

impl<T: Record, C: Codec> Migrator<T, C> {
    /// Import a raw document of any known version as a `T`.
    ///
    /// Runs the steps from the document's version to the latest, in order,
    /// then decodes the result, zero-filling fields the document lacks from
    /// `T::default()`. A document already at the latest version is decoded
    /// directly. The first failing step aborts the import with
    /// [`MigrateError::RunningMigration`]; its `index` counts from the first
    /// step that ran for this document.
    pub fn import(&self, raw: &C::Raw) -> Result<T> {
        let version = self.detect_version(raw)?;
        let steps = self.steps_from(version)?;

        debug!(
            codec = C::NAME,
            migrator = %self.label,
            version,
            latest = self.last_version(),
            pending = steps.len(),
            "importing document"
        );

        let mut migrated: Option<C::Raw> = None;
        for (index, step) in steps.iter().enumerate() {
            let input = migrated.as_ref().unwrap_or(raw);
            trace!(codec = C::NAME, index, step = step.name(), "applying migration step");
            let output = step
                .apply(input)
                .map_err(|source| MigrateError::RunningMigration {
                    index,
                    step: step.name().to_owned(),
                    source: Box::new(source),
                })?;
            migrated = Some(output);
        }

        C::decode(migrated.as_ref().unwrap_or(raw))
    }
}

impl<T: Serialize, C: Codec> Migrator<T, C> {
    /// Export a record as a raw document stamped with [`last_version`].
    ///
    /// `entity` is assumed to already be in the latest schema shape. It must
    /// serialize to a map; anything else fails with
    /// [`MigrateError::EncodeFailure`].
    ///
    /// [`last_version`]: Self::last_version
    pub fn export(&self, entity: &T) -> Result<C::Raw> {
        let raw = C::encode(entity)?;
        trace!(
            codec = C::NAME,
            migrator = %self.label,
            version = self.last_version(),
            "exporting document"
        );
        C::inject_version(raw, self.last_version())
    }
}

impl<T, C: Codec> From<MigrationChain<C>> for Migrator<T, C> {
    fn from(chain: MigrationChain<C>) -> Self {
        Self::new(chain)
    }
}

impl<T, C: Codec> fmt::Debug for Migrator<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrator")
            .field("codec", &C::NAME)
            .field("label", &self.label)
            .field("last_version", &self.last_version())
            .field("chain", &self.chain)
            .finish()
    }
}
