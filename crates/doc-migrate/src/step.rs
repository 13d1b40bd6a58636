use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::codec::{Codec, Record};
use crate::error::{MigrateError, Result};

type StepFn<C> = dyn Fn(&<C as Codec>::Raw) -> Result<<C as Codec>::Raw> + Send + Sync;

/// Decode `raw` as `A`, run `transform`, and encode the resulting `B`.
///
/// This is how a typed transform between two record shapes becomes a
/// raw-to-raw migration. Fields `raw` lacks are zero-filled from
/// `A::default()` (see [`Codec::decode`]). Decode failures surface as
/// [`MigrateError::Malformed`], encode failures as
/// [`MigrateError::EncodeFailure`]. The transform's own error is converted
/// with `Into` and nothing else, so a [`MigrateError`] returned by the
/// transform reaches the caller unchanged.
pub fn wrap<C, A, B, E, F>(raw: &C::Raw, transform: F) -> Result<C::Raw>
where
    C: Codec,
    A: Record,
    B: Serialize,
    E: Into<MigrateError>,
    F: FnOnce(A) -> core::result::Result<B, E>,
{
    let old: A = C::decode(raw)?;
    let new = transform(old).map_err(Into::into)?;
    C::encode(&new)
}

/// A single migration step: raw document at version N in, raw document at
/// version N + 1 out.
///
/// Steps must be **deterministic and pure**. A chain is shared by every
/// import running on a migrator, possibly from several threads at once.
pub struct MigrationStep<C: Codec> {
    name: Cow<'static, str>,
    run: Box<StepFn<C>>,
}

impl<C: Codec> MigrationStep<C> {
    /// Build a step from a typed transform `A -> B`.
    ///
    /// ```
    /// # #[cfg(feature = "json")] {
    /// use doc_migrate::{json::JsonCodec, MigrateError, MigrationStep};
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Default, Serialize, Deserialize)]
    /// struct Celsius { temp: f64 }
    /// #[derive(Serialize)]
    /// struct Kelvin { temp: f64 }
    ///
    /// let step: MigrationStep<JsonCodec> = MigrationStep::typed("to_kelvin", |c: Celsius| {
    ///     Ok::<_, MigrateError>(Kelvin { temp: c.temp + 273.0 })
    /// });
    ///
    /// let out = step.apply(&br#"{"temp":20.0}"#.to_vec()).unwrap();
    /// assert_eq!(out, br#"{"temp":293.0}"#);
    /// # }
    /// ```
    pub fn typed<A, B, E, F>(name: impl Into<Cow<'static, str>>, transform: F) -> Self
    where
        A: Record,
        B: Serialize,
        E: Into<MigrateError>,
        F: Fn(A) -> core::result::Result<B, E> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(move |raw: &C::Raw| wrap::<C, A, B, E, _>(raw, &transform)),
        }
    }

    /// Build a step from a function operating directly on raw documents.
    pub fn raw<F>(name: impl Into<Cow<'static, str>>, migrate: F) -> Self
    where
        F: Fn(&C::Raw) -> Result<C::Raw> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(migrate),
        }
    }

    /// Human-readable name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the step on a document.
    pub fn apply(&self, raw: &C::Raw) -> Result<C::Raw> {
        (self.run)(raw)
    }
}

impl<C: Codec> fmt::Debug for MigrationStep<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationStep")
            .field("codec", &C::NAME)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
