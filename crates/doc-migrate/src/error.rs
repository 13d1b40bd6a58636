use thiserror::Error;

/// Boxed cause carried by codec and transform failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = MigrateError> = core::result::Result<T, E>;

/// Error during import, export, or a migration step.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Decoding a raw document into a typed or generic shape failed.
    #[error("malformed document: {0}")]
    Malformed(#[source] BoxError),
    /// The document carries no schema version field.
    #[error("no schema version field in {codec} document")]
    NoVersion { codec: &'static str },
    /// The schema version field is present but is not an integer.
    #[error("schema version is not an integer: found {found}")]
    InvalidVersionFormat { found: String },
    /// The schema version is outside `1..=latest`.
    #[error("schema version {version} not found in migrations (latest is v{latest})")]
    VersionNotFound { version: i64, latest: u32 },
    /// A migration step failed. `index` is relative to the steps that were
    /// selected for this document, not to the whole chain.
    #[error("running migration {index} (`{step}`) failed: {source}")]
    RunningMigration {
        index: usize,
        step: String,
        #[source]
        source: Box<MigrateError>,
    },
    /// Encoding a typed value, or injecting the version field, failed.
    #[error("encoding failed: {0}")]
    EncodeFailure(#[source] BoxError),
    /// A typed transform rejected its input.
    #[error("transform failed: {0}")]
    Transform(#[source] BoxError),
}

/// Fieldless category of a [`MigrateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Malformed,
    NoVersion,
    InvalidVersionFormat,
    VersionNotFound,
    RunningMigration,
    EncodeFailure,
    Transform,
}

impl MigrateError {
    pub(crate) fn malformed(err: impl Into<BoxError>) -> Self {
        Self::Malformed(err.into())
    }

    pub(crate) fn encode_failure(err: impl Into<BoxError>) -> Self {
        Self::EncodeFailure(err.into())
    }

    /// Wrap a business-rule failure raised inside a typed transform.
    ///
    /// ```
    /// use doc_migrate::{ErrorKind, MigrateError};
    ///
    /// let err = MigrateError::transform("age must not be negative");
    /// assert_eq!(err.kind(), ErrorKind::Transform);
    /// ```
    pub fn transform(err: impl Into<BoxError>) -> Self {
        Self::Transform(err.into())
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed(_) => ErrorKind::Malformed,
            Self::NoVersion { .. } => ErrorKind::NoVersion,
            Self::InvalidVersionFormat { .. } => ErrorKind::InvalidVersionFormat,
            Self::VersionNotFound { .. } => ErrorKind::VersionNotFound,
            Self::RunningMigration { .. } => ErrorKind::RunningMigration,
            Self::EncodeFailure(_) => ErrorKind::EncodeFailure,
            Self::Transform(_) => ErrorKind::Transform,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            MigrateError::NoVersion { codec: "json" }.kind(),
            ErrorKind::NoVersion
        );
        assert_eq!(
            MigrateError::VersionNotFound {
                version: 0,
                latest: 3
            }
            .kind(),
            ErrorKind::VersionNotFound
        );
        assert_eq!(
            MigrateError::encode_failure("boom").kind(),
            ErrorKind::EncodeFailure
        );
    }

    #[test]
    fn display_messages() {
        let err = MigrateError::VersionNotFound {
            version: -1,
            latest: 3,
        };
        assert_eq!(
            err.to_string(),
            "schema version -1 not found in migrations (latest is v3)"
        );

        let err = MigrateError::InvalidVersionFormat {
            found: "string".into(),
        };
        assert_eq!(
            err.to_string(),
            "schema version is not an integer: found string"
        );
    }

    #[test]
    fn running_migration_exposes_step_error_as_source() {
        let err = MigrateError::RunningMigration {
            index: 2,
            step: "merge_names".into(),
            source: Box::new(MigrateError::transform("no last name")),
        };

        assert_eq!(
            err.to_string(),
            "running migration 2 (`merge_names`) failed: transform failed: no last name"
        );
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "transform failed: no last name");
    }
}
