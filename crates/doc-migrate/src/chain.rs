use std::fmt;

use crate::codec::Codec;
use crate::step::MigrationStep;

/// The ordered list of migration steps for one record type.
///
/// Steps are indexed by position: the step at index `i` migrates version
/// `i + 1` to version `i + 2`. Versions are therefore contiguous by
/// construction and the latest version is `len() + 1`.
///
/// # Example
///
/// ```
/// # #[cfg(feature = "json")] {
/// use doc_migrate::{json::JsonCodec, MigrationChain, MigrationStep};
///
/// let chain = MigrationChain::<JsonCodec>::new()
///     .with_step(MigrationStep::raw("v1_to_v2", |raw: &Vec<u8>| Ok(raw.clone())))
///     .with_step(MigrationStep::raw("v2_to_v3", |raw: &Vec<u8>| Ok(raw.clone())));
///
/// assert_eq!(chain.last_version(), 3);
/// assert_eq!(chain.from_version(2).map(|steps| steps.len()), Some(1));
/// assert_eq!(chain.from_version(3).map(|steps| steps.len()), Some(0));
/// assert!(chain.from_version(4).is_none());
/// # }
/// ```
pub struct MigrationChain<C: Codec> {
    steps: Vec<MigrationStep<C>>,
}

impl<C: Codec> MigrationChain<C> {
    /// Create an empty chain. Its only version is 1.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step, migrating the current latest version to the next one.
    pub fn push(&mut self, step: MigrationStep<C>) {
        self.steps.push(step);
    }

    /// Builder-style [`push`](Self::push).
    pub fn with_step(mut self, step: MigrationStep<C>) -> Self {
        self.push(step);
        self
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the chain has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The latest schema version: `len() + 1`.
    pub fn last_version(&self) -> u32 {
        u32::try_from(self.steps.len()).map_or(u32::MAX, |len| len.saturating_add(1))
    }

    /// The steps that bring a document at `version` to the latest version.
    ///
    /// Returns an empty slice for the latest version and `None` for anything
    /// outside `1..=last_version()`.
    pub fn from_version(&self, version: i64) -> Option<&[MigrationStep<C>]> {
        let start = usize::try_from(version.checked_sub(1)?).ok()?;
        self.steps.get(start..)
    }

    /// Iterate over the steps in order.
    pub fn iter(&self) -> std::slice::Iter<'_, MigrationStep<C>> {
        self.steps.iter()
    }

    /// List every step as `(source version, target version, name)`.
    pub fn describe(&self) -> Vec<(u32, u32, &str)> {
        (1u32..)
            .zip(&self.steps)
            .map(|(from, step)| (from, from + 1, step.name()))
            .collect()
    }
}

impl<C: Codec> Default for MigrationChain<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> FromIterator<MigrationStep<C>> for MigrationChain<C> {
    fn from_iter<I: IntoIterator<Item = MigrationStep<C>>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<C: Codec> Extend<MigrationStep<C>> for MigrationChain<C> {
    fn extend<I: IntoIterator<Item = MigrationStep<C>>>(&mut self, iter: I) {
        self.steps.extend(iter);
    }
}

impl<'a, C: Codec> IntoIterator for &'a MigrationChain<C> {
    type Item = &'a MigrationStep<C>;
    type IntoIter = std::slice::Iter<'a, MigrationStep<C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl<C: Codec> fmt::Debug for MigrationChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.describe()).finish()
    }
}
