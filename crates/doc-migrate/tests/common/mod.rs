//! Record generations shared by the per-codec integration tests.
//!
//! v1 has separate first/last names, v2 merges them, v3 adds an age that
//! old documents never had.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use doc_migrate::{Codec, MigrateError, MigrationChain, MigrationStep};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryV1 {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryV2 {
    pub full_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryV3 {
    pub full_name: String,
    pub age: i32,
}

pub fn merge_names(v1: EntryV1) -> Result<EntryV2, MigrateError> {
    Ok(EntryV2 {
        full_name: format!("{} {}", v1.first_name, v1.last_name),
    })
}

pub fn carry_full_name(v2: EntryV2) -> Result<EntryV3, MigrateError> {
    Ok(EntryV3 {
        full_name: v2.full_name,
        ..EntryV3::default()
    })
}

/// The two-step chain: `LastVersion == 3`.
pub fn entry_chain<C: Codec>() -> MigrationChain<C> {
    [
        MigrationStep::typed("merge_names", merge_names),
        MigrationStep::typed("carry_full_name", carry_full_name),
    ]
    .into_iter()
    .collect()
}

/// A pass-through step that counts how often it ran.
pub fn counting_step<C: Codec>(name: &'static str, calls: &Arc<AtomicUsize>) -> MigrationStep<C>
where
    C::Raw: Clone,
{
    let calls = Arc::clone(calls);
    MigrationStep::raw(name, move |raw: &C::Raw| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(raw.clone())
    })
}

/// A step that always fails with a transform error.
pub fn failing_step<C: Codec>(name: &'static str) -> MigrationStep<C> {
    MigrationStep::raw(name, |_: &C::Raw| {
        Err(MigrateError::transform("refusing to migrate"))
    })
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
