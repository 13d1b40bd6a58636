//! Integration tests for the `#[migration]` macro.
//!
//! One set of annotated functions feeds both a JSON and a BSON migrator;
//! stored v1 profiles must load as v3 through either.

use bson::doc;
use doc_migrate::bson::BsonMigrator;
use doc_migrate::json::{JsonCodec, JsonMigrator};
use doc_migrate::{migration, ErrorKind, MigrateError, MigrationStep};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ProfileV1 {
    handle: String,
    email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ProfileV2 {
    handle: String,
    email: String,
    verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct ProfileV3 {
    handle: String,
    email: String,
    verified: bool,
    display_name: Option<String>,
}

#[migration]
fn add_verified(old: ProfileV1) -> ProfileV2 {
    ProfileV2 {
        handle: old.handle,
        email: old.email,
        verified: false,
    }
}

#[migration(name = "v2_to_v3")]
fn add_display_name(old: ProfileV2) -> Result<ProfileV3, MigrateError> {
    if old.handle.is_empty() {
        return Err(MigrateError::transform("profile without handle"));
    }
    Ok(ProfileV3 {
        display_name: Some(format!("@{}", old.handle)),
        handle: old.handle,
        email: old.email,
        verified: old.verified,
    })
}

fn json_profiles() -> JsonMigrator<ProfileV3> {
    JsonMigrator::builder()
        .label("profiles")
        .step(add_verified_step())
        .step(add_display_name_step())
        .build()
}

fn bson_profiles() -> BsonMigrator<ProfileV3> {
    BsonMigrator::builder()
        .label("profiles")
        .steps([add_verified_step(), add_display_name_step()])
        .build()
}

fn ada() -> ProfileV3 {
    ProfileV3 {
        handle: "ada".into(),
        email: "ada@example.org".into(),
        verified: false,
        display_name: Some("@ada".into()),
    }
}

#[test]
fn annotated_function_is_still_callable() {
    let v2 = add_verified(ProfileV1 {
        handle: "h".into(),
        email: "e".into(),
    });
    assert!(!v2.verified);
}

#[test]
fn step_names_default_to_function_name() {
    let step: MigrationStep<JsonCodec> = add_verified_step();
    assert_eq!(step.name(), "add_verified");

    let step: MigrationStep<JsonCodec> = add_display_name_step();
    assert_eq!(step.name(), "v2_to_v3");

    assert_eq!(
        json_profiles().chain().describe(),
        vec![(1, 2, "add_verified"), (2, 3, "v2_to_v3")]
    );
}

#[test]
fn json_v1_profile_loads_as_v3() {
    let raw = br#"{"handle":"ada","email":"ada@example.org","__schema_version":1}"#.to_vec();
    assert_eq!(json_profiles().import(&raw).unwrap(), ada());
}

#[test]
fn bson_v1_profile_loads_as_v3() {
    let raw = doc! { "handle": "ada", "email": "ada@example.org", "__schema_version": 1 };
    assert_eq!(bson_profiles().import(&raw).unwrap(), ada());
}

#[test]
fn v2_profile_keeps_its_verified_flag() {
    let raw = br#"{"handle":"bob","verified":true,"__schema_version":2}"#.to_vec();
    let profile = json_profiles().import(&raw).unwrap();
    assert!(profile.verified);
    assert_eq!(profile.display_name.as_deref(), Some("@bob"));

    let raw = doc! { "handle": "bob", "verified": true, "__schema_version": 2 };
    assert!(bson_profiles().import(&raw).unwrap().verified);
}

#[test]
fn fallible_step_reports_transform_error() {
    let raw = doc! { "email": "nobody@example.org", "__schema_version": 1 };
    match bson_profiles().import(&raw).unwrap_err() {
        MigrateError::RunningMigration {
            index,
            step,
            source,
        } => {
            assert_eq!(index, 1);
            assert_eq!(step, "v2_to_v3");
            assert_eq!(source.kind(), ErrorKind::Transform);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn both_codecs_round_trip_the_latest_record() {
    let mut profile = ada();
    profile.verified = true;

    let json = json_profiles();
    assert_eq!(json.import(&json.export(&profile).unwrap()).unwrap(), profile);

    let bson = bson_profiles();
    assert_eq!(bson.import(&bson.export(&profile).unwrap()).unwrap(), profile);
}
