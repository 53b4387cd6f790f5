// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    db_name = { r#"{"db_user": "u", "db_pass": "p", "db_name": "nova"}"# },
    nova_db = { r#"{"db_user": "u", "db_pass": "p", "nova_db": "nova"}"# },
)]
fn preset_config_accepts_db_name_aliases(json: &str) {
    let config: PresetConfig = serde_json::from_str(json).unwrap();
    assert_eq!(
        config,
        PresetConfig { db_user: "u".into(), db_pass: "p".into(), db_name: "nova".into() }
    );
}

#[test]
fn preset_config_requires_credentials() {
    let result: Result<PresetConfig, _> = serde_json::from_str(r#"{"db_name": "nova"}"#);
    assert!(result.is_err());
}

#[test]
fn builder_sets_name_and_path() {
    let preset = DatasetPreset::builder().name("trove").path("/d/trove").build();
    assert_eq!(preset.name, "trove");
    assert_eq!(preset.path, PathBuf::from("/d/trove"));
    assert_eq!(preset.config.db_user, "nova");
}
