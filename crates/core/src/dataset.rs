// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dataset presets that parametrize the validation step.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the per-preset configuration file.
pub const PRESET_CONFIG_FILE: &str = "config.json";

/// Credentials and target database for one preset (`config.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetConfig {
    pub db_user: String,
    pub db_pass: String,
    #[serde(alias = "nova_db")]
    pub db_name: String,
}

/// A named configuration bundle discovered by a dataset registry.
///
/// Immutable once loaded; `path` is the preset directory, which also holds
/// the fixtures the validator runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPreset {
    pub name: String,
    pub path: PathBuf,
    pub config: PresetConfig,
}

crate::builder! {
    pub struct DatasetPresetBuilder => DatasetPreset {
        into {
            name: String = "some_dataset",
            path: PathBuf = "/datasets/some_dataset",
        }
        set {
            config: PresetConfig = PresetConfig {
                db_user: "nova".to_string(),
                db_pass: "secret".to_string(),
                db_name: "nova_dataset".to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "dataset_tests.rs"]
mod tests;
