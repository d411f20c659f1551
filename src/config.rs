// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mold configuration

use crate::error::{MoldError, MoldResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "polymold.toml";

/// Where the pour spout is cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpoutVariant {
    /// Vertical channel above the cavity center, cut into the top half
    Simple,
    /// Horizontal channel entering from the -x face, cut into the bottom half
    #[default]
    Validated,
}

impl FromStr for SpoutVariant {
    type Err = MoldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "validated" => Ok(Self::Validated),
            other => Err(MoldError::InvalidConfig(format!(
                "unknown spout variant '{}' (expected simple or validated)",
                other
            ))),
        }
    }
}

/// What to do with an input mesh that has holes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatertightPolicy {
    #[default]
    Reject,
    /// Fill holes once, then require a closed mesh
    Repair,
}

/// Mold generation parameters.
///
/// Optional sizes derive from `wall_thickness` when unset, so scaling the wall
/// scales keys and spout with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoldConfig {
    /// Clearance between the object and the outside of the mold
    pub wall_thickness: f64,
    /// Key radius as a fraction of the wall thickness
    pub key_radius_ratio: f64,
    /// Key height; defaults to the wall thickness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_height: Option<f64>,
    /// Spout radius; defaults to a third of the wall thickness
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spout_radius: Option<f64>,
    /// Spout length as a fraction of the mold's x extent (validated variant)
    pub spout_length_ratio: f64,
    pub spout_variant: SpoutVariant,
    /// Extra translation applied to the spout after placement
    pub spout_offset: [f64; 3],
    /// Facets around each cylinder
    pub segments: u32,
    pub watertight_policy: WatertightPolicy,
}

impl Default for MoldConfig {
    fn default() -> Self {
        Self {
            wall_thickness: 10.0,
            key_radius_ratio: 0.25,
            key_height: None,
            spout_radius: None,
            spout_length_ratio: 0.4,
            spout_variant: SpoutVariant::Validated,
            spout_offset: [0.0; 3],
            segments: 32,
            watertight_policy: WatertightPolicy::Reject,
        }
    }
}

impl MoldConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> MoldResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| MoldError::io(path, e))?;
        toml::from_str(&content).map_err(|source| MoldError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Uses `path` when given, otherwise `polymold.toml` in the working
    /// directory if it exists, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> MoldResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if PathBuf::from(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `POLYMOLD_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> MoldResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("POLYMOLD_WALL_THICKNESS") {
            self.wall_thickness = parse_env("POLYMOLD_WALL_THICKNESS", &value)?;
        }
        if let Some(value) = lookup("POLYMOLD_SEGMENTS") {
            self.segments = parse_env("POLYMOLD_SEGMENTS", &value)?;
        }
        if let Some(value) = lookup("POLYMOLD_SPOUT_VARIANT") {
            self.spout_variant = value.parse()?;
        }
        if let Some(value) = lookup("POLYMOLD_REPAIR") {
            let repair: bool = parse_env("POLYMOLD_REPAIR", &value)?;
            self.watertight_policy = if repair {
                WatertightPolicy::Repair
            } else {
                WatertightPolicy::Reject
            };
        }
        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> MoldResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| MoldError::InvalidConfig(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| MoldError::io(path, e))
    }

    /// Reject values that would produce meaningless geometry
    pub fn validate(&self) -> MoldResult<()> {
        let positive = [
            ("wall_thickness", Some(self.wall_thickness)),
            ("key_height", self.key_height),
            ("spout_radius", self.spout_radius),
        ];
        for (name, value) in positive {
            if let Some(value) = value {
                if !value.is_finite() || value <= 0.0 {
                    return Err(MoldError::InvalidConfig(format!(
                        "{} must be a positive number, got {}",
                        name, value
                    )));
                }
            }
        }

        for (name, value) in [
            ("key_radius_ratio", self.key_radius_ratio),
            ("spout_length_ratio", self.spout_length_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(MoldError::InvalidConfig(format!(
                    "{} must be in (0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.spout_offset.iter().any(|v| !v.is_finite()) {
            return Err(MoldError::InvalidConfig("spout_offset must be finite".into()));
        }
        if self.segments < 3 {
            return Err(MoldError::InvalidConfig(format!(
                "segments must be at least 3, got {}",
                self.segments
            )));
        }
        Ok(())
    }

    pub fn key_radius(&self) -> f64 {
        self.wall_thickness * self.key_radius_ratio
    }

    pub fn key_height(&self) -> f64 {
        self.key_height.unwrap_or(self.wall_thickness)
    }

    pub fn spout_radius(&self) -> f64 {
        self.spout_radius.unwrap_or(self.wall_thickness / 3.0)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> MoldResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MoldError::InvalidConfig(format!("{}='{}' is not a valid value", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_reference_mold() {
        let config = MoldConfig::default();
        assert_eq!(config.wall_thickness, 10.0);
        assert_eq!(config.key_radius(), 2.5);
        assert_eq!(config.key_height(), 10.0);
        assert!((config.spout_radius() - 10.0 / 3.0).abs() < 1e-12);
        assert_eq!(config.spout_variant, SpoutVariant::Validated);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> MoldResult<()> {
        let mut file = NamedTempFile::new().map_err(|e| MoldError::io("tempfile", e))?;
        writeln!(
            file,
            "wall_thickness = 6.0\nspout_variant = \"simple\"\nwatertight_policy = \"repair\""
        )
        .map_err(|e| MoldError::io("tempfile", e))?;

        let config = MoldConfig::from_file(file.path())?;

        assert_eq!(config.wall_thickness, 6.0);
        assert_eq!(config.spout_variant, SpoutVariant::Simple);
        assert_eq!(config.watertight_policy, WatertightPolicy::Repair);
        assert_eq!(config.segments, 32);
        assert_eq!(config.key_radius(), 1.5);
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> MoldResult<()> {
        let file = NamedTempFile::new().map_err(|e| MoldError::io("tempfile", e))?;
        let config = MoldConfig {
            key_height: Some(4.0),
            spout_offset: [1.0, 2.0, 3.0],
            ..MoldConfig::default()
        };
        config.save(file.path())?;

        assert_eq!(MoldConfig::from_file(file.path())?, config);
        Ok(())
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "wall_thickness = \"thick\"").unwrap();

        let err = MoldConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, MoldError::ConfigParse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("POLYMOLD_WALL_THICKNESS", "12.5"),
            ("POLYMOLD_SEGMENTS", "48"),
            ("POLYMOLD_SPOUT_VARIANT", "Simple"),
            ("POLYMOLD_REPAIR", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = MoldConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.wall_thickness, 12.5);
        assert_eq!(config.segments, 48);
        assert_eq!(config.spout_variant, SpoutVariant::Simple);
        assert_eq!(config.watertight_policy, WatertightPolicy::Repair);
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = MoldConfig::default();
        let err = config
            .apply_env_overrides(|key| (key == "POLYMOLD_SEGMENTS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, MoldError::InvalidConfig(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            MoldConfig {
                wall_thickness: 0.0,
                ..MoldConfig::default()
            },
            MoldConfig {
                wall_thickness: f64::NAN,
                ..MoldConfig::default()
            },
            MoldConfig {
                key_radius_ratio: 1.5,
                ..MoldConfig::default()
            },
            MoldConfig {
                spout_radius: Some(-1.0),
                ..MoldConfig::default()
            },
            MoldConfig {
                segments: 2,
                ..MoldConfig::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(MoldError::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
        }
    }
}
