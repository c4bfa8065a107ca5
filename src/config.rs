//! Viewer configuration: where videos live and what to show first.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::{AcousticFeature, Facet, FacetTuple, KinematicFeature, MetadataValue, SignalTable};
use crate::data::{AssetResolver, Selection};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Top-level configuration. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Directory the video files are served from.
    pub asset_root: String,
    /// Video file extension, without the dot.
    pub asset_extension: String,
    /// Selection shown right after a dataset is loaded.
    pub default_selection: DefaultSelection,
}

/// Initial facet and feature choice. Facet values are written as text and
/// typed the same way CSV cells are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSelection {
    pub speaker: String,
    pub rhyme_name: String,
    pub point_hand: String,
    pub speech_rate: String,
    pub acoustic: AcousticFeature,
    pub kinematic: KinematicFeature,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_root: "./co_rhymes_assets".to_string(),
            asset_extension: "mp4".to_string(),
            default_selection: DefaultSelection::default(),
        }
    }
}

impl Default for DefaultSelection {
    fn default() -> Self {
        Self {
            speaker: "1".to_string(),
            rhyme_name: "ent".to_string(),
            point_hand: "_L".to_string(),
            speech_rate: "normal".to_string(),
            acoustic: AcousticFeature::Env,
            kinematic: KinematicFeature::MFing,
        }
    }
}

impl ViewerConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ext = self.asset_extension.as_str();
        if ext.trim().is_empty() {
            return Err(ConfigError::Invalid("asset_extension must not be empty".to_string()));
        }
        if ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(ConfigError::Invalid(format!(
                "asset_extension must be a bare extension like \"mp4\", got {ext:?}"
            )));
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn resolver(&self) -> AssetResolver {
        AssetResolver::new(&self.asset_root, &self.asset_extension)
    }

    /// The configured default selection, with each facet value replaced by
    /// the first enumerated value when the table does not contain it.
    pub fn initial_selection(&self, table: &SignalTable) -> Selection {
        let d = &self.default_selection;
        let mut facets = FacetTuple::new(
            MetadataValue::infer(&d.speaker),
            MetadataValue::infer(&d.rhyme_name),
            MetadataValue::infer(&d.point_hand),
            MetadataValue::infer(&d.speech_rate),
        );
        for facet in Facet::ALL {
            let values = table.facet_values(facet);
            if values.contains(facets.get(facet)) {
                continue;
            }
            if let Some(first) = values.iter().next() {
                log::debug!(
                    "Default {} {} not in dataset, using {first}",
                    facet.column_name(),
                    facets.get(facet)
                );
                facets.set(facet, first.clone());
            }
        }
        Selection {
            facets,
            acoustic: d.acoustic,
            kinematic: d.kinematic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawColumns;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ViewerConfig::default();
        assert_eq!(config.asset_root, "./co_rhymes_assets");
        assert_eq!(config.asset_extension, "mp4");
        assert_eq!(config.default_selection.point_hand, "_L");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ViewerConfig::from_json(
            r#"{ "asset_root": "/srv/videos", "default_selection": { "acoustic": "f0" } }"#,
        )
        .unwrap();
        assert_eq!(config.asset_root, "/srv/videos");
        assert_eq!(config.asset_extension, "mp4");
        assert_eq!(config.default_selection.acoustic, AcousticFeature::F0);
        assert_eq!(config.default_selection.kinematic, KinematicFeature::MFing);
    }

    #[test]
    fn test_config_roundtrip_serialization() {
        let mut config = ViewerConfig::default();
        config.asset_extension = "webm".to_string();
        config.default_selection.kinematic = KinematicFeature::VElb;

        let json = config.to_json().unwrap();
        assert_eq!(ViewerConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_extension() {
        for ext in ["", ".mp4", "a/b"] {
            let config = ViewerConfig {
                asset_extension: ext.to_string(),
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))), "{ext:?}");
        }
    }

    #[test]
    fn test_rejects_unknown_feature() {
        let err = ViewerConfig::from_json(r#"{ "default_selection": { "acoustic": "pitch" } }"#);
        assert!(matches!(err, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("viewer.json");
        std::fs::write(&path, r#"{ "asset_extension": "mov" }"#).unwrap();

        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.resolver().extension(), "mov");
        assert!(matches!(
            ViewerConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_initial_selection_falls_back_to_first_value() {
        let mut raw = RawColumns::with_capacity(2);
        raw.push_row(0.0, FacetTuple::new(1, "ent", "_R", "normal"), [Some(0.0); 9]);
        raw.push_row(0.0, FacetTuple::new(2, "zoo", "_R", "fast"), [Some(0.0); 9]);
        let table = SignalTable::from_columns(raw);

        let sel = ViewerConfig::default().initial_selection(&table);
        assert_eq!(sel.facets, FacetTuple::new(1, "ent", "_R", "normal"));
        assert_eq!(sel.acoustic, AcousticFeature::Env);
    }
}
