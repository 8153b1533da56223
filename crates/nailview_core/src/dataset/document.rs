//! Persisted dataset document shape.
//!
//! # Invariants
//! - Top-level sections are `metadata`, `domains`, `composition_rules` and
//!   `geometry`; unknown sections and keys are preserved on save.

use crate::config::{CompositionRules, GeometryConstants};
use crate::model::record::RawRecord;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub total_domains: usize,
    /// Date the dataset was first generated (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<String>,
    /// Date of the most recent append (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub domains: Vec<RawRecord>,
    #[serde(default)]
    pub composition_rules: CompositionRules,
    #[serde(default)]
    pub geometry: GeometryConstants,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::DatasetDocument;
    use serde_json::json;

    #[test]
    fn unknown_sections_survive_round_trip() {
        let value = json!({
            "metadata": { "total_domains": 1, "generated": "2025-01-02", "curator": "lab" },
            "domains": [{ "name": "one", "nail_role": "vertical" }],
            "geometry": { "reveal_angle": 75.0, "note": "tilt" },
            "changelog": ["initial import"]
        });
        let document: DatasetDocument = serde_json::from_value(value).unwrap();
        assert_eq!(document.geometry.reveal_angle, 75.0);
        assert_eq!(document.domains.len(), 1);

        let back = serde_json::to_value(&document).unwrap();
        assert_eq!(back["metadata"]["curator"], "lab");
        assert_eq!(back["geometry"]["note"], "tilt");
        assert_eq!(back["changelog"][0], "initial import");
        assert!(back["composition_rules"]["category_colors"].is_object());
    }
}
