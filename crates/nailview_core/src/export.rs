//! Interchange document bundling the neutral and reveal views.
//!
//! Both views come from one `ViewPair`, so element `i` of `normal_view` and
//! `nail_view` describe the same record; `name` is the join key for clients
//! that interpolate between them.

use crate::dataset::Metadata;
use crate::model::record::NailRole;
use crate::model::visual::DomainVisual;
use crate::view::{ComposedView, ViewPair};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportElement {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Renderable color, `rgb(r, g, b)`.
    pub color: String,
    pub size: f64,
    pub labels: Vec<String>,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<NailRole>,
}

impl ExportElement {
    fn from_visual(visual: &DomainVisual, with_role: bool) -> Self {
        Self {
            name: visual.name.clone(),
            x: visual.x,
            y: visual.y,
            z: visual.z,
            color: visual.color.css(),
            size: visual.size,
            labels: visual.names_text.clone(),
            tag: visual.tag.clone(),
            role: with_role.then_some(visual.nail_role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterchangeDocument {
    pub metadata: Metadata,
    pub reveal_angle: f64,
    pub normal_view: Vec<ExportElement>,
    pub nail_view: Vec<ExportElement>,
}

fn elements(view: &ComposedView, with_role: bool) -> Vec<ExportElement> {
    view.visuals
        .iter()
        .map(|visual| ExportElement::from_visual(visual, with_role))
        .collect()
}

pub fn build_interchange(metadata: &Metadata, views: &ViewPair) -> InterchangeDocument {
    InterchangeDocument {
        metadata: metadata.clone(),
        reveal_angle: views.reveal.angle,
        normal_view: elements(&views.normal, false),
        nail_view: elements(&views.reveal, true),
    }
}

impl InterchangeDocument {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::build_interchange;
    use crate::config::CompositionConfig;
    use crate::dataset::Metadata;
    use crate::model::record::{Category, DomainRecord, NailRole};
    use crate::view::{compose_pair, compose_view};

    fn records() -> Vec<DomainRecord> {
        [
            ("left", NailRole::Horizontal),
            ("top", NailRole::Vertical),
            ("pivot", NailRole::Intersection),
        ]
        .into_iter()
        .map(|(name, role)| DomainRecord {
            name: name.to_string(),
            category: Category::Employment,
            effect_size_r: 0.12,
            p_value: 0.02,
            sample_size: 800,
            key_metric: String::new(),
            primary_names: vec![format!("{name} person")],
            mechanism: String::new(),
            nail_role: role,
            tag: "economic".to_string(),
        })
        .collect()
    }

    #[test]
    fn normal_view_matches_direct_neutral_composition() {
        let config = CompositionConfig::default();
        let records = records();
        let document = build_interchange(&Metadata::default(), &compose_pair(&records, &config));
        let direct = compose_view(&records, &config, 0.0);

        assert_eq!(document.normal_view.len(), direct.visuals.len());
        for (element, visual) in document.normal_view.iter().zip(&direct.visuals) {
            assert_eq!(element.name, visual.name);
            assert!((element.x - visual.x).abs() < 1e-12);
            assert!((element.y - visual.y).abs() < 1e-12);
            assert!(element.role.is_none());
        }
    }

    #[test]
    fn nail_view_carries_role_and_shares_keys() {
        let config = CompositionConfig::default();
        let document = build_interchange(
            &Metadata::default(),
            &compose_pair(&records(), &config),
        );
        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(json["reveal_angle"], 90.0);
        assert!(json["normal_view"][0].get("role").is_none());
        assert_eq!(json["nail_view"][1]["role"], "vertical");
        assert_eq!(json["nail_view"][2]["x"], 0.0);
        let normal_names: Vec<_> = document.normal_view.iter().map(|e| &e.name).collect();
        let nail_names: Vec<_> = document.nail_view.iter().map(|e| &e.name).collect();
        assert_eq!(normal_names, nail_names);
        assert!(json["normal_view"][0]["color"]
            .as_str()
            .is_some_and(|color| color.starts_with("rgb(")));
    }
}
