//! One composed view: every record normalized and transformed at one angle.
//!
//! # Responsibility
//! - Run normalizer + transformer over a record slice.
//! - Serve as the single source for the renderer, exporter and instructions.
//!
//! # Invariants
//! - Visual `i` always derives from record `i` (source order is preserved).
//! - Composition is deterministic and side-effect free.

use crate::config::CompositionConfig;
use crate::model::record::{DomainRecord, RecordWarning};
use crate::model::visual::DomainVisual;
use crate::normalize::normalize;
use crate::transform::transform_visual;

/// Visuals for one viewing angle.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedView {
    pub angle: f64,
    pub visuals: Vec<DomainVisual>,
    /// Color fallbacks hit while normalizing.
    pub warnings: Vec<RecordWarning>,
}

impl ComposedView {
    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }
}

pub fn compose_view(
    records: &[DomainRecord],
    config: &CompositionConfig,
    angle: f64,
) -> ComposedView {
    let mut warnings = Vec::new();
    let visuals = records
        .iter()
        .map(|record| {
            let (baseline, warning) = normalize(record, config);
            warnings.extend(warning);
            transform_visual(&baseline, angle, config.ranges.coordinate)
        })
        .collect();

    ComposedView {
        angle,
        visuals,
        warnings,
    }
}

/// The neutral (angle 0) and reveal views of the same records.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewPair {
    pub normal: ComposedView,
    pub reveal: ComposedView,
}

pub fn compose_pair(records: &[DomainRecord], config: &CompositionConfig) -> ViewPair {
    ViewPair {
        normal: compose_view(records, config, 0.0),
        reveal: compose_view(records, config, config.reveal_angle),
    }
}

#[cfg(test)]
mod tests {
    use super::{compose_pair, compose_view};
    use crate::config::CompositionConfig;
    use crate::model::record::{Category, DomainRecord, NailRole};
    use crate::normalize::normalize;

    fn record(name: &str, role: NailRole, category: Category) -> DomainRecord {
        DomainRecord {
            name: name.to_string(),
            category,
            effect_size_r: 0.3,
            p_value: 0.01,
            sample_size: 1200,
            key_metric: String::new(),
            primary_names: Vec::new(),
            mechanism: String::new(),
            nail_role: role,
            tag: String::new(),
        }
    }

    #[test]
    fn neutral_view_equals_normalizer_output() {
        let config = CompositionConfig::default();
        let records = vec![
            record("a", NailRole::Vertical, Category::Health),
            record("b", NailRole::Horizontal, Category::Housing),
            record("c", NailRole::Peripheral, Category::Cultural),
        ];
        let view = compose_view(&records, &config, 0.0);
        for (record, visual) in records.iter().zip(&view.visuals) {
            assert_eq!(&normalize(record, &config).0, visual);
        }
    }

    #[test]
    fn pair_keeps_source_order_and_collects_color_warnings() {
        let config = CompositionConfig::default();
        let records = vec![
            record("first", NailRole::Intersection, Category::Other("misc".to_string())),
            record("second", NailRole::Vertical, Category::Health),
        ];
        let pair = compose_pair(&records, &config);

        assert_eq!(pair.reveal.angle, 90.0);
        assert_eq!(pair.normal.visuals[0].name, "first");
        assert_eq!(pair.reveal.visuals[1].name, "second");
        assert_eq!((pair.reveal.visuals[0].x, pair.reveal.visuals[0].y), (0.0, 0.0));
        assert_eq!(pair.normal.warnings.len(), 1);
    }

    #[test]
    fn empty_records_compose_to_empty_views() {
        let pair = compose_pair(&[], &CompositionConfig::default());
        assert!(pair.normal.is_empty() && pair.reveal.is_empty());
    }
}
