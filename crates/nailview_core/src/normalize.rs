//! Record -> baseline visual normalization.
//!
//! # Responsibility
//! - Map raw statistics onto canonical coordinates, depth, size and color.
//!
//! # Invariants
//! - Output always lies in the configured output ranges, whatever the input.
//! - Never fails; a missing color is reported as a warning, not an error.

use crate::config::CompositionConfig;
use crate::model::record::{DomainRecord, RecordWarning};
use crate::model::visual::DomainVisual;

/// Floor applied to `p_value` before taking `-log10`.
pub const P_VALUE_FLOOR: f64 = 1e-5;
/// Added to `p_value` in the size term so `p = 0` stays finite.
pub const SIZE_P_EPSILON: f64 = 1e-4;
pub const MAX_LABELS: usize = 3;

/// `-log10(max(p, 1e-5))`, clamped into the significance domain.
pub fn significance(p_value: f64, config: &CompositionConfig) -> f64 {
    let p = if p_value.is_finite() { p_value } else { 0.0 };
    config.ranges.significance.clamp(-(p.max(P_VALUE_FLOOR)).log10())
}

/// Unscaled size term: `n^0.25 / (p + 1e-4)`.
pub fn raw_size(sample_size: u64, p_value: f64) -> f64 {
    let p = if p_value.is_finite() { p_value.max(0.0) } else { 0.0 };
    (sample_size as f64).powf(0.25) * (1.0 / (p + SIZE_P_EPSILON))
}

/// Baseline visual for one record, before any perspective transform.
///
/// The returned warnings only cover the color lookup; numeric defaulting is
/// reported when the record is loaded.
pub fn normalize(
    record: &DomainRecord,
    config: &CompositionConfig,
) -> (DomainVisual, Option<RecordWarning>) {
    let ranges = &config.ranges;

    let x = ranges
        .effect_size
        .map_to(record.effect_size_r, ranges.coordinate);
    let y = ranges
        .significance
        .map_to(significance(record.p_value, config), ranges.coordinate);
    let z = ranges
        .sample_size_log
        .map_to((record.sample_size as f64 + 1.0).log10(), ranges.depth);
    let size = ranges
        .size_raw
        .map_to(raw_size(record.sample_size, record.p_value), ranges.size);

    let (color, warning) = match config.color_for(&record.category) {
        Some(color) => (color, None),
        None => (
            config.default_color,
            Some(RecordWarning::UnknownCategory {
                name: record.name.clone(),
                category: record.category.label().to_string(),
            }),
        ),
    };

    let visual = DomainVisual {
        name: record.name.clone(),
        x,
        y,
        z,
        color,
        size,
        names_text: record
            .primary_names
            .iter()
            .take(MAX_LABELS)
            .cloned()
            .collect(),
        nail_role: record.nail_role,
        tag: record.tag.clone(),
    };
    (visual, warning)
}
