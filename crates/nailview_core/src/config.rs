//! Composition configuration: color table, range constants, reveal geometry.
//!
//! # Responsibility
//! - Mirror the `composition_rules` and `geometry` document sections.
//! - Validate them once and expose a typed `CompositionConfig`.
//!
//! # Invariants
//! - Every range has `lo < hi` and finite bounds.
//! - Every color channel is finite and within [0, 1].
//! - No category color equals the overlay accent color.
//! - The reveal angle lies in (`LABEL_ANGLE_THRESHOLD`, 90].

use crate::layout::{ACCENT_COLOR, LABEL_ANGLE_THRESHOLD};
use crate::model::record::Category;
use crate::model::visual::Rgb;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fallback color for categories missing from the color table.
pub const DEFAULT_GRAY: Rgb = Rgb::new(0.5, 0.5, 0.5);

pub const DEFAULT_REVEAL_ANGLE: f64 = 90.0;

/// Closed numeric interval serialized as `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range(pub f64, pub f64);

impl Range {
    pub fn lo(self) -> f64 {
        self.0
    }

    pub fn hi(self) -> f64 {
        self.1
    }

    /// Clamps into the interval. NaN maps to `lo`.
    pub fn clamp(self, value: f64) -> f64 {
        if value.is_nan() {
            return self.0;
        }
        value.clamp(self.0, self.1)
    }

    /// Linearly maps `value` from this interval onto `to`, clamping first.
    pub fn map_to(self, value: f64, to: Range) -> f64 {
        let clamped = self.clamp(value);
        let t = (clamped - self.0) / (self.1 - self.0);
        to.0 * (1.0 - t) + to.1 * t
    }

    fn is_valid(self) -> bool {
        self.0.is_finite() && self.1.is_finite() && self.0 < self.1
    }
}

/// Range-mapping constants shared by the normalizer, renderer and
/// instruction generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeTable {
    /// Input domain for `effect_size_r`.
    pub effect_size: Range,
    /// Input domain for `-log10(p)`.
    pub significance: Range,
    /// Input domain for `log10(sample_size + 1)`.
    pub sample_size_log: Range,
    /// Input domain for `sample_size^0.25 / (p + 1e-4)`.
    pub size_raw: Range,
    /// Output range for `x` and `y`.
    pub coordinate: Range,
    /// Output range for `z`.
    pub depth: Range,
    /// Output range for element size.
    pub size: Range,
}

impl Default for RangeTable {
    fn default() -> Self {
        Self {
            effect_size: Range(0.0, 0.4),
            significance: Range(0.0, 5.0),
            sample_size_log: Range(0.0, 5.0),
            size_raw: Range(0.0, 50_000.0),
            coordinate: Range(-0.8, 0.8),
            depth: Range(0.1, 1.0),
            size: Range(0.02, 0.15),
        }
    }
}

impl RangeTable {
    fn named(&self) -> [(&'static str, Range); 7] {
        [
            ("effect_size", self.effect_size),
            ("significance", self.significance),
            ("sample_size_log", self.sample_size_log),
            ("size_raw", self.size_raw),
            ("coordinate", self.coordinate),
            ("depth", self.depth),
            ("size", self.size),
        ]
    }
}

/// `composition_rules` document section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionRules {
    /// Category label -> RGB triple.
    pub category_colors: BTreeMap<String, Rgb>,
    pub default_color: Rgb,
    pub ranges: RangeTable,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CompositionRules {
    fn default() -> Self {
        let category_colors = default_palette()
            .into_iter()
            .map(|(category, color)| (category.label().to_string(), color))
            .collect();
        Self {
            category_colors,
            default_color: DEFAULT_GRAY,
            ranges: RangeTable::default(),
            extra: Map::new(),
        }
    }
}

/// `geometry` document section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConstants {
    /// Viewing angle in degrees at which the cross becomes visible.
    pub reveal_angle: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GeometryConstants {
    fn default() -> Self {
        Self {
            reveal_angle: DEFAULT_REVEAL_ANGLE,
            extra: Map::new(),
        }
    }
}

/// Palette shipped with fresh datasets.
pub fn default_palette() -> [(Category, Rgb); 8] {
    [
        (Category::SocialFinancial, Rgb::new(0.80, 0.20, 0.20)),
        (Category::Health, Rgb::new(0.20, 0.60, 0.80)),
        (Category::Education, Rgb::new(0.30, 0.70, 0.30)),
        (Category::CriminalJustice, Rgb::new(0.55, 0.10, 0.55)),
        (Category::Employment, Rgb::new(0.90, 0.50, 0.10)),
        (Category::Housing, Rgb::new(0.60, 0.40, 0.20)),
        (Category::Political, Rgb::new(0.20, 0.30, 0.70)),
        (Category::Cultural, Rgb::new(0.85, 0.45, 0.65)),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidRange { name: &'static str, lo: f64, hi: f64 },
    InvalidColor { key: String },
    AccentCollision { key: String },
    InvalidRevealAngle(f64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { name, lo, hi } => {
                write!(f, "range `{name}` must satisfy lo < hi, got [{lo}, {hi}]")
            }
            Self::InvalidColor { key } => {
                write!(f, "color `{key}` must have channels within [0, 1]")
            }
            Self::AccentCollision { key } => write!(
                f,
                "color `{key}` equals the overlay accent {}",
                ACCENT_COLOR.hex()
            ),
            Self::InvalidRevealAngle(angle) => write!(
                f,
                "reveal_angle must be within ({LABEL_ANGLE_THRESHOLD}, 90], got {angle}"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Validated configuration used by every pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionConfig {
    colors: BTreeMap<Category, Rgb>,
    pub default_color: Rgb,
    pub ranges: RangeTable,
    pub reveal_angle: f64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            colors: default_palette().into_iter().collect(),
            default_color: DEFAULT_GRAY,
            ranges: RangeTable::default(),
            reveal_angle: DEFAULT_REVEAL_ANGLE,
        }
    }
}

impl CompositionConfig {
    /// Builds and validates a configuration from document sections.
    ///
    /// # Errors
    /// Returns the first violated invariant listed in the module docs.
    pub fn from_sections(
        rules: &CompositionRules,
        geometry: &GeometryConstants,
    ) -> Result<Self, ConfigError> {
        let colors = rules
            .category_colors
            .iter()
            .map(|(label, color)| (Category::from_label(label), *color))
            .collect();
        let config = Self {
            colors,
            default_color: rules.default_color,
            ranges: rules.ranges,
            reveal_angle: geometry.reveal_angle,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, range) in self.ranges.named() {
            if !range.is_valid() {
                return Err(ConfigError::InvalidRange {
                    name,
                    lo: range.lo(),
                    hi: range.hi(),
                });
            }
        }

        let accent = ACCENT_COLOR.hex();
        let named_colors = self
            .colors
            .iter()
            .map(|(category, color)| (category.label().to_string(), *color))
            .chain(std::iter::once(("default_color".to_string(), self.default_color)));
        for (key, color) in named_colors {
            if !color.is_valid() {
                return Err(ConfigError::InvalidColor { key });
            }
            if color.hex() == accent {
                return Err(ConfigError::AccentCollision { key });
            }
        }

        if !(self.reveal_angle.is_finite()
            && self.reveal_angle > LABEL_ANGLE_THRESHOLD
            && self.reveal_angle <= 90.0)
        {
            return Err(ConfigError::InvalidRevealAngle(self.reveal_angle));
        }
        Ok(())
    }

    /// Looks up a category color; `None` means the default applies.
    pub fn color_for(&self, category: &Category) -> Option<Rgb> {
        self.colors.get(category).copied()
    }

    /// Color table entries in category order.
    pub fn colors(&self) -> impl Iterator<Item = (&Category, &Rgb)> {
        self.colors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CompositionConfig, CompositionRules, ConfigError, GeometryConstants, Range, DEFAULT_GRAY,
    };
    use crate::layout::ACCENT_COLOR;
    use crate::model::record::Category;
    use serde_json::json;

    #[test]
    fn range_map_clamps_before_scaling() {
        let from = Range(0.0, 0.4);
        let to = Range(-0.8, 0.8);
        assert!((from.map_to(0.2, to) - 0.0).abs() < 1e-12);
        assert_eq!(from.map_to(0.5, to), 0.8);
        assert_eq!(from.map_to(-1.0, to), -0.8);
        assert_eq!(from.map_to(f64::NAN, to), -0.8);
    }

    #[test]
    fn sections_deserialize_with_defaults() {
        let rules: CompositionRules = serde_json::from_value(json!({
            "category_colors": { "health": [0.1, 0.2, 0.3] }
        }))
        .unwrap();
        let geometry: GeometryConstants = serde_json::from_value(json!({})).unwrap();
        let config = CompositionConfig::from_sections(&rules, &geometry).unwrap();

        assert_eq!(config.default_color, DEFAULT_GRAY);
        assert_eq!(config.reveal_angle, 90.0);
        assert_eq!(config.ranges.size, Range(0.02, 0.15));
        assert!(config.color_for(&Category::Health).is_some());
        assert!(config.color_for(&Category::Housing).is_none());
    }

    #[test]
    fn validate_rejects_degenerate_range_and_accent_color() {
        let mut config = CompositionConfig::default();
        config.ranges.depth = Range(1.0, 1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { name: "depth", .. })
        ));

        let mut rules = CompositionRules::default();
        rules
            .category_colors
            .insert("cultural".to_string(), ACCENT_COLOR);
        let err = CompositionConfig::from_sections(&rules, &GeometryConstants::default())
            .expect_err("accent collision must be rejected");
        assert_eq!(
            err,
            ConfigError::AccentCollision {
                key: "cultural".to_string()
            }
        );
    }

    #[test]
    fn validate_rejects_reveal_angle_at_label_threshold() {
        let geometry = GeometryConstants {
            reveal_angle: 20.0,
            ..GeometryConstants::default()
        };
        let err = CompositionConfig::from_sections(&CompositionRules::default(), &geometry)
            .expect_err("threshold angle is not a reveal angle");
        assert_eq!(err, ConfigError::InvalidRevealAngle(20.0));
    }
}
