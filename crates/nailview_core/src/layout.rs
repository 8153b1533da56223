//! Shared layout rules for every output format.
//!
//! # Responsibility
//! - Own the normalized -> device coordinate mapping.
//! - Own the glow layering recipe, paint order and reveal overlay geometry.
//!
//! # Invariants
//! - The y axis is flipped exactly once, in `CanvasMapping::to_device`.
//! - The SVG renderer and the instruction generator both call into this
//!   module, so the picture and the written procedure describe one layout.

use crate::model::record::NailRole;
use crate::model::visual::{DomainVisual, Rgb};
use std::cmp::Ordering;

/// Labels and the overlay are only drawn above this angle (degrees).
pub const LABEL_ANGLE_THRESHOLD: f64 = 20.0;

/// Overlay color; category colors must differ from it.
pub const ACCENT_COLOR: Rgb = Rgb::new(1.0, 215.0 / 255.0, 0.0);

pub const OVERLAY_OPACITY: f64 = 0.35;

/// Glow ring radii as multiples of the element size, innermost first.
pub const GLOW_RING_SCALES: [f64; 3] = [2.0, 3.0, 4.0];

/// Marker ring radius around the intersection element, as a multiple of its
/// size.
pub const INTERSECTION_MARKER_SCALE: f64 = 5.0;

/// Whether labels and the reveal overlay are drawn at `angle`.
pub fn reveal_visible(angle: f64) -> bool {
    angle > LABEL_ANGLE_THRESHOLD
}

/// Maps normalized space ([-1, 1], y up) onto a device rectangle (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMapping {
    pub width: f64,
    pub height: f64,
}

impl CanvasMapping {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn square(side: f64) -> Self {
        Self::new(side, side)
    }

    pub fn to_device(&self, x: f64, y: f64) -> (f64, f64) {
        ((x + 1.0) / 2.0 * self.width, (1.0 - y) / 2.0 * self.height)
    }

    /// Converts a normalized length (radius) to device units.
    pub fn length(&self, normalized: f64) -> f64 {
        normalized * self.width / 2.0
    }
}

/// One paint step for an element: a glow ring or the solid disk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowLayer {
    /// Normalized radius.
    pub radius: f64,
    pub opacity: f64,
    /// `true` for the final solid disk.
    pub solid: bool,
}

/// Base opacity of the solid disk: `0.5 + 0.5 z`.
pub fn base_opacity(z: f64) -> f64 {
    0.5 + 0.5 * z
}

/// Paint steps for one element, back to front: three rings then the disk.
pub fn glow_layers(size: f64, z: f64) -> [GlowLayer; 4] {
    let base = base_opacity(z);
    let ring = |index: usize| GlowLayer {
        radius: size * GLOW_RING_SCALES[index],
        opacity: base * 0.1 / (index as f64 + 1.0),
        solid: false,
    };
    [
        ring(0),
        ring(1),
        ring(2),
        GlowLayer {
            radius: size,
            opacity: base,
            solid: true,
        },
    ]
}

/// Elements in paint order: ascending z, ties keep input order.
pub fn depth_order(visuals: &[DomainVisual]) -> Vec<&DomainVisual> {
    let mut ordered: Vec<&DomainVisual> = visuals.iter().collect();
    ordered.sort_by(|a, b| a.z.partial_cmp(&b.z).unwrap_or(Ordering::Equal));
    ordered
}

/// Reveal structure extracted from one transformed view.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay<'a> {
    /// Vertical-role points, descending y.
    pub vertical: Vec<(f64, f64)>,
    /// Horizontal-role points, ascending x.
    pub horizontal: Vec<(f64, f64)>,
    pub intersection: Option<&'a DomainVisual>,
}

impl Overlay<'_> {
    /// A polyline needs at least two points.
    pub fn has_vertical_line(&self) -> bool {
        self.vertical.len() >= 2
    }

    pub fn has_horizontal_line(&self) -> bool {
        self.horizontal.len() >= 2
    }
}

pub fn overlay(visuals: &[DomainVisual]) -> Overlay<'_> {
    let points = |role: NailRole| -> Vec<(f64, f64)> {
        visuals
            .iter()
            .filter(|visual| visual.nail_role == role)
            .map(|visual| (visual.x, visual.y))
            .collect()
    };

    let mut vertical = points(NailRole::Vertical);
    vertical.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    let mut horizontal = points(NailRole::Horizontal);
    horizontal.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    Overlay {
        vertical,
        horizontal,
        intersection: visuals
            .iter()
            .find(|visual| visual.nail_role == NailRole::Intersection),
    }
}

#[cfg(test)]
mod tests {
    use super::{depth_order, glow_layers, overlay, reveal_visible, CanvasMapping};
    use crate::model::record::NailRole;
    use crate::model::visual::{DomainVisual, Rgb};

    fn visual(name: &str, x: f64, y: f64, z: f64, role: NailRole) -> DomainVisual {
        DomainVisual {
            name: name.to_string(),
            x,
            y,
            z,
            color: Rgb::new(0.5, 0.5, 0.5),
            size: 0.05,
            names_text: Vec::new(),
            nail_role: role,
            tag: String::new(),
        }
    }

    #[test]
    fn mapping_flips_y_once() {
        let mapping = CanvasMapping::square(1000.0);
        assert_eq!(mapping.to_device(0.0, 0.0), (500.0, 500.0));
        assert_eq!(mapping.to_device(-1.0, 1.0), (0.0, 0.0));
        assert_eq!(mapping.to_device(1.0, -1.0), (1000.0, 1000.0));
        assert_eq!(mapping.length(0.1), 50.0);
    }

    #[test]
    fn glow_rings_fade_outwards() {
        let layers = glow_layers(0.1, 1.0);
        assert_eq!(layers[0].radius, 0.2);
        assert!((layers[0].opacity - 0.1).abs() < 1e-12);
        assert!((layers[1].opacity - 0.05).abs() < 1e-12);
        assert!((layers[2].radius - 0.4).abs() < 1e-12);
        assert!(layers[3].solid);
        assert_eq!(layers[3].opacity, 1.0);
    }

    #[test]
    fn depth_order_is_stable_ascending_z() {
        let visuals = vec![
            visual("front", 0.0, 0.0, 0.9, NailRole::Peripheral),
            visual("back-a", 0.0, 0.0, 0.2, NailRole::Peripheral),
            visual("back-b", 0.0, 0.0, 0.2, NailRole::Peripheral),
        ];
        let names: Vec<&str> = depth_order(&visuals)
            .into_iter()
            .map(|visual| visual.name.as_str())
            .collect();
        assert_eq!(names, ["back-a", "back-b", "front"]);
    }

    #[test]
    fn overlay_orders_lines_and_finds_pivot() {
        let visuals = vec![
            visual("v-low", 0.01, -0.5, 0.5, NailRole::Vertical),
            visual("h-right", 0.6, 0.02, 0.5, NailRole::Horizontal),
            visual("v-high", 0.02, 0.7, 0.5, NailRole::Vertical),
            visual("h-left", -0.4, 0.01, 0.5, NailRole::Horizontal),
            visual("pivot", 0.0, 0.0, 0.5, NailRole::Intersection),
        ];
        let overlay = overlay(&visuals);
        assert_eq!(overlay.vertical, vec![(0.02, 0.7), (0.01, -0.5)]);
        assert_eq!(overlay.horizontal, vec![(-0.4, 0.01), (0.6, 0.02)]);
        assert_eq!(overlay.intersection.map(|v| v.name.as_str()), Some("pivot"));
        assert!(overlay.has_vertical_line() && overlay.has_horizontal_line());
    }

    #[test]
    fn reveal_threshold_is_exclusive() {
        assert!(!reveal_visible(0.0));
        assert!(!reveal_visible(20.0));
        assert!(reveal_visible(20.5));
    }
}
