//! Role-conditional perspective transform.
//!
//! # Responsibility
//! - Pull baseline coordinates toward the hidden cross as the angle grows.
//!
//! # Invariants
//! - Angle 0 is the identity for every role.
//! - `Intersection` always lands on the origin.
//! - At any angle in [0, 90], vertical elements never move away from x = 0
//!   and horizontal elements never move away from y = 0.
//! - The coordinate along a role's own bar is left alone, so elements on the
//!   same bar keep their order and spacing in the reveal view.
//! - Results are clamped into the coordinate range.

use crate::config::Range;
use crate::model::record::NailRole;
use crate::model::visual::DomainVisual;

/// Weight of the pull toward the cross bar.
const PRIMARY_PULL: f64 = 0.6;
/// Drift applied to peripheral elements.
const PERIPHERAL_DRIFT: f64 = 0.1;

/// Transforms one coordinate pair for `role` at `angle_degrees`.
pub fn transform_point(
    x: f64,
    y: f64,
    role: NailRole,
    angle_degrees: f64,
    bounds: Range,
) -> (f64, f64) {
    let sin = angle_degrees.to_radians().sin();

    let (tx, ty) = match role {
        NailRole::Vertical => (x - x * sin * PRIMARY_PULL, y),
        NailRole::Horizontal => (x, y - y * sin * PRIMARY_PULL),
        NailRole::Intersection => (0.0, 0.0),
        NailRole::Peripheral => {
            let factor = 1.0 - PERIPHERAL_DRIFT * sin;
            (x * factor, y * factor)
        }
    };
    (bounds.clamp(tx), bounds.clamp(ty))
}

/// Returns a new visual seen from `angle_degrees`; z, color and size pass
/// through unchanged.
pub fn transform_visual(visual: &DomainVisual, angle_degrees: f64, bounds: Range) -> DomainVisual {
    let (x, y) = transform_point(visual.x, visual.y, visual.nail_role, angle_degrees, bounds);
    visual.moved_to(x, y)
}
