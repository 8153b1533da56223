//! Derived visual element model.
//!
//! # Invariants
//! - `x`, `y` stay in [-0.8, 0.8], `z` in [0.1, 1.0], `size` in [0.02, 0.15].
//! - Visuals are produced fresh for every render and never mutated in place;
//!   transforms return new values.

use super::record::NailRole;
use serde::{Deserialize, Serialize};

/// Linear RGB color with channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self(r, g, b)
    }

    /// 8-bit channels, rounded.
    pub fn to_u8(self) -> [u8; 3] {
        [channel_u8(self.0), channel_u8(self.1), channel_u8(self.2)]
    }

    /// CSS/SVG functional notation, e.g. `rgb(204, 51, 51)`.
    pub fn css(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("rgb({r}, {g}, {b})")
    }

    /// Hex notation, e.g. `#cc3333`.
    pub fn hex(self) -> String {
        let [r, g, b] = self.to_u8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn is_valid(self) -> bool {
        [self.0, self.1, self.2]
            .iter()
            .all(|channel| channel.is_finite() && (0.0..=1.0).contains(channel))
    }
}

fn channel_u8(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// One renderable element in normalized space (positive y points up).
#[derive(Debug, Clone, PartialEq)]
pub struct DomainVisual {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: Rgb,
    pub size: f64,
    /// At most three labels taken from the record's primary names.
    pub names_text: Vec<String>,
    pub nail_role: NailRole,
    pub tag: String,
}

impl DomainVisual {
    /// Returns a copy placed at new coordinates.
    pub fn moved_to(&self, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn color_strings_are_rounded_and_clamped() {
        let color = Rgb::new(0.8, 0.2, 1.4);
        assert_eq!(color.css(), "rgb(204, 51, 255)");
        assert_eq!(color.hex(), "#cc33ff");
        assert!(!color.is_valid());
        assert!(Rgb::new(0.5, 0.5, 0.5).is_valid());
    }
}
