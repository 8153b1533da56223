//! Human-reproducible painting instructions.
//!
//! # Responsibility
//! - Translate the neutral view into per-element painting steps in physical
//!   canvas units (cm).
//! - Describe the reveal overlay as a separate second pass.
//!
//! # Invariants
//! - Positions, radii, opacities and paint order come from `layout`, the
//!   same functions the SVG renderer uses.
//! - Output is deterministic for identical input.

use crate::config::CompositionConfig;
use crate::layout::{
    depth_order, glow_layers, overlay, CanvasMapping, ACCENT_COLOR, INTERSECTION_MARKER_SCALE,
    OVERLAY_OPACITY,
};
use crate::model::visual::Rgb;
use crate::view::ViewPair;

pub const DEFAULT_CANVAS_CM: f64 = 100.0;

/// Pigment proportions (percent, summing to 100) for one color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PigmentMix {
    pub cyan: f64,
    pub magenta: f64,
    pub yellow: f64,
    pub black: f64,
    pub white: f64,
}

/// Subtractive approximation: CMYK components for hue and depth, plus
/// titanium white for the lightest shared channel.
pub fn pigment_mix(color: Rgb) -> PigmentMix {
    let (r, g, b) = (
        color.0.clamp(0.0, 1.0),
        color.1.clamp(0.0, 1.0),
        color.2.clamp(0.0, 1.0),
    );
    let max = r.max(g).max(b);
    let black = 1.0 - max;
    let (cyan, magenta, yellow) = if max > 0.0 {
        ((max - r) / max, (max - g) / max, (max - b) / max)
    } else {
        (0.0, 0.0, 0.0)
    };
    let white = r.min(g).min(b);

    let total = cyan + magenta + yellow + black + white;
    if total <= 0.0 {
        return PigmentMix {
            cyan: 0.0,
            magenta: 0.0,
            yellow: 0.0,
            black: 0.0,
            white: 100.0,
        };
    }
    let percent = |part: f64| part / total * 100.0;
    PigmentMix {
        cyan: percent(cyan),
        magenta: percent(magenta),
        yellow: percent(yellow),
        black: percent(black),
        white: percent(white),
    }
}

/// Builds the Markdown instruction document for a square canvas of
/// `canvas_cm` centimetres.
pub fn generate_instructions(views: &ViewPair, config: &CompositionConfig, canvas_cm: f64) -> String {
    let mapping = CanvasMapping::square(canvas_cm);
    let mut doc = String::new();

    doc.push_str("# Reproduction instructions\n\n");
    doc.push_str(&format!(
        "Elements: {}. Reveal angle: {}°.\n\n",
        views.normal.visuals.len(),
        views.reveal.angle
    ));

    doc.push_str("## Canvas\n\n");
    doc.push_str(&format!(
        "- Size: {} cm × {} cm.\n- Measure positions from the top-left corner.\n- One normalized unit equals {} cm; the normalized origin is the canvas centre.\n\n",
        cm(mapping.width),
        cm(mapping.height),
        cm(mapping.length(1.0))
    ));

    push_pigments(&mut doc, config);
    push_first_pass(&mut doc, views, mapping);
    push_second_pass(&mut doc, views, mapping);
    doc
}

fn push_pigments(doc: &mut String, config: &CompositionConfig) {
    doc.push_str("## Pigment mixing\n\n");
    doc.push_str("| Category | Color | Cyan % | Magenta % | Yellow % | Black % | White % |\n");
    doc.push_str("|---|---|---|---|---|---|---|\n");
    let rows = config
        .colors()
        .map(|(category, color)| (category.label().to_string(), *color))
        .chain(std::iter::once(("(default)".to_string(), config.default_color)));
    for (label, color) in rows {
        let mix = pigment_mix(color);
        doc.push_str(&format!(
            "| {label} | {} | {:.0} | {:.0} | {:.0} | {:.0} | {:.0} |\n",
            color.hex(),
            mix.cyan,
            mix.magenta,
            mix.yellow,
            mix.black,
            mix.white
        ));
    }
    doc.push('\n');
}

fn push_first_pass(doc: &mut String, views: &ViewPair, mapping: CanvasMapping) {
    doc.push_str("## First pass: neutral composition\n\n");
    if views.normal.is_empty() {
        doc.push_str("No elements to paint.\n\n");
        return;
    }
    doc.push_str("Paint elements in the order listed (back to front). Let each layer dry before the next.\n\n");

    for (index, visual) in depth_order(&views.normal.visuals).into_iter().enumerate() {
        let (left, top) = mapping.to_device(visual.x, visual.y);
        doc.push_str(&format!("### {}. {}\n\n", index + 1, visual.name));
        doc.push_str(&format!(
            "- Centre: {} cm from left, {} cm from top.\n- Color: {} (see pigment table).\n",
            cm(left),
            cm(top),
            visual.color.hex()
        ));
        for (step, layer) in glow_layers(visual.size, visual.z).iter().enumerate() {
            let kind = if layer.solid {
                "solid disk"
            } else {
                "glow ring"
            };
            doc.push_str(&format!(
                "- Layer {}: {kind}, radius {} cm, opacity {:.1}%.\n",
                step + 1,
                cm(mapping.length(layer.radius)),
                layer.opacity * 100.0
            ));
        }
        if !visual.names_text.is_empty() {
            doc.push_str(&format!("- Names: {}.\n", visual.names_text.join(", ")));
        }
        doc.push('\n');
    }
}

fn push_second_pass(doc: &mut String, views: &ViewPair, mapping: CanvasMapping) {
    doc.push_str(&format!(
        "## Second pass: reveal overlay at {}°\n\n",
        views.reveal.angle
    ));
    doc.push_str(&format!(
        "Use {} at {:.0}% opacity. Points are taken from the reveal view.\n\n",
        ACCENT_COLOR.hex(),
        OVERLAY_OPACITY * 100.0
    ));

    let overlay = overlay(&views.reveal.visuals);
    let describe = |points: &[(f64, f64)]| -> String {
        points
            .iter()
            .map(|(x, y)| {
                let (left, top) = mapping.to_device(*x, *y);
                format!("({} cm, {} cm)", cm(left), cm(top))
            })
            .collect::<Vec<_>>()
            .join(" → ")
    };

    if overlay.has_vertical_line() {
        doc.push_str(&format!(
            "- Vertical line, top to bottom: {}.\n",
            describe(&overlay.vertical)
        ));
    } else {
        doc.push_str("- Vertical line: fewer than two vertical elements, skip.\n");
    }
    if overlay.has_horizontal_line() {
        doc.push_str(&format!(
            "- Horizontal line, left to right: {}.\n",
            describe(&overlay.horizontal)
        ));
    } else {
        doc.push_str("- Horizontal line: fewer than two horizontal elements, skip.\n");
    }
    match overlay.intersection {
        Some(pivot) => {
            let (left, top) = mapping.to_device(pivot.x, pivot.y);
            doc.push_str(&format!(
                "- Intersection marker for {}: ring of radius {} cm centred at ({} cm, {} cm), name written below.\n",
                pivot.name,
                cm(mapping.length(pivot.size * INTERSECTION_MARKER_SCALE)),
                cm(left),
                cm(top)
            ));
        }
        None => doc.push_str("- Intersection marker: no intersection element, skip.\n"),
    }
}

fn cm(value: f64) -> String {
    let rounded = format!("{value:.1}");
    if rounded == "-0.0" {
        "0.0".to_string()
    } else {
        rounded
    }
}
