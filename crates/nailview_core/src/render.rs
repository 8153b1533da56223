//! SVG composition renderer.
//!
//! # Responsibility
//! - Paint one composed view as a layered SVG document.
//!
//! # Invariants
//! - Elements are painted in ascending z; glow rings precede their disk.
//! - Labels and the reveal overlay only appear above the label threshold.
//! - The overlay is painted last.
//! - Output is byte-stable for identical input.

use crate::layout::{
    depth_order, glow_layers, overlay, reveal_visible, CanvasMapping, ACCENT_COLOR,
    INTERSECTION_MARKER_SCALE, OVERLAY_OPACITY,
};
use crate::model::visual::DomainVisual;
use crate::view::ComposedView;

const BACKGROUND: &str = "#0b0b10";
const LABEL_COLOR: &str = "#e8e8e8";
const OVERLAY_STROKE_WIDTH: f64 = 2.0;

/// Renders `view` onto a canvas described by `mapping`.
///
/// An empty view yields a valid document containing only the background.
pub fn render_svg(view: &ComposedView, mapping: CanvasMapping) -> String {
    let show_reveal = reveal_visible(view.angle);
    let label_size = (mapping.width / 80.0).max(8.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(mapping.width),
        h = num(mapping.height),
    ));
    svg.push('\n');
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" fill=\"{BACKGROUND}\"/>\n",
        num(mapping.width),
        num(mapping.height)
    ));

    svg.push_str("  <g id=\"elements\">\n");
    for visual in depth_order(&view.visuals) {
        push_element(&mut svg, visual, mapping);
        if show_reveal {
            push_labels(&mut svg, visual, mapping, label_size);
        }
    }
    svg.push_str("  </g>\n");

    if show_reveal {
        push_overlay(&mut svg, &view.visuals, mapping, label_size);
    }

    svg.push_str("</svg>\n");
    svg
}

fn push_element(svg: &mut String, visual: &DomainVisual, mapping: CanvasMapping) {
    let (cx, cy) = mapping.to_device(visual.x, visual.y);
    let fill = visual.color.css();
    for layer in glow_layers(visual.size, visual.z) {
        svg.push_str(&format!(
            "    <circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{fill}\" fill-opacity=\"{}\"/>\n",
            num(cx),
            num(cy),
            num(mapping.length(layer.radius)),
            num(layer.opacity),
        ));
    }
}

fn push_labels(svg: &mut String, visual: &DomainVisual, mapping: CanvasMapping, label_size: f64) {
    let (cx, cy) = mapping.to_device(visual.x, visual.y);
    let top = cy - mapping.length(visual.size) - label_size * 0.5;
    for (index, label) in visual.names_text.iter().enumerate() {
        let line_y = top - label_size * 1.2 * (visual.names_text.len() - 1 - index) as f64;
        svg.push_str(&format!(
            "    <text x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{LABEL_COLOR}\" text-anchor=\"middle\">{}</text>\n",
            num(cx),
            num(line_y),
            num(label_size),
            escape_xml(label),
        ));
    }
}

fn push_overlay(
    svg: &mut String,
    visuals: &[DomainVisual],
    mapping: CanvasMapping,
    label_size: f64,
) {
    let overlay = overlay(visuals);
    let accent = ACCENT_COLOR.hex();

    svg.push_str(&format!(
        "  <g id=\"reveal\" stroke=\"{accent}\" stroke-opacity=\"{}\" fill=\"none\">\n",
        num(OVERLAY_OPACITY)
    ));
    for (id, points) in [
        ("vertical", &overlay.vertical),
        ("horizontal", &overlay.horizontal),
    ] {
        if points.len() < 2 {
            continue;
        }
        let path = points
            .iter()
            .map(|(x, y)| {
                let (px, py) = mapping.to_device(*x, *y);
                format!("{},{}", num(px), num(py))
            })
            .collect::<Vec<_>>()
            .join(" ");
        svg.push_str(&format!(
            "    <polyline id=\"{id}\" points=\"{path}\" stroke-width=\"{}\"/>\n",
            num(OVERLAY_STROKE_WIDTH)
        ));
    }

    if let Some(pivot) = overlay.intersection {
        let (cx, cy) = mapping.to_device(pivot.x, pivot.y);
        let radius = mapping.length(pivot.size * INTERSECTION_MARKER_SCALE);
        svg.push_str(&format!(
            "    <circle id=\"intersection\" cx=\"{}\" cy=\"{}\" r=\"{}\" stroke-width=\"{}\"/>\n",
            num(cx),
            num(cy),
            num(radius),
            num(OVERLAY_STROKE_WIDTH)
        ));
        svg.push_str(&format!(
            "    <text x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{accent}\" fill-opacity=\"{}\" stroke=\"none\" text-anchor=\"middle\">{}</text>\n",
            num(cx),
            num(cy + radius + label_size * 1.2),
            num(label_size),
            num(OVERLAY_OPACITY),
            escape_xml(&pivot.name),
        ));
    }
    svg.push_str("  </g>\n");
}

/// Fixed-precision number formatting; trailing zeros are trimmed.
fn num(value: f64) -> String {
    let fixed = format!("{value:.3}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
