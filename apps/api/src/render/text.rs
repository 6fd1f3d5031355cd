//! Text compositor: sanitize, wrap, truncate and draw a value inside a field box.

use lopdf::content::Operation;
use lopdf::{Object, StringFormat};

use crate::layout::sanitize::{encode_win_ansi, sanitize_text};
use crate::layout::wrap::{line_height, max_lines, wrap_text};
use crate::models::template::{FieldSpec, TextAlign, TextStyle};
use crate::render::fonts::EmbeddedFont;
use crate::render::page::PageCanvas;

/// One line as it was placed on the page, in visual coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
}

/// Configured rotation is clockwise-positive; PDF angles are
/// counter-clockwise, so the sign is inverted before drawing.
pub fn render_angle(rotation_degrees: f32) -> f32 {
    -rotation_degrees
}

/// Lays out `value` for `field` without drawing anything.
pub fn layout_lines(
    field: &FieldSpec,
    style: &TextStyle,
    font: &EmbeddedFont,
    page_height: f32,
    value: &str,
) -> Vec<PlacedLine> {
    let text = sanitize_text(value);
    if text.is_empty() {
        return Vec::new();
    }

    let size = style.font_size_pt;
    let mut lines = wrap_text(&text, &font.metrics, size, field.width);
    if let Some(height) = field.height {
        lines.truncate(max_lines(height, size));
    }

    let advance = line_height(size);
    lines
        .into_iter()
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
        .map(|(index, line)| {
            let width = font.metrics.width_pt(&line, size);
            let x = match style.align {
                TextAlign::Left => field.x,
                TextAlign::Center => field.x + (field.width - width) / 2.0,
                TextAlign::Right => field.x + field.width - width,
            };
            let y = page_height - field.y - index as f32 * advance;
            PlacedLine {
                text: line,
                x,
                y,
                width,
            }
        })
        .collect()
}

/// Draws `value` onto the canvas. Returns the placed lines; empty when the
/// value sanitizes to nothing.
pub fn draw_text(
    canvas: &mut PageCanvas,
    field: &FieldSpec,
    style: &TextStyle,
    font: &EmbeddedFont,
    value: &str,
) -> Vec<PlacedLine> {
    let placed = layout_lines(field, style, font, canvas.geometry.visual_height(), value);
    if placed.is_empty() {
        return placed;
    }

    canvas.use_font(&font.resource_name, font.object_id);

    let theta = render_angle(field.rotation_degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    let color = style.color;

    for line in &placed {
        canvas.push(Operation::new("BT", vec![]));
        canvas.push(Operation::new(
            "Tf",
            vec![font.resource_name.as_str().into(), style.font_size_pt.into()],
        ));
        canvas.push(Operation::new(
            "rg",
            vec![color.r.into(), color.g.into(), color.b.into()],
        ));
        canvas.push(Operation::new(
            "Tm",
            vec![
                cos.into(),
                sin.into(),
                (-sin).into(),
                cos.into(),
                line.x.into(),
                line.y.into(),
            ],
        ));
        canvas.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(&line.text), StringFormat::Literal)],
        ));
        canvas.push(Operation::new("ET", vec![]));
    }

    placed
}
