//! Template configuration: the stored row, the two accepted JSON shapes and
//! the normalized form the renderer consumes.
//!
//! Older admin tooling saved `{textFields: [...], imageFields: [...]}`; the
//! current one saves a single tagged `{fields: [...]}` list. Both are
//! normalized once, when the row is read, into `TemplateConfig`. Fields are
//! read one at a time: a field that fails to parse is dropped with a warning
//! and never takes the rest of the template down with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use thiserror::Error;
use tracing::warn;

use crate::layout::font_metrics::{FontFace, FontFamily, FontWeight};

pub const DEFAULT_FONT_SIZE_PT: f32 = 12.0;
pub const DEFAULT_FIELD_WIDTH_PT: f32 = 200.0;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateConfigRow {
    pub id: i64,
    pub test_id: i64,
    pub base_document_path: String,
    pub config: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Normalized configuration
// ────────────────────────────────────────────────────────────────────────────

/// Immutable snapshot of one template, read fresh for every generation.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateConfig {
    pub template_id: i64,
    pub test_id: i64,
    pub base_document_ref: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    /// 1-based page index as configured. Values outside the base document,
    /// zero and negatives included, are rejected when the field is drawn.
    pub page: i64,
    /// Top-left origin, in points.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: Option<f32>,
    pub rotation_degrees: f32,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(TextStyle),
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font: FontFace,
    pub font_size_pt: f32,
    pub color: Rgb,
    pub align: TextAlign,
    pub segment: Option<SegmentRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" | "middle" => TextAlign::Center,
            "right" | "end" => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

/// Addresses one part of a narrative segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub key: String,
    pub part: SegmentPart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentPart {
    /// The segment title.
    Key,
    /// The segment body.
    Value,
}

/// Fill colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Parses `#rgb` or `#rrggbb` (leading `#` optional). Anything else is black.
    pub fn from_hex(hex: &str) -> Self {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Rgb::BLACK;
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Rgb::BLACK,
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        match (channel(0), channel(2), channel(4)) {
            (Some(r), Some(g), Some(b)) => Rgb { r, g, b },
            _ => Rgb::BLACK,
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::BLACK
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stored JSON shapes
// ────────────────────────────────────────────────────────────────────────────

/// Why a stored configuration cannot be normalized at all. Problems with
/// individual fields never end up here; those fields are skipped.
#[derive(Debug, Error)]
pub enum TemplateShapeError {
    #[error("configuration must be a JSON object")]
    NotAnObject,

    #[error("configuration has neither `fields` nor `textFields`/`imageFields`")]
    NoFieldList,

    #[error("`{0}` must be an array")]
    NotAnArray(&'static str),
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawFieldKind {
    Text,
    Image,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    name: String,
    #[serde(default, alias = "type")]
    kind: Option<RawFieldKind>,
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    height: Option<f32>,
    #[serde(default, alias = "rotationDegrees")]
    rotation: f32,
    #[serde(default)]
    font_family: Option<String>,
    #[serde(default, alias = "fontSizePt")]
    font_size: Option<f32>,
    #[serde(default)]
    font_weight: Option<Value>,
    #[serde(default, alias = "colorHex")]
    color: Option<String>,
    #[serde(default)]
    text_align: Option<String>,
    #[serde(default)]
    segment_key: Option<String>,
    #[serde(default)]
    segment_part: Option<String>,
}

fn default_page() -> i64 {
    1
}

impl RawField {
    fn normalize(self, fallback_kind: RawFieldKind) -> FieldSpec {
        let kind = match self.kind.unwrap_or(fallback_kind) {
            RawFieldKind::Image => FieldKind::Image,
            RawFieldKind::Text => FieldKind::Text(self.text_style()),
        };
        FieldSpec {
            name: self.name,
            page: self.page,
            x: self.x,
            y: self.y,
            width: self.width.unwrap_or(DEFAULT_FIELD_WIDTH_PT),
            height: self.height.filter(|h| *h > 0.0),
            rotation_degrees: self.rotation,
            kind,
        }
    }

    fn text_style(&self) -> TextStyle {
        let family = self
            .font_family
            .as_deref()
            .map(FontFamily::from_name)
            .unwrap_or(FontFamily::Sans);
        let weight = match &self.font_weight {
            Some(Value::String(s)) => FontWeight::from_css(s),
            Some(Value::Number(n)) => FontWeight::from_css(&n.to_string()),
            _ => FontWeight::Regular,
        };
        let segment = self
            .segment_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| SegmentRef {
                key: key.to_string(),
                part: match self.segment_part.as_deref().map(str::trim) {
                    Some("key") | Some("title") => SegmentPart::Key,
                    _ => SegmentPart::Value,
                },
            });

        TextStyle {
            font: FontFace::new(family, weight),
            font_size_pt: self
                .font_size
                .filter(|size| *size > 0.0)
                .unwrap_or(DEFAULT_FONT_SIZE_PT),
            color: self.color.as_deref().map(Rgb::from_hex).unwrap_or_default(),
            align: self
                .text_align
                .as_deref()
                .map(TextAlign::from_name)
                .unwrap_or_default(),
            segment,
        }
    }
}

/// Looks up the first present, non-null key among `keys`.
fn field_list<'a>(
    object: &'a Map<String, Value>,
    keys: &[&'static str],
) -> Result<Option<&'a [Value]>, TemplateShapeError> {
    let Some((key, value)) = keys
        .iter()
        .find_map(|key| object.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
    else {
        return Ok(None);
    };
    value
        .as_array()
        .map(|list| Some(list.as_slice()))
        .ok_or(TemplateShapeError::NotAnArray(key))
}

/// Normalizes one stored field. A field that does not deserialize is logged
/// and dropped so the rest of the template still renders.
fn normalize_field(
    template_id: i64,
    index: usize,
    value: &Value,
    fallback_kind: RawFieldKind,
) -> Option<FieldSpec> {
    match RawField::deserialize(value) {
        Ok(raw) => Some(raw.normalize(fallback_kind)),
        Err(e) => {
            let name = value
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("<unnamed>");
            warn!(template_id, field = name, index, error = %e, "template field skipped");
            None
        }
    }
}

impl TemplateConfig {
    /// Normalizes a stored row into the renderer's configuration model.
    ///
    /// The shape is chosen by key: a `fields` list is the unified form,
    /// otherwise `textFields` / `imageFields` (or their snake_case spellings)
    /// are read as the legacy form.
    pub fn from_row(row: &TemplateConfigRow) -> Result<Self, TemplateShapeError> {
        let object = row
            .config
            .as_object()
            .ok_or(TemplateShapeError::NotAnObject)?;

        let lists: Vec<(&[Value], RawFieldKind)> =
            if let Some(fields) = field_list(object, &["fields"])? {
                vec![(fields, RawFieldKind::Text)]
            } else {
                let text = field_list(object, &["textFields", "text_fields"])?;
                let image = field_list(object, &["imageFields", "image_fields"])?;
                if text.is_none() && image.is_none() {
                    return Err(TemplateShapeError::NoFieldList);
                }
                [(text, RawFieldKind::Text), (image, RawFieldKind::Image)]
                    .into_iter()
                    .filter_map(|(list, kind)| list.map(|list| (list, kind)))
                    .collect()
            };

        let fields = lists
            .into_iter()
            .flat_map(|(list, kind)| list.iter().enumerate().map(move |(i, v)| (i, v, kind)))
            .filter_map(|(index, value, kind)| normalize_field(row.id, index, value, kind))
            .collect();

        Ok(TemplateConfig {
            template_id: row.id,
            test_id: row.test_id,
            base_document_ref: row.base_document_path.clone(),
            fields,
        })
    }
}
