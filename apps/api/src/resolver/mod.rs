//! Field value resolution: turns a template field plus the source record into
//! the literal text or image reference to render.

pub mod aliases;

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;

use crate::models::source::SourceRecord;
use crate::models::template::{FieldSpec, SegmentPart, SegmentRef};
use crate::narrative::segments::{parse_segments, SegmentMap};
use crate::render::FieldError;

use aliases::resolve_alias;

/// Prefix of inline-encoded image values.
const INLINE_IMAGE_PREFIX: &str = "data:";
/// Field-name prefix addressing a narrative segment body.
const RESULT_PREFIX: &str = "result.";

/// Where an image field's bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Inline { bytes: Vec<u8>, hint: Option<String> },
    /// Path relative to the storage root.
    Stored { path: String },
}

impl ImageSource {
    /// Encoding hint derived from the MIME type or the file name.
    pub fn hint(&self) -> Option<&str> {
        match self {
            ImageSource::Inline { hint, .. } => hint.as_deref(),
            ImageSource::Stored { path } => Some(path.as_str()),
        }
    }
}

/// Resolver bound to one source record. The narrative is parsed at most once.
pub struct FieldResolver<'a> {
    record: &'a SourceRecord,
    narrative: OnceLock<SegmentMap>,
}

impl<'a> FieldResolver<'a> {
    pub fn new(record: &'a SourceRecord) -> Self {
        Self {
            record,
            narrative: OnceLock::new(),
        }
    }

    pub fn narrative(&self) -> &SegmentMap {
        self.narrative.get_or_init(|| {
            self.record
                .narrative_text()
                .map(|text| parse_segments(&text))
                .unwrap_or_default()
        })
    }

    /// Text value for a field. Missing data resolves to an empty string.
    ///
    /// Order: explicit segment reference, alias table, `result.<key>`, then
    /// the raw record key.
    pub fn resolve_text(&self, field: &FieldSpec, segment: Option<&SegmentRef>) -> String {
        if let Some(segment) = segment {
            return self.segment_part(&segment.key, segment.part);
        }
        if let Some(value) = resolve_alias(&field.name, self.record) {
            return value;
        }
        if let Some(key) = field.name.strip_prefix(RESULT_PREFIX) {
            return self.segment_part(key, SegmentPart::Value);
        }
        self.record.text(&field.name).unwrap_or_default()
    }

    fn segment_part(&self, key: &str, part: SegmentPart) -> String {
        match self.narrative().get(key) {
            Some(segment) => match part {
                SegmentPart::Key => segment.title.clone(),
                SegmentPart::Value => segment.body.clone(),
            },
            None => {
                debug!(segment = key, "narrative segment not present");
                String::new()
            }
        }
    }

    /// Image reference for a field; `Ok(None)` when the record has no value.
    pub fn resolve_image(&self, field: &FieldSpec) -> Result<Option<ImageSource>, FieldError> {
        let keys: &[&str] = match field.name.as_str() {
            "studentPhoto" => &["profile_image", "photo", "student_photo"],
            "signature" => &["signature_image", "signature"],
            "logo" => &["institution_logo", "logo"],
            _ => &[],
        };
        let Some(value) = self
            .record
            .first_text(keys)
            .or_else(|| self.record.text(&field.name))
        else {
            return Ok(None);
        };

        match value.strip_prefix(INLINE_IMAGE_PREFIX) {
            Some(inline) => parse_inline(inline).map(Some),
            None => Ok(Some(ImageSource::Stored {
                path: value.trim_start_matches('/').to_string(),
            })),
        }
    }
}

/// Parses the remainder of `data:<mime>;base64,<payload>`.
fn parse_inline(inline: &str) -> Result<ImageSource, FieldError> {
    let (header, payload) = inline
        .split_once(',')
        .ok_or_else(|| FieldError::InlinePayload("missing ',' separator".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| FieldError::InlinePayload("only base64 payloads are supported".to_string()))?;
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(cleaned)
        .map_err(|e| FieldError::InlinePayload(e.to_string()))?;
    Ok(ImageSource::Inline {
        bytes,
        hint: (!mime.is_empty()).then(|| mime.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::FieldKind;
    use serde_json::{json, Value};

    fn record(value: Value) -> SourceRecord {
        SourceRecord::from_value(value).unwrap()
    }

    fn field(name: &str) -> FieldSpec {
        FieldSpec {
            name: name.to_string(),
            page: 1,
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: None,
            rotation_degrees: 0.0,
            kind: FieldKind::Image,
        }
    }

    fn segment(key: &str, part: SegmentPart) -> SegmentRef {
        SegmentRef {
            key: key.to_string(),
            part,
        }
    }

    const NARRATIVE: &str = "<p>Hello</p><h3>Power match!</h3><p>Your vibe matches X.</p>";

    #[test]
    fn test_segment_reference_selects_title_or_body() {
        let r = record(json!({"result_description": NARRATIVE}));
        let resolver = FieldResolver::new(&r);
        let field = field("anything");
        assert_eq!(
            resolver.resolve_text(&field, Some(&segment("power_match", SegmentPart::Key))),
            "Power match!"
        );
        assert_eq!(
            resolver.resolve_text(&field, Some(&segment("power_match", SegmentPart::Value))),
            "Your vibe matches X."
        );
        assert_eq!(
            resolver.resolve_text(&field, Some(&segment("missing", SegmentPart::Value))),
            ""
        );
    }

    #[test]
    fn test_segment_reference_without_narrative_is_empty() {
        let r = record(json!({"first_name": "Jane"}));
        let resolver = FieldResolver::new(&r);
        assert_eq!(
            resolver.resolve_text(&field("x"), Some(&segment("intro", SegmentPart::Value))),
            ""
        );
    }

    #[test]
    fn test_alias_takes_precedence_over_raw_key() {
        let r = record(json!({"first_name": "Jane", "last_name": "Doe", "studentName": "ignored"}));
        let resolver = FieldResolver::new(&r);
        assert_eq!(resolver.resolve_text(&field("studentName"), None), "Jane Doe");
    }

    #[test]
    fn test_result_prefix_reads_segment_body() {
        let r = record(json!({"description": NARRATIVE}));
        let resolver = FieldResolver::new(&r);
        assert_eq!(resolver.resolve_text(&field("result.intro"), None), "Hello");
        assert_eq!(resolver.resolve_text(&field("result.nope"), None), "");
    }

    #[test]
    fn test_structured_narrative_is_used_directly() {
        let r = record(json!({"result_description": {"summary": {"title": "S", "body": "Solid work"}}}));
        let resolver = FieldResolver::new(&r);
        assert_eq!(resolver.resolve_text(&field("result.summary"), None), "Solid work");
    }

    #[test]
    fn test_raw_passthrough_for_unknown_names() {
        let r = record(json!({"house": "Blue"}));
        let resolver = FieldResolver::new(&r);
        assert_eq!(resolver.resolve_text(&field("house"), None), "Blue");
        assert_eq!(resolver.resolve_text(&field("missing"), None), "");
    }

    #[test]
    fn test_image_alias_resolves_stored_path() {
        let r = record(json!({"profile_image": "/uploads/students/17.png"}));
        let resolver = FieldResolver::new(&r);
        assert_eq!(
            resolver.resolve_image(&field("studentPhoto")).unwrap(),
            Some(ImageSource::Stored {
                path: "uploads/students/17.png".to_string()
            })
        );
    }

    #[test]
    fn test_inline_image_payload_is_decoded() {
        let encoded = STANDARD.encode(b"\x89PNG\r\n\x1a\nrest");
        let r = record(json!({"signature_image": format!("data:image/png;base64,{encoded}")}));
        let resolver = FieldResolver::new(&r);
        let source = resolver.resolve_image(&field("signature")).unwrap().unwrap();
        assert_eq!(source.hint(), Some("image/png"));
        let ImageSource::Inline { bytes, .. } = source else {
            panic!("expected inline payload");
        };
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_malformed_inline_payload_is_a_field_error() {
        let r = record(json!({"logo": "data:image/png;base64,@@@"}));
        let resolver = FieldResolver::new(&r);
        assert!(matches!(
            resolver.resolve_image(&field("logo")),
            Err(FieldError::InlinePayload(_))
        ));
    }

    #[test]
    fn test_missing_image_value_is_none() {
        let r = record(json!({}));
        let resolver = FieldResolver::new(&r);
        assert_eq!(resolver.resolve_image(&field("logo")).unwrap(), None);
    }
}
