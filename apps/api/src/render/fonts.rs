//! Font library and per-document font embedding.
//!
//! `FontLibrary` is built once at startup and shared immutably: it holds the
//! optional custom TrueType faces and their measured widths. Each generation
//! then embeds the faces its template needs into its own document through
//! `DocumentFonts`; embedded objects are never shared between documents.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use rusttype::{Font, Scale};
use tracing::{debug, info, warn};

use crate::layout::font_metrics::{
    get_metrics, FontFace, FontFamily, FontWeight, GlyphMetrics, MeasuredWidths, StandardFont,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomFont {
    PoppinsRegular,
    PoppinsBold,
    PlayfairRegular,
    PlayfairBold,
}

impl CustomFont {
    pub const ALL: [CustomFont; 4] = [
        CustomFont::PoppinsRegular,
        CustomFont::PoppinsBold,
        CustomFont::PlayfairRegular,
        CustomFont::PlayfairBold,
    ];

    pub fn for_face(face: FontFace) -> Option<Self> {
        match (face.family, face.weight) {
            (FontFamily::Poppins, FontWeight::Regular) => Some(CustomFont::PoppinsRegular),
            (FontFamily::Poppins, FontWeight::Bold) => Some(CustomFont::PoppinsBold),
            (FontFamily::Playfair, FontWeight::Regular) => Some(CustomFont::PlayfairRegular),
            (FontFamily::Playfair, FontWeight::Bold) => Some(CustomFont::PlayfairBold),
            _ => None,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            CustomFont::PoppinsRegular => "Poppins-Regular.ttf",
            CustomFont::PoppinsBold => "Poppins-Bold.ttf",
            CustomFont::PlayfairRegular => "PlayfairDisplay-Regular.ttf",
            CustomFont::PlayfairBold => "PlayfairDisplay-Bold.ttf",
        }
    }

    pub fn base_font_name(&self) -> &'static str {
        match self {
            CustomFont::PoppinsRegular => "Poppins-Regular",
            CustomFont::PoppinsBold => "Poppins-Bold",
            CustomFont::PlayfairRegular => "PlayfairDisplay-Regular",
            CustomFont::PlayfairBold => "PlayfairDisplay-Bold",
        }
    }
}

/// A parsed custom face with the metrics the PDF font dictionary needs.
pub struct LoadedFace {
    bytes: Arc<Vec<u8>>,
    widths: Arc<MeasuredWidths>,
    /// Thousandths of an em.
    ascent: i64,
    descent: i64,
}

impl LoadedFace {
    /// Parses a TrueType blob and measures the WinAnsi range. `None` when the
    /// bytes are not a usable font.
    pub fn parse(bytes: Vec<u8>) -> Option<Self> {
        let font = Font::try_from_vec(bytes.clone())?;
        let units_per_em = f32::from(font.units_per_em());
        let v_metrics = font.v_metrics_unscaled();
        let extent = v_metrics.ascent - v_metrics.descent;
        if units_per_em <= 0.0 || extent <= 0.0 {
            return None;
        }

        // Scaling by the ascent-descent extent yields advances in font units.
        let scale = Scale::uniform(extent);
        let mut widths = [0.0_f32; 224];
        for (offset, slot) in widths.iter_mut().enumerate() {
            let c = char::from(MeasuredWidths::FIRST_CHAR + offset as u8);
            *slot = font.glyph(c).scaled(scale).h_metrics().advance_width / units_per_em;
        }

        let thousandths = |v: f32| (v / units_per_em * 1000.0).round() as i64;
        Some(Self {
            bytes: Arc::new(bytes),
            widths: Arc::new(MeasuredWidths::new(widths)),
            ascent: thousandths(v_metrics.ascent),
            descent: thousandths(v_metrics.descent),
        })
    }
}

/// What a requested face actually draws with.
pub enum FontChoice<'a> {
    Custom(CustomFont, &'a LoadedFace),
    Standard(StandardFont),
}

#[derive(Default)]
pub struct FontLibrary {
    custom: HashMap<CustomFont, LoadedFace>,
}

impl FontLibrary {
    /// Reads every known custom face from `dir`. Missing or unparsable files
    /// degrade to the standard face of the same classification.
    pub async fn load(dir: &Path) -> Self {
        let mut custom = HashMap::new();
        for font in CustomFont::ALL {
            let path = dir.join(font.file_name());
            match tokio::fs::read(&path).await {
                Ok(bytes) => match LoadedFace::parse(bytes) {
                    Some(face) => {
                        debug!(font = font.base_font_name(), "custom font loaded");
                        custom.insert(font, face);
                    }
                    None => warn!(
                        path = %path.display(),
                        "custom font could not be parsed; using standard fallback"
                    ),
                },
                Err(e) => warn!(
                    path = %path.display(),
                    "custom font unavailable ({e}); using standard fallback"
                ),
            }
        }
        info!("Font library ready ({} custom faces)", custom.len());
        Self { custom }
    }

    /// Library with only the standard PDF faces.
    #[cfg(test)]
    pub fn standard_only() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_blobs(blobs: impl IntoIterator<Item = (CustomFont, Vec<u8>)>) -> Self {
        let custom = blobs
            .into_iter()
            .filter_map(|(font, bytes)| LoadedFace::parse(bytes).map(|face| (font, face)))
            .collect();
        Self { custom }
    }

    pub fn resolve(&self, face: FontFace) -> FontChoice<'_> {
        CustomFont::for_face(face)
            .and_then(|font| self.custom.get(&font).map(|loaded| FontChoice::Custom(font, loaded)))
            .unwrap_or_else(|| FontChoice::Standard(face.standard_fallback()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Per-document embedding
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct EmbeddedFont {
    pub resource_name: String,
    pub object_id: ObjectId,
    pub metrics: GlyphMetrics,
}

/// Fonts embedded into one document, keyed by requested face.
#[derive(Default)]
pub struct DocumentFonts {
    by_face: HashMap<FontFace, EmbeddedFont>,
    by_base_font: HashMap<String, EmbeddedFont>,
}

impl DocumentFonts {
    pub fn embed_all(
        doc: &mut Document,
        library: &FontLibrary,
        faces: impl IntoIterator<Item = FontFace>,
    ) -> Self {
        let mut fonts = Self::default();
        for face in faces {
            fonts.embed(doc, library, face);
        }
        fonts
    }

    /// Embeds `face` unless it (or the face it resolves to) already is.
    pub fn embed(&mut self, doc: &mut Document, library: &FontLibrary, face: FontFace) -> EmbeddedFont {
        if let Some(existing) = self.by_face.get(&face) {
            return existing.clone();
        }

        let (base_font, metrics) = match library.resolve(face) {
            FontChoice::Custom(font, loaded) => (
                font.base_font_name().to_string(),
                GlyphMetrics::Measured(Arc::clone(&loaded.widths)),
            ),
            FontChoice::Standard(standard) => (
                standard.base_font_name().to_string(),
                GlyphMetrics::Table(get_metrics(standard)),
            ),
        };

        let embedded = match self.by_base_font.get(&base_font) {
            Some(existing) => existing.clone(),
            None => {
                let object_id = match library.resolve(face) {
                    FontChoice::Custom(font, loaded) => embed_truetype(doc, font, loaded),
                    FontChoice::Standard(standard) => embed_standard(doc, standard),
                };
                let embedded = EmbeddedFont {
                    resource_name: format!("RgF{}", self.by_base_font.len() + 1),
                    object_id,
                    metrics,
                };
                self.by_base_font.insert(base_font, embedded.clone());
                embedded
            }
        };
        self.by_face.insert(face, embedded.clone());
        embedded
    }
}

fn embed_standard(doc: &mut Document, font: StandardFont) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(font.base_font_name().as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    })
}

fn embed_truetype(doc: &mut Document, font: CustomFont, face: &LoadedFace) -> ObjectId {
    let base_font = Object::Name(font.base_font_name().as_bytes().to_vec());

    let mut file = Stream::new(
        dictionary! { "Length1" => face.bytes.len() as i64 },
        face.bytes.as_ref().clone(),
    );
    let _ = file.compress();
    let file_id = doc.add_object(file);

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => base_font.clone(),
        // Nonsymbolic: glyphs are looked up through the standard encoding.
        "Flags" => 32_i64,
        "FontBBox" => vec![0_i64.into(), face.descent.into(), 1000_i64.into(), face.ascent.into()],
        "ItalicAngle" => 0_i64,
        "Ascent" => face.ascent,
        "Descent" => face.descent,
        "CapHeight" => face.ascent,
        "StemV" => 80_i64,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = face
        .widths
        .pdf_widths()
        .into_iter()
        .map(Object::Integer)
        .collect();

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => base_font,
        "FirstChar" => i64::from(MeasuredWidths::FIRST_CHAR),
        "LastChar" => i64::from(MeasuredWidths::LAST_CHAR),
        "Widths" => widths,
        "FontDescriptor" => descriptor_id,
        "Encoding" => "WinAnsiEncoding",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_family_without_bytes_falls_back() {
        let library = FontLibrary::standard_only();
        let face = FontFace::new(FontFamily::Playfair, FontWeight::Bold);
        assert!(matches!(
            library.resolve(face),
            FontChoice::Standard(StandardFont::TimesBold)
        ));
    }

    #[test]
    fn test_unparsable_blob_is_ignored() {
        let library = FontLibrary::from_blobs([(CustomFont::PoppinsRegular, b"nope".to_vec())]);
        let face = FontFace::new(FontFamily::Poppins, FontWeight::Regular);
        assert!(matches!(
            library.resolve(face),
            FontChoice::Standard(StandardFont::Helvetica)
        ));
    }

    #[tokio::test]
    async fn test_load_from_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let library = FontLibrary::load(dir.path()).await;
        assert!(library.custom.is_empty());
    }

    #[test]
    fn test_faces_sharing_a_base_font_share_one_object() {
        let mut doc = Document::with_version("1.5");
        let library = FontLibrary::standard_only();
        let sans = FontFace::new(FontFamily::Sans, FontWeight::Regular);
        let poppins = FontFace::new(FontFamily::Poppins, FontWeight::Regular);
        let serif = FontFace::new(FontFamily::Serif, FontWeight::Regular);

        let mut fonts = DocumentFonts::embed_all(&mut doc, &library, [sans, poppins, serif]);
        let objects_after_embedding = doc.objects.len();

        let a = fonts.embed(&mut doc, &library, sans);
        let b = fonts.embed(&mut doc, &library, poppins);
        let c = fonts.embed(&mut doc, &library, serif);
        assert_eq!(doc.objects.len(), objects_after_embedding);
        assert_eq!(a.object_id, b.object_id);
        assert_ne!(a.object_id, c.object_id);
        assert_ne!(a.resource_name, c.resource_name);

        let base_font = |id: ObjectId| {
            doc.get_dictionary(id)
                .unwrap()
                .get(b"BaseFont")
                .and_then(Object::as_name)
                .unwrap()
                .to_vec()
        };
        assert_eq!(base_font(a.object_id), b"Helvetica");
        assert_eq!(base_font(c.object_id), b"Times-Roman");
    }

    #[test]
    fn test_standard_font_dictionary_uses_win_ansi() {
        let mut doc = Document::with_version("1.5");
        let id = embed_standard(&mut doc, StandardFont::CourierBold);
        let dict = doc.get_dictionary(id).unwrap();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Courier-Bold");
        assert_eq!(dict.get(b"Encoding").unwrap().as_name().unwrap(), b"WinAnsiEncoding");
    }
}
