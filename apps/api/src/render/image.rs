//! Image compositor: embed a PNG or JPEG as an image XObject and place it in
//! a field box, rotating around the box centre.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{ExtendedColorType, ImageDecoder, ImageFormat};
use lopdf::content::Operation;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::models::template::FieldSpec;
use crate::render::page::PageCanvas;
use crate::render::text::render_angle;
use crate::render::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Png,
    Jpeg,
}

impl ImageEncoding {
    /// Uses the content hint (MIME type or file name) first, then the
    /// payload's magic bytes.
    pub fn detect(hint: Option<&str>, bytes: &[u8]) -> Option<Self> {
        let from_hint = hint.and_then(|hint| {
            let hint = hint.trim().to_ascii_lowercase();
            if hint.ends_with("png") {
                Some(ImageEncoding::Png)
            } else if hint.ends_with("jpeg") || hint.ends_with("jpg") {
                Some(ImageEncoding::Jpeg)
            } else {
                None
            }
        });
        from_hint.or_else(|| {
            if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
                Some(ImageEncoding::Png)
            } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
                Some(ImageEncoding::Jpeg)
            } else {
                None
            }
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EmbeddedImage {
    pub object_id: ObjectId,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl EmbeddedImage {
    /// Box height for a field; a missing height keeps the aspect ratio.
    pub fn draw_height(&self, field: &FieldSpec) -> f32 {
        field.height.unwrap_or_else(|| {
            if self.pixel_width == 0 {
                field.width
            } else {
                field.width * self.pixel_height as f32 / self.pixel_width as f32
            }
        })
    }
}

/// Adds the image to the document as an XObject.
pub fn embed_image(
    doc: &mut Document,
    bytes: &[u8],
    encoding: ImageEncoding,
) -> Result<EmbeddedImage, FieldError> {
    match encoding {
        ImageEncoding::Jpeg => embed_jpeg(doc, bytes),
        ImageEncoding::Png => {
            let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
                .map_err(|e| FieldError::ImageDecode(e.to_string()))?;
            Ok(embed_raster(doc, &decoded))
        }
    }
}

/// Gray and RGB JPEGs are embedded as-is; other colour models are decoded
/// and re-embedded as RGB.
fn embed_jpeg(doc: &mut Document, bytes: &[u8]) -> Result<EmbeddedImage, FieldError> {
    let decoder =
        JpegDecoder::new(Cursor::new(bytes)).map_err(|e| FieldError::ImageDecode(e.to_string()))?;
    let (width, height) = decoder.dimensions();
    let color_space = match decoder.original_color_type() {
        ExtendedColorType::L8 => Some("DeviceGray"),
        ExtendedColorType::Rgb8 => Some("DeviceRGB"),
        _ => None,
    };

    let Some(color_space) = color_space else {
        let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
            .map_err(|e| FieldError::ImageDecode(e.to_string()))?;
        return Ok(embed_raster(doc, &decoded));
    };

    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8_i64,
            "Filter" => "DCTDecode",
        },
        bytes.to_vec(),
    );
    Ok(EmbeddedImage {
        object_id: doc.add_object(stream),
        pixel_width: width,
        pixel_height: height,
    })
}

/// Embeds decoded pixels as flate-compressed RGB, with an alpha soft mask
/// when the image has transparency.
fn embed_raster(doc: &mut Document, decoded: &image::DynamicImage) -> EmbeddedImage {
    let (width, height) = (decoded.width(), decoded.height());

    let smask_id = decoded.color().has_alpha().then(|| {
        let alpha: Vec<u8> = decoded.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mut mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8_i64,
            },
            alpha,
        );
        let _ = mask.compress();
        doc.add_object(mask)
    });

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8_i64,
    };
    if let Some(mask_id) = smask_id {
        dict.set("SMask", mask_id);
    }
    let mut stream = Stream::new(dict, decoded.to_rgb8().into_raw());
    let _ = stream.compress();

    EmbeddedImage {
        object_id: doc.add_object(stream),
        pixel_width: width,
        pixel_height: height,
    }
}

/// Placement matrix for the unit image square.
///
/// The box is converted from top-left to bottom-left origin, then rotated by
/// the inverted configured angle with the origin offset so the box centre
/// stays fixed.
pub fn image_matrix(field: &FieldSpec, draw_height: f32, page_height: f32) -> [f32; 6] {
    let (w, h) = (field.width, draw_height);
    let x = field.x;
    let y = page_height - field.y - h;

    let theta = render_angle(field.rotation_degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    let x0 = x + w / 2.0 - (w / 2.0 * cos - h / 2.0 * sin);
    let y0 = y + h / 2.0 - (w / 2.0 * sin + h / 2.0 * cos);

    [w * cos, w * sin, -h * sin, h * cos, x0, y0]
}

pub fn draw_image(
    canvas: &mut PageCanvas,
    field: &FieldSpec,
    image: &EmbeddedImage,
    resource_name: &str,
) -> [f32; 6] {
    let matrix = image_matrix(field, image.draw_height(field), canvas.geometry.visual_height());
    canvas.use_xobject(resource_name, image.object_id);
    canvas.push(Operation::new("q", vec![]));
    canvas.push(Operation::new(
        "cm",
        matrix.iter().map(|v| Object::from(*v)).collect(),
    ));
    canvas.push(Operation::new("Do", vec![resource_name.into()]));
    canvas.push(Operation::new("Q", vec![]));
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::FieldKind;
    use crate::test_support::{tiny_jpeg, tiny_png};

    fn field(width: f32, height: Option<f32>, rotation: f32) -> FieldSpec {
        FieldSpec {
            name: "studentPhoto".to_string(),
            page: 1,
            x: 100.0,
            y: 50.0,
            width,
            height,
            rotation_degrees: rotation,
            kind: FieldKind::Image,
        }
    }

    fn apply(m: [f32; 6], u: f32, v: f32) -> (f32, f32) {
        (m[0] * u + m[2] * v + m[4], m[1] * u + m[3] * v + m[5])
    }

    #[test]
    fn test_detect_prefers_hint_then_magic_bytes() {
        assert_eq!(ImageEncoding::detect(Some("image/png"), b""), Some(ImageEncoding::Png));
        assert_eq!(ImageEncoding::detect(Some("photo.JPG"), b""), Some(ImageEncoding::Jpeg));
        assert_eq!(
            ImageEncoding::detect(None, &tiny_png(2, 2, true)),
            Some(ImageEncoding::Png)
        );
        assert_eq!(ImageEncoding::detect(None, &tiny_jpeg(2, 2)), Some(ImageEncoding::Jpeg));
        assert_eq!(ImageEncoding::detect(Some("image/gif"), b"GIF89a"), None);
    }

    #[test]
    fn test_unrotated_matrix_converts_top_left_origin() {
        let m = image_matrix(&field(80.0, Some(40.0), 0.0), 40.0, 842.0);
        assert_eq!(m, [80.0, 0.0, 0.0, 40.0, 100.0, 842.0 - 50.0 - 40.0]);
    }

    #[test]
    fn test_rotation_pivots_around_center() {
        let f = field(80.0, Some(40.0), 30.0);
        let m = image_matrix(&f, 40.0, 842.0);
        let (cx, cy) = apply(m, 0.5, 0.5);
        assert!((cx - 140.0).abs() < 1e-3);
        assert!((cy - (842.0 - 50.0 - 20.0)).abs() < 1e-3);

        // Configured +30 renders as -30 (clockwise).
        let angle = m[1].atan2(m[0]).to_degrees();
        assert!((angle + 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_png_with_alpha_gets_soft_mask() {
        let mut doc = Document::with_version("1.5");
        let image = embed_image(&mut doc, &tiny_png(4, 2, true), ImageEncoding::Png).unwrap();
        assert_eq!((image.pixel_width, image.pixel_height), (4, 2));
        let stream = doc.get_object(image.object_id).unwrap().as_stream().unwrap();
        assert!(stream.dict.get(b"SMask").is_ok());
    }

    #[test]
    fn test_jpeg_is_embedded_as_dct() {
        let mut doc = Document::with_version("1.5");
        let image = embed_image(&mut doc, &tiny_jpeg(3, 5), ImageEncoding::Jpeg).unwrap();
        let stream = doc.get_object(image.object_id).unwrap().as_stream().unwrap();
        assert_eq!(stream.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!((image.pixel_width, image.pixel_height), (3, 5));
    }

    #[test]
    fn test_missing_height_keeps_aspect_ratio() {
        let image = EmbeddedImage {
            object_id: (1, 0),
            pixel_width: 200,
            pixel_height: 100,
        };
        assert_eq!(image.draw_height(&field(80.0, None, 0.0)), 40.0);
        assert_eq!(image.draw_height(&field(80.0, Some(10.0), 0.0)), 10.0);
    }

    #[test]
    fn test_corrupt_png_is_a_decode_error() {
        let mut doc = Document::with_version("1.5");
        assert!(matches!(
            embed_image(&mut doc, b"\x89PNG\r\n\x1a\ngarbage", ImageEncoding::Png),
            Err(FieldError::ImageDecode(_))
        ));
    }
}
