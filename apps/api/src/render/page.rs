//! Base-document handling: page geometry, per-page drawing canvases and the
//! final merge of drawn content back into the page tree.
//!
//! Configuration coordinates refer to the page as it is displayed, i.e. after
//! the page's `/Rotate` has been applied. Each canvas collects operations in
//! that visual space and a single `cm` per page maps them onto the page's
//! native space. `/Rotate` itself is never touched.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::generation::error::GenerationError;
use crate::render::FieldError;

/// US Letter, used when a page carries no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);
const MAX_TREE_DEPTH: usize = 32;

// ────────────────────────────────────────────────────────────────────────────
// Geometry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub llx: f32,
    pub lly: f32,
    /// Native (unrotated) box size.
    pub width: f32,
    pub height: f32,
    /// Normalized to 0, 90, 180 or 270.
    pub rotate: i64,
}

impl PageGeometry {
    /// Reads CropBox (falling back to MediaBox) and Rotate, following
    /// inheritance through the page tree.
    pub fn read(doc: &Document, page_id: ObjectId) -> Self {
        let rect = inherited(doc, page_id, b"CropBox")
            .or_else(|| inherited(doc, page_id, b"MediaBox"))
            .and_then(|obj| rectangle(doc, obj));
        let (llx, lly, width, height) =
            rect.unwrap_or((0.0, 0.0, DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1));

        let rotate = inherited(doc, page_id, b"Rotate")
            .and_then(number)
            .map(|r| normalize_rotation(r as i64))
            .unwrap_or(0);

        Self {
            llx,
            lly,
            width,
            height,
            rotate,
        }
    }

    fn quarter_turned(&self) -> bool {
        self.rotate == 90 || self.rotate == 270
    }

    /// Width as displayed.
    #[cfg(test)]
    pub fn visual_width(&self) -> f32 {
        if self.quarter_turned() {
            self.height
        } else {
            self.width
        }
    }

    /// Height as displayed.
    pub fn visual_height(&self) -> f32 {
        if self.quarter_turned() {
            self.width
        } else {
            self.height
        }
    }

    /// Matrix mapping visual coordinates (bottom-left origin) onto native
    /// user space.
    pub fn visual_to_native(&self) -> [f32; 6] {
        let (llx, lly, w, h) = (self.llx, self.lly, self.width, self.height);
        match self.rotate {
            90 => [0.0, 1.0, -1.0, 0.0, llx + w, lly],
            180 => [-1.0, 0.0, 0.0, -1.0, llx + w, lly + h],
            270 => [0.0, -1.0, 1.0, 0.0, llx, lly + h],
            _ => [1.0, 0.0, 0.0, 1.0, llx, lly],
        }
    }
}

fn normalize_rotation(degrees: i64) -> i64 {
    let turned = degrees.rem_euclid(360);
    // Rotate must be a multiple of 90; round anything else down.
    turned - turned % 90
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn rectangle(doc: &Document, obj: &Object) -> Option<(f32, f32, f32, f32)> {
    let items = resolve(doc, obj).as_array().ok()?;
    if items.len() != 4 {
        return None;
    }
    let values: Vec<f32> = items
        .iter()
        .filter_map(|item| number(resolve(doc, item)))
        .collect();
    if values.len() != 4 {
        return None;
    }
    let (x0, x1) = (values[0].min(values[2]), values[0].max(values[2]));
    let (y0, y1) = (values[1].min(values[3]), values[1].max(values[3]));
    if x1 - x0 <= 0.0 || y1 - y0 <= 0.0 {
        return None;
    }
    Some((x0, y0, x1 - x0, y1 - y0))
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Looks `key` up on the page, then on each ancestor `Pages` node.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

// ────────────────────────────────────────────────────────────────────────────
// Canvas
// ────────────────────────────────────────────────────────────────────────────

/// Drawing operations and resources collected for one page.
#[derive(Debug)]
pub struct PageCanvas {
    pub geometry: PageGeometry,
    operations: Vec<Operation>,
    fonts: BTreeMap<String, ObjectId>,
    xobjects: BTreeMap<String, ObjectId>,
}

impl PageCanvas {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            operations: Vec::new(),
            fonts: BTreeMap::new(),
            xobjects: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    pub fn use_font(&mut self, resource_name: &str, object_id: ObjectId) {
        self.fonts.insert(resource_name.to_string(), object_id);
    }

    pub fn use_xobject(&mut self, resource_name: &str, object_id: ObjectId) {
        self.xobjects.insert(resource_name.to_string(), object_id);
    }

    #[cfg(test)]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// A loaded base document plus whatever has been drawn onto it so far.
pub struct TemplateDocument {
    doc: Document,
    pages: BTreeMap<u32, ObjectId>,
    canvases: BTreeMap<u32, PageCanvas>,
    next_image: usize,
}

impl TemplateDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, GenerationError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| GenerationError::BaseDocumentUnreadable(e.to_string()))?;
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(GenerationError::BaseDocumentUnreadable(
                "document has no pages".to_string(),
            ));
        }
        Ok(Self {
            doc,
            pages,
            canvases: BTreeMap::new(),
            next_image: 0,
        })
    }

    #[cfg(test)]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Canvas for a 1-based page number. Zero, negative and past-the-end
    /// pages are out of range.
    pub fn canvas(&mut self, page: i64) -> Result<&mut PageCanvas, FieldError> {
        let (number, page_id) = u32::try_from(page)
            .ok()
            .and_then(|number| self.pages.get(&number).map(|id| (number, *id)))
            .ok_or(FieldError::PageOutOfRange {
                page,
                page_count: self.pages.len(),
            })?;
        Ok(match self.canvases.entry(number) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(PageCanvas::new(PageGeometry::read(&self.doc, page_id))),
        })
    }

    #[cfg(test)]
    pub fn geometry(&self, page: u32) -> Option<PageGeometry> {
        self.pages
            .get(&page)
            .map(|id| PageGeometry::read(&self.doc, *id))
    }

    pub fn next_image_name(&mut self) -> String {
        self.next_image += 1;
        format!("RgIm{}", self.next_image)
    }

    /// Writes every non-empty canvas into its page and serializes the result.
    pub fn finish(mut self) -> Result<Vec<u8>, GenerationError> {
        let canvases = std::mem::take(&mut self.canvases);
        for (page, canvas) in canvases {
            if canvas.operations.is_empty() {
                continue;
            }
            let Some(page_id) = self.pages.get(&page).copied() else {
                continue;
            };
            self.apply_canvas(page_id, canvas)?;
        }

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| GenerationError::SerializationFailure(e.to_string()))?;
        Ok(out)
    }

    fn apply_canvas(&mut self, page_id: ObjectId, canvas: PageCanvas) -> Result<(), GenerationError> {
        let (resources, renamed) = self.merged_resources(page_id, &canvas);

        let matrix = canvas.geometry.visual_to_native();
        let mut operations = Vec::with_capacity(canvas.operations.len() + 4);
        operations.push(Operation::new("Q", vec![]));
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            matrix.iter().map(|v| (*v).into()).collect(),
        ));
        operations.extend(
            canvas
                .operations
                .into_iter()
                .map(|op| renamed.apply(op)),
        );
        operations.push(Operation::new("Q", vec![]));

        let overlay = Content { operations }
            .encode()
            .map_err(|e| GenerationError::SerializationFailure(e.to_string()))?;

        let mut contents = self.existing_contents(page_id);

        let prefix_id = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let mut overlay_stream = Stream::new(Dictionary::new(), overlay);
        let _ = overlay_stream.compress();
        let overlay_id = self.doc.add_object(overlay_stream);

        contents.insert(0, Object::Reference(prefix_id));
        contents.push(Object::Reference(overlay_id));

        let page = self
            .doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| GenerationError::SerializationFailure(e.to_string()))?;
        page.set("Contents", Object::Array(contents));
        page.set("Resources", Object::Dictionary(resources));
        Ok(())
    }

    fn existing_contents(&self, page_id: ObjectId) -> Vec<Object> {
        let Ok(page) = self.doc.get_dictionary(page_id) else {
            return Vec::new();
        };
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Effective page resources with the canvas' fonts and images added.
    /// Shared or inherited dictionaries are copied onto the page, never edited
    /// in place, so other pages keep their own resources.
    fn merged_resources(&self, page_id: ObjectId, canvas: &PageCanvas) -> (Dictionary, ResourceRenames) {
        let mut resources = inherited(&self.doc, page_id, b"Resources")
            .and_then(|obj| obj.as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);
        let renames = ResourceRenames {
            fonts: self.merge_category(&mut resources, b"Font", &canvas.fonts),
            xobjects: self.merge_category(&mut resources, b"XObject", &canvas.xobjects),
        };
        (resources, renames)
    }

    /// Adds `entries` to one resource category. A name the page already uses
    /// for a different object is given a fresh suffix; the returned map holds
    /// those renames.
    fn merge_category(
        &self,
        resources: &mut Dictionary,
        key: &[u8],
        entries: &BTreeMap<String, ObjectId>,
    ) -> BTreeMap<Vec<u8>, Vec<u8>> {
        let mut renames = BTreeMap::new();
        if entries.is_empty() {
            return renames;
        }
        let mut category = resources
            .get(key)
            .ok()
            .and_then(|obj| resolve(&self.doc, obj).as_dict().ok())
            .cloned()
            .unwrap_or_else(Dictionary::new);
        for (name, id) in entries {
            let taken = |candidate: &str| match category.get(candidate.as_bytes()) {
                Ok(Object::Reference(existing)) => existing != id,
                Ok(_) => true,
                Err(_) => false,
            };
            let mut chosen = name.clone();
            let mut suffix = 1;
            while taken(&chosen) || (chosen != *name && entries.contains_key(&chosen)) {
                chosen = format!("{name}_{suffix}");
                suffix += 1;
            }
            if chosen != *name {
                renames.insert(name.as_bytes().to_vec(), chosen.as_bytes().to_vec());
            }
            category.set(chosen.as_str(), Object::Reference(*id));
        }
        resources.set(key, Object::Dictionary(category));
        renames
    }
}

/// Resource names that had to change because the base page already used
/// them.
struct ResourceRenames {
    fonts: BTreeMap<Vec<u8>, Vec<u8>>,
    xobjects: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl ResourceRenames {
    fn apply(&self, mut op: Operation) -> Operation {
        let table = if op.operator == "Tf" {
            &self.fonts
        } else if op.operator == "Do" {
            &self.xobjects
        } else {
            return op;
        };
        if let Some(Object::Name(name)) = op.operands.first_mut() {
            if let Some(new_name) = table.get(name.as_slice()) {
                *name = new_name.clone();
            }
        }
        op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{page_operators, sample_pdf};
    use lopdf::dictionary;

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            TemplateDocument::load(b"not a pdf"),
            Err(GenerationError::BaseDocumentUnreadable(_))
        ));
    }

    #[test]
    fn test_geometry_reads_inherited_rotation() {
        let doc = TemplateDocument::load(&sample_pdf()).unwrap();
        assert_eq!(doc.page_count(), 3);

        let upright = doc.geometry(1).unwrap();
        assert_eq!(upright.rotate, 0);
        assert_eq!((upright.visual_width(), upright.visual_height()), (595.0, 842.0));

        let rotated = doc.geometry(2).unwrap();
        assert_eq!(rotated.rotate, 90);
        assert_eq!((rotated.visual_width(), rotated.visual_height()), (842.0, 595.0));
    }

    #[test]
    fn test_visual_to_native_maps_corners() {
        let geometry = PageGeometry {
            llx: 0.0,
            lly: 0.0,
            width: 595.0,
            height: 842.0,
            rotate: 90,
        };
        let [a, b, c, d, e, f] = geometry.visual_to_native();
        let apply = |u: f32, v: f32| (a * u + c * v + e, b * u + d * v + f);
        // Visual top-left is the native bottom-left corner.
        assert_eq!(apply(0.0, geometry.visual_height()), (0.0, 0.0));
        // Visual bottom-left is the native bottom-right corner.
        assert_eq!(apply(0.0, 0.0), (595.0, 0.0));
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(45), 0);
    }

    #[test]
    fn test_canvas_out_of_range_page() {
        let mut doc = TemplateDocument::load(&sample_pdf()).unwrap();
        assert!(matches!(
            doc.canvas(0),
            Err(FieldError::PageOutOfRange { page: 0, .. })
        ));
        assert!(matches!(
            doc.canvas(9),
            Err(FieldError::PageOutOfRange { page: 9, page_count: 3 })
        ));
    }

    #[test]
    fn test_canvas_rejects_negative_page() {
        let mut doc = TemplateDocument::load(&sample_pdf()).unwrap();
        assert!(matches!(
            doc.canvas(-1),
            Err(FieldError::PageOutOfRange { page: -1, page_count: 3 })
        ));
        assert!(matches!(
            doc.canvas(i64::from(u32::MAX) + 1),
            Err(FieldError::PageOutOfRange { .. })
        ));
        assert!(doc.canvas(3).is_ok());
    }

    #[test]
    fn test_drawn_resources_never_replace_existing_names() {
        let mut doc = TemplateDocument::load(&sample_pdf()).unwrap();
        let page_id = doc.pages[&1];
        let standard_font = |base_font: &str| {
            dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
            }
        };
        let original = doc.doc_mut().add_object(standard_font("Courier"));
        let drawn = doc.doc_mut().add_object(standard_font("Times-Bold"));

        let resources_id = doc
            .doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_reference()
            .unwrap();
        doc.doc_mut()
            .get_object_mut(resources_id)
            .and_then(Object::as_dict_mut)
            .unwrap()
            .get_mut(b"Font")
            .and_then(Object::as_dict_mut)
            .unwrap()
            .set("RgF1", original);

        let canvas = doc.canvas(1).unwrap();
        canvas.use_font("RgF1", drawn);
        canvas.push(Operation::new("BT", vec![]));
        canvas.push(Operation::new(
            "Tf",
            vec![Object::Name(b"RgF1".to_vec()), 12_i64.into()],
        ));
        canvas.push(Operation::new("ET", vec![]));
        let reloaded = Document::load_mem(&doc.finish().unwrap()).unwrap();

        let page_id = reloaded.get_pages()[&1];
        let fonts = reloaded
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Resources")
            .and_then(Object::as_dict)
            .unwrap()
            .get(b"Font")
            .and_then(Object::as_dict)
            .unwrap();
        let base_font = |name: &[u8]| {
            let id = fonts.get(name).and_then(Object::as_reference).unwrap();
            reloaded
                .get_dictionary(id)
                .unwrap()
                .get(b"BaseFont")
                .and_then(Object::as_name)
                .unwrap()
                .to_vec()
        };
        assert_eq!(base_font(b"RgF1"), b"Courier");
        assert_eq!(base_font(b"F1"), b"Helvetica");

        let content = Content::decode(&reloaded.get_page_content(page_id).unwrap()).unwrap();
        let drawn_name = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tf")
            .filter_map(|op| match op.operands.first() {
                Some(Object::Name(name)) => Some(name.clone()),
                _ => None,
            })
            .last()
            .unwrap();
        assert_ne!(drawn_name, b"RgF1");
        assert_eq!(base_font(drawn_name.as_slice()), b"Times-Bold");
    }

    #[test]
    fn test_finish_wraps_original_content_and_keeps_rotation() {
        let mut doc = TemplateDocument::load(&sample_pdf()).unwrap();
        doc.canvas(2)
            .unwrap()
            .push(Operation::new("BT", vec![]));
        doc.canvas(2).unwrap().push(Operation::new("ET", vec![]));
        let bytes = doc.finish().unwrap();

        let reloaded = Document::load_mem(&bytes).unwrap();
        let page_id = reloaded.get_pages()[&2];
        let geometry = PageGeometry::read(&reloaded, page_id);
        assert_eq!(geometry.rotate, 90);

        let operators = page_operators(&reloaded, 2);
        assert_eq!(operators.first().map(String::as_str), Some("q"));
        assert_eq!(operators.last().map(String::as_str), Some("Q"));
        assert!(operators.contains(&"cm".to_string()));
        assert!(operators.contains(&"BT".to_string()));

        // Untouched pages keep their original content.
        let first_page = page_operators(&reloaded, 1);
        assert!(!first_page.contains(&"cm".to_string()));
    }
}
