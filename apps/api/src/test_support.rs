//! Fixtures shared by unit tests: an in-memory backend for every persistence
//! trait, a small multi-page base document and tiny raster images.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde_json::Value;

use crate::config::{Config, StorageBackend};
use crate::generation::assembler::ResultGenerator;
use crate::models::generation::{GenerationRecord, GenerationStatus};
use crate::models::source::SourceRecord;
use crate::models::template::TemplateConfigRow;
use crate::render::fonts::FontLibrary;
use crate::repository::{GenerationLog, SourceRepository, TemplateRepository};
use crate::state::AppState;
use crate::storage::{validate_path, DocumentStorage};

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryBackend {
    templates: Mutex<HashMap<i64, TemplateConfigRow>>,
    sources: Mutex<HashMap<(i64, i64, i64), SourceRecord>>,
    generations: Mutex<Vec<GenerationRecord>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn with_template(self, test_id: i64, base_path: &str, config: Value) -> Self {
        let now = Utc::now();
        self.templates.lock().unwrap().insert(
            test_id,
            TemplateConfigRow {
                id: test_id * 100,
                test_id,
                base_document_path: base_path.to_string(),
                config,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    pub fn with_source(self, test_id: i64, student_id: i64, attempt_id: i64, record: Value) -> Self {
        let record = SourceRecord::from_value(record).expect("source fixture must be an object");
        self.sources
            .lock()
            .unwrap()
            .insert((test_id, student_id, attempt_id), record);
        self
    }

    pub fn with_file(self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.lock().unwrap().insert(path.to_string(), bytes);
        self
    }

    pub fn generations(&self) -> Vec<GenerationRecord> {
        self.generations.lock().unwrap().clone()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryBackend {
    async fn active_template(&self, test_id: i64) -> Result<Option<TemplateConfigRow>> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .get(&test_id)
            .filter(|row| row.is_active)
            .cloned())
    }
}

#[async_trait]
impl SourceRepository for InMemoryBackend {
    async fn source_record(
        &self,
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
    ) -> Result<Option<SourceRecord>> {
        Ok(self
            .sources
            .lock()
            .unwrap()
            .get(&(test_id, student_id, attempt_id))
            .cloned())
    }
}

#[async_trait]
impl GenerationLog for InMemoryBackend {
    async fn append(&self, record: &GenerationRecord) -> Result<()> {
        self.generations.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn latest_for_attempt(&self, attempt_id: i64) -> Result<Option<GenerationRecord>> {
        Ok(self
            .generations
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.attempt_id == attempt_id)
            .cloned())
    }

    async fn latest_success_for_attempt(
        &self,
        attempt_id: i64,
    ) -> Result<Option<GenerationRecord>> {
        Ok(self
            .generations
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.attempt_id == attempt_id && r.status == GenerationStatus::Success)
            .cloned())
    }
}

#[async_trait]
impl DocumentStorage for InMemoryBackend {
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        validate_path(path)?;
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    async fn save(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        validate_path(path)?;
        self.files.lock().unwrap().insert(path.to_string(), bytes);
        Ok(())
    }
}

/// Application state wired to one in-memory backend with standard fonts.
pub fn test_state(backend: Arc<InMemoryBackend>) -> AppState {
    let generator = ResultGenerator::new(
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend,
        Arc::new(FontLibrary::standard_only()),
        "results",
    );
    AppState {
        config: Config {
            database_url: "postgres://localhost/test".to_string(),
            storage: StorageBackend::Local {
                root: "./storage".into(),
            },
            fonts_dir: "./fonts".into(),
            result_category: "results".to_string(),
            generation_timeout_secs: 30,
            port: 8080,
            rust_log: "debug".to_string(),
        },
        generator,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Documents
// ────────────────────────────────────────────────────────────────────────────

fn label_stream(label: &str) -> Stream {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12_i64.into()]),
            Operation::new("Td", vec![50_i64.into(), 800_i64.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(label.as_bytes().to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    Stream::new(dictionary! {}, content.encode().unwrap())
}

/// Three A4 pages. Page 2 sits under a nested page-tree node that carries
/// `/Rotate 90`; the MediaBox is inherited from the root.
pub fn sample_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let rotated_node_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page = |parent: ObjectId, label: &str| {
        let contents = doc.add_object(label_stream(label));
        doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => parent,
            "Contents" => contents,
            "Resources" => resources_id,
        })
    };
    let first = page(pages_id, "Certificate");
    let second = page(rotated_node_id, "Landscape");
    let third = page(pages_id, "Appendix");

    doc.objects.insert(
        rotated_node_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Parent" => pages_id,
            "Kids" => vec![second.into()],
            "Count" => 1_i64,
            "Rotate" => 90_i64,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![first.into(), rotated_node_id.into(), third.into()],
            "Count" => 3_i64,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), 595_i64.into(), 842_i64.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn page_content(doc: &Document, page: u32) -> Content {
    let page_id = doc.get_pages()[&page];
    let bytes = doc.get_page_content(page_id).unwrap();
    Content::decode(&bytes).unwrap()
}

/// Operators of a page's combined content streams, in order.
pub fn page_operators(doc: &Document, page: u32) -> Vec<String> {
    page_content(doc, page)
        .operations
        .into_iter()
        .map(|op| op.operator)
        .collect()
}

/// Literal strings shown with `Tj` on a page.
pub fn page_strings(doc: &Document, page: u32) -> Vec<String> {
    page_content(doc, page)
        .operations
        .into_iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Images
// ────────────────────────────────────────────────────────────────────────────

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn tiny_png(width: u32, height: u32, alpha: bool) -> Vec<u8> {
    let image = if alpha {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 128])))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])))
    };
    encode(image, ImageFormat::Png)
}

pub fn tiny_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 90, 160]))),
        ImageFormat::Jpeg,
    )
}
