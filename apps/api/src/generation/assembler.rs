//! Document assembler.
//!
//! One call to [`ResultGenerator::generate`] loads the active template for a
//! test, the source record for the attempt, draws every configured field on
//! the base document and persists the result. Per-field problems are logged
//! and skipped; only structural failures abort the document.
//!
//! Concurrent calls share nothing mutable: the font library is immutable
//! behind an `Arc`, every call embeds fonts into its own document.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::generation::error::GenerationError;
use crate::generation::paths::output_path;
use crate::models::generation::GenerationRecord;
use crate::models::source::SourceRecord;
use crate::models::template::{FieldKind, FieldSpec, TemplateConfig};
use crate::render::fonts::{DocumentFonts, FontLibrary};
use crate::render::image::{draw_image, embed_image, ImageEncoding};
use crate::render::page::TemplateDocument;
use crate::render::text::draw_text;
use crate::render::FieldError;
use crate::repository::{GenerationLog, SourceRepository, TemplateRepository};
use crate::resolver::{FieldResolver, ImageSource};
use crate::storage::{DocumentStorage, PDF_CONTENT_TYPE};

// ────────────────────────────────────────────────────────────────────────────
// Request / outcome types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub test_id: i64,
    pub student_id: i64,
    pub attempt_id: i64,
    /// Attributes laid over the stored source record, key by key.
    pub override_record: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub record: GenerationRecord,
    pub rendered_fields: usize,
    pub skipped_fields: usize,
}

enum FieldOutcome {
    Rendered,
    Empty,
}

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ResultGenerator {
    templates: Arc<dyn TemplateRepository>,
    sources: Arc<dyn SourceRepository>,
    log: Arc<dyn GenerationLog>,
    storage: Arc<dyn DocumentStorage>,
    fonts: Arc<FontLibrary>,
    category: String,
}

impl ResultGenerator {
    pub fn new(
        templates: Arc<dyn TemplateRepository>,
        sources: Arc<dyn SourceRepository>,
        log: Arc<dyn GenerationLog>,
        storage: Arc<dyn DocumentStorage>,
        fonts: Arc<FontLibrary>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            templates,
            sources,
            log,
            storage,
            fonts,
            category: category.into(),
        }
    }

    /// Renders and stores one result document, appending a generation record.
    ///
    /// Missing configuration, base document or source record fail before
    /// anything is rendered and leave no record behind.
    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        let GenerationRequest {
            test_id,
            student_id,
            attempt_id,
            override_record,
        } = request;

        let template = self.load_template(test_id).await?;
        let base = self.load_base_document(&template).await?;
        let record = self
            .load_source(test_id, student_id, attempt_id, override_record)
            .await?;

        match self
            .render_and_store(&template, base, &record, student_id, attempt_id)
            .await
        {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(test_id, student_id, attempt_id, error = %e, "result generation failed");
                self.record_failure(Some(template.template_id), test_id, student_id, attempt_id, &e)
                    .await;
                Err(e)
            }
        }
    }

    /// Re-runs generation for an attempt, recovering the test and student from
    /// the attempt's most recent generation record.
    pub async fn regenerate(
        &self,
        attempt_id: i64,
        override_record: Option<Map<String, Value>>,
    ) -> Result<GenerationOutcome, GenerationError> {
        let seed = self.regeneration_seed(attempt_id).await?;
        info!(
            attempt_id,
            test_id = seed.test_id,
            student_id = seed.student_id,
            "regenerating result document"
        );
        self.generate(GenerationRequest {
            test_id: seed.test_id,
            student_id: seed.student_id,
            attempt_id,
            override_record,
        })
        .await
    }

    pub async fn latest_success(
        &self,
        attempt_id: i64,
    ) -> Result<Option<GenerationRecord>, GenerationError> {
        self.log
            .latest_success_for_attempt(attempt_id)
            .await
            .map_err(GenerationError::Repository)
    }

    /// Bytes of a previously generated output, if still present in storage.
    pub async fn read_output(
        &self,
        record: &GenerationRecord,
    ) -> Result<Option<Vec<u8>>, GenerationError> {
        let Some(path) = record.output_path.as_deref() else {
            return Ok(None);
        };
        self.storage
            .read(path)
            .await
            .map_err(GenerationError::Storage)
    }

    /// Appends a `failed` record for a generation the caller abandoned at
    /// `started_at`. Nothing is appended when the attempt already has a record
    /// from that run, i.e. the output was persisted before the deadline hit.
    pub async fn record_timeout(
        &self,
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
        started_at: DateTime<Utc>,
    ) {
        match self.log.latest_for_attempt(attempt_id).await {
            Ok(Some(latest)) if latest.created_at >= started_at => {
                info!(
                    attempt_id,
                    status = latest.status.as_str(),
                    "generation finished before the timeout; nothing to record"
                );
            }
            _ => {
                self.record_failure(None, test_id, student_id, attempt_id, &GenerationError::Timeout)
                    .await
            }
        }
    }

    /// Like [`Self::record_timeout`] for a regeneration, where only the
    /// attempt is known to the caller.
    pub async fn record_regeneration_timeout(&self, attempt_id: i64, started_at: DateTime<Utc>) {
        match self.regeneration_seed(attempt_id).await {
            Ok(seed) => {
                self.record_timeout(seed.test_id, seed.student_id, attempt_id, started_at)
                    .await
            }
            Err(e) => warn!(attempt_id, error = %e, "cannot record regeneration timeout"),
        }
    }

    // ── preconditions ──────────────────────────────────────────────────────

    async fn load_template(&self, test_id: i64) -> Result<TemplateConfig, GenerationError> {
        let row = self
            .templates
            .active_template(test_id)
            .await
            .map_err(GenerationError::Repository)?
            .ok_or(GenerationError::ConfigurationMissing { test_id })?;

        TemplateConfig::from_row(&row).map_err(|e| {
            warn!(test_id, template_id = row.id, error = %e, "template configuration is malformed");
            GenerationError::ConfigurationMissing { test_id }
        })
    }

    async fn load_base_document(&self, template: &TemplateConfig) -> Result<Vec<u8>, GenerationError> {
        let path = template.base_document_ref.trim_start_matches('/');
        self.storage
            .read(path)
            .await
            .map_err(GenerationError::Storage)?
            .ok_or_else(|| {
                GenerationError::BaseDocumentUnreadable(format!("base document '{path}' not found"))
            })
    }

    async fn load_source(
        &self,
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
        override_record: Option<Map<String, Value>>,
    ) -> Result<SourceRecord, GenerationError> {
        let mut record = self
            .sources
            .source_record(test_id, student_id, attempt_id)
            .await
            .map_err(GenerationError::Repository)?
            .ok_or(GenerationError::SourceDataMissing {
                test_id,
                student_id,
                attempt_id,
            })?;

        if let Some(overrides) = override_record {
            record.merge(overrides);
        }
        record.insert_missing("test_id", test_id);
        record.insert_missing("student_id", student_id);
        record.insert_missing("attempt_id", attempt_id);
        Ok(record)
    }

    async fn regeneration_seed(&self, attempt_id: i64) -> Result<GenerationRecord, GenerationError> {
        self.log
            .latest_for_attempt(attempt_id)
            .await
            .map_err(GenerationError::Repository)?
            .ok_or(GenerationError::NoPreviousGeneration { attempt_id })
    }

    // ── rendering ──────────────────────────────────────────────────────────

    async fn render_and_store(
        &self,
        template: &TemplateConfig,
        base: Vec<u8>,
        record: &SourceRecord,
        student_id: i64,
        attempt_id: i64,
    ) -> Result<GenerationOutcome, GenerationError> {
        let mut document = tokio::task::spawn_blocking(move || TemplateDocument::load(&base))
            .await
            .map_err(|e| GenerationError::BaseDocumentUnreadable(e.to_string()))??;

        let faces = template.fields.iter().filter_map(|field| match &field.kind {
            FieldKind::Text(style) => Some(style.font),
            FieldKind::Image => None,
        });
        let mut fonts = DocumentFonts::embed_all(document.doc_mut(), &self.fonts, faces);

        let resolver = FieldResolver::new(record);
        let (mut rendered, mut skipped) = (0, 0);
        for field in &template.fields {
            tokio::task::yield_now().await;
            match self
                .render_field(&mut document, &mut fonts, &resolver, field)
                .await
            {
                Ok(FieldOutcome::Rendered) => rendered += 1,
                Ok(FieldOutcome::Empty) => {
                    debug!(field = %field.name, "field resolved empty, skipped");
                    skipped += 1;
                }
                Err(e) => {
                    warn!(field = %field.name, page = field.page, error = %e, "field skipped");
                    skipped += 1;
                }
            }
        }

        let bytes = tokio::task::spawn_blocking(move || document.finish())
            .await
            .map_err(|e| GenerationError::SerializationFailure(e.to_string()))??;

        let entry = GenerationRecord::success(
            template.template_id,
            template.test_id,
            student_id,
            attempt_id,
            output_path(&self.category, student_id, attempt_id),
        );
        let entry = self.persist(entry, bytes).await?;

        info!(
            attempt_id,
            output_path = entry.output_path.as_deref().unwrap_or_default(),
            rendered,
            skipped,
            "result document generated"
        );

        Ok(GenerationOutcome {
            record: entry,
            rendered_fields: rendered,
            skipped_fields: skipped,
        })
    }

    async fn render_field(
        &self,
        document: &mut TemplateDocument,
        fonts: &mut DocumentFonts,
        resolver: &FieldResolver<'_>,
        field: &FieldSpec,
    ) -> Result<FieldOutcome, FieldError> {
        match &field.kind {
            FieldKind::Text(style) => {
                let value = resolver.resolve_text(field, style.segment.as_ref());
                if value.trim().is_empty() {
                    return Ok(FieldOutcome::Empty);
                }
                let font = fonts.embed(document.doc_mut(), &self.fonts, style.font);
                let canvas = document.canvas(field.page)?;
                let placed = draw_text(canvas, field, style, &font, &value);
                Ok(if placed.is_empty() {
                    FieldOutcome::Empty
                } else {
                    FieldOutcome::Rendered
                })
            }
            FieldKind::Image => {
                let Some(source) = resolver.resolve_image(field)? else {
                    return Ok(FieldOutcome::Empty);
                };
                // Fail on the page before fetching any bytes.
                document.canvas(field.page)?;

                let hint = source.hint().map(str::to_owned);
                let bytes = match source {
                    ImageSource::Inline { bytes, .. } => bytes,
                    ImageSource::Stored { path } => self
                        .storage
                        .read(&path)
                        .await
                        .map_err(|e| FieldError::ImageMissing(format!("{path}: {e}")))?
                        .ok_or_else(|| FieldError::ImageMissing(path.clone()))?,
                };
                let encoding = ImageEncoding::detect(hint.as_deref(), &bytes)
                    .ok_or(FieldError::UnsupportedImageEncoding)?;

                let image = embed_image(document.doc_mut(), &bytes, encoding)?;
                let resource_name = document.next_image_name();
                let canvas = document.canvas(field.page)?;
                draw_image(canvas, field, &image, &resource_name);
                Ok(FieldOutcome::Rendered)
            }
        }
    }

    /// Saves the output and appends its success record on a task of its own.
    /// Once started, both complete even if the caller stops waiting.
    async fn persist(
        &self,
        entry: GenerationRecord,
        bytes: Vec<u8>,
    ) -> Result<GenerationRecord, GenerationError> {
        let storage = Arc::clone(&self.storage);
        let log = Arc::clone(&self.log);
        tokio::spawn(async move {
            let path = entry.output_path.as_deref().unwrap_or_default();
            storage
                .save(path, bytes, PDF_CONTENT_TYPE)
                .await
                .map_err(GenerationError::Storage)?;
            log.append(&entry)
                .await
                .map_err(GenerationError::Repository)?;
            Ok::<_, GenerationError>(entry)
        })
        .await
        .map_err(|e| GenerationError::Storage(e.into()))?
    }

    async fn record_failure(
        &self,
        template_id: Option<i64>,
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
        cause: &GenerationError,
    ) {
        let entry =
            GenerationRecord::failed(template_id, test_id, student_id, attempt_id, cause.to_string());
        if let Err(e) = self.log.append(&entry).await {
            error!(attempt_id, error = %e, "could not record failed generation");
        }
    }
}
