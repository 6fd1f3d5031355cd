//! Persistence seams used by the document assembler.
//!
//! The assembler only sees these traits; `AppState` carries them as
//! `Arc<dyn …>`. `PgRepository` implements all three against Postgres, the
//! test suite uses an in-memory backend.

pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::generation::GenerationRecord;
use crate::models::source::SourceRecord;
use crate::models::template::TemplateConfigRow;

pub use postgres::PgRepository;

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// The active template configuration for a test, if any.
    async fn active_template(&self, test_id: i64) -> Result<Option<TemplateConfigRow>>;
}

#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Flat record for one (test, student, attempt) triple, if the attempt exists.
    async fn source_record(
        &self,
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
    ) -> Result<Option<SourceRecord>>;
}

/// Append-only generation audit log.
#[async_trait]
pub trait GenerationLog: Send + Sync {
    async fn append(&self, record: &GenerationRecord) -> Result<()>;

    /// Most recent record of any status; seeds regeneration.
    async fn latest_for_attempt(&self, attempt_id: i64) -> Result<Option<GenerationRecord>>;

    async fn latest_success_for_attempt(&self, attempt_id: i64)
        -> Result<Option<GenerationRecord>>;
}
