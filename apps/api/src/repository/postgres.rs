use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::generation::{GenerationRecord, GenerationStatus};
use crate::models::source::SourceRecord;
use crate::models::template::TemplateConfigRow;
use crate::repository::{GenerationLog, SourceRepository, TemplateRepository};

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Flattens the student, test, attempt and result rows into one JSON object.
/// Result columns are merged last so computed values (score, grade, ...) win.
const SOURCE_RECORD_SQL: &str = r#"
SELECT
    jsonb_build_object(
        'test_id', a.test_id,
        'student_id', a.student_id,
        'attempt_id', a.id,
        'first_name', s.first_name,
        'middle_name', s.middle_name,
        'last_name', s.last_name,
        'email', s.email,
        'phone', s.phone,
        'roll_number', s.roll_number,
        'date_of_birth', s.date_of_birth,
        'gender', s.gender,
        'address', s.address,
        'profile_image', s.profile_image,
        'test_name', t.title,
        'test_code', t.code,
        'test_category', t.category,
        'total_questions', t.total_questions,
        'total_marks', t.total_marks,
        'passing_marks', t.passing_marks,
        'passing_percentage', t.passing_percentage,
        'duration_minutes', t.duration_minutes,
        'attempt_number', a.attempt_number,
        'attempt_date', a.submitted_at,
        'time_taken_seconds', a.time_taken_seconds
    )
    || COALESCE(to_jsonb(r) - 'id' - 'attempt_id' - 'created_at' - 'updated_at', '{}'::jsonb)
    || jsonb_build_object(
        'section_scores',
        COALESCE(
            (SELECT jsonb_agg(
                        jsonb_build_object(
                            'section_name', sec.title,
                            'score', ss.score,
                            'max_score', ss.max_score
                        )
                        ORDER BY sec.position
                    )
               FROM section_scores ss
               JOIN test_sections sec ON sec.id = ss.section_id
              WHERE ss.attempt_id = a.id),
            '[]'::jsonb
        )
    ) AS record
FROM test_attempts a
JOIN students s ON s.id = a.student_id
JOIN tests t ON t.id = a.test_id
LEFT JOIN test_results r ON r.attempt_id = a.id
WHERE a.id = $1 AND a.test_id = $2 AND a.student_id = $3
"#;

#[async_trait]
impl TemplateRepository for PgRepository {
    async fn active_template(&self, test_id: i64) -> Result<Option<TemplateConfigRow>> {
        let row = sqlx::query_as::<_, TemplateConfigRow>(
            r#"
            SELECT * FROM template_configs
            WHERE test_id = $1 AND is_active
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl SourceRepository for PgRepository {
    async fn source_record(
        &self,
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
    ) -> Result<Option<SourceRecord>> {
        let record: Option<Value> = sqlx::query_scalar(SOURCE_RECORD_SQL)
            .bind(attempt_id)
            .bind(test_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record.and_then(SourceRecord::from_value))
    }
}

#[derive(FromRow)]
struct GenerationRow {
    id: Uuid,
    template_id: Option<i64>,
    test_id: i64,
    student_id: i64,
    attempt_id: i64,
    output_path: Option<String>,
    status: String,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<GenerationRow> for GenerationRecord {
    type Error = anyhow::Error;

    fn try_from(row: GenerationRow) -> Result<Self> {
        let status = GenerationStatus::parse(&row.status)
            .ok_or_else(|| anyhow!("unknown generation status '{}'", row.status))?;
        Ok(GenerationRecord {
            id: row.id,
            template_id: row.template_id,
            test_id: row.test_id,
            student_id: row.student_id,
            attempt_id: row.attempt_id,
            output_path: row.output_path,
            status,
            error_message: row.error_message,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl GenerationLog for PgRepository {
    /// INSERT only. Records are never updated.
    async fn append(&self, record: &GenerationRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO result_generations
                (id, template_id, test_id, student_id, attempt_id,
                 output_path, status, error_message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(record.template_id)
        .bind(record.test_id)
        .bind(record.student_id)
        .bind(record.attempt_id)
        .bind(&record.output_path)
        .bind(record.status.as_str())
        .bind(&record.error_message)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_for_attempt(&self, attempt_id: i64) -> Result<Option<GenerationRecord>> {
        sqlx::query_as::<_, GenerationRow>(
            r#"
            SELECT * FROM result_generations
            WHERE attempt_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?
        .map(GenerationRecord::try_from)
        .transpose()
    }

    async fn latest_success_for_attempt(
        &self,
        attempt_id: i64,
    ) -> Result<Option<GenerationRecord>> {
        sqlx::query_as::<_, GenerationRow>(
            r#"
            SELECT * FROM result_generations
            WHERE attempt_id = $1 AND status = 'success'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?
        .map(GenerationRecord::try_from)
        .transpose()
    }
}
