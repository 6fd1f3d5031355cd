//! Append-only audit entries for generation attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Failed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Success => "success",
            GenerationStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(GenerationStatus::Success),
            "failed" => Some(GenerationStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub id: Uuid,
    /// Absent when the attempt failed before a template was resolved.
    pub template_id: Option<i64>,
    pub test_id: i64,
    pub student_id: i64,
    pub attempt_id: i64,
    pub output_path: Option<String>,
    pub status: GenerationStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub fn success(
        template_id: i64,
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
        output_path: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id: Some(template_id),
            test_id,
            student_id,
            attempt_id,
            output_path: Some(output_path),
            status: GenerationStatus::Success,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn failed(
        template_id: Option<i64>,
        test_id: i64,
        student_id: i64,
        attempt_id: i64,
        error_message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id,
            test_id,
            student_id,
            attempt_id,
            output_path: None,
            status: GenerationStatus::Failed,
            error_message: Some(error_message),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_column_text() {
        for status in [GenerationStatus::Success, GenerationStatus::Failed] {
            assert_eq!(GenerationStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(GenerationStatus::parse("pending"), None);
    }

    #[test]
    fn test_records_get_distinct_ids() {
        let a = GenerationRecord::success(1, 2, 3, 4, "results/a.pdf".into());
        let b = GenerationRecord::success(1, 2, 3, 4, "results/a.pdf".into());
        assert_ne!(a.id, b.id);
        assert_eq!(a.status, GenerationStatus::Success);
    }
}
