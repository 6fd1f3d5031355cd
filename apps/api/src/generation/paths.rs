use chrono::Utc;
use uuid::Uuid;

pub const OUTPUT_EXTENSION: &str = "pdf";

/// `<category>/result-<studentId>-<attemptId>-<unixMillis>-<8 hex>.pdf`
///
/// The random suffix keeps two generations in the same millisecond apart.
pub fn output_path(category: &str, student_id: i64, attempt_id: i64) -> String {
    let category = category.trim_matches('/');
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{category}/result-{student_id}-{attempt_id}-{}-{}.{OUTPUT_EXTENSION}",
        Utc::now().timestamp_millis(),
        &suffix[..8]
    )
}
