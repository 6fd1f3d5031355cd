//! Template field names the admin UI offers, mapped onto source record keys.
//!
//! Each alias tries its canonical key, then legacy alternates, then the field
//! name itself. A few aliases are computed rather than looked up.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::models::source::{format_number, value_to_text, SourceRecord};

/// Grade bands on percentage, highest first.
const GRADE_BANDS: &[(f64, &str)] = &[
    (90.0, "A+"),
    (80.0, "A"),
    (70.0, "B+"),
    (60.0, "B"),
    (50.0, "C"),
    (40.0, "D"),
];

const DISPLAY_DATE: &str = "%d %b %Y";

/// Resolves `name` when it is a known alias. `None` means the name is not an
/// alias; `Some("")` means it is one but the record has no value for it.
pub fn resolve_alias(name: &str, record: &SourceRecord) -> Option<String> {
    let value = match name {
        "studentName" => student_name(record).or_else(|| lookup(record, &["student_name", "name", "full_name"], name)),
        "firstName" => lookup(record, &["first_name", "firstname"], name),
        "lastName" => lookup(record, &["last_name", "lastname", "surname"], name),
        "email" => lookup(record, &["email", "student_email"], name),
        "phone" => lookup(record, &["phone", "phone_number", "mobile"], name),
        "rollNumber" => lookup(record, &["roll_number", "roll_no", "enrollment_number"], name),
        "dateOfBirth" => lookup(record, &["date_of_birth", "dob"], name).map(|d| display_date(&d)),
        "gender" => lookup(record, &["gender"], name),

        "testName" => lookup(record, &["test_name", "test_title"], name),
        "testCode" => lookup(record, &["test_code", "code"], name),
        "testCategory" => lookup(record, &["test_category", "category"], name),
        "totalQuestions" => lookup(record, &["total_questions", "question_count"], name),
        "totalMarks" => lookup(record, &["total_marks", "max_score"], name),
        "passingMarks" => lookup(record, &["passing_marks", "pass_marks"], name),
        "duration" => lookup(record, &["duration_minutes", "duration"], name),

        "score" => lookup(record, &["score", "obtained_marks", "marks_obtained"], name),
        "percentage" => record
            .first_number(&["percentage", "percent"])
            .map(format_number)
            .or_else(|| record.text(name)),
        "correctAnswers" => lookup(record, &["correct_answers", "correct_count"], name),
        "wrongAnswers" => lookup(record, &["wrong_answers", "incorrect_answers"], name),
        "unanswered" => lookup(record, &["unanswered", "skipped"], name),
        "timeTaken" => time_taken(record).or_else(|| record.text(name)),
        "attemptNumber" => lookup(record, &["attempt_number", "attempt_no"], name),
        "attemptDate" => lookup(record, &["attempt_date", "submitted_at", "completed_at"], name)
            .map(|d| display_date(&d)),

        "resultTitle" => lookup(record, &["result_title", "title"], name),
        "grade" => lookup(record, &["grade"], name).or_else(|| percentage(record).map(grade_for)),
        "certificateId" => lookup(record, &["certificate_id"], name).or_else(|| certificate_id(record)),
        "passStatus" => pass_status(record).map(str::to_string),
        "sectionScores" => section_summary(record),
        "issueDate" => Some(Utc::now().format(DISPLAY_DATE).to_string()),

        _ => match name.strip_prefix("address.") {
            Some(part) => address_part(record, part),
            None => return None,
        },
    };
    Some(value.unwrap_or_default())
}

fn lookup(record: &SourceRecord, keys: &[&str], raw: &str) -> Option<String> {
    record.first_text(keys).or_else(|| record.text(raw))
}

fn student_name(record: &SourceRecord) -> Option<String> {
    let parts: Vec<String> = ["first_name", "middle_name", "last_name"]
        .iter()
        .filter_map(|key| record.text(key))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Nested `address` object first, then flat `address_<part>` keys.
fn address_part(record: &SourceRecord, part: &str) -> Option<String> {
    let alternates: &[&str] = match part {
        "line1" => &["line1", "line_1", "address_line1", "street"],
        "line2" => &["line2", "line_2", "address_line2"],
        "pincode" => &["pincode", "postal_code", "zip", "zip_code"],
        "city" => &["city"],
        "state" => &["state"],
        "country" => &["country"],
        _ => &[],
    };

    if let Some(Value::Object(address)) = record.get("address") {
        if let Some(found) = alternates
            .iter()
            .chain(std::iter::once(&part))
            .find_map(|key| address.get(*key).and_then(value_to_text))
        {
            return Some(found);
        }
    }
    alternates
        .iter()
        .map(|key| format!("address_{key}"))
        .chain(std::iter::once(part.to_string()))
        .find_map(|key| record.text(&key))
}

fn percentage(record: &SourceRecord) -> Option<f64> {
    record.first_number(&["percentage", "percent"]).or_else(|| {
        let score = record.first_number(&["score", "obtained_marks", "marks_obtained"])?;
        let total = record.first_number(&["total_marks", "max_score"])?;
        (total > 0.0).then(|| score / total * 100.0)
    })
}

pub fn grade_for(percentage: f64) -> String {
    GRADE_BANDS
        .iter()
        .find(|(floor, _)| percentage >= *floor)
        .map(|(_, grade)| *grade)
        .unwrap_or("F")
        .to_string()
}

fn certificate_id(record: &SourceRecord) -> Option<String> {
    let test = record.text("test_id")?;
    let student = record.text("student_id")?;
    let attempt = record.text("attempt_id")?;
    Some(format!("CERT-{test}-{student}-{attempt}"))
}

/// Explicit `passed` flag, then percentage against the passing percentage,
/// then score against passing marks.
fn pass_status(record: &SourceRecord) -> Option<&'static str> {
    let passed = record
        .flag("passed")
        .or_else(|| record.flag("is_passed"))
        .or_else(|| {
            let pct = record.first_number(&["percentage", "percent"])?;
            let threshold = record.number("passing_percentage")?;
            Some(pct >= threshold)
        })
        .or_else(|| {
            let score = record.first_number(&["score", "obtained_marks", "marks_obtained"])?;
            let threshold = record.first_number(&["passing_marks", "pass_marks"])?;
            Some(score >= threshold)
        })?;
    Some(if passed { "PASS" } else { "FAIL" })
}

/// One `"<name>: <score>/<max>"` line per section.
fn section_summary(record: &SourceRecord) -> Option<String> {
    let Some(Value::Array(sections)) = record.get("section_scores") else {
        return record.text("sectionScores");
    };
    let lines: Vec<String> = sections
        .iter()
        .filter_map(|section| {
            let section = section.as_object()?;
            let name = section_text(section, &["section_name", "name", "title"])?;
            let score = section_text(section, &["score", "obtained_marks"])
                .unwrap_or_else(|| "0".to_string());
            match section_text(section, &["max_score", "total_marks", "max_marks"]) {
                Some(max) => Some(format!("{name}: {score}/{max}")),
                None => Some(format!("{name}: {score}")),
            }
        })
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn section_text(section: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| section.get(*key).and_then(value_to_text))
}

fn time_taken(record: &SourceRecord) -> Option<String> {
    let seconds = record.number("time_taken_seconds")?;
    let total = seconds.max(0.0).round() as u64;
    let (minutes, secs) = (total / 60, total % 60);
    Some(if minutes > 0 {
        format!("{minutes} min {secs} sec")
    } else {
        format!("{secs} sec")
    })
}

/// Reformats ISO dates and timestamps; anything else is returned unchanged.
fn display_date(raw: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format(DISPLAY_DATE).to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return ts.format(DISPLAY_DATE).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format(DISPLAY_DATE).to_string();
    }
    raw.to_string()
}
