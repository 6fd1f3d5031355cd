//! Template-authoring preview for narrative segmentation.

use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::narrative::segments::{parse_segments, SegmentMap};

#[derive(Debug, Deserialize)]
pub struct SegmentPreviewRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SegmentPreviewResponse {
    pub keys: Vec<String>,
    pub segments: SegmentMap,
}

/// POST /api/v1/narrative/segments
///
/// Shows which segment keys a template field may reference for the given text.
pub async fn handle_preview_segments(
    Json(request): Json<SegmentPreviewRequest>,
) -> Result<Json<SegmentPreviewResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let segments = parse_segments(&request.text);
    Ok(Json(SegmentPreviewResponse {
        keys: segments.keys().cloned().collect(),
        segments,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preview_lists_segment_keys() {
        let request = SegmentPreviewRequest {
            text: "<p>Hi</p><h2>Score Summary</h2><p>Good</p>".to_string(),
        };
        let Json(response) = handle_preview_segments(Json(request)).await.unwrap();
        assert_eq!(response.keys, vec!["intro".to_string(), "score_summary".to_string()]);
    }

    #[tokio::test]
    async fn test_preview_rejects_blank_text() {
        let request = SegmentPreviewRequest {
            text: "  ".to_string(),
        };
        assert!(matches!(
            handle_preview_segments(Json(request)).await,
            Err(AppError::Validation(_))
        ));
    }
}
