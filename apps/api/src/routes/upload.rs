use std::path::PathBuf;

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::render::{render_fallback, render_resume};
use crate::state::AppState;
use crate::storage;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body ceiling enforced by the router. Leaves room for multipart framing.
pub const MAX_REQUEST_BODY_BYTES: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub json: ResumeRecord,
    pub pdf_url: String,
    pub download_url: String,
    pub original_filename: String,
    pub processed_at: String,
    pub file_size: usize,
}

/// The `file` part of the form, as received.
struct PdfUpload {
    filename: Option<String>,
    content: Bytes,
}

/// POST /upload-resume
///
/// Validate → extract → render (with fallback) → respond.
/// Extraction and rendering failures degrade the output instead of failing the request.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_file_field(&mut multipart)
        .await?
        .ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let original_filename = validate_upload(&upload)?;
    let file_size = upload.content.len();

    info!("Processing upload {original_filename} ({file_size} bytes)");

    let record = state.extractor.extract(&upload.content).await;
    if let Some(cause) = &record.parsing_error {
        warn!("Extraction degraded for {original_filename}: {cause}");
    }

    let pdf_filename = storage::output_filename(&original_filename, Local::now(), Uuid::new_v4());
    let pdf_path = state.config.output_dir.join(&pdf_filename);
    let record = render_with_fallback(record, pdf_path).await?;

    info!("Upload {original_filename} stored as {pdf_filename}");

    Ok(Json(UploadResponse {
        message: "Resume processed successfully".to_string(),
        json: record,
        pdf_url: format!("/static/{pdf_filename}"),
        download_url: format!("/download-pdf/{pdf_filename}"),
        original_filename,
        processed_at: Local::now().to_rfc3339(),
        file_size,
    }))
}

/// Finds the `file` part, skipping any other form fields.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<PdfUpload>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content = field.bytes().await?;
        return Ok(Some(PdfUpload { filename, content }));
    }
    Ok(None)
}

/// Applies the upload checks in order; returns the original filename.
fn validate_upload(upload: &PdfUpload) -> Result<String, AppError> {
    let filename = match upload.filename.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => return Err(AppError::Validation("No filename provided".to_string())),
    };
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::Validation(
            "Only PDF files are allowed".to_string(),
        ));
    }
    if upload.content.is_empty() {
        return Err(AppError::Validation("Empty file uploaded".to_string()));
    }
    if upload.content.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "File too large. Maximum size is 10MB".to_string(),
        ));
    }
    Ok(filename.to_string())
}

/// Runs the renderer on the blocking pool, falling back to the minimal
/// document when the full render fails. Hands the record back for the response.
async fn render_with_fallback(
    record: ResumeRecord,
    path: PathBuf,
) -> Result<ResumeRecord, AppError> {
    let (record, outcome) = tokio::task::spawn_blocking(move || {
        if render_resume(&record, &path) {
            return (record, Ok(()));
        }
        warn!("Falling back to minimal PDF at {}", path.display());
        let outcome = render_fallback(&path);
        (record, outcome)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))?;

    outcome.map_err(|e| AppError::Render(e.to_string()))?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::json;

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::post("/upload-resume")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn dir_entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    const VALID_REPLY: &str = r#"```json
{
  "first_name": "Jane",
  "last_name": "Doe",
  "email": "jane@example.com",
  "skills": ["Rust", "SQL"],
  "work": [{"company": "Acme", "title": "Engineer", "startDate": "2020", "endDate": "Present", "description": "Built things"}],
  "education": [],
  "summary": "Engineer.",
}
```"#;

    #[tokio::test]
    async fn test_non_pdf_upload_rejected_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let model = StubModel::replying(VALID_REPLY);
        let app = test_app(dir.path(), model.clone());

        let response = send(app, upload_request(multipart_body(Some("notes.txt"), b"hi"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"detail": "Only PDF files are allowed"})
        );
        assert_eq!(model.call_count(), 0);
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_empty_file_rejected_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let model = StubModel::replying(VALID_REPLY);
        let app = test_app(dir.path(), model.clone());

        let response = send(app, upload_request(multipart_body(Some("cv.pdf"), b""))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"detail": "Empty file uploaded"}));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), StubModel::replying(VALID_REPLY));
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
        );

        let response = send(app, upload_request(body.into_bytes())).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"detail": "No file uploaded"}));
    }

    #[tokio::test]
    async fn test_missing_filename_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), StubModel::replying(VALID_REPLY));

        let response = send(app, upload_request(multipart_body(None, b"%PDF-1.4"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"detail": "No filename provided"}));
    }

    #[tokio::test]
    async fn test_oversized_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let model = StubModel::replying(VALID_REPLY);
        let app = test_app(dir.path(), model.clone());
        let content = vec![b'a'; MAX_UPLOAD_BYTES + 1];

        let response = send(app, upload_request(multipart_body(Some("big.pdf"), &content))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"detail": "File too large. Maximum size is 10MB"})
        );
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_upload_returns_envelope_and_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let model = StubModel::replying(VALID_REPLY);
        let app = test_app(dir.path(), model.clone());

        let response = send(
            app,
            upload_request(multipart_body(Some("Jane Doe.PDF"), b"%PDF-1.4 fake")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Resume processed successfully");
        assert_eq!(body["original_filename"], "Jane Doe.PDF");
        assert_eq!(body["file_size"], 13);
        assert_eq!(body["json"]["first_name"], "Jane");
        assert_eq!(body["json"]["skills"], "Rust, SQL");
        assert_eq!(body["json"]["work"][0]["company"], "Acme");
        assert!(body["json"].get("parsing_error").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(body["processed_at"].as_str().unwrap()).is_ok());
        assert_eq!(model.call_count(), 1);

        let pdf_url = body["pdf_url"].as_str().unwrap();
        let file = pdf_url.strip_prefix("/static/").unwrap();
        assert!(file.starts_with("resume_"));
        assert!(file.ends_with("_Jane_Doe.PDF"));
        assert_eq!(body["download_url"], format!("/download-pdf/{file}"));
        assert!(std::fs::read(dir.path().join(file)).unwrap().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_failed_extraction_still_produces_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let model = StubModel::failing(503);
        let app = test_app(dir.path(), model.clone());

        let response = send(app, upload_request(multipart_body(Some("cv.pdf"), b"%PDF"))).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let cause = body["json"]["parsing_error"].as_str().unwrap();
        assert!(cause.starts_with("Parsing failed:"));
        assert_eq!(body["json"]["first_name"], "");
        assert_eq!(body["json"]["work"], json!([]));

        let file = body["pdf_url"].as_str().unwrap().strip_prefix("/static/").unwrap();
        assert!(dir.path().join(file).is_file());
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let app = test_app(&missing, StubModel::replying(VALID_REPLY));

        let response = send(app, upload_request(multipart_body(Some("cv.pdf"), b"%PDF"))).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await, json!({"detail": "Failed to generate PDF"}));
    }

    #[test]
    fn test_validate_upload_order() {
        let upload = PdfUpload {
            filename: Some(String::new()),
            content: Bytes::new(),
        };
        // Empty filename wins over empty content.
        assert!(matches!(
            validate_upload(&upload),
            Err(AppError::Validation(msg)) if msg == "No filename provided"
        ));
    }
}
