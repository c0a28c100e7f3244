use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue},
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::info;

use crate::errors::AppError;
use crate::state::AppState;
use crate::storage;

/// GET /download-pdf/:filename
/// Serves a generated PDF as an attachment. The name is sanitized before it
/// touches the filesystem, so only files directly inside the output directory
/// are reachable. The file is streamed from disk, with range and conditional
/// request support.
pub async fn handle_download_pdf(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let safe_name = storage::sanitize_filename(&filename);
    let not_found = || AppError::NotFound("PDF not found".to_string());

    let path = storage::resolve(&state.config.output_dir, &safe_name).ok_or_else(not_found)?;
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(not_found()),
    }

    let mut response = match ServeFile::new(&path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    };
    if response.status().is_success() {
        let disposition = format!("attachment; filename=\"processed_{safe_name}\"");
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/pdf"),
        );
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_bytes(disposition.as_bytes())
                .map_err(|e| AppError::Internal(e.into()))?,
        );
    }
    info!("Serving {} ({})", path.display(), response.status());

    Ok(response)
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::json;

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_download_existing_pdf() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("resume_1.pdf"), b"%PDF-1.3 body").unwrap();
        let app = test_app(dir.path(), StubModel::replying("{}"));

        let response = send(app, get("/download-pdf/resume_1.pdf")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"processed_resume_1.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.3 body");
    }

    #[tokio::test]
    async fn test_download_honours_range_requests() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("resume_2.pdf"), b"%PDF-1.3 body").unwrap();
        let app = test_app(dir.path(), StubModel::replying("{}"));
        let request = Request::get("/download-pdf/resume_2.pdf")
            .header(header::RANGE, "bytes=0-3")
            .body(Body::empty())
            .unwrap();

        let response = send(app, request).await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"processed_resume_2.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"%PDF");
    }

    #[tokio::test]
    async fn test_download_missing_pdf_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path(), StubModel::replying("{}"));

        let response = send(app, get("/download-pdf/nope.pdf")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"detail": "PDF not found"}));
    }

    #[tokio::test]
    async fn test_download_rejects_traversal() {
        let root = tempfile::tempdir().unwrap();
        let output = root.path().join("static");
        std::fs::create_dir(&output).unwrap();
        std::fs::write(root.path().join("secret.pdf"), b"%PDF secret").unwrap();
        let app = test_app(&output, StubModel::replying("{}"));

        // Encoded "../secret.pdf" decodes into the path parameter intact.
        let response = send(app, get("/download-pdf/..%2Fsecret.pdf")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_directory_name_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        let app = test_app(dir.path(), StubModel::replying("{}"));

        let response = send(app, get("/download-pdf/nested")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
