pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/analyze",
            post(handlers::handle_analyze).layer(upload_limit),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::{AnalyzerSettings, ResumeAnalyzer};
    use crate::extract::TextExtractor;
    use crate::storage::DiskUploadStorage;
    use crate::testing::{FakeExtractor, FakeModel, SAMPLE_REPLY};

    const BOUNDARY: &str = "resumespark-test-boundary";

    enum Part<'a> {
        File(&'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart_body(parts: &[Part]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File(name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"resume.pdf\"\r\n\
                             Content-Type: application/pdf\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn analyze_request(parts: &[Part]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn app(
        dir: &Path,
        extractor: Arc<dyn TextExtractor>,
        model: Arc<FakeModel>,
        max_upload_bytes: usize,
    ) -> Router {
        let analyzer = ResumeAnalyzer::new(
            AnalyzerSettings::default(),
            Arc::new(DiskUploadStorage::new(dir)),
            extractor,
            model,
        );
        build_router(AppState {
            analyzer: Arc::new(analyzer),
            max_upload_bytes,
        })
    }

    fn default_app(dir: &Path, model: Arc<FakeModel>) -> Router {
        app(
            dir,
            Arc::new(FakeExtractor::ok("Jane Doe. Rust, Postgres, AWS.")),
            model,
            1024 * 1024,
        )
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(default_app(dir.path(), Arc::new(FakeModel::text("{}"))), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_success_returns_analysis_shape() {
        let dir = tempfile::tempdir().unwrap();
        let app = default_app(dir.path(), Arc::new(FakeModel::text(SAMPLE_REPLY)));

        let (status, body) = send(
            app,
            analyze_request(&[
                Part::File("resume", b"%PDF-1.4 fake"),
                Part::Text("jobDescription", "Senior backend engineer, Rust"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["score"].is_number());
        assert!(body["strengths"]
            .as_array()
            .unwrap()
            .iter()
            .all(Value::is_string));
        assert!(body["weaknesses"]
            .as_array()
            .unwrap()
            .iter()
            .all(Value::is_string));
        for project in body["projects"].as_array().unwrap() {
            assert!(project["strength"].is_string());
            assert!(project["weakness"].is_string());
        }
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_fenced_reply_returns_same_body() {
        let dir = tempfile::tempdir().unwrap();
        let parts = [
            Part::File("resume", b"%PDF-1.4"),
            Part::Text("jobDescription", "Data engineer"),
        ];
        let fenced = format!("```json\n{SAMPLE_REPLY}\n```");

        let (_, plain) = send(
            default_app(dir.path(), Arc::new(FakeModel::text(SAMPLE_REPLY))),
            analyze_request(&parts),
        )
        .await;
        let (status, stripped) = send(
            default_app(dir.path(), Arc::new(FakeModel::text(&fenced))),
            analyze_request(&parts),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(plain, stripped);
    }

    #[tokio::test]
    async fn test_missing_job_description_is_400_without_upload() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(FakeModel::text(SAMPLE_REPLY));

        let (status, body) = send(
            default_app(dir.path(), model.clone()),
            analyze_request(&[Part::File("resume", b"%PDF-1.4")]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing resume or job description.");
        assert!(is_empty(dir.path()));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_resume_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            default_app(dir.path(), Arc::new(FakeModel::text(SAMPLE_REPLY))),
            analyze_request(&[Part::Text("jobDescription", "Platform engineer")]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body["error"].as_str().unwrap().is_empty());
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_resume_sent_as_text_field_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(
            default_app(dir.path(), Arc::new(FakeModel::text(SAMPLE_REPLY))),
            analyze_request(&[
                Part::Text("resume", "not a file"),
                Part::Text("jobDescription", "Platform engineer"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_job_description_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = send(
            default_app(dir.path(), Arc::new(FakeModel::text(SAMPLE_REPLY))),
            analyze_request(&[
                Part::File("resume", b"%PDF-1.4"),
                Part::Text("jobDescription", "   "),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_non_multipart_request_is_400_json() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"jobDescription": "x"}).to_string()))
            .unwrap();

        let (status, body) = send(
            default_app(dir.path(), Arc::new(FakeModel::text(SAMPLE_REPLY))),
            request,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_model_json_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            default_app(
                dir.path(),
                Arc::new(FakeModel::text("The candidate looks strong overall.")),
            ),
            analyze_request(&[
                Part::File("resume", b"%PDF-1.4"),
                Part::Text("jobDescription", "ML engineer"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
        assert!(body.get("score").is_none());
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_zero_candidates_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            default_app(dir.path(), Arc::new(FakeModel::reply(json!({"candidates": []})))),
            analyze_request(&[
                Part::File("resume", b"%PDF-1.4"),
                Part::Text("jobDescription", "ML engineer"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("candidates"));
        assert!(is_empty(dir.path()));
    }

    #[tokio::test]
    async fn test_extraction_failure_is_500_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(FakeModel::text(SAMPLE_REPLY));
        let app = app(
            dir.path(),
            Arc::new(FakeExtractor::failing()),
            model.clone(),
            1024 * 1024,
        );

        let (status, body) = send(
            app,
            analyze_request(&[
                Part::File("resume", b"%PDF-1.4 broken"),
                Part::Text("jobDescription", "SRE"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("xref"));
        assert!(is_empty(dir.path()));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_model_unavailable_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = send(
            default_app(dir.path(), Arc::new(FakeModel::unavailable())),
            analyze_request(&[
                Part::File("resume", b"%PDF-1.4"),
                Part::Text("jobDescription", "SRE"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let big = vec![b'a'; 4096];
        let app = app(
            dir.path(),
            Arc::new(FakeExtractor::ok("cv")),
            Arc::new(FakeModel::text(SAMPLE_REPLY)),
            512,
        );

        let (status, body) = send(
            app,
            analyze_request(&[
                Part::File("resume", &big),
                Part::Text("jobDescription", "SRE"),
            ]),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].is_string());
        assert!(is_empty(dir.path()));
    }
}
