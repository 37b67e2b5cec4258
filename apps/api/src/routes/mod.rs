pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;
use crate::wizard::handlers;

/// Large enough that an oversized PDF reaches intake and gets the size error,
/// rather than a bare transport rejection.
const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/session", get(handlers::handle_get_session))
        .route(
            "/api/v1/session/resume",
            post(handlers::handle_upload_resume).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/session/resume/encoded",
            post(handlers::handle_upload_encoded_resume)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/session/job-description",
            put(handlers::handle_update_job_description),
        )
        .route("/api/v1/session/analyze", post(handlers::handle_analyze))
        .route("/api/v1/session/reset", post(handlers::handle_reset))
        .route("/api/v1/session/report", get(handlers::handle_report))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::analysis::contract::{
        parse_analysis, AnalysisError, AnalysisProvider, AnalysisRequest, AnalysisResult,
    };
    use crate::config::Config;
    use crate::intake::document::MAX_DOCUMENT_BYTES;

    const EXAMPLE_RESPONSE: &str = r#"{"matchScore":72,"summary":"Strong backend alignment","missingKeywords":["Kubernetes"],"culturalFitAnalysis":"Good fit","improvements":[{"section":"Skills","originalConcept":"lists Go","improvedRewrite":"Led migration of 12 microservices to Go, reducing latency 30%","whyItWorks":"adds quantifiable impact"}]}"#;
    const BOUNDARY: &str = "fitcheck-test-boundary";

    struct FixedProvider(&'static str);

    #[async_trait]
    impl AnalysisProvider for FixedProvider {
        async fn analyze(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<AnalysisResult, AnalysisError> {
            parse_analysis(self.0)
        }
    }

    fn app(reply: &'static str) -> Router {
        let config = Config {
            gemini_api_key: None,
            port: 0,
            analysis_timeout: Duration::from_secs(5),
            rust_log: "info".to_string(),
        };
        build_router(AppState::new(Arc::new(FixedProvider(reply)), config))
    }

    fn multipart_request(content_type: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"cv.pdf\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/session/resume")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn pdf(len: usize) -> Vec<u8> {
        let mut data = b"%PDF-1.7\n".to_vec();
        data.resize(len, b'0');
        data
    }

    async fn session(app: &Router) -> Value {
        let response = app
            .clone()
            .oneshot(empty_request(Method::GET, "/api/v1/session"))
            .await
            .unwrap();
        body_json(response).await
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(EXAMPLE_RESPONSE)
            .oneshot(empty_request(Method::GET, "/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_full_wizard_flow() {
        let app = app(EXAMPLE_RESPONSE);

        let response = app
            .clone()
            .oneshot(multipart_request("application/pdf", &pdf(10 * 1024)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = body_json(response).await;
        assert_eq!(view["document"]["filename"], "cv.pdf");
        assert_eq!(view["canAnalyze"], false);

        let response = app
            .clone()
            .oneshot(json_request(
                Method::PUT,
                "/api/v1/session/job-description",
                json!({"text": "Senior backend engineer, 5 years Go, Kubernetes"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["canAnalyze"], true);

        let response = app
            .clone()
            .oneshot(empty_request(Method::POST, "/api/v1/session/analyze"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = body_json(response).await;
        assert_eq!(view["phase"], "results");
        assert_eq!(view["result"]["band"], "strong");
        assert_eq!(view["result"]["improvements"][0]["before"], "lists Go");

        let response = app
            .clone()
            .oneshot(empty_request(Method::GET, "/api/v1/session/report"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Strong Match"));

        let response = app
            .clone()
            .oneshot(empty_request(Method::POST, "/api/v1/session/reset"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = body_json(response).await;
        assert_eq!(view["phase"], "input");
        assert!(view["document"].is_null());
        assert!(view["result"].is_null());
        assert_eq!(view["jobDescription"]["text"], "");
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_rejected() {
        let app = app(EXAMPLE_RESPONSE);
        let response = app
            .clone()
            .oneshot(multipart_request("image/png", b"\x89PNG"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Please upload a PDF file.");

        let view = session(&app).await;
        assert!(view["document"].is_null());
        assert_eq!(view["error"], "Please upload a PDF file.");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let app = app(EXAMPLE_RESPONSE);
        let response = app
            .clone()
            .oneshot(multipart_request("application/pdf", &pdf(MAX_DOCUMENT_BYTES + 1)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "File size exceeds 5MB limit."
        );
        assert!(session(&app).await["document"].is_null());
    }

    #[tokio::test]
    async fn test_encoded_upload_accepts_data_url() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let app = app(EXAMPLE_RESPONSE);
        let data = format!("data:application/pdf;base64,{}", BASE64.encode(pdf(2048)));
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/session/resume/encoded",
                json!({"filename": "encoded.pdf", "data": data}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = body_json(response).await;
        assert_eq!(view["document"]["filename"], "encoded.pdf");
        assert_eq!(view["document"]["sizeBytes"], 2048);
    }

    #[tokio::test]
    async fn test_encoded_upload_over_body_limit_gets_size_error() {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

        let app = app(EXAMPLE_RESPONSE);
        let data = BASE64.encode(pdf(7 * 1024 * 1024));
        assert!(data.len() > UPLOAD_BODY_LIMIT);

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/session/resume/encoded",
                json!({"filename": "big.pdf", "data": data}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(body["error"]["message"], "File size exceeds 5MB limit.");

        let view = session(&app).await;
        assert!(view["document"].is_null());
        assert_eq!(view["error"], "File size exceeds 5MB limit.");
    }

    #[tokio::test]
    async fn test_encoded_upload_with_broken_json_is_validation_error() {
        let app = app(EXAMPLE_RESPONSE);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/session/resume/encoded")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"data\": "))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
        assert!(session(&app).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_analyze_without_resume_is_validation_error() {
        let app = app(EXAMPLE_RESPONSE);
        let response = app
            .clone()
            .oneshot(empty_request(Method::POST, "/api/v1/session/analyze"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Please upload your resume."
        );

        let view = session(&app).await;
        assert_eq!(view["phase"], "input");
        assert_eq!(view["error"], "Please upload your resume.");
    }

    #[tokio::test]
    async fn test_provider_failure_returns_bad_gateway_and_keeps_inputs() {
        let app = app("not json at all");
        app.clone()
            .oneshot(multipart_request("application/pdf", &pdf(1024)))
            .await
            .unwrap();
        app.clone()
            .oneshot(json_request(
                Method::PUT,
                "/api/v1/session/job-description",
                json!({"mode": "url", "url": "https://example.com/jobs/42"}),
            ))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(empty_request(Method::POST, "/api/v1/session/analyze"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"]["code"], "ANALYSIS_ERROR");

        let view = session(&app).await;
        assert_eq!(view["phase"], "input");
        assert_eq!(view["document"]["filename"], "cv.pdf");
        assert_eq!(view["jobDescription"]["url"], "https://example.com/jobs/42");
        assert!(view["error"].as_str().unwrap().contains("malformed JSON"));
    }

    #[tokio::test]
    async fn test_report_requires_results() {
        let response = app(EXAMPLE_RESPONSE)
            .oneshot(empty_request(Method::GET, "/api/v1/session/report"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
