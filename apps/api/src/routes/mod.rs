pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::assistant::handlers as assistant;
use crate::demo::handlers as demo;
use crate::profile::handlers as profile;
use crate::state::AppState;

/// Headroom above the file ceiling for multipart framing and the other fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/profile", get(profile::handle_get_profile))
        // Assistant (streamed text)
        .route("/api/v1/chat", post(assistant::handle_chat))
        .route("/api/v1/analyze-resume", post(assistant::handle_analyze_resume))
        .route("/api/v1/recommend-skills", post(assistant::handle_recommend_skills))
        .route("/api/v1/insights", post(assistant::handle_insights))
        .route("/api/v1/section-qa", post(assistant::handle_section_qa))
        // Demo
        .route(
            "/api/v1/demo/parse-cv",
            post(demo::handle_parse_cv).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/api/v1/demo/form", post(demo::handle_demo_form))
        .route("/api/v1/demo/preview", post(demo::handle_demo_preview))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use futures::stream;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::{AppMode, Config};
    use crate::llm_client::{CompletionGateway, CompletionRequest, LlmError, TextStream};
    use crate::profile::ProfileCatalog;

    const CLIENT_IP: &str = "203.0.113.7";
    const RAW_CV: &str = "Jane Doe, jane@x.com, Skills: Python, SQL";

    #[derive(Default)]
    struct FakeGateway {
        reply: String,
        chunks: Vec<&'static str>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeGateway {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                ..Default::default()
            })
        }

        fn streaming(chunks: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                chunks,
                ..Default::default()
            })
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionGateway for FakeGateway {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request);
            Ok(self.reply.clone())
        }

        async fn stream(&self, request: CompletionRequest) -> Result<TextStream, LlmError> {
            self.seen.lock().unwrap().push(request);
            let chunks: Vec<Result<String, LlmError>> =
                self.chunks.iter().map(|c| Ok(c.to_string())).collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    fn app_with(config: Config, gateway: Option<Arc<FakeGateway>>) -> Router {
        let gateway = gateway.map(|g| g as Arc<dyn CompletionGateway>);
        let state = AppState::new(config, ProfileCatalog::bundled().unwrap(), gateway);
        build_router(state)
    }

    fn app(gateway: Option<Arc<FakeGateway>>) -> Router {
        app_with(Config::default(), gateway)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", CLIENT_IP)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_multipart(uri: &str, file_name: &str, mime: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(b"--BOUNDARY\r\n");
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
                 Content-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(
            b"\r\n--BOUNDARY\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\nen\r\n--BOUNDARY--\r\n",
        );
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=BOUNDARY")
            .header("x-forwarded-for", CLIENT_IP)
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn chat_body() -> Value {
        json!({"messages": [{"role": "user", "content": "What does John do?"}], "language": "en"})
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["completions"], false);
    }

    #[tokio::test]
    async fn test_profile_endpoint_falls_back_on_bad_language() {
        let app = app(None);
        let response = app
            .clone()
            .oneshot(Request::get("/api/v1/profile?language=en").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["language"], "en");
        assert_eq!(body["profile"]["personal"]["name"], "John Doe");

        let response = app
            .oneshot(Request::get("/api/v1/profile?language=xx").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await["language"], "es");
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let response = app(None)
            .oneshot(post_json("/api/v1/chat", chat_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["errorCode"], "api_key_missing");
    }

    #[tokio::test]
    async fn test_chat_streams_chunks_in_order() {
        let gateway = FakeGateway::streaming(vec!["Hello", ", ", "world"]);
        let response = app(Some(gateway.clone()))
            .oneshot(post_json("/api/v1/chat", chat_body()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "Hello, world");

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        let system = requests[0].system.as_deref().unwrap();
        assert!(system.contains("John Doe"));
        assert!(system.contains("Always respond in English."));
        assert_eq!(requests[0].messages[0].content, "What does John do?");
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_envelope() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(Some(FakeGateway::replying("")))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errorCode"], "invalid_request");
    }

    #[tokio::test]
    async fn test_chat_rejects_bad_messages() {
        let response = app(Some(FakeGateway::streaming(vec![])))
            .oneshot(post_json("/api/v1/chat", json!({"messages": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errorCode"], "invalid_messages");
    }

    #[tokio::test]
    async fn test_section_qa_validation() {
        let app = app(Some(FakeGateway::streaming(vec!["ok"])));
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/section-qa",
                json!({"section": "hobbies", "question": "Why?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errorCode"], "invalid_section");

        let response = app
            .oneshot(post_json(
                "/api/v1/section-qa",
                json!({"section": "skills", "question": "   "}),
            ))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["errorCode"], "invalid_question");
    }

    #[tokio::test]
    async fn test_analysis_accepts_bodyless_post() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/insights")
            .body(Body::empty())
            .unwrap();
        let response = app(Some(FakeGateway::streaming(vec!["{}"])))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "{}");
    }

    #[tokio::test]
    async fn test_cv_data_only_honoured_in_demo_mode() {
        let cv = json!({"personal": {"name": "Zed Example"}});
        let mut body = chat_body();
        body["cvData"] = cv;

        let personal = FakeGateway::streaming(vec!["ok"]);
        app(Some(personal.clone()))
            .oneshot(post_json("/api/v1/chat", body.clone()))
            .await
            .unwrap();
        let system = personal.requests()[0].system.clone().unwrap();
        assert!(system.contains("John Doe"));
        assert!(!system.contains("Zed Example"));

        let demo = FakeGateway::streaming(vec!["ok"]);
        let config = Config {
            app_mode: AppMode::Demo,
            ..Config::default()
        };
        app_with(config, Some(demo.clone()))
            .oneshot(post_json("/api/v1/chat", body))
            .await
            .unwrap();
        let system = demo.requests()[0].system.clone().unwrap();
        assert!(system.contains("Zed Example"));
        assert!(!system.contains("John Doe"));
    }

    #[tokio::test]
    async fn test_demo_mode_without_cv_data_uses_empty_profile() {
        let config = Config {
            app_mode: AppMode::Demo,
            ..Config::default()
        };
        let gateway = FakeGateway::streaming(vec!["{}"]);
        let app = app_with(config, Some(gateway.clone()));

        for body in [json!({"language": "en"}), json!({"language": "en", "cvData": null})] {
            let response = app
                .clone()
                .oneshot(post_json("/api/v1/insights", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let requests = gateway.requests();
        assert_eq!(requests.len(), 2);
        for request in requests {
            let prompt = &request.messages[0].content;
            assert!(!prompt.contains("John Doe"));
            assert!(!prompt.contains("Python"));
        }
    }

    #[tokio::test]
    async fn test_demo_parse_embeds_text_and_sanitises_reply() {
        let gateway = FakeGateway::replying(
            "Sure! ```json\n{\"personal\": {\"name\": \" Jane Doe \"}, \"skills\": [{\"name\": \"Python\", \"category\": \"??\"}]}\n```",
        );
        let response = app(Some(gateway.clone()))
            .oneshot(post_json(
                "/api/v1/demo/parse-cv",
                json!({"text": RAW_CV, "language": "en"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["cvData"]["personal"]["name"], "Jane Doe");
        assert_eq!(body["cvData"]["skills"][0]["category"], "programming");

        let requests = gateway.requests();
        let prompt = &requests[0].messages[0].content;
        assert!(prompt.contains(RAW_CV));
        assert!(prompt.contains("\"personal\""));
        assert!(prompt.contains("\"skills\""));
        assert_eq!(requests[0].temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_demo_parse_garbage_reply() {
        let response = app(Some(FakeGateway::replying("I am unable to help with that.")))
            .oneshot(post_json("/api/v1/demo/parse-cv", json!({"text": RAW_CV})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["errorCode"], "invalid_model_response");
    }

    #[tokio::test]
    async fn test_demo_parse_empty_text() {
        let response = app(Some(FakeGateway::replying("{}")))
            .oneshot(post_json("/api/v1/demo/parse-cv", json!({"text": "  \n "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errorCode"], "empty_text");
    }

    #[tokio::test]
    async fn test_demo_parse_rate_limit_then_reject() {
        let app = app(Some(FakeGateway::replying("{\"skills\": []}")));
        for attempt in 1..=8 {
            let response = app
                .clone()
                .oneshot(post_json("/api/v1/demo/parse-cv", json!({"text": RAW_CV})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "attempt {attempt}");
        }

        let response = app
            .oneshot(post_json("/api/v1/demo/parse-cv", json!({"text": RAW_CV})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after: u64 = response.headers()[header::RETRY_AFTER]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));
        assert_eq!(body_json(response).await["errorCode"], "rate_limited");
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_format() {
        let response = app(Some(FakeGateway::replying("{}")))
            .oneshot(post_multipart(
                "/api/v1/demo/parse-cv",
                "cv.txt",
                "text/plain",
                b"plain text cv",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errorCode"], "unsupported_format");
    }

    #[tokio::test]
    async fn test_upload_too_large() {
        let config = Config {
            max_upload_bytes: 16,
            ..Config::default()
        };
        let response = app_with(config, Some(FakeGateway::replying("{}")))
            .oneshot(post_multipart(
                "/api/v1/demo/parse-cv",
                "cv.pdf",
                "application/pdf",
                &[b'%'; 64],
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body_json(response).await["errorCode"], "file_too_large");
    }

    #[tokio::test]
    async fn test_upload_corrupt_document() {
        let response = app(Some(FakeGateway::replying("{}")))
            .oneshot(post_multipart(
                "/api/v1/demo/parse-cv",
                "cv.docx",
                "application/octet-stream",
                b"not a zip archive",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errorCode"], "invalid_file");
    }

    #[tokio::test]
    async fn test_demo_form_and_preview() {
        let app = app(None);
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/v1/demo/form",
                json!({
                    "fullName": "Jane Doe",
                    "email": "jane@x.com",
                    "profile": "Data engineer.",
                    "skills": "Python, SQL",
                    "experienceRole": "Engineer",
                    "experienceHighlights": "Built pipelines\nCut costs\nMentored\nExtra"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cv_data = body_json(response).await["cvData"].clone();
        assert_eq!(cv_data["experience"][0]["id"], "demo-exp-1");

        let response = app
            .oneshot(post_json("/api/v1/demo/preview", json!({ "cvData": cv_data })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["preview"]["readOnly"], true);
        assert_eq!(body["preview"]["fullName"], "Jane Doe");
        assert_eq!(
            body["preview"]["experience"]["highlights"],
            json!(["Built pipelines", "Cut costs"])
        );
        assert_eq!(body["profile"]["certificates"], json!([]));
    }

    #[tokio::test]
    async fn test_demo_form_requires_fields() {
        let response = app(None)
            .oneshot(post_json("/api/v1/demo/form", json!({"fullName": "Jane"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["errorCode"], "invalid_request");
    }
}
