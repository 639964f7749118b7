use pretty_assertions::assert_eq;
use reglens_core::ANALYZE_PATH;
use reglens_core::AnalysisClient;
use reglens_core::AnalysisOutcome;
use reglens_core::HighlightStyle;
use reglens_core::StreamError;
use reglens_core::Transcript;
use reglens_core::drive;
use serde_json::Value;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;

/// One record whose `content` is a JSON-encoded string, as the backend
/// produces for model-generated kinds.
fn sse_record(kind: &str, content: &Value) -> String {
    let record = json!({ "type": kind, "content": content.to_string() });
    format!("data: {record}\n\n")
}

/// One record whose `content` is embedded as-is.
fn sse_inline_record(kind: &str, content: &Value) -> String {
    let record = json!({ "type": kind, "content": content });
    format!("data: {record}\n\n")
}

async fn mount_stream(server: &MockServer, text: &str, body: String) {
    Mock::given(method("POST"))
        .and(path(ANALYZE_PATH))
        .and(body_json(json!({ "text": text })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_raw(body, "text/event-stream"),
        )
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn streams_a_full_analysis_into_the_transcript() {
    let text = "For marketing we collect emails from users.";
    let body = [
        sse_record(
            "regulation",
            &json!({
                "regulations": [
                    { "regulation": "GDPR", "description": "EU data protection law" },
                ],
            }),
        ),
        sse_record(
            "article",
            &json!({
                "articles": [
                    {
                        "regulation": "GDPR",
                        "article": "Article 5",
                        "description": "Principles relating to processing",
                    },
                ],
            }),
        ),
        sse_record(
            "citation",
            &json!({
                "citations": [
                    {
                        "regulation": "GDPR",
                        "article": "Article 5",
                        "citation": "Personal data shall be processed lawfully",
                    },
                ],
            }),
        ),
        sse_inline_record(
            "related_document",
            &json!({
                "regulation": "GDPR",
                "article": "Article 5",
                "document": {
                    "document_id": "doc-1",
                    "link": "https://example.com/gdpr",
                    "source_type": "web",
                    "semantic_identifier": "GDPR full text",
                },
            }),
        ),
        sse_record(
            "summary",
            &json!({
                "summary": {
                    "considerations": [
                        {
                            "text_segment": "we collect emails",
                            "regulation": "GDPR",
                            "article": "Article 5",
                            "analysis": "Collection requires a lawful basis",
                            "severity": "high",
                            "recommended_action": "Document a lawful basis",
                        },
                    ],
                },
            }),
        ),
    ]
    .concat();

    let server = MockServer::start().await;
    mount_stream(&server, text, body).await;

    let client = AnalysisClient::new(server.uri());
    let mut transcript = Transcript::new();
    let id = transcript.submit(text);
    let stream = client.analyze(text).await.unwrap();
    let outcome = drive(&mut transcript, id, stream, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, AnalysisOutcome::Completed);
    let message = transcript.analysis(id).unwrap();
    assert_eq!(message.events().len(), 5);
    assert_eq!(message.display_text(), "analysis complete");

    let index = message.index();
    let regulation = &index.regulations["GDPR"];
    assert_eq!(regulation.description, "EU data protection law");
    let article = &regulation.articles["Article 5"];
    assert_eq!(article.citations.len(), 1);
    assert_eq!(article.related_documents.len(), 1);
    assert_eq!(
        article.related_documents[0].document.document_id,
        "doc-1"
    );
    assert!(index.unresolved.is_empty());

    let annotated = message.annotated_text();
    assert_eq!(annotated.spans.len(), 1);
    assert_eq!(
        &annotated.source[annotated.spans[0].range.clone()],
        "we collect emails"
    );
    assert_eq!(annotated.spans[0].style, HighlightStyle::Severe);
    assert!(annotated.to_html().contains("analysis-highlight-severe"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_backend_error_record_fails_the_message_and_keeps_prior_events() {
    let text = "Anything at all.";
    let body = [
        sse_record(
            "regulation",
            &json!({
                "regulations": [
                    { "regulation": "GDPR", "description": "EU data protection law" },
                ],
            }),
        ),
        sse_inline_record("error", &json!("No valid regulations found")),
        sse_record(
            "article",
            &json!({
                "articles": [
                    { "regulation": "GDPR", "article": "Article 5", "description": "late" },
                ],
            }),
        ),
    ]
    .concat();

    let server = MockServer::start().await;
    mount_stream(&server, text, body).await;

    let client = AnalysisClient::new(server.uri());
    let mut transcript = Transcript::new();
    let id = transcript.submit(text);
    let stream = client.analyze(text).await.unwrap();
    let outcome = drive(&mut transcript, id, stream, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AnalysisOutcome::Failed {
            reason: "No valid regulations found".to_string(),
        }
    );
    let message = transcript.analysis(id).unwrap();
    // The record after the error is never decoded.
    assert_eq!(message.events().len(), 1);
    assert_eq!(message.display_text(), "error: No valid regulations found");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn undecodable_lines_are_skipped_without_ending_the_stream() {
    let text = "Resilience check.";
    let body = [
        sse_record(
            "regulation",
            &json!({
                "regulations": [
                    { "regulation": "GDPR", "description": "EU data protection law" },
                ],
            }),
        ),
        "data: not-json\n\n".to_string(),
        "event: keep-alive\n\n".to_string(),
        sse_record(
            "article",
            &json!({
                "articles": [
                    {
                        "regulation": "GDPR",
                        "article": "Article 5",
                        "description": "Principles relating to processing",
                    },
                ],
            }),
        ),
    ]
    .concat();

    let server = MockServer::start().await;
    mount_stream(&server, text, body).await;

    let client = AnalysisClient::new(server.uri());
    let mut transcript = Transcript::new();
    let id = transcript.submit(text);
    let stream = client.analyze(text).await.unwrap();
    let outcome = drive(&mut transcript, id, stream, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, AnalysisOutcome::Completed);
    assert_eq!(transcript.analysis(id).unwrap().events().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_success_responses_surface_as_http_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ANALYZE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalysisClient::new(server.uri());
    let err = client.analyze("text").await.unwrap_err();

    assert!(matches!(
        err,
        StreamError::Http { status: 500, ref message } if message == "backend exploded"
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_unterminated_trailing_fragment_is_discarded() {
    let text = "Trailing fragment.";
    let mut body = sse_record(
        "regulation",
        &json!({
            "regulations": [
                { "regulation": "GDPR", "description": "EU data protection law" },
            ],
        }),
    );
    // A record cut off mid-line, with no closing newline.
    body.push_str(r#"data: {"type": "article", "content"#);

    let server = MockServer::start().await;
    mount_stream(&server, text, body).await;

    let client = AnalysisClient::new(server.uri());
    let mut transcript = Transcript::new();
    let id = transcript.submit(text);
    let stream = client.analyze(text).await.unwrap();
    let outcome = drive(&mut transcript, id, stream, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome, AnalysisOutcome::Completed);
    assert_eq!(transcript.analysis(id).unwrap().events().len(), 1);
}
