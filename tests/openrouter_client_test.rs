use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use topicsieve::application::ports::{OracleError, RelevanceOracle};
use topicsieve::infrastructure::llm::{OpenRouterClient, create_openrouter_client};
use topicsieve::presentation::config::OracleSettings;

fn settings(base_url: &str) -> OracleSettings {
    OracleSettings {
        api_key: "test-key".to_string(),
        base_url: base_url.to_string(),
        ..OracleSettings::default()
    }
}

fn client(settings: &OracleSettings) -> OpenRouterClient {
    create_openrouter_client(settings, Duration::from_secs(5)).unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "gen-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

#[tokio::test]
async fn given_successful_completion_when_asking_then_returns_message_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("x-title", "Keyword Analyzer"))
        .and(body_partial_json(json!({
            "model": "mistralai/mistral-7b-instruct",
            "max_tokens": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("true")))
        .expect(1)
        .mount(&server)
        .await;

    let answer = client(&settings(&server.uri()))
        .ask("running gear", "running")
        .await
        .unwrap();

    assert_eq!(answer, "true");
}

#[tokio::test]
async fn given_prompt_when_asking_then_topic_and_keyword_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("false")))
        .mount(&server)
        .await;

    client(&settings(&server.uri()))
        .ask("buy shoes", "marathon training")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages[0]["role"], "system");
    let user = messages[1]["content"].as_str().unwrap();
    assert!(user.contains("Topic: \"marathon training\""), "{user}");
    assert!(user.contains("Keyword: \"buy shoes\""), "{user}");
}

#[tokio::test]
async fn given_referer_configured_when_asking_then_header_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("http-referer", "https://example.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("false")))
        .expect(1)
        .mount(&server)
        .await;
    let settings = OracleSettings {
        referer: Some("https://example.test".to_string()),
        ..settings(&server.uri())
    };

    assert!(client(&settings).ask("k", "t").await.is_ok());
}

#[tokio::test]
async fn given_429_when_asking_then_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let error = client(&settings(&server.uri())).ask("k", "t").await.unwrap_err();

    assert_eq!(error, OracleError::RateLimited);
}

#[tokio::test]
async fn given_server_error_when_asking_then_api_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let error = client(&settings(&server.uri())).ask("k", "t").await.unwrap_err();

    assert_eq!(error, OracleError::ApiError { status: 502 });
}

#[tokio::test]
async fn given_non_json_body_when_asking_then_malformed_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let error = client(&settings(&server.uri())).ask("k", "t").await.unwrap_err();

    assert!(matches!(error, OracleError::MalformedResponse(_)));
}

#[tokio::test]
async fn given_empty_choices_or_null_content_when_asking_then_malformed_response() {
    for body in [
        json!({"choices": []}),
        json!({"choices": [{"message": {"role": "assistant", "content": null}}]}),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let error = client(&settings(&server.uri())).ask("k", "t").await.unwrap_err();

        assert_eq!(
            error,
            OracleError::MalformedResponse("missing message content".to_string())
        );
    }
}

#[tokio::test]
async fn given_unreachable_endpoint_when_asking_then_transport_error() {
    let error = client(&settings("http://127.0.0.1:1"))
        .ask("k", "t")
        .await
        .unwrap_err();

    assert!(matches!(error, OracleError::TransportError(_)));
}

#[test]
fn given_blank_api_key_when_preflighting_then_not_configured() {
    let blank_key = OracleSettings {
        api_key: "  ".to_string(),
        ..OracleSettings::default()
    };

    let error = client(&blank_key).preflight().unwrap_err();

    assert_eq!(
        error,
        OracleError::NotConfigured("API key is not configured".to_string())
    );
    assert!(client(&settings("http://localhost")).preflight().is_ok());
}

#[test]
fn given_base_url_with_trailing_slash_when_creating_then_accepted() {
    assert!(create_openrouter_client(&settings("http://localhost/"), Duration::from_secs(1)).is_ok());
}
