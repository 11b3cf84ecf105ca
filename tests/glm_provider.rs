//! GLM provider wire-format tests against a mock HTTP server

use coursemate::config::ProviderConfig;
use coursemate::{GlmProvider, Message, ModelProvider, ToolDefinition};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_for(server: &MockServer) -> GlmProvider {
    GlmProvider::new(&ProviderConfig {
        api_base: server.uri(),
        model: "glm-4-flash".to_string(),
        api_key: Some("test-key".to_string()),
    })
    .unwrap()
}

fn tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: "search_course_content".to_string(),
        description: "Search course materials".to_string(),
        parameters: json!({"type": "object", "properties": {}}),
    }]
}

#[tokio::test]
async fn test_text_completion_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "glm-4-flash",
            "temperature": 0.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Lesson 2 covers clients."}}]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let response = provider
        .complete(&[Message::user("What does lesson 2 cover?")], None)
        .await
        .unwrap();

    assert_eq!(response.text.as_deref(), Some("Lesson 2 covers clients."));
    assert!(!response.has_tool_requests());
}

#[tokio::test]
async fn test_tool_requests_parsed_and_tool_choice_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "tool_choice": "auto",
            "tools": [{"type": "function", "function": {"name": "search_course_content"}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {
                "content": "",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "search_course_content",
                        "arguments": "{\"query\":\"clients\"}"
                    }
                }]
            }}]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let definitions = tool_definitions();
    let response = provider
        .complete(&[Message::user("question")], Some(&definitions))
        .await
        .unwrap();

    assert!(response.text.is_none());
    assert_eq!(response.tool_requests.len(), 1);
    assert_eq!(response.tool_requests[0].id, "call_1");
    assert_eq!(response.tool_requests[0].name, "search_course_content");
    assert_eq!(response.tool_requests[0].arguments, "{\"query\":\"clients\"}");
}

#[tokio::test]
async fn test_error_status_maps_to_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .complete(&[Message::user("question")], None)
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("401"));
    assert!(text.contains("invalid api key"));
}

#[tokio::test]
async fn test_no_choices_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .complete(&[Message::user("question")], None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no choices"));
}
