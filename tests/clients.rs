use httpmock::prelude::*;
use relaygraph::clients::{
    ChatCompletionsClient, CompletionConfig, CompletionError, CompletionService, SearchClient,
    SearchConfig, SearchOutcome,
};
use relaygraph::message::Message;
use serde_json::json;

fn completion_config(server: &MockServer) -> CompletionConfig {
    CompletionConfig::new("test-key").with_base_url(server.base_url())
}

fn search_config(server: &MockServer) -> SearchConfig {
    SearchConfig::new("test-key").with_base_url(server.url("/search"))
}

#[tokio::test]
async fn completion_parses_message_and_tool_calls() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_includes(r#"{"model": "deepseek-chat"}"#);
            then.status(200).json_body(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "Recommend follow-up CT in 6 months.",
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "web_search",
                                "arguments": "{\"query\":\"fleischner criteria\"}"
                            }
                        }]
                    }
                }]
            }));
        })
        .await;

    let client = ChatCompletionsClient::new(completion_config(&server));
    let completion = client
        .complete(&[Message::user("7mm nodule, next steps?")])
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(completion.message.role, Message::ASSISTANT);
    assert_eq!(completion.message.content, "Recommend follow-up CT in 6 months.");
    assert!(completion.has_tool_calls());
    assert_eq!(completion.tool_calls[0].name, "web_search");
    assert_eq!(
        completion.tool_calls[0].arguments,
        json!({"query": "fleischner criteria"})
    );
}

#[tokio::test]
async fn completion_declares_bound_tools_on_the_wire() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body_includes(
                    r#"{"tools": [{"type": "function", "function": {"name": "web_search"}}]}"#,
                );
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            }));
        })
        .await;

    let client = ChatCompletionsClient::new(completion_config(&server))
        .bind_tools(vec![SearchClient::tool_spec()]);
    client.complete(&[Message::user("q")]).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn completion_retries_server_errors_then_surfaces_the_failure() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503).body("overloaded");
        })
        .await;

    let client = ChatCompletionsClient::new(completion_config(&server));
    let err = client.complete(&[Message::user("q")]).await.unwrap_err();

    // Initial attempt plus max_retries.
    mock.assert_hits_async(3).await;
    assert!(matches!(err, CompletionError::Api { status: 503, .. }));
}

#[tokio::test]
async fn completion_does_not_retry_client_errors() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).body("bad key");
        })
        .await;

    let client = ChatCompletionsClient::new(completion_config(&server));
    let err = client.complete(&[Message::user("q")]).await.unwrap_err();

    mock.assert_hits_async(1).await;
    assert!(matches!(err, CompletionError::Api { status: 401, .. }));
}

#[tokio::test]
async fn completion_without_choices_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({"choices": []}));
        })
        .await;

    let client = ChatCompletionsClient::new(completion_config(&server));
    let err = client.complete(&[Message::user("q")]).await.unwrap_err();
    assert!(matches!(err, CompletionError::EmptyResponse));
}

#[tokio::test]
async fn search_parses_a_full_payload() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/search")
                .query_param("q", "pulmonary nodule")
                .query_param("engine", "google")
                .query_param("api_key", "test-key");
            then.status(200).json_body(json!({
                "search_information": {
                    "query_displayed": "pulmonary nodule",
                    "total_results": 4200u64
                },
                "organic_results": [
                    {"title": "Guideline", "link": "https://g.example", "snippet": "Follow-up."}
                ],
                "knowledge_graph": {
                    "title": "Pulmonary nodule",
                    "description": "Small rounded opacity.",
                    "type": "Medical condition"
                },
                "related_searches": [{"query": "lung-rads"}]
            }));
        })
        .await;

    let client = SearchClient::new(search_config(&server));
    let outcome = client.search("pulmonary nodule", 3).await;

    mock.assert_async().await;
    let results = match outcome {
        SearchOutcome::Results(results) => results,
        SearchOutcome::Unavailable(reason) => panic!("expected results, got unavailable: {reason}"),
    };
    assert_eq!(results.hits.len(), 1);
    assert_eq!(results.total_results, Some(4200));
    assert_eq!(results.knowledge_panel.unwrap().title, "Pulmonary nodule");
    assert_eq!(results.related_queries, ["lung-rads"]);
}

#[tokio::test]
async fn search_upstream_failure_becomes_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(500).body("backend down");
        })
        .await;

    let client = SearchClient::new(search_config(&server));
    let outcome = client.search("anything", 3).await;
    assert!(outcome.is_unavailable());
}

#[tokio::test]
async fn search_empty_payload_becomes_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/search");
            then.status(200).json_body(json!({"search_information": {}}));
        })
        .await;

    let client = SearchClient::new(search_config(&server));
    let outcome = client.search("anything", 3).await;
    assert!(outcome.is_unavailable());
}
