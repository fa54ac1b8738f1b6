// @zen-component: COACH-OpenAIProvider
//
//! OpenAI chat-completions provider.
//!
//! Posts to `/chat/completions` with `stream: true` and reads the server-sent
//! event body until the `[DONE]` sentinel. Each event carries one
//! `chat.completion.chunk`; only `choices[0].delta.content` is forwarded.

use async_trait::async_trait;
use futures_util::{Stream, StreamExt, TryStreamExt, future};
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{ChatProvider, FragmentStream, ProviderError, ProviderKind};
use crate::models::chat::{ChatMessage, ChatRequest};

/// Default API base used when none is configured.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Terminal event payload of an OpenAI stream.
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIChunk {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    error: Option<OpenAIErrorBody>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    #[serde(default)]
    delta: OpenAIDelta,
}

#[derive(Default, Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIErrorBody,
}

/// Streaming client for an OpenAI-compatible chat-completions API.
#[derive(Debug, Clone)]
pub struct OpenAiChatProvider {
    client: Client,
    endpoint: Url,
}

impl OpenAiChatProvider {
    /// Create a provider rooted at `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(base_url: &Url) -> Result<Self, url::ParseError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            endpoint: chat_completions_url(base_url)?,
        })
    }

    /// The resolved `/chat/completions` URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn stream_chat(
        &self,
        api_key: &str,
        request: ChatRequest,
    ) -> Result<FragmentStream, ProviderError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .header(ACCEPT, "text/event-stream")
            .json(&OpenAIChatRequest {
                model: &request.model,
                messages: &request.messages,
                temperature: request.temperature,
                stream: true,
            })
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        debug!(model = %request.model, "provider stream opened");
        let events = sse_stream::SseStream::from_byte_stream(response.bytes_stream());
        Ok(fragments(events))
    }
}

/// Map a stream of SSE events to text fragments.
///
/// Stops at `[DONE]` or right after the first error. Events without content
/// (role announcements, finish markers, keep-alives) are skipped.
pub fn fragments<S>(events: S) -> FragmentStream
where
    S: Stream<Item = Result<sse_stream::Sse, sse_stream::Error>> + Send + 'static,
{
    let stream = events
        .map_err(|e| ProviderError::Stream(e.to_string()))
        .try_take_while(|sse| future::ready(Ok(!is_done(sse))))
        .try_filter_map(|sse| future::ready(parse_chunk(&sse)))
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        });
    Box::pin(stream)
}

fn is_done(sse: &sse_stream::Sse) -> bool {
    sse.data.as_deref().map(str::trim) == Some(DONE_SENTINEL)
}

/// Extract the content delta from a single SSE event.
fn parse_chunk(sse: &sse_stream::Sse) -> Result<Option<String>, ProviderError> {
    let Some(data) = sse.data.as_deref().filter(|d| !d.trim().is_empty()) else {
        return Ok(None);
    };
    let chunk: OpenAIChunk =
        serde_json::from_str(data).map_err(|e| ProviderError::Decode(e.to_string()))?;
    if let Some(error) = chunk.error {
        return Err(ProviderError::Upstream(error.message));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

/// Prefer the API's `error.message` over the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<OpenAIErrorResponse>(body)
        .map(|r| r.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Join `chat/completions` onto a base URL, keeping its last path segment.
fn chat_completions_url(base: &Url) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn event(data: &str) -> Result<sse_stream::Sse, sse_stream::Error> {
        Ok(sse_stream::Sse {
            event: None,
            data: Some(data.to_string()),
            id: None,
            retry: None,
        })
    }

    fn delta(content: &str) -> String {
        serde_json::json!({
            "object": "chat.completion.chunk",
            "choices": [{ "index": 0, "delta": { "content": content } }]
        })
        .to_string()
    }

    #[test]
    fn endpoint_keeps_version_segment() {
        let base: Url = "https://api.openai.com/v1".parse().expect("url");
        let provider = OpenAiChatProvider::new(&base).expect("provider");
        assert_eq!(
            provider.endpoint().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        let base: Url = "http://localhost:8080/v1/".parse().expect("url");
        let provider = OpenAiChatProvider::new(&base).expect("provider");
        assert_eq!(
            provider.endpoint().as_str(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn request_body_is_streaming() {
        let messages = [ChatMessage::system("sys"), ChatMessage::user("q")];
        let body = serde_json::to_value(OpenAIChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.4,
            stream: true,
        })
        .expect("serialize");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "q");
    }

    #[test]
    fn parse_chunk_extracts_content() {
        let sse = event(&delta("Great")).expect("event");
        assert_eq!(parse_chunk(&sse).expect("chunk"), Some("Great".to_string()));
    }

    #[test]
    fn parse_chunk_skips_role_and_finish_chunks() {
        let role = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        let finish = r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#;
        let empty = r#"{"choices":[]}"#;
        for data in [role, finish, empty, ""] {
            let sse = event(data).expect("event");
            assert_eq!(parse_chunk(&sse).expect("chunk"), None, "data: {data}");
        }
    }

    #[test]
    fn parse_chunk_surfaces_in_band_errors() {
        let sse = event(r#"{"error":{"message":"overloaded"}}"#).expect("event");
        let err = parse_chunk(&sse).expect_err("error chunk");
        assert!(matches!(err, ProviderError::Upstream(m) if m == "overloaded"));
    }

    #[test]
    fn parse_chunk_rejects_garbage() {
        let sse = event("not json").expect("event");
        assert!(matches!(parse_chunk(&sse), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn error_message_prefers_api_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
        assert_eq!(error_message("gateway timeout"), "gateway timeout");
    }

    #[tokio::test]
    async fn fragments_preserve_order_and_stop_at_done() {
        let events = vec![
            event(r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#),
            event(&delta("Great")),
            event(&delta(" readiness")),
            event(&delta(" today.")),
            event("[DONE]"),
            event(&delta("ignored")),
        ];
        let collected: Vec<String> = fragments(futures_util::stream::iter(events))
            .try_collect()
            .await
            .expect("stream");
        assert_eq!(collected, vec!["Great", " readiness", " today."]);
    }

    #[tokio::test]
    async fn fragments_end_after_in_band_error() {
        let events = vec![
            event(&delta("Great")),
            event(r#"{"error":{"message":"server_error"}}"#),
        ];
        let mut stream = fragments(futures_util::stream::iter(events));
        assert_eq!(
            stream.next().await.and_then(Result::ok),
            Some("Great".to_string())
        );
        assert!(matches!(stream.next().await, Some(Err(ProviderError::Upstream(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn fragments_end_after_undecodable_chunk() {
        let events = vec![event("not json"), event(&delta("late"))];
        let mut stream = fragments(futures_util::stream::iter(events));
        assert!(matches!(stream.next().await, Some(Err(ProviderError::Decode(_)))));
        assert!(stream.next().await.is_none());
    }

    fn chat_request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("How should I train?")],
            temperature: 0.4,
        }
    }

    fn provider_for(server: &MockServer) -> OpenAiChatProvider {
        let base: Url = format!("{}/v1", server.uri()).parse().expect("url");
        OpenAiChatProvider::new(&base).expect("provider")
    }

    fn sse_body(data: &[String]) -> String {
        data.iter().map(|d| format!("data: {d}\n\n")).collect()
    }

    #[tokio::test]
    async fn stream_chat_relays_streamed_completion() {
        let server = MockServer::start().await;
        let body = sse_body(&[
            r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#.to_string(),
            delta("Great"),
            delta(" day"),
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#.to_string(),
            "[DONE]".to_string(),
        ]);
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "stream": true,
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "How should I train?" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&server)
            .await;

        let stream = provider_for(&server)
            .stream_chat("sk-test", chat_request())
            .await
            .expect("stream opened");
        let collected: Vec<String> = stream.try_collect().await.expect("fragments");
        assert_eq!(collected, vec!["Great", " day"]);
    }

    #[tokio::test]
    async fn stream_chat_reports_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .stream_chat("sk-wrong", chat_request())
            .await;
        match result {
            Err(ProviderError::Status { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a status error"),
        }
    }

    #[tokio::test]
    async fn stream_chat_surfaces_in_band_error() {
        let server = MockServer::start().await;
        let body = sse_body(&[
            delta("Great"),
            r#"{"error":{"message":"server_error"}}"#.to_string(),
            delta(" never"),
        ]);
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let mut stream = provider_for(&server)
            .stream_chat("sk-test", chat_request())
            .await
            .expect("stream opened");
        assert_eq!(stream.next().await.and_then(Result::ok), Some("Great".to_string()));
        assert!(matches!(
            stream.next().await,
            Some(Err(ProviderError::Upstream(m))) if m == "server_error"
        ));
        assert!(stream.next().await.is_none());
    }
}
