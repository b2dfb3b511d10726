use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: String,
}

impl CompletionMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionResponseMessage,
}

#[derive(Deserialize)]
struct CompletionResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Sends one chat-completion request and returns the reply text
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError>;
}

/// OpenAI-compatible `chat/completions` client (Groq, Perplexity)
#[derive(Clone, Default)]
pub struct ChatCompletionClient {
    client: Client,
}

impl ChatCompletionClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Use a preconfigured client (proxy, timeouts)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    async fn complete(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        let response = self.client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        parse_reply(&body)
    }
}

/// Text of the first choice in a `chat/completions` response body
pub(crate) fn parse_reply(body: &str) -> Result<String, GatewayError> {
    let response: CompletionResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or(GatewayError::EmptyReply)
}

/// `error.message` from an API error body, or a generic message
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| "Error al comunicarse con la API".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "llama3-8b-8192".to_string(),
            messages: vec![
                CompletionMessage::system("sé útil"),
                CompletionMessage::user("¿qué ceno?"),
            ],
            temperature: 0.2,
            max_tokens: 1000,
        }
    }

    fn client() -> ChatCompletionClient {
        ChatCompletionClient::with_client(Client::builder().no_proxy().build().unwrap())
    }

    /// Whether `raw` holds the headers plus a body of `content-length` bytes
    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..head_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.trim().eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        raw.len() >= head_end + 4 + length
    }

    /// Answer a single HTTP request with `status` and `body`; the handle
    /// yields the raw request that was received
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/chat/completions", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8(raw).unwrap()
        });

        (endpoint, handle)
    }

    #[tokio::test]
    async fn test_complete_posts_json_with_bearer_key() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"choices": [{"message": {"role": "assistant", "content": "Lentejas"}}]}"#,
        )
        .await;

        let reply = client().complete(&endpoint, "gsk-test", &request()).await.unwrap();
        assert_eq!(reply, "Lentejas");

        let raw = server.await.unwrap();
        let (head, body) = raw.split_once("\r\n\r\n").unwrap();
        let head = head.to_lowercase();
        assert!(head.starts_with("post /chat/completions http/1.1"));
        assert!(head.contains("authorization: bearer gsk-test"));
        assert!(head.contains("content-type: application/json"));

        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["model"], "llama3-8b-8192");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "¿qué ceno?");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[tokio::test]
    async fn test_complete_reports_api_error_message() {
        let (endpoint, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#,
        )
        .await;

        let err = client().complete(&endpoint, "wrong", &request()).await.unwrap_err();
        match err {
            GatewayError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid API Key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_falls_back_on_unreadable_error_body() {
        let (endpoint, _server) = serve_once("502 Bad Gateway", "<html>bad gateway</html>").await;

        let err = client().complete(&endpoint, "gsk-test", &request()).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Status { status: 502, ref message } if message == "Error al comunicarse con la API"
        ));
    }

    #[test]
    fn test_parse_reply_takes_first_choice() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Hola"}},
                {"index": 1, "message": {"role": "assistant", "content": "Adiós"}}
            ]
        }"#;
        assert_eq!(parse_reply(body).unwrap(), "Hola");
    }

    #[test]
    fn test_parse_reply_without_choices() {
        assert!(matches!(
            parse_reply(r#"{"choices": []}"#),
            Err(GatewayError::EmptyReply)
        ));
        assert!(matches!(
            parse_reply("<html>bad gateway</html>"),
            Err(GatewayError::Malformed(_))
        ));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"message": "Invalid API Key", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Invalid API Key");
        assert_eq!(error_message("oops"), "Error al comunicarse con la API");
    }

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest {
            model: "llama3-8b-8192".to_string(),
            messages: vec![
                CompletionMessage::system("sé útil"),
                CompletionMessage::user("hola"),
            ],
            temperature: 0.2,
            max_tokens: 1000,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hola");
        assert_eq!(json["max_tokens"], 1000);
    }
}
