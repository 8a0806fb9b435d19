// Backend communication with the tokenizer service over HTTP

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Token ids and their text pieces, index-aligned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodeResult {
    token_ids: Vec<i64>,
    token_texts: Vec<String>,
}

impl EncodeResult {
    pub fn new(token_ids: Vec<i64>, token_texts: Vec<String>) -> Result<Self, BackendError> {
        if token_ids.len() != token_texts.len() {
            return Err(BackendError::MalformedResponse(format!(
                "{} token ids but {} token texts",
                token_ids.len(),
                token_texts.len()
            )));
        }
        Ok(Self {
            token_ids,
            token_texts,
        })
    }

    pub fn token_ids(&self) -> &[i64] {
        &self.token_ids
    }

    pub fn token_texts(&self) -> &[String] {
        &self.token_texts
    }

    pub fn len(&self) -> usize {
        self.token_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_ids.is_empty()
    }

    /// Iterate `(id, text)` pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &str)> {
        self.token_ids
            .iter()
            .copied()
            .zip(self.token_texts.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeResponse {
    pub tokens: Vec<i64>,
    pub token_texts: Vec<String>,
}

impl TryFrom<EncodeResponse> for EncodeResult {
    type Error = BackendError;

    fn try_from(response: EncodeResponse) -> Result<Self, Self::Error> {
        EncodeResult::new(response.tokens, response.token_texts)
    }
}

#[derive(Debug, Clone, Serialize)]
struct DecodeRequest<'a> {
    tokens: &'a [i64],
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Malformed or empty user input; no request was sent.
    #[error("{0}")]
    Validation(String),
    /// Backend unreachable, or the request was aborted or timed out.
    #[error("Cannot reach backend: {0}")]
    Connectivity(String),
    #[error("Server error: {}", status_line(.status, .status_text))]
    Server { status: u16, status_text: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// `"404 Not Found"`, or just the code when the reason is unknown.
fn status_line(status: &u16, status_text: &str) -> String {
    if status_text.is_empty() {
        status.to_string()
    } else {
        format!("{} {}", status, status_text)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            BackendError::Server {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            }
        } else {
            BackendError::Connectivity(e.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::MalformedResponse(e.to_string())
    }
}

/// The two remote operations the front end depends on.
#[async_trait]
pub trait TokenizerApi: Send + Sync {
    async fn encode(&self, text: &str) -> Result<EncodeResult, BackendError>;

    async fn decode(&self, tokens: &[i64]) -> Result<String, BackendError>;

    /// Base URL requests are sent to, used in user-facing messages.
    fn base_url(&self) -> &str;
}

pub struct HttpTokenizer {
    client: Client,
    base_url: String,
}

impl HttpTokenizer {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BackendError::Connectivity(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, "POST");

        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Server {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl TokenizerApi for HttpTokenizer {
    async fn encode(&self, text: &str) -> Result<EncodeResult, BackendError> {
        let response: EncodeResponse = self.post_json("encode", text).await?;
        response.try_into()
    }

    async fn decode(&self, tokens: &[i64]) -> Result<String, BackendError> {
        self.post_json("decode", &DecodeRequest { tokens }).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_backend(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str) -> HttpTokenizer {
        HttpTokenizer::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_encode_response_deserialize() {
        let json = r#"{
            "tokens": [15496, 11, 995],
            "token_texts": ["Hello", ",", " world"]
        }"#;

        let response: EncodeResponse = serde_json::from_str(json).unwrap();
        let result = EncodeResult::try_from(response).unwrap();

        assert_eq!(result.token_ids(), &[15496, 11, 995]);
        assert_eq!(result.token_texts()[2], " world");
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_encode_response_requires_both_fields() {
        let json = r#"{"tokens": [1, 2]}"#;
        assert!(serde_json::from_str::<EncodeResponse>(json).is_err());
    }

    #[test]
    fn test_encode_result_rejects_length_mismatch() {
        let err = EncodeResult::new(vec![1, 2, 3], vec!["a".into()]).unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[test]
    fn test_encode_result_iter_pairs() {
        let result = EncodeResult::new(vec![7, 8], vec!["ab".into(), "cd".into()]).unwrap();
        let pairs: Vec<_> = result.iter().collect();
        assert_eq!(pairs, vec![(7, "ab"), (8, "cd")]);
    }

    #[test]
    fn test_decode_request_serialize() {
        let body = serde_json::to_value(DecodeRequest { tokens: &[15496, 11, 995] }).unwrap();
        assert_eq!(body, json!({"tokens": [15496, 11, 995]}));
    }

    #[test]
    fn test_server_error_display() {
        let err = BackendError::Server {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "Server error: 500 Internal Server Error");
    }

    #[test]
    fn test_server_error_without_reason_has_no_trailing_space() {
        let err = BackendError::Server {
            status: 599,
            status_text: String::new(),
        };
        assert_eq!(err.to_string(), "Server error: 599");
    }

    #[tokio::test]
    async fn test_nonstandard_status_is_reported_by_code() {
        let router = Router::new().route(
            "/decode",
            post(|| async { (StatusCode::from_u16(599).unwrap(), "odd") }),
        );
        let base = spawn_backend(router).await;

        let err = client(&base).decode(&[1]).await.unwrap_err();
        assert_eq!(err.to_string(), "Server error: 599");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = client("http://localhost:8080/");
        assert_eq!(api.base_url(), "http://localhost:8080");
        assert_eq!(api.endpoint("encode"), "http://localhost:8080/encode");
    }

    #[tokio::test]
    async fn test_encode_sends_raw_json_string() {
        let router = Router::new().route(
            "/encode",
            post(|Json(text): Json<String>| async move {
                let texts: Vec<String> = text.chars().map(|c| c.to_string()).collect();
                let ids: Vec<i64> = text.chars().map(|c| c as i64).collect();
                Json(json!({"tokens": ids, "token_texts": texts}))
            }),
        );
        let base = spawn_backend(router).await;

        let result = client(&base).encode("  hi").await.unwrap();

        assert_eq!(result.token_texts(), &[" ", " ", "h", "i"]);
        assert_eq!(result.token_ids(), &[32, 32, 104, 105]);
    }

    #[tokio::test]
    async fn test_decode_posts_token_object() {
        let router = Router::new().route(
            "/decode",
            post(|Json(body): Json<serde_json::Value>| async move {
                Json(json!(body["tokens"].to_string()))
            }),
        );
        let base = spawn_backend(router).await;

        let decoded = client(&base).decode(&[15496, 11, 995]).await.unwrap();

        assert_eq!(decoded, "[15496,11,995]");
    }

    #[tokio::test]
    async fn test_decode_empty_string_is_success() {
        let router = Router::new().route("/decode", post(|| async { Json(json!("")) }));
        let base = spawn_backend(router).await;

        assert_eq!(client(&base).decode(&[0]).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_non_success_status_is_server_error() {
        let router = Router::new().route(
            "/encode",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "Encoding error") }),
        );
        let base = spawn_backend(router).await;

        let err = client(&base).encode("hello").await.unwrap_err();

        assert_eq!(
            err,
            BackendError::Server {
                status: 500,
                status_text: "Internal Server Error".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_mismatched_lengths_are_malformed() {
        let router = Router::new().route(
            "/encode",
            post(|| async { Json(json!({"tokens": [1, 2], "token_texts": ["a"]})) }),
        );
        let base = spawn_backend(router).await;

        let err = client(&base).encode("ab").await.unwrap_err();
        assert!(matches!(err, BackendError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_connectivity_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = client(&format!("http://{}", addr));

        assert!(matches!(
            api.encode("hello").await,
            Err(BackendError::Connectivity(_))
        ));
        assert!(matches!(
            api.decode(&[1]).await,
            Err(BackendError::Connectivity(_))
        ));
    }
}
