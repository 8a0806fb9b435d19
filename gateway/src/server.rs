use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::GatewayError;
use crate::{assets, proxy};

#[derive(Clone)]
pub struct GatewayState {
    pub root: Arc<PathBuf>,
    pub backend: Arc<str>,
    pub client: reqwest::Client,
}

impl GatewayState {
    pub fn new(root: PathBuf, backend: &str, proxy_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(proxy_timeout).build()?;
        Ok(Self {
            root: Arc::new(root),
            backend: Arc::from(backend.trim_end_matches('/')),
            client,
        })
    }
}

pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(State(state): State<GatewayState>, request: Request) -> Result<Response, GatewayError> {
    let path = request.uri().path().to_string();
    if proxy::is_api_path(&path) {
        proxy::forward(&state, request).await
    } else {
        assets::serve(&state.root, &path).await
    }
}

/// Adds the CORS headers to every response and answers preflights itself.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::Json;
    use tempfile::TempDir;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Backend that echoes what it received.
    async fn spawn_backend() -> String {
        let router = Router::new()
            .route(
                "/encode",
                post(|request: Request| async move {
                    let query = request.uri().query().unwrap_or("").to_string();
                    let host = request
                        .headers()
                        .get(header::HOST)
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
                        .await
                        .unwrap();
                    Json(echo(&query, &host, &body))
                }),
            )
            .route("/decode", post(|| async { (StatusCode::BAD_REQUEST, "bad tokens") }));
        spawn(router).await
    }

    fn echo(query: &str, host: &str, body: &[u8]) -> std::collections::HashMap<&'static str, String> {
        std::collections::HashMap::from([
            ("query", query.to_string()),
            ("host", host.to_string()),
            ("body", String::from_utf8_lossy(body).into_owned()),
        ])
    }

    async fn spawn_gateway(root: &TempDir, backend: &str) -> String {
        let state = GatewayState::new(root.path().to_path_buf(), backend, Duration::from_secs(5)).unwrap();
        spawn(create_router(state)).await
    }

    fn assert_cors(response: &reqwest::Response) {
        let h = response.headers();
        assert_eq!(h["access-control-allow-origin"], "*");
        assert_eq!(h["access-control-allow-methods"], "GET, POST, OPTIONS");
        assert_eq!(h["access-control-allow-headers"], "Content-Type");
    }

    #[tokio::test]
    async fn test_proxies_api_with_prefix_stripped() {
        let root = TempDir::new().unwrap();
        let backend = spawn_backend().await;
        let gateway = spawn_gateway(&root, &backend).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/encode?lang=en", gateway))
            .header("content-type", "application/json")
            .body("\"Hello\"")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_cors(&response);
        let text = response.text().await.unwrap();
        assert!(text.contains("\"query\":\"lang=en\""), "{text}");
        assert!(text.contains("\\\"Hello\\\""), "{text}");
        // Host names the backend, not the gateway.
        let backend_host = backend.trim_start_matches("http://");
        assert!(text.contains(&format!("\"host\":\"{}\"", backend_host)), "{text}");
    }

    #[tokio::test]
    async fn test_backend_status_passes_through() {
        let root = TempDir::new().unwrap();
        let backend = spawn_backend().await;
        let gateway = spawn_gateway(&root, &backend).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/decode", gateway))
            .body("[1]")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        assert_eq!(response.text().await.unwrap(), "bad tokens");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_proxy_error() {
        let root = TempDir::new().unwrap();
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let backend = format!("http://{}", closed.local_addr().unwrap());
        drop(closed);
        let gateway = spawn_gateway(&root, &backend).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/encode", gateway))
            .body("\"x\"")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        assert_cors(&response);
        let text = response.text().await.unwrap();
        assert!(text.starts_with("Proxy Error: Cannot connect to backend server."));
        assert!(text.contains(&backend));
    }

    #[tokio::test]
    async fn test_options_is_empty_204_everywhere() {
        let root = TempDir::new().unwrap();
        let gateway = spawn_gateway(&root, "http://127.0.0.1:1").await;

        for path in ["/", "/api/encode", "/missing.png"] {
            let response = reqwest::Client::new()
                .request(reqwest::Method::OPTIONS, format!("{}{}", gateway, path))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 204);
            assert_cors(&response);
            assert!(response.text().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_static_and_404_carry_cors() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("index.html"), "<p>index</p>").unwrap();
        std::fs::write(root.path().join("app.js"), "let x = 1;").unwrap();
        let gateway = spawn_gateway(&root, "http://127.0.0.1:1").await;

        let index = reqwest::get(format!("{}/", gateway)).await.unwrap();
        assert_eq!(index.status(), 200);
        assert_cors(&index);
        assert_eq!(index.headers()["content-type"], "text/html");

        let script = reqwest::get(format!("{}/app.js?v=2", gateway)).await.unwrap();
        assert_eq!(script.headers()["content-type"], "text/javascript");
        assert_eq!(script.text().await.unwrap(), "let x = 1;");

        let missing = reqwest::get(format!("{}/nope.css", gateway)).await.unwrap();
        assert_eq!(missing.status(), 404);
        assert_cors(&missing);
    }
}
