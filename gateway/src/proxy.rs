//! Forwarding of `/api/*` requests to the tokenizer backend.

use axum::body::{to_bytes, Body};
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderName};
use axum::response::Response;

use crate::error::GatewayError;
use crate::server::GatewayState;

pub const API_PREFIX: &str = "/api";

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

pub fn is_api_path(path: &str) -> bool {
    path.starts_with(API_PREFIX)
}

/// Backend URL for a gateway path and query: `/api/encode?x=1` becomes
/// `{backend}/encode?x=1`.
pub fn target_url(backend: &str, path: &str, query: Option<&str>) -> String {
    let rest = path.strip_prefix(API_PREFIX).unwrap_or(path);
    let mut url = String::with_capacity(backend.len() + rest.len() + 1);
    url.push_str(backend);
    if !rest.starts_with('/') {
        url.push('/');
    }
    url.push_str(rest);
    if let Some(query) = query {
        url.push('?');
        url.push_str(query);
    }
    url
}

fn forwardable(headers: &HeaderMap, drop_host: bool) -> HeaderMap {
    let mut out = headers.clone();
    for name in &HOP_BY_HOP {
        out.remove(name);
    }
    if drop_host {
        out.remove(header::HOST);
    }
    // Length is recomputed from the buffered body.
    out.remove(header::CONTENT_LENGTH);
    out
}

pub async fn forward(state: &GatewayState, request: Request) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();
    let url = target_url(&state.backend, parts.uri.path(), parts.uri.query());
    tracing::info!(method = %parts.method, path = %parts.uri, target = %url, "Proxying API request");

    let body = to_bytes(body, usize::MAX).await?;
    let proxy_err = |source| GatewayError::Proxy {
        backend: state.backend.to_string(),
        source,
    };

    let upstream = state
        .client
        .request(parts.method, &url)
        .headers(forwardable(&parts.headers, true))
        .body(body)
        .send()
        .await
        .map_err(proxy_err)?;

    let status = upstream.status();
    let headers = forwardable(upstream.headers(), false);
    let bytes = upstream.bytes().await.map_err(proxy_err)?;

    tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "backend replied");

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url_strips_prefix_and_keeps_query() {
        let backend = "http://localhost:8080";
        assert_eq!(target_url(backend, "/api/encode", None), "http://localhost:8080/encode");
        assert_eq!(
            target_url(backend, "/api/decode", Some("verbose=1")),
            "http://localhost:8080/decode?verbose=1"
        );
        assert_eq!(target_url(backend, "/api", None), "http://localhost:8080/");
    }

    #[test]
    fn test_api_path_detection() {
        assert!(is_api_path("/api/encode"));
        assert!(is_api_path("/api"));
        assert!(!is_api_path("/index.html"));
        assert!(!is_api_path("/"));
    }

    #[test]
    fn test_hop_by_hop_and_host_are_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "localhost:3000".parse().unwrap());
        headers.insert(header::CONNECTION, "keep-alive".parse().unwrap());
        headers.insert("keep-alive", "timeout=5".parse().unwrap());
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        headers.insert("x-trace", "abc".parse().unwrap());

        let out = forwardable(&headers, true);
        assert!(out.get(header::HOST).is_none());
        assert!(out.get(header::CONNECTION).is_none());
        assert!(out.get("keep-alive").is_none());
        assert_eq!(out[header::CONTENT_TYPE], "application/json");
        assert_eq!(out["x-trace"], "abc");
    }
}
