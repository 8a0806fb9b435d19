//! Static files from the asset root.

use std::io;
use std::path::{Component, Path, PathBuf};

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;

const NOT_FOUND_PAGE: &str = "404.html";

const FALLBACK_404: &str = "<!DOCTYPE html>
<html>
<head><title>404 Not Found</title></head>
<body>
<h1>404 - Page Not Found</h1>
<p>The page you are looking for does not exist.</p>
<p><a href=\"/\">Back to the tokenizer</a></p>
</body>
</html>
";

/// Content type for a file name, by extension. Anything unlisted is plain text.
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "text/plain",
    }
}

/// Map a request path onto a file under `root`. `None` if the path would
/// leave the root.
pub fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    if request_path == "/" {
        return Some(root.join("index.html"));
    }

    let mut resolved = root.to_path_buf();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

pub async fn serve(root: &Path, request_path: &str) -> Result<Response, GatewayError> {
    let Some(path) = resolve(root, request_path) else {
        tracing::debug!(path = request_path, "rejected path outside asset root");
        return Ok(not_found(root).await);
    };

    match tokio::fs::read(&path).await {
        Ok(body) => Ok(([(header::CONTENT_TYPE, content_type(&path))], body).into_response()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(not_found(root).await),
        Err(e) => Err(e.into()),
    }
}

async fn not_found(root: &Path) -> Response {
    let page = match tokio::fs::read(root.join(NOT_FOUND_PAGE)).await {
        Ok(page) => page,
        Err(_) => FALLBACK_404.as_bytes().to_vec(),
    };
    (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, "text/html")], page).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use tempfile::TempDir;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type(Path::new("index.html")), "text/html");
        assert_eq!(content_type(Path::new("a/script.js")), "text/javascript");
        assert_eq!(content_type(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(content_type(Path::new("favicon.ico")), "image/x-icon");
        assert_eq!(content_type(Path::new("notes.md")), "text/plain");
        assert_eq!(content_type(Path::new("Makefile")), "text/plain");
    }

    #[test]
    fn test_resolve() {
        let root = Path::new("/srv/public");
        assert_eq!(resolve(root, "/"), Some(root.join("index.html")));
        assert_eq!(resolve(root, "/css/site.css"), Some(root.join("css/site.css")));
        assert_eq!(resolve(root, "/./a.js"), Some(root.join("a.js")));
        assert_eq!(resolve(root, "/../etc/passwd"), None);
        assert_eq!(resolve(root, "/a/../../b"), None);
    }

    #[tokio::test]
    async fn test_serves_index_with_type() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();

        let response = serve(dir.path(), "/").await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(body_text(response).await, "<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_missing_file_uses_custom_404() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("404.html"), "custom missing").unwrap();

        let response = serve(dir.path(), "/nope.css").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(body_text(response).await, "custom missing");
    }

    #[tokio::test]
    async fn test_missing_404_page_falls_back() {
        let dir = TempDir::new().unwrap();

        let response = serve(dir.path(), "/nope").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("404 - Page Not Found"));
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("public");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "s3cret").unwrap();

        let response = serve(&root, "/../secret.txt").await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!body_text(response).await.contains("s3cret"));
    }

    #[tokio::test]
    async fn test_directory_is_server_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let err = serve(dir.path(), "/sub").await.unwrap_err();
        assert!(err.to_string().starts_with("Server Error: "));
    }
}
