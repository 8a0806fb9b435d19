use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures a request can hit inside the gateway. Each maps to one HTTP reply.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Server Error: {:?}", .0.kind())]
    Io(#[from] std::io::Error),

    #[error("Proxy Error: Cannot connect to backend server. Please make sure the tokenizer backend is running at {backend}.")]
    Proxy {
        backend: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read request body: {0}")]
    Body(#[from] axum::Error),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Io(e) => tracing::error!(error = %e, "asset read failed"),
            GatewayError::Proxy { source, .. } => tracing::error!(error = %source, "proxy request failed"),
            GatewayError::Body(e) => tracing::warn!(error = %e, "bad request body"),
        }

        let status = match self {
            GatewayError::Body(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_message_names_kind() {
        let err = GatewayError::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert_eq!(err.to_string(), "Server Error: PermissionDenied");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
