//! Errors raised outside of GraphQL resolution.
//!
//! Resolvers report their failures through `async_graphql::Error`; these
//! variants cover the request plumbing around them and are rendered as
//! JSON bodies.

use axum::http::header::ToStrError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CcaError {
    /// \[401\] The `cca-token` header named no known session.
    ///
    /// ```json
    /// {
    ///     "message": "login required",
    ///     "statusCode": 401
    /// }
    /// ```
    #[error("login required")]
    Unauthorized,
    /// \[400\] The `cca-token` header wasn't valid ASCII.
    #[error("invalid token header")]
    InvalidTokenHeader(#[source] ToStrError),
    /// \[404\] No route matched.
    #[error("resource not found")]
    NotFound,
    /// \[500\] A setting was missing or unusable at startup.
    #[error("misconfigured: {0}")]
    Config(String),
    /// \[500\] The relational store failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),
    /// \[500\] The club document store failed.
    #[error("document store error")]
    DocumentStore(#[from] mongodb::error::Error),
}

pub type CcaResult<T> = Result<T, CcaError>;

impl CcaError {
    pub fn status(&self) -> StatusCode {
        match self {
            CcaError::Unauthorized => StatusCode::UNAUTHORIZED,
            CcaError::InvalidTokenHeader(_) => StatusCode::BAD_REQUEST,
            CcaError::NotFound => StatusCode::NOT_FOUND,
            CcaError::Config(_) | CcaError::Database(_) | CcaError::DocumentStore(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn as_json(&self) -> Value {
        let status = self.status().as_u16();

        match self {
            CcaError::InvalidTokenHeader(error) => json!({
                "message": self.to_string(),
                "statusCode": status,
                "reason": error.to_string(),
            }),
            CcaError::Config(_) => json!({
                "message": "server error",
                "statusCode": status,
                "error": self.to_string(),
            }),
            CcaError::Database(error) => json!({
                "message": self.to_string(),
                "statusCode": status,
                "error": error.to_string(),
            }),
            CcaError::DocumentStore(error) => json!({
                "message": self.to_string(),
                "statusCode": status,
                "error": error.to_string(),
            }),
            CcaError::Unauthorized | CcaError::NotFound => json!({
                "message": self.to_string(),
                "statusCode": status,
            }),
        }
    }
}

impl IntoResponse for CcaError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (self.status(), Json(self.as_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tokens_are_unauthorized() {
        let error = CcaError::Unauthorized;

        assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            error.as_json(),
            json!({ "message": "login required", "statusCode": 401 })
        );
    }

    #[test]
    fn unknown_routes_are_not_found() {
        let error = CcaError::NotFound;

        assert_eq!(error.as_json(), json!({ "message": "resource not found", "statusCode": 404 }));
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn config_errors_are_server_errors() {
        let error = CcaError::Config("DATABASE_URL must be set".to_owned());

        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.as_json()["statusCode"], 500);
        assert_eq!(
            error.as_json()["error"],
            "misconfigured: DATABASE_URL must be set"
        );
    }
}
