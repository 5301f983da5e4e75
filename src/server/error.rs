// src/server/error.rs
use crate::probe::CheckError;
use hyper::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use hyper::{Body, Method, Response, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Method not allowed")]
    MethodNotAllowed(Method),

    #[error("Not found")]
    NotFound,

    #[error("Status check failed: {0}")]
    CheckFailed(#[from] CheckError),

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::CheckFailed(_) | ApiError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to clients; internal detail stays in the logs.
    fn public_message(&self) -> &'static str {
        match self {
            ApiError::MethodNotAllowed(_) => "Method not allowed",
            ApiError::NotFound => "Not found",
            ApiError::CheckFailed(_) => "Failed to check site statuses",
            ApiError::Encode(_) => "Internal server error",
        }
    }
}

// Convert ApiError to a JSON error response
impl From<ApiError> for Response<Body> {
    fn from(err: ApiError) -> Self {
        let body = serde_json::json!({ "error": err.public_message() }).to_string();

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = err.status();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let ApiError::MethodNotAllowed(allowed) = &err {
            if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
                response.headers_mut().insert(ALLOW, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response<Body>) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_method_not_allowed_response() {
        let response: Response<Body> = ApiError::MethodNotAllowed(Method::GET).into();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "GET");
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Method not allowed" })
        );
    }

    #[tokio::test]
    async fn test_check_failure_is_generic_500() {
        let err = ApiError::from(CheckError::NoResults { attempted: 9 });
        let response: Response<Body> = err.into();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "error": "Failed to check site statuses" })
        );
    }
}
