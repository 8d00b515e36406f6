use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storefront_types::api::MutationResponse;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),

    /// A stored record is missing a required part or holds a value that
    /// cannot be read back. Distinct from "not found".
    #[error("Incomplete record: {0}")]
    Incomplete(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Incomplete(_) | Self::Store(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Every failure answers with the `{ success: false, message }` envelope.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }
        (status, Json(MutationResponse::failed(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound("Order").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Invalid("bad".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Conflict("taken".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Incomplete("buyer".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Store(anyhow::anyhow!("disk I/O error")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ApiError::NotFound("Order").to_string(), "Order not found");
        assert_eq!(
            ApiError::Store(anyhow::anyhow!("database is locked")).to_string(),
            "Store error: database is locked"
        );
    }
}
