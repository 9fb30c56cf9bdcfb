use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("explorer request failed: {0}")]
    Explorer(#[from] reqwest::Error),

    #[error("explorer rejected the request: {0}")]
    ExplorerResponse(String),

    #[error("state file {path}: {source}")]
    StateFile {
        path: String,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Engine(EngineError::InvalidSnapshot(_) | EngineError::UnknownRemoteAction(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Engine(EngineError::InvalidSettings(_))
            | Self::Explorer(_)
            | Self::ExplorerResponse(_)
            | Self::StateFile { .. }
            | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
