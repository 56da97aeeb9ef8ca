use axum::http::StatusCode;
use tracing::error;

/// Errors shared by the record stores, the aggregator and the advice requester.
#[derive(Debug, thiserror::Error)]
pub enum DiaryError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// No OpenAI credential in settings or server configuration.
    #[error("OpenAI API key is not configured")]
    CredentialMissing,

    /// Completion API or health provider failure. Never retried automatically.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DiaryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::CredentialMissing => StatusCode::PRECONDITION_FAILED,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type DiaryResult<T> = Result<T, DiaryError>;

/// Converts an error into the `(StatusCode, String)` rejection used by handlers.
pub fn reject(e: DiaryError) -> (StatusCode, String) {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "request failed");
    }
    (status, e.to_string())
}
