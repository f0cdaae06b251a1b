/// Failures that can end an orchestrated request. Input errors are shown
/// verbatim; request failures are shown behind an `Error: ` prefix.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Please enter a manga title")]
    EmptyTitle,

    #[error("Count must be between 1 and 20")]
    InvalidCount,

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
