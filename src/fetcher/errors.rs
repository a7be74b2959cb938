use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("connection error: {0}")]
    Connect(String),

    #[error("body read error: {0}")]
    Body(String),

    #[error("transport error: {0}")]
    Transport(String),

    /// Any status other than 200. Never retried.
    #[error("failed to retrieve (status: {})", status.as_u16())]
    TerminalHttp { status: StatusCode },

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl FetchError {
    pub fn should_retry(&self) -> bool {
        match self {
            Self::InvalidUrl(_) => false,
            Self::TerminalHttp { .. } => false,
            Self::RetriesExhausted { .. } => false,

            Self::ConnectTimeout => true,
            Self::RequestTimeout => true,
            Self::Connect(_) => true,
            Self::Body(_) => true,
            Self::Transport(_) => true,
        }
    }

    /// Status code carried by a terminal HTTP failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::TerminalHttp { status } => Some(*status),
            _ => None,
        }
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if let Some(status) = err.status() {
            Self::TerminalHttp { status }
        } else if err.is_connect() || err.is_request() {
            // DNS failures and refused or reset connections land here
            Self::Connect(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
