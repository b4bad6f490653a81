use crate::types::ProblemDetails;

#[derive(Debug, thiserror::Error)]
pub enum ShortenerClientError {
    #[error("Invalid base URL [{url}]: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request never got a response.
    #[error("Backend unavailable: {0}")]
    Network(String),

    /// The backend answered with a non-success status. `message` is taken from the problem
    /// details when the body carried them.
    #[error("{message}")]
    Http {
        status: u16,
        problem: Option<ProblemDetails>,
        message: String,
    },

    #[error("Unexpected response body with status {status}: {reason}")]
    InvalidBody { status: u16, reason: String },
}

impl ShortenerClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::InvalidBody { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Http {
                problem: Some(problem),
                ..
            } => problem.request_id(),
            _ => None,
        }
    }
}
