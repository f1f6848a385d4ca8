use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub body: String,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub encoding: String,
    pub byte_len: u64,
    pub status: u16,
    /// Canonical reason phrase for `status`, empty when there is none.
    pub status_text: String,
}

impl FetchMetadata {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// One row of the mirror ("Times") table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRecord {
    pub id: i64,
    pub html_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("invalid mirror store url: {0}")]
    InvalidUrl(String),
    #[error("mirror store request timed out")]
    Timeout,
    #[error("mirror store returned {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("unexpected mirror store response: {0}")]
    Decode(String),
    #[error("mirror store unreachable: {0}")]
    Network(String),
}

impl StoreError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}
