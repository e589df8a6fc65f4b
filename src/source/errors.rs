use std::fmt;

/// Which read operation failed; prefixed to every error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Latest,
    History,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Endpoint::Latest => "latest",
            Endpoint::History => "history",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request never produced a response (DNS, connect, reset, ...).
    #[error("{endpoint}: request failed: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status.
    #[error("{endpoint}: HTTP {status}")]
    Status { endpoint: Endpoint, status: u16 },

    /// The body was not the expected JSON shape.
    #[error("{endpoint}: malformed response: {source}")]
    Malformed {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl SourceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
