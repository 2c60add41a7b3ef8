use thiserror::Error;

pub type Result<T, E = MistError> = std::result::Result<T, E>;

/// Failure of a single request against the MIST backend.
///
/// Errors are stored per query and handed to the caller as-is; nothing in this
/// crate retries a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MistError {
    /// The request never produced an HTTP response (connect, timeout, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// A guarded operation was attempted without its inputs (no selection, no labels).
    #[error("precondition not met: {0}")]
    PreconditionNotMet(&'static str),

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl MistError {
    pub fn is_network(&self) -> bool {
        matches!(self, MistError::Network(_))
    }

    pub fn is_server(&self) -> bool {
        matches!(self, MistError::Server { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            MistError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for MistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return MistError::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return MistError::Server {
                status: status.as_u16(),
                body: String::new(),
            };
        }
        MistError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for MistError {
    fn from(err: serde_json::Error) -> Self {
        MistError::Decode(err.to_string())
    }
}
