use thiserror::Error;

/// The three failure classes every backend call collapses into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response arrived (connection refused, DNS, reset).
    NetworkFailure,
    /// 4xx, including auth failures and validation rejections.
    ClientError,
    /// 5xx, and any other non-success status.
    ServerError,
}

/// ApiError
///
/// The normalized `{ httpStatus, message }` error produced by the gateway. `message` is
/// the server-supplied one when the body carried it, otherwise a generic transport message.
/// Views show `message` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    /// `None` for network failures.
    pub http_status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NetworkFailure,
            http_status: None,
            message: message.into(),
        }
    }

    /// from_status
    ///
    /// Classifies an HTTP failure. A blank server message falls back to the generic
    /// `Request failed with status code N` text.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        // Only 4xx is the caller's fault. Anything else that is not a success (a 5xx, or a
        // stray 1xx/3xx the client does not follow) is blamed on the server.
        let kind = match status {
            400..=499 => ErrorKind::ClientError,
            _ => ErrorKind::ServerError,
        };
        let message = server_message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| format!("Request failed with status code {status}"));

        Self {
            kind,
            http_status: Some(status),
            message,
        }
    }

    /// A form rejected before it left the client. Reported like a 400 from the server.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ClientError,
            http_status: Some(400),
            message: message.into(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.http_status == Some(401)
    }
}

/// Failures of the durable identity storage.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("identity storage error: {0}")]
    Storage(String),

    #[error("identity record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors surfaced by the `Conferio` context to its consumers.
#[derive(Debug, Error)]
pub enum ConferioError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// The backend answered 401; the identity has been cleared.
    #[error("session expired, sign in again ({0})")]
    SessionExpired(ApiError),
}

impl ConferioError {
    /// Where the caller should navigate after this error, if anywhere.
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            ConferioError::SessionExpired(_) => Some(crate::guard::LOGIN_PATH),
            _ => None,
        }
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ConferioError::Api(error) | ConferioError::SessionExpired(error) => Some(error),
            ConferioError::Session(_) => None,
        }
    }
}
