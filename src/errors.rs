use thiserror::Error;

/// The flavour of a 4xx response, as reported by the Brightcove APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// 400 `BAD_VALUE`: the request body or query was malformed.
    BadValue,
    /// 403: the credentials lack the permission for this operation.
    Forbidden,
    /// 404 `RESOURCE_NOT_FOUND`.
    NotFound,
    /// 405 `METHOD_NOT_ALLOWED`.
    MethodNotAllowed,
    /// 409 `CONFLICT` or `REFERENCE_IN_USE`.
    Conflict,
    /// 422 `ILLEGAL_FIELD`.
    IllegalField,
    /// 429 `TOO_MANY_REQUESTS`, surfaced once retries are exhausted.
    TooManyRequests,
    /// Any other 4xx.
    Other,
}

impl ClientErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadValue,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            409 => Self::Conflict,
            422 => Self::IllegalField,
            429 => Self::TooManyRequests,
            _ => Self::Other,
        }
    }
}

/// All errors that can occur when using the Brightcove client.
#[derive(Error, Debug)]
pub enum BrightcoveError {
    /// The credential exchange was rejected, or a request still got a 401
    /// after a forced token refresh.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// A 4xx response other than 401.
    #[error("client error {status} ({kind:?}) from {endpoint}: {body}")]
    Client {
        status: u16,
        kind: ClientErrorKind,
        endpoint: String,
        body: String,
    },

    /// A 5xx response that persisted through every retry.
    #[error("server error {status} from {endpoint}: {body}")]
    Server {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// The response body did not match the expected schema.
    #[error("unexpected response shape from {endpoint}: {message}")]
    Schema { endpoint: String, message: String },

    /// Transport failure (connect, TLS, timeout) after retries were exhausted.
    #[error("request to {endpoint} failed: {source}")]
    Network {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The request model failed validation before anything was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or malformed client configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The client was closed; no further requests are admitted.
    #[error("client is closed")]
    Closed,

    /// A transport-level HTTP error outside the retrying dispatcher.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// An I/O error, typically from reading a local source file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Polling an ingest job exceeded the configured timeout.
    #[error("poll timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The ingest job reached the `failed` state.
    #[error("ingest job failed: {0}")]
    JobFailed(String),
}

impl BrightcoveError {
    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for 404 responses.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Client {
                kind: ClientErrorKind::NotFound,
                ..
            }
        )
    }
}

/// A convenience alias for `Result<T, BrightcoveError>`.
pub type Result<T> = std::result::Result<T, BrightcoveError>;
