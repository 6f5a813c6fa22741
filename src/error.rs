use thiserror::Error;

/// Unified error type for panel operations
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network, DNS or timeout failure reported by the transport
    #[error("request {url} failed: {message}")]
    Transport { url: String, message: String },

    /// HTTP status above 400
    #[error("request {url} failed with status {status}: {body}")]
    Remote {
        status: u16,
        url: String,
        body: String,
    },

    /// Envelope carried a non-zero `code`
    #[error("ret {envelope} invalid")]
    RemoteLogical { envelope: String },

    /// Node type outside the supported families
    #[error("unsupported node type: {0}")]
    UnsupportedNodeType(String),

    /// Payload did not match the expected shape
    #[error("unmarshal {resource} failed: {message}, raw: {raw}")]
    Decode {
        resource: &'static str,
        message: String,
        raw: String,
    },

    /// Unusable local configuration (bad rule file, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result alias for panel operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Failure reported by a [`PanelTransport`](crate::business::api::PanelTransport)
/// before any HTTP status was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::new(err.to_string())
    }
}
