use thiserror::Error;

/// Failure to complete an HTTP exchange at all (as opposed to a non-2xx reply).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request could not be sent: {0}")]
    Request(String),
    #[error("response body could not be read: {0}")]
    Body(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{context} failed with HTTP {status}")]
    Status { status: u16, context: &'static str },
    #[error("could not decode {context}: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },
    #[error("invalid request url: {0}")]
    Url(String),
    #[error("assistant request failed with HTTP {status}")]
    Assistant {
        status: u16,
        error: Option<String>,
        usage_text: Option<String>,
    },
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } | GatewayError::Assistant { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::Url(err.to_string())
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
