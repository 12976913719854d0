//! Error types for sending text messages

use std::fmt;

/// Result type alias for SMS operations
pub type SmsResult<T> = Result<T, SmsError>;

/// Errors that can occur while talking to the SMS provider
#[derive(Debug)]
pub enum SmsError {
    /// The request could not be sent or the response could not be read
    Transport(reqwest::Error),

    /// The provider rejected the account credentials
    Unauthorized(u16),

    /// The provider answered with an unexpected HTTP status
    Http(u16),

    /// The XML-RPC call returned a fault (e.g. invalid destination)
    Fault { code: i64, message: String },

    /// The provider answered with something that is not an XML-RPC response
    InvalidResponse(String),

    /// The message does not fit into a single text message
    MessageTooLong { length: usize, max: usize },
}

impl fmt::Display for SmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmsError::Transport(err) => write!(f, "SMS transport error: {}", err),
            SmsError::Unauthorized(status) => {
                write!(f, "SMS provider rejected credentials (HTTP {})", status)
            }
            SmsError::Http(status) => write!(f, "SMS provider returned HTTP {}", status),
            SmsError::Fault { code, message } => {
                write!(f, "SMS provider fault {}: {}", code, message)
            }
            SmsError::InvalidResponse(msg) => write!(f, "invalid SMS provider response: {}", msg),
            SmsError::MessageTooLong { length, max } => {
                write!(f, "message too long ({} characters, max {})", length, max)
            }
        }
    }
}

impl std::error::Error for SmsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SmsError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SmsError {
    fn from(err: reqwest::Error) -> Self {
        SmsError::Transport(err)
    }
}
