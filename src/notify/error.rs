//! Notification error types

use thiserror::Error;

/// Errors that can occur while sending a notification
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP authentication failed: {0}")]
    Auth(String),

    #[error("SMTP network error: {0}")]
    Network(String),
}

impl SendError {
    /// Classify an SMTP transport error
    ///
    /// Permanent rejections (bad credentials, refused sender) will not
    /// succeed on retry; everything else is treated as transient.
    pub fn from_transport(err: lettre::transport::smtp::Error) -> Self {
        if err.is_permanent() {
            SendError::Auth(err.to_string())
        } else {
            SendError::Network(err.to_string())
        }
    }

    /// Short kind label for log output
    pub fn kind(&self) -> &'static str {
        match self {
            SendError::InvalidRecipient(_) => "invalid-recipient",
            SendError::Message(_) => "message",
            SendError::Auth(_) => "auth",
            SendError::Network(_) => "network",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(SendError::Auth("535 bad credentials".to_string()).kind(), "auth");
        assert_eq!(SendError::Network("connection reset".to_string()).kind(), "network");
    }

    #[test]
    fn test_invalid_recipient_from_address_error() {
        let err: Result<lettre::Address, _> = "not-an-address".parse();
        let send_err: SendError = err.unwrap_err().into();
        assert_eq!(send_err.kind(), "invalid-recipient");
    }
}
