use reqwest::StatusCode;

/// Failures raised by the media and transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Microphone access was denied or no usable device exists.
    /// Terminal; never retried.
    #[error("media access denied: {0}")]
    MediaAccessDenied(String),

    /// The offer/answer exchange or link bring-up failed. Transient;
    /// retried a bounded number of times.
    #[error("session negotiation failed: {0}")]
    NegotiationFailed(String),

    /// The event channel dropped without a session-end handshake.
    #[error("channel closed unexpectedly: {}", .reason.as_deref().unwrap_or("no reason given"))]
    ChannelClosed { reason: Option<String> },

    /// `establish` was called while a session is already active.
    #[error("transport already established")]
    AlreadyEstablished,
}

impl TransportError {
    /// Terminal failures must not be retried.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransportError::MediaAccessDenied(_))
    }
}

/// Failures from the interview backend API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
}
