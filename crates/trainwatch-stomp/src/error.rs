use thiserror::Error;

/// Errors from the STOMP codec and connection state machine.
#[derive(Debug, Error)]
pub enum StompError {
    /// The wire bytes did not form a well-formed STOMP frame.
    #[error("malformed STOMP frame: {0}")]
    Malformed(String),
    /// Underlying transport I/O error.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    /// The broker returned an ERROR frame.
    #[error("broker error: {0}")]
    Broker(String),
    /// The connect handshake did not complete with a CONNECTED frame.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
    /// No heartbeat or frame arrived within the negotiated window.
    #[error("heartbeat timeout")]
    HeartbeatTimeout,
    /// The connection was closed by the remote end.
    #[error("remote disconnected")]
    RemoteDisconnected,
    /// Connection attempts exhausted the configured maximum.
    #[error("maximum connection attempts ({0}) exhausted")]
    AttemptsExhausted(u32),
}
