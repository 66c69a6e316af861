//! Shared error type across coven crates.

use thiserror::Error;

/// Coarse failure taxonomy. Decides how a failure is handled, not what it says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller misuse: double start/connect, stop/disconnect while idle, bad input.
    Precondition,
    /// I/O failure on an established connection. Ends that connection only.
    Transport,
    /// Peer sent something undecodable. Ends that connection only.
    Protocol,
    /// Application listener failed. Caught at the notification boundary.
    Listener,
    /// Configuration rejected at load time.
    Config,
}

impl ErrorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::Precondition => "precondition",
            ErrorClass::Transport => "transport",
            ErrorClass::Protocol => "protocol",
            ErrorClass::Listener => "listener",
            ErrorClass::Config => "config",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CovenError>;

/// Unified error type used by core and relay.
#[derive(Debug, Error)]
pub enum CovenError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("bad frame: {0}")]
    BadFrame(String),
    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("connection closed")]
    ConnectionClosed,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("write timed out")]
    Timeout,
    #[error("server was already started")]
    AlreadyRunning,
    #[error("server was not started")]
    NotRunning,
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("listener failed: {0}")]
    Listener(String),
}

impl CovenError {
    /// Stable machine-readable code (logs, test vectors).
    pub fn code(&self) -> &'static str {
        match self {
            CovenError::InvalidAddress(_) => "INVALID_ADDRESS",
            CovenError::BadFrame(_) => "BAD_FRAME",
            CovenError::FrameTooLarge { .. } => "FRAME_TOO_LARGE",
            CovenError::UnsupportedVersion => "UNSUPPORTED_VERSION",
            CovenError::ConnectionClosed => "CONNECTION_CLOSED",
            CovenError::Io(_) => "IO",
            CovenError::Timeout => "TIMEOUT",
            CovenError::AlreadyRunning => "ALREADY_RUNNING",
            CovenError::NotRunning => "NOT_RUNNING",
            CovenError::AlreadyConnected => "ALREADY_CONNECTED",
            CovenError::NotConnected => "NOT_CONNECTED",
            CovenError::Unsupported(_) => "UNSUPPORTED",
            CovenError::Config(_) => "CONFIG",
            CovenError::Listener(_) => "LISTENER",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            CovenError::InvalidAddress(_)
            | CovenError::AlreadyRunning
            | CovenError::NotRunning
            | CovenError::AlreadyConnected
            | CovenError::NotConnected => ErrorClass::Precondition,
            CovenError::BadFrame(_)
            | CovenError::FrameTooLarge { .. }
            | CovenError::UnsupportedVersion
            | CovenError::Unsupported(_) => ErrorClass::Protocol,
            CovenError::ConnectionClosed | CovenError::Io(_) | CovenError::Timeout => {
                ErrorClass::Transport
            }
            CovenError::Config(_) => ErrorClass::Config,
            CovenError::Listener(_) => ErrorClass::Listener,
        }
    }

    /// Orderly end of stream (peer hung up between frames).
    pub fn is_disconnect(&self) -> bool {
        matches!(self, CovenError::ConnectionClosed)
    }
}
