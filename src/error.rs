//! Error types for the MohnNode firmware.
//!
//! Every variant is `Copy` so errors can be logged, stored in results and
//! folded into `success = false` flags without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failure below the HTTP status line: the request never produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The network link is down; the request was not attempted.
    NotConnected,
    /// Connect, write or read exceeded the configured timeout.
    Timeout,
    /// Socket or driver level I/O failure.
    Io,
    /// The endpoint URL could not be parsed.
    InvalidUrl,
    /// The URL scheme is not supported by this transport.
    Unsupported,
    /// The peer sent something that is not an HTTP response.
    BadResponse,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Timeout => write!(f, "timed out"),
            Self::Io => write!(f, "I/O error"),
            Self::InvalidUrl => write!(f, "invalid URL"),
            Self::Unsupported => write!(f, "unsupported scheme"),
            Self::BadResponse => write!(f, "bad HTTP response"),
        }
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Failure of one request/response exchange with the game backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    Transport(TransportError),
    /// The server answered with a non-200 status.
    HttpStatus(u16),
    /// The body was not the expected JSON shape.
    Malformed,
    /// The server answered 200 but flagged the request as unsuccessful.
    Rejected,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Malformed => write!(f, "malformed response body"),
            Self::Rejected => write!(f, "rejected by server"),
        }
    }
}

impl From<TransportError> for ProtocolError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    /// The partition has no free entries left.
    Full,
    Io,
    /// Namespace or key exceeds the 15-character NVS limit.
    InvalidKey,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Io => write!(f, "storage I/O error"),
            Self::InvalidKey => write!(f, "invalid namespace or key"),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The stored blob could not be decoded.
    Corrupted,
    /// A value is outside its allowed range.
    ValidationFailed(&'static str),
    Storage(StorageError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "stored config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Creature rule violations
// ---------------------------------------------------------------------------

/// Why an evolution request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolveError {
    /// Already at the last stage.
    FinalStage,
    /// Level or XP requirement for the next stage not met.
    NotReady,
    /// The device tier cannot host the next stage.
    DeviceTooSmall,
}

impl fmt::Display for EvolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FinalStage => write!(f, "already at final stage"),
            Self::NotReady => write!(f, "requirements not met"),
            Self::DeviceTooSmall => write!(f, "needs a bigger aquarium"),
        }
    }
}

/// Why a game-mode change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// Hit points are zero; the creature must rest first.
    KnockedOut,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KnockedOut => write!(f, "creature is knocked out"),
        }
    }
}
