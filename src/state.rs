// src/state.rs - Klipper device state model
use std::fmt;

/// State of the klipper host as reported by a `printer/info` query.
///
/// The mapping from raw tokens is total: any token the device reports that
/// is not one of the four known values collapses to `Unknown`, as does any
/// response the prober cannot decode. `Unknown` is also the initial state of
/// a fresh session before the first probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Ready,
    Startup,
    Shutdown,
    Error,
    Unknown,
}

impl DeviceState {
    /// Map a raw status token, case-insensitively.
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "ready" => Self::Ready,
            "startup" => Self::Startup,
            "shutdown" => Self::Shutdown,
            "error" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Whether the device has stopped transitioning.
    ///
    /// `Startup` and `Unknown` are transient; the stabilization wait keeps
    /// polling through them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Shutdown | Self::Error)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Ready => "ready",
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", token)
    }
}
