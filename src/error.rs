use std::fmt;

use crate::coord::Coord;

/// Error taxonomy for the master engine (spec §7).
///
/// Recovery is dispatched on the variant: `Parse`/`Transport` are handled
/// per-session and never reach the control task; `Protocol` triggers a
/// resync of the offending session; `Timeout` never surfaces as an `Err`
/// at all (the collector just returns whatever it has); `Config` is the
/// only variant that is fatal to the whole process.
#[derive(Debug)]
pub enum EngineError {
    /// A malformed wire line. The session discards it and continues.
    Parse(String),
    /// A socket-level failure. The owning session closes.
    Transport(std::io::Error),
    /// A slave's prior-stat snapshot disagreed with the master's record
    /// for `node`, or the slave otherwise reported a diverged position.
    Protocol { node: Option<Coord>, reason: String },
    /// A deadline elapsed before the desired quorum of replies arrived.
    Timeout,
    /// A startup configuration error. Fatal.
    Config(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Parse(line) => write!(f, "parse error: {line}"),
            EngineError::Transport(e) => write!(f, "transport error: {e}"),
            EngineError::Protocol { node, reason } => match node {
                Some(c) => write!(f, "protocol error at {c}: {reason}"),
                None => write!(f, "protocol error: {reason}"),
            },
            EngineError::Timeout => write!(f, "deadline elapsed"),
            EngineError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Transport(e)
    }
}

impl EngineError {
    /// Exit code convention for fatal startup failures (spec §6).
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Config(_) => 1,
            EngineError::Transport(_) => 2,
            _ => 70,
        }
    }
}
