//! Line-framed textual command/reply encode+parse (spec §4.1).
//!
//! Pure text in, pure text out: no sockets here, so round-trip and
//! malformed-input behavior are unit-testable without a running session.

mod command;
mod genmoves;
mod reply;

pub use command::Command;
pub use command::read_command;
pub use genmoves::ChildStat;
pub use genmoves::GenmovesReply;
pub use genmoves::GenmovesRequest;
pub use genmoves::TimeSettings;
pub use reply::Reply;
pub use reply::read_reply;

/// Verbs that carry a multi-line, blank-line-terminated body.
pub const GENMOVES: &str = "pachi-genmoves";
pub const GENMOVES_CLEANUP: &str = "pachi-genmoves_cleanup";

pub(crate) fn is_multiline_verb(verb: &str) -> bool {
    verb == GENMOVES || verb == GENMOVES_CLEANUP
}

/// Formats a statistic value with the wire's fixed 7 fractional digits
/// (spec §8 "Round-trip... modulo documented float precision").
pub(crate) fn format_value(v: f64) -> String {
    format!("{v:.7}")
}
