//! Distributed master engine for an MCTS Go-playing program: coordinates
//! a fleet of slave search workers over a line-framed GTP extension
//! protocol, aggregates their partial statistics, and picks a move.

pub mod chat;
pub mod collector;
pub mod config;
pub mod coord;
pub mod error;
pub mod genmoves;
pub mod logging;
pub mod master;
pub mod protocol;
pub mod proxy;
pub mod registry;
pub mod reply_buffer;
pub mod session;
pub mod slave_table;
pub mod status;
pub mod tree;
pub mod wire;

pub use config::Config;
pub use error::EngineError;
pub use master::Master;
