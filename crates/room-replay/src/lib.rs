//! Rebuilds a room from its action log and prints the resulting state.

pub mod config;
pub mod error;
pub mod log;
pub mod replay;
