//! CLI Commands

pub mod resolve;
pub mod watch;
