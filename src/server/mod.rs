//! Server Module
//!
//! Line-oriented command protocol over TCP.
//!
//! # Commands
//! - `SET key value [EX seconds]`, `GET key`, `DEL key...`, `EXISTS key`
//! - `TTL key` - remaining seconds, `-1` if missing, `-2` if no expiry
//! - `DUMP`, `STATS`, `SAVE`, `PING`, `HELP`, `QUIT`

pub mod command;
pub mod listener;

pub use command::{Command, CommandParser, CommandResult};
pub use listener::{serve, GREETING};
