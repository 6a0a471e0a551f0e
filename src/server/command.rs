//! Command Parser
//!
//! Turns one request line into a call on the cache store and a one-line
//! textual reply.
//!
//! Replies follow a small Redis-like convention: `+` for status and values,
//! `:` for integers and `-ERR` for errors.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheStore, SnapshotStore, Ttl};

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// TTL reply for a missing or expired key
pub const TTL_NOT_FOUND: i64 = -1;

/// TTL reply for a key that never expires
pub const TTL_NO_EXPIRY: i64 = -2;

const HELP_TEXT: &str = "PING, QUIT, SET, GET, DEL, EXISTS, TTL, DUMP, STATS, SAVE, HELP";

// == Command ==
/// Commands understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Quit,
    Set,
    Get,
    Del,
    Exists,
    Ttl,
    Dump,
    Stats,
    Save,
    Help,
    Unknown,
}

impl Command {
    /// Parses a command name, case-insensitively.
    pub fn get(name: &str) -> Command {
        match name.to_ascii_uppercase().as_str() {
            "PING" => Command::Ping,
            "QUIT" => Command::Quit,
            "SET" => Command::Set,
            "GET" => Command::Get,
            "DEL" => Command::Del,
            "EXISTS" => Command::Exists,
            "TTL" => Command::Ttl,
            "DUMP" => Command::Dump,
            "STATS" => Command::Stats,
            "SAVE" => Command::Save,
            "HELP" => Command::Help,
            _ => Command::Unknown,
        }
    }
}

// == Command Result ==
/// A reply line and whether the connection should close after sending it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub response: String,
    pub should_close: bool,
}

impl CommandResult {
    pub fn reply(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            should_close: false,
        }
    }

    pub fn closing(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            should_close: true,
        }
    }

    pub fn error(message: impl AsRef<str>) -> Self {
        Self::reply(format!("-ERR {}", message.as_ref()))
    }

    pub fn value(value: impl AsRef<str>) -> Self {
        Self::reply(format!("+VALUE {}", value.as_ref()))
    }

    pub fn integer(n: i64) -> Self {
        Self::reply(format!(":{n}"))
    }
}

// == Command Parser ==
/// Dispatches request lines to a shared cache store.
#[derive(Debug, Clone)]
pub struct CommandParser {
    store: Arc<CacheStore>,
    snapshots: Option<Arc<SnapshotStore>>,
}

impl CommandParser {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self {
            store,
            snapshots: None,
        }
    }

    /// Enables the `SAVE` command.
    pub fn with_snapshots(mut self, snapshots: Arc<SnapshotStore>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    // == Handle ==
    /// Executes one request line.
    pub fn handle(&self, line: &str) -> CommandResult {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(name) = tokens.first() else {
            return CommandResult::error("empty command");
        };

        let command = Command::get(name);
        debug!(?command, args = tokens.len() - 1, "Handling command");

        match command {
            Command::Ping => CommandResult::reply("+PONG"),
            Command::Quit => CommandResult::closing("+BYE"),
            Command::Set => self.handle_set(&tokens),
            Command::Get => self.handle_get(&tokens),
            Command::Del => self.handle_del(&tokens),
            Command::Exists => self.handle_exists(&tokens),
            Command::Ttl => self.handle_ttl(&tokens),
            Command::Dump => self.handle_dump(),
            Command::Stats => self.handle_stats(),
            Command::Save => self.handle_save(),
            Command::Help => CommandResult::reply(format!("+HELP {HELP_TEXT}")),
            Command::Unknown => CommandResult::error("unknown command"),
        }
    }

    fn handle_set(&self, tokens: &[&str]) -> CommandResult {
        if tokens.len() < 3 {
            return CommandResult::error("SET requires key and value");
        }
        let (key, value) = (tokens[1], tokens[2]);
        if key.len() > MAX_KEY_LENGTH {
            return CommandResult::error("key too long");
        }

        let mut ttl = None;
        if tokens.len() > 3 {
            if tokens.len() != 5 || !tokens[3].eq_ignore_ascii_case("EX") {
                return CommandResult::error("SET syntax: SET key value [EX seconds]");
            }
            match parse_positive_seconds(tokens[4]) {
                Some(seconds) => ttl = Some(Duration::from_secs(seconds)),
                None => return CommandResult::error("ttl must be a positive number"),
            }
        }

        self.store.set(key, value, ttl);
        CommandResult::reply("+OK")
    }

    fn handle_get(&self, tokens: &[&str]) -> CommandResult {
        if tokens.len() != 2 {
            return CommandResult::error("GET requires a key");
        }
        match self.store.get(tokens[1]) {
            Some(value) => CommandResult::value(value),
            None => CommandResult::error("key not found"),
        }
    }

    fn handle_del(&self, tokens: &[&str]) -> CommandResult {
        if tokens.len() < 2 {
            return CommandResult::error("DEL requires at least one key");
        }
        let removed = tokens[1..]
            .iter()
            .filter(|key| self.store.delete(key))
            .count();
        CommandResult::integer(removed as i64)
    }

    fn handle_exists(&self, tokens: &[&str]) -> CommandResult {
        if tokens.len() != 2 {
            return CommandResult::error("EXISTS requires a key");
        }
        CommandResult::integer(i64::from(self.store.exists(tokens[1])))
    }

    fn handle_ttl(&self, tokens: &[&str]) -> CommandResult {
        if tokens.len() != 2 {
            return CommandResult::error("TTL requires a key");
        }
        let seconds = match self.store.remaining_ttl(tokens[1]) {
            Ttl::NotFound => TTL_NOT_FOUND,
            Ttl::NoExpiry => TTL_NO_EXPIRY,
            Ttl::Remaining(left) => i64::try_from(left.as_secs()).unwrap_or(i64::MAX),
        };
        CommandResult::integer(seconds)
    }

    fn handle_dump(&self) -> CommandResult {
        let mut live: Vec<(String, String)> = self
            .store
            .dump_all()
            .into_iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, entry)| (key, entry.value))
            .collect();

        if live.is_empty() {
            return CommandResult::reply("+EMPTY");
        }
        live.sort();

        let pairs: Vec<String> = live
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        CommandResult::reply(format!("+DUMP {}", pairs.join(" ")))
    }

    fn handle_stats(&self) -> CommandResult {
        let stats = self.store.stats();
        CommandResult::reply(format!(
            "+STATS hits={} misses={} evictions={} expirations={} entries={}",
            stats.hits, stats.misses, stats.evictions, stats.expirations, stats.total_entries
        ))
    }

    fn handle_save(&self) -> CommandResult {
        match &self.snapshots {
            Some(snapshots) if snapshots.save() => CommandResult::reply("+OK"),
            Some(_) => CommandResult::error("snapshot failed"),
            None => CommandResult::error("snapshots disabled"),
        }
    }
}

fn parse_positive_seconds(token: &str) -> Option<u64> {
    token.parse::<u64>().ok().filter(|seconds| *seconds > 0)
}
