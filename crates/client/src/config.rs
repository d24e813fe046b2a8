//! Bridge configuration loaded from the process environment.
use std::env;
use std::path::PathBuf;

use crate::arena::ArenaConfig;

/// Wire realization used to reach the policy server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TransportKind {
    /// Line-delimited JSON over one persistent TCP connection.
    #[default]
    Stream,
    /// Three request/response endpoints.
    Http,
}

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub transport: TransportKind,
    pub stream_addr: String,
    pub http_url: String,
    /// Episodes run back to back, each over a fresh connection.
    pub episodes: u32,
    /// Directory for the optional log file.
    pub log_dir: Option<PathBuf>,
    pub arena: ArenaConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            stream_addr: "127.0.0.1:54321".to_string(),
            http_url: "http://127.0.0.1:12345".to_string(),
            episodes: 1,
            log_dir: None,
            arena: ArenaConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BRIDGE_TRANSPORT` - `stream` or `http` (default: stream)
    /// - `BRIDGE_STREAM_ADDR` - Policy server address for the stream transport
    /// - `BRIDGE_HTTP_URL` - Policy server base URL for the HTTP transport
    /// - `BRIDGE_EPISODES` - Episodes to run (default: 1, minimum: 1)
    /// - `BRIDGE_LOG_DIR` - Also write logs to `<dir>/bridge.log`
    /// - `ARENA_WIDTH`, `ARENA_HEIGHT` - Battlefield size
    /// - `ARENA_MAX_TURNS` - Turns before a round ends
    /// - `ARENA_ROUNDS` - Rounds in the battle
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(kind) = read(&lookup, "BRIDGE_TRANSPORT") {
            config.transport = kind;
        }
        if let Some(addr) = lookup("BRIDGE_STREAM_ADDR").filter(|addr| !addr.is_empty()) {
            config.stream_addr = addr;
        }
        if let Some(url) = lookup("BRIDGE_HTTP_URL").filter(|url| !url.is_empty()) {
            config.http_url = url;
        }
        if let Some(episodes) = read::<u32, _>(&lookup, "BRIDGE_EPISODES") {
            config.episodes = episodes.max(1);
        }
        config.log_dir = lookup("BRIDGE_LOG_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        let arena = &mut config.arena;
        if let Some(width) =
            read::<f64, _>(&lookup, "ARENA_WIDTH").filter(|w| *w >= ArenaConfig::MIN_SIDE)
        {
            arena.width = width;
        }
        if let Some(height) =
            read::<f64, _>(&lookup, "ARENA_HEIGHT").filter(|h| *h >= ArenaConfig::MIN_SIDE)
        {
            arena.height = height;
        }
        if let Some(max_turns) = read::<u64, _>(&lookup, "ARENA_MAX_TURNS") {
            arena.max_turns = max_turns.max(1);
        }
        if let Some(rounds) = read::<u32, _>(&lookup, "ARENA_ROUNDS") {
            arena.rounds = rounds.max(1);
        }

        config
    }

    /// Address of the policy server for the selected transport.
    pub fn endpoint(&self) -> &str {
        match self.transport {
            TransportKind::Stream => &self.stream_addr,
            TransportKind::Http => &self.http_url,
        }
    }
}

fn read<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)?.trim().parse().ok()
}
