//! Server configuration from environment variables.

use anyhow::Context;
use settlers_core::BotDifficulty;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SAVE_DIR: &str = "saves";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on (`SERVER_ADDR`)
    pub addr: SocketAddr,
    /// Directory for numbered save files (`SAVE_DIR`)
    pub save_dir: PathBuf,
    /// Policy used for AI seats (`BOT_DIFFICULTY`: easy | medium)
    pub bot_difficulty: BotDifficulty,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()
            .context("SERVER_ADDR is not a socket address")?;

        let save_dir = lookup("SAVE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR));

        let bot_difficulty = match lookup("BOT_DIFFICULTY") {
            Some(value) => value.parse().context("BOT_DIFFICULTY must be easy or medium")?,
            None => BotDifficulty::default(),
        };

        Ok(Self {
            addr,
            save_dir,
            bot_difficulty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.save_dir, PathBuf::from("saves"));
        assert_eq!(config.bot_difficulty, BotDifficulty::Medium);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("SERVER_ADDR", "127.0.0.1:9000"),
            ("SAVE_DIR", "/tmp/settlers"),
            ("BOT_DIFFICULTY", "easy"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.save_dir, PathBuf::from("/tmp/settlers"));
        assert_eq!(config.bot_difficulty, BotDifficulty::Easy);
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(ServerConfig::from_lookup(lookup_from(&[("SERVER_ADDR", "nowhere")])).is_err());
        assert!(ServerConfig::from_lookup(lookup_from(&[("BOT_DIFFICULTY", "hard")])).is_err());
    }
}
