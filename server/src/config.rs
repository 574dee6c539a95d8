use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

pub const ADDR_VAR: &str = "RIDE_TRACKER_ADDR";
pub const LOG_DIR_VAR: &str = "RIDE_TRACKER_LOG_DIR";
pub const STATIC_DIR_VAR: &str = "RIDE_TRACKER_STATIC_DIR";

const DEFAULT_ADDR: &str = "127.0.0.1:5000";
const DEFAULT_LOG_DIR: &str = "server/log";

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub log_dir: PathBuf,
    /// Served as a fallback for every unrouted path when set.
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let raw_addr = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = raw_addr
            .parse()
            .with_context(|| format!("{ADDR_VAR} is not a socket address: {raw_addr}"))?;

        let log_dir: PathBuf = lookup(LOG_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())
            .into();

        let static_dir = lookup(STATIC_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            addr,
            log_dir,
            static_dir,
        })
    }
}

#[cfg(test)]
fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: std::collections::HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();

    assert_eq!(config.addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
    assert_eq!(config.log_dir, PathBuf::from("server/log"));
    assert_eq!(config.static_dir, None);
}

#[test]
fn test_overrides() {
    let config = ServerConfig::from_lookup(lookup_from(&[
        (ADDR_VAR, "0.0.0.0:8080"),
        (LOG_DIR_VAR, "/var/log/rides"),
        (STATIC_DIR_VAR, "web"),
    ]))
    .unwrap();

    assert_eq!(config.addr.port(), 8080);
    assert_eq!(config.log_dir, PathBuf::from("/var/log/rides"));
    assert_eq!(config.static_dir, Some(PathBuf::from("web")));
}

#[test]
fn test_invalid_addr() {
    assert!(ServerConfig::from_lookup(lookup_from(&[(ADDR_VAR, "localhost")])).is_err());
}
