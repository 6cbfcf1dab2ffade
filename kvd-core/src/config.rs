//! Configuration loading: a TOML file (path from `KVD_CONFIG`, default
//! `kvd.toml`) with every field overridable by a same-named `KVD_*`
//! environment variable, read after the file is parsed.

use crate::error::{Error, Result};
use crate::storage::StorageKind;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "kvd.toml";
const DEFAULT_CACHE_CAPACITY: usize = 1000;
const DEFAULT_RPC_WORKERS: usize = 4;
const DEFAULT_THREAD_POOL_SIZE: usize = 4;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    ip: Option<String>,
    port: Option<u16>,
    storage_type: Option<String>,
    storage_path: Option<String>,
    cache_capacity: Option<usize>,
    rpc_workers: Option<usize>,
    thread_pool_size: Option<usize>,
}

/// The fully-resolved, validated configuration used to construct a
/// server and its storage engine.
#[derive(Debug, Clone)]
pub struct Config {
    pub ip: Option<String>,
    pub port: u16,
    pub storage: StorageKind,
    pub rpc_workers: usize,
    pub thread_pool_size: usize,
}

impl Config {
    /// Load from `KVD_CONFIG` (or `kvd.toml` if unset), apply `KVD_*`
    /// environment overrides, and validate the result.
    pub fn load() -> Result<Self> {
        let path = env::var("KVD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut raw = if Path::new(&path).exists() {
            parse(&path)?
        } else {
            RawConfig::default()
        };
        apply_env_overrides(&mut raw);
        resolve(raw)
    }

    #[cfg(test)]
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents)
            .map_err(|err| Error::Config(format!("invalid config: {}", err)))?;
        resolve(raw)
    }
}

fn parse(path: &str) -> Result<RawConfig> {
    let contents = fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|err| Error::Config(format!("invalid config: {}", err)))
}

fn apply_env_overrides(raw: &mut RawConfig) {
    if let Ok(v) = env::var("KVD_IP") {
        raw.ip = Some(v);
    }
    if let Ok(v) = env::var("KVD_PORT") {
        if let Ok(v) = v.parse() {
            raw.port = Some(v);
        }
    }
    if let Ok(v) = env::var("KVD_STORAGE_TYPE") {
        raw.storage_type = Some(v);
    }
    if let Ok(v) = env::var("KVD_STORAGE_PATH") {
        raw.storage_path = Some(v);
    }
    if let Ok(v) = env::var("KVD_CACHE_CAPACITY") {
        if let Ok(v) = v.parse() {
            raw.cache_capacity = Some(v);
        }
    }
    if let Ok(v) = env::var("KVD_RPC_WORKERS") {
        if let Ok(v) = v.parse() {
            raw.rpc_workers = Some(v);
        }
    }
    if let Ok(v) = env::var("KVD_THREAD_POOL_SIZE") {
        if let Ok(v) = v.parse() {
            raw.thread_pool_size = Some(v);
        }
    }
}

fn resolve(raw: RawConfig) -> Result<Config> {
    let port = raw
        .port
        .ok_or_else(|| Error::Config("missing required field: port".to_string()))?;

    let storage_type = raw.storage_type.as_deref().unwrap_or("memory");
    let storage = match storage_type {
        "memory" => StorageKind::Memory,
        "memory_lru" => StorageKind::MemoryLru {
            cache_capacity: raw.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        },
        "file" => {
            let path = raw.storage_path.ok_or_else(|| {
                Error::Config("storage_path is required when storage_type = \"file\"".to_string())
            })?;
            StorageKind::File { path }
        }
        other => {
            return Err(Error::Config(format!(
                "unknown storage_type: {:?}",
                other
            )))
        }
    };

    Ok(Config {
        ip: raw.ip,
        port,
        storage,
        rpc_workers: raw.rpc_workers.unwrap_or(DEFAULT_RPC_WORKERS),
        thread_pool_size: raw.thread_pool_size.unwrap_or(DEFAULT_THREAD_POOL_SIZE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_port_is_a_config_error() {
        let result = Config::from_toml_str("ip = \"127.0.0.1\"");
        assert!(result.is_err());
    }

    #[test]
    fn defaults_to_memory_storage() {
        let cfg = Config::from_toml_str("port = 7878").unwrap();
        assert!(matches!(cfg.storage, StorageKind::Memory));
        assert_eq!(cfg.rpc_workers, DEFAULT_RPC_WORKERS);
        assert_eq!(cfg.thread_pool_size, DEFAULT_THREAD_POOL_SIZE);
    }

    #[test]
    fn file_storage_requires_path() {
        let result = Config::from_toml_str("port = 1\nstorage_type = \"file\"");
        assert!(result.is_err());
    }

    #[test]
    fn memory_lru_picks_up_cache_capacity() {
        let cfg =
            Config::from_toml_str("port = 1\nstorage_type = \"memory_lru\"\ncache_capacity = 42")
                .unwrap();
        match cfg.storage {
            StorageKind::MemoryLru { cache_capacity } => assert_eq!(cache_capacity, 42),
            _ => panic!("expected MemoryLru"),
        }
    }

    #[test]
    fn unknown_storage_type_is_rejected() {
        let result = Config::from_toml_str("port = 1\nstorage_type = \"bogus\"");
        assert!(result.is_err());
    }
}
