use anyhow::Result;
use common::{
    SourceKind,
    constants::{APTOS_MAINNET_NODE, DEFAULT_PROXY_URL},
    env::get_env_var,
};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::Path, time::Duration};

const DEFAULT_POLL_MS: u64 = 3_000;
const DEFAULT_PORT: u16 = 1313;
const DEFAULT_CONFIG_PATH: &str = "tracktos.toml";

/// optional `tracktos.toml`; every key can be overridden from the env
#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq)]
pub struct FileConfig {
    source: Option<String>,
    proxy_url: Option<String>,
    node_url: Option<String>,
    poll_ms: Option<u64>,
    port: Option<u16>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub source: SourceKind,
    pub proxy_url: String,
    pub node_url: String,
    pub poll_ms: u64,
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        Config::from_layers(FileConfig::discover(), |key| get_env_var(key).ok())
    }

    /// env (via `lookup`) wins over the file, the file over defaults
    pub fn from_layers<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = match lookup("TRACKTOS_SOURCE").or(file.source) {
            Some(kind) => kind.parse::<SourceKind>()?,
            None => SourceKind::default(),
        };
        let proxy_url = lookup("TRACKTOS_PROXY_URL")
            .or(file.proxy_url)
            .unwrap_or_else(|| DEFAULT_PROXY_URL.into());
        let node_url = lookup("APTOS_NODE_URL")
            .or(file.node_url)
            .unwrap_or_else(|| APTOS_MAINNET_NODE.into());
        let poll_ms = lookup("TRACKTOS_POLL_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .or(file.poll_ms)
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_POLL_MS);
        let port = lookup("SERVER_PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .or(file.port)
            .unwrap_or(DEFAULT_PORT);
        Ok(Config {
            source,
            proxy_url,
            node_url,
            poll_ms,
            port,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

impl FileConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// reads `TRACKTOS_CONFIG`, else `tracktos.toml` in the working
    /// directory. a missing file is the empty layer; a broken one is
    /// reported and skipped.
    pub fn discover() -> Self {
        let path = get_env_var("TRACKTOS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        FileConfig::read(Path::new(&path))
    }

    pub fn read(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return FileConfig::default(),
            Err(err) => {
                warn!("ignoring config {}: {err}", path.display());
                return FileConfig::default();
            }
        };
        FileConfig::from_toml(&contents).unwrap_or_else(|err| {
            warn!("ignoring config {}: {err}", path.display());
            FileConfig::default()
        })
    }
}
