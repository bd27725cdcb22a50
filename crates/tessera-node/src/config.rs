//! `tessera-node.toml`: ledger parameters, HTTP API, storage and logging.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tessera_ledger::{ProtocolParameters, RentStructure};

/// Port the node API listens on unless configured otherwise.
pub const DEFAULT_API_PORT: u16 = 14265;

/// Every section falls back to its defaults when absent from the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Protocol parameters a fresh data directory starts with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Human readable part of addresses and DIDs.
    pub hrp: String,
    /// Tokens minted per faucet request.
    pub faucet_amount: u64,
    pub rent_structure: RentStructure,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let params = ProtocolParameters::default();
        Self {
            hrp: params.network_hrp,
            faucet_amount: params.faucet_amount,
            rent_structure: params.rent_structure,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen_addr: String,
    /// 0 binds any free port.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1".into(),
            port: DEFAULT_API_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// RocksDB directory holding unspent outputs and parameters.
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl NodeConfig {
    /// Read `path`, or the defaults if there is no such file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn protocol_parameters(&self) -> ProtocolParameters {
        ProtocolParameters {
            network_hrp: self.network.hrp.clone(),
            rent_structure: self.network.rent_structure,
            faucet_amount: self.network.faucet_amount,
        }
    }

    pub fn api_socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.api.listen_addr, self.api.port).parse()?)
    }
}
