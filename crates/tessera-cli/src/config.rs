//! `tessera.toml`: where the ledger lives and how the demo runs.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tessera_ledger::{HttpLedgerClient, LedgerClient, MemoryLedger, ProtocolParameters};

const LOCAL_NODE: &str = "http://127.0.0.1:14265";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub ledger: LedgerConfig,
    pub wallet: WalletConfig,
    pub demo: DemoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base URL of a `tessera-node` API.
    pub node_url: String,
    /// Usually the node itself.
    pub faucet_url: String,
    /// Only used to print links.
    pub explorer_url: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            node_url: LOCAL_NODE.into(),
            faucet_url: LOCAL_NODE.into(),
            explorer_url: "https://explorer.shimmer.network/testnet".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// SLIP-44 branch new identities derive their keys on.
    pub coin_type: u32,
    /// Seconds between balance checks after a faucet request.
    pub poll_interval_secs: u64,
    /// Balance checks per faucet request.
    pub max_attempts: u32,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            coin_type: tessera_core::COIN_TYPE_SHIMMER,
            poll_interval_secs: 5,
            max_attempts: 12,
        }
    }
}

impl WalletConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Oldest credential the verifier accepts.
    pub max_age_secs: u64,
    /// Revocation bitmap index of the issued degree.
    pub revocation_index: u32,
    /// Pause before presenting the aged credential again.
    pub expiry_wait_secs: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            max_age_secs: 5,
            revocation_index: 1,
            expiry_wait_secs: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
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

impl CliConfig {
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

    /// The configured node, or a fresh in-process ledger.
    pub fn ledger_client(&self, in_memory: bool) -> Arc<dyn LedgerClient> {
        if in_memory {
            Arc::new(MemoryLedger::new(ProtocolParameters::default()))
        } else {
            Arc::new(HttpLedgerClient::new(
                self.ledger.node_url.clone(),
                self.ledger.faucet_url.clone(),
            ))
        }
    }
}
