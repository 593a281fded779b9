use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use client_core::ReceiptPolicy;
use shared::domain::Address;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "message_board.toml";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x938a90c60Bc3995b46b5477f2892381Cd18fDfB3";

/// Environment variable to settings key. Later entries win.
const ENV_KEYS: &[(&str, &str)] = &[
    ("WALLET_RPC_URL", "wallet_rpc_url"),
    ("APP__WALLET_RPC_URL", "wallet_rpc_url"),
    ("CONTRACT_ADDRESS", "contract_address"),
    ("APP__CONTRACT_ADDRESS", "contract_address"),
    ("APP__SUBMIT_FLOOR_MS", "submit_floor_ms"),
    ("APP__RECEIPT_POLL_INTERVAL_MS", "receipt_poll_interval_ms"),
    ("APP__RECEIPT_MAX_ATTEMPTS", "receipt_max_attempts"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub wallet_rpc_url: Option<String>,
    pub contract_address: String,
    pub submit_floor_ms: u64,
    pub receipt_poll_interval_ms: u64,
    pub receipt_max_attempts: u32,
}

impl Default for Settings {
    fn default() -> Self {
        let receipts = ReceiptPolicy::default();
        Self {
            wallet_rpc_url: None,
            contract_address: DEFAULT_CONTRACT_ADDRESS.into(),
            submit_floor_ms: 1000,
            receipt_poll_interval_ms: receipts.poll_interval.as_millis() as u64,
            receipt_max_attempts: receipts.max_attempts,
        }
    }
}

impl Settings {
    pub fn contract(&self) -> anyhow::Result<Address> {
        self.contract_address
            .parse()
            .with_context(|| format!("invalid contract address '{}'", self.contract_address))
    }

    pub fn submit_floor(&self) -> Duration {
        Duration::from_millis(self.submit_floor_ms)
    }

    pub fn receipt_policy(&self) -> ReceiptPolicy {
        ReceiptPolicy {
            poll_interval: Duration::from_millis(self.receipt_poll_interval_ms),
            max_attempts: self.receipt_max_attempts,
        }
    }

    fn set(&mut self, key: &str, value: &str) {
        let value = value.trim();
        match key {
            "wallet_rpc_url" => {
                self.wallet_rpc_url = (!value.is_empty()).then(|| value.to_string());
            }
            "contract_address" => self.contract_address = value.to_string(),
            "submit_floor_ms" => set_number(&mut self.submit_floor_ms, key, value),
            "receipt_poll_interval_ms" => set_number(&mut self.receipt_poll_interval_ms, key, value),
            "receipt_max_attempts" => set_number(&mut self.receipt_max_attempts, key, value),
            _ => warn!(key, "ignoring unknown setting"),
        }
    }
}

fn set_number<T: std::str::FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value, "ignoring non-numeric setting"),
    }
}

pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(error) => warn!(path = %path.display(), %error, "ignoring unreadable config file"),
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    for (key, value) in file_cfg {
        match value {
            toml::Value::String(s) => settings.set(key, s),
            toml::Value::Integer(i) => settings.set(key, &i.to_string()),
            other => warn!(key, kind = other.type_str(), "ignoring non-scalar setting"),
        }
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    for (env_key, key) in ENV_KEYS {
        if let Some(value) = lookup(env_key) {
            settings.set(key, &value);
        }
    }
}
