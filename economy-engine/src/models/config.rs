use economy::AccountId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Runtime settings, layered from an optional TOML file and `ECONOMY__*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Period of the market simulator.
    pub tick_interval_ms: u64,

    /// Price deltas are drawn uniformly from `[-max_price_delta, max_price_delta)`.
    pub max_price_delta: i64,

    /// Identities allowed to seize balances.
    pub authorized_accounts: Vec<AccountId>,

    /// Load the store snapshot at startup and save it at shutdown.
    pub persist_snapshot: bool,

    /// Append settled operations to the CSV journal.
    pub journal: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            max_price_delta: 50,
            authorized_accounts: Vec::new(),
            persist_snapshot: true,
            journal: true,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(
                config::Environment::with_prefix("ECONOMY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn with_authorized(mut self, accounts: impl IntoIterator<Item = AccountId>) -> Self {
        for account in accounts {
            if !self.authorized_accounts.contains(&account) {
                self.authorized_accounts.push(account);
            }
        }
        self
    }
}
