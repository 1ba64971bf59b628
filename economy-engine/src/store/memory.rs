use super::{load_state, save_state, StoreSnapshot};
use economy::{
    AccountId, Holding, Instrument, LedgerStore, MarketStore, PortfolioStore, StoreError,
};
use log::info;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const BALANCES: &str = "balances";
const HOLDINGS: &str = "holdings";
const INSTRUMENTS: &str = "instruments";

fn read<'a, T>(lock: &'a RwLock<T>, table: &'static str) -> Result<RwLockReadGuard<'a, T>, StoreError> {
    lock.read().map_err(|_| StoreError::Poisoned(table))
}

fn write<'a, T>(lock: &'a RwLock<T>, table: &'static str) -> Result<RwLockWriteGuard<'a, T>, StoreError> {
    lock.write().map_err(|_| StoreError::Poisoned(table))
}

/// All three tables in process memory. Each trait method takes one table
/// lock for the duration of one statement.
#[derive(Default)]
pub struct MemoryStore {
    balances: RwLock<HashMap<AccountId, i64>>,
    holdings: RwLock<HashMap<AccountId, BTreeMap<String, u64>>>,
    /// Kept in catalog order.
    instruments: RwLock<Vec<Instrument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut holdings: HashMap<AccountId, BTreeMap<String, u64>> = HashMap::new();
        for h in snapshot.holdings {
            holdings
                .entry(h.account)
                .or_default()
                .insert(h.instrument, h.quantity);
        }
        Self {
            balances: RwLock::new(snapshot.balances.into_iter().collect()),
            holdings: RwLock::new(holdings),
            instruments: RwLock::new(snapshot.instruments),
        }
    }

    /// Copies every table. Tables are read one after another, so callers
    /// wanting a consistent image should take it while no command is running.
    pub fn snapshot(&self) -> Result<StoreSnapshot, StoreError> {
        let balances = read(&self.balances, BALANCES)?
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        let holdings = read(&self.holdings, HOLDINGS)?
            .iter()
            .flat_map(|(account, rows)| {
                rows.iter()
                    .map(move |(name, qty)| Holding::new(account.clone(), name.clone(), *qty))
            })
            .collect();
        let instruments = read(&self.instruments, INSTRUMENTS)?.clone();
        Ok(StoreSnapshot {
            balances,
            holdings,
            instruments,
        })
    }

    /// Opens the snapshot at `path`, or starts empty if there is none.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            info!("No snapshot at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let snapshot: StoreSnapshot = load_state(path)?;
        info!(
            "Loaded snapshot from {}: {} accounts, {} holdings, {} instruments",
            path.display(),
            snapshot.balances.len(),
            snapshot.holdings.len(),
            snapshot.instruments.len()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        save_state(path, &self.snapshot()?)
    }
}

impl LedgerStore for MemoryStore {
    fn balance(&self, account: &AccountId) -> Result<i64, StoreError> {
        Ok(read(&self.balances, BALANCES)?
            .get(account)
            .copied()
            .unwrap_or(0))
    }

    fn adjust_balance(&self, account: &AccountId, delta: i64) -> Result<i64, StoreError> {
        let mut balances = write(&self.balances, BALANCES)?;
        let current = balances.get(account).copied().unwrap_or(0);
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::constraint(BALANCES, format!("overflow on {}", account)))?;
        if next < 0 {
            return Err(StoreError::constraint(
                BALANCES,
                format!("balance of {} would become {}", account, next),
            ));
        }
        balances.insert(account.clone(), next);
        Ok(next)
    }

    fn accounts(&self) -> Result<Vec<(AccountId, i64)>, StoreError> {
        let mut rows: Vec<_> = read(&self.balances, BALANCES)?
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        rows.sort();
        Ok(rows)
    }
}

impl PortfolioStore for MemoryStore {
    fn holding(&self, account: &AccountId, instrument: &str) -> Result<u64, StoreError> {
        Ok(read(&self.holdings, HOLDINGS)?
            .get(account)
            .and_then(|rows| rows.get(instrument))
            .copied()
            .unwrap_or(0))
    }

    fn set_holding(
        &self,
        account: &AccountId,
        instrument: &str,
        quantity: u64,
    ) -> Result<(), StoreError> {
        write(&self.holdings, HOLDINGS)?
            .entry(account.clone())
            .or_default()
            .insert(instrument.to_string(), quantity);
        Ok(())
    }

    fn holdings(&self, account: &AccountId) -> Result<Vec<Holding>, StoreError> {
        Ok(read(&self.holdings, HOLDINGS)?
            .get(account)
            .map(|rows| {
                rows.iter()
                    .map(|(name, qty)| Holding::new(account.clone(), name.clone(), *qty))
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl MarketStore for MemoryStore {
    fn list_instruments(&self) -> Result<Vec<Instrument>, StoreError> {
        Ok(read(&self.instruments, INSTRUMENTS)?.clone())
    }

    fn instrument(&self, name: &str) -> Result<Option<Instrument>, StoreError> {
        Ok(read(&self.instruments, INSTRUMENTS)?
            .iter()
            .find(|i| i.name() == name)
            .cloned())
    }

    fn set_price(&self, name: &str, price: u64) -> Result<(), StoreError> {
        let mut instruments = write(&self.instruments, INSTRUMENTS)?;
        let row = instruments
            .iter_mut()
            .find(|i| i.name() == name)
            .ok_or_else(|| StoreError::MissingInstrument(name.to_string()))?;
        *row = row.clone().with_price(price);
        Ok(())
    }

    fn seed(&self, catalog: &[Instrument]) -> Result<usize, StoreError> {
        let mut instruments = write(&self.instruments, INSTRUMENTS)?;
        let mut inserted = 0;
        for candidate in catalog {
            if !instruments.iter().any(|i| i.name() == candidate.name()) {
                instruments.push(candidate.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
