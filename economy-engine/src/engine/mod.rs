use crate::error::{EngineError, Result};
use crate::events::{EconomyEvent, EventBus};
use crate::lock::AccountLocks;
use crate::market::{MarketSimulator, DEFAULT_MAX_DELTA};
use crate::models::{
    Command, GrantReceipt, Outcome, Receipt, SeizureReceipt, Side, TradeReceipt, Transaction,
    TransactionLogger, TransferReceipt, WagerReceipt,
};
use crate::wager::{self, Fortune, RandomFortune};
use economy::{
    AccountId, Instrument, LedgerStore, MarketSnapshot, MarketStore, PortfolioStore,
    PortfolioView, Position, StoreError,
};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Cash value of `quantity` units at `price`.
fn notional(price: u64, quantity: u64) -> Result<i64> {
    price
        .checked_mul(quantity)
        .and_then(|total| i64::try_from(total).ok())
        .ok_or_else(|| EngineError::invalid(format!("{} x {} overflows", quantity, price)))
}

fn ensure_room(balance: i64, credit: i64) -> Result<()> {
    balance
        .checked_add(credit)
        .map(|_| ())
        .ok_or_else(|| EngineError::invalid(format!("crediting {} would overflow", credit)))
}

fn settled(receipt: impl Into<Receipt>) -> Outcome {
    Outcome::Settled {
        receipt: receipt.into(),
    }
}

/// The transaction core.
///
/// Every mutating operation runs as: validate input, lock the account(s),
/// re-read state, check the business rule, write, unlock, report. A rejected
/// operation writes nothing.
pub struct Engine {
    ledger: Arc<dyn LedgerStore>,
    portfolio: Arc<dyn PortfolioStore>,
    market: Arc<dyn MarketStore>,
    locks: AccountLocks,
    simulator: MarketSimulator,
    fortune: Box<dyn Fortune>,
    authorized: HashSet<AccountId>,
    events: EventBus,
    journal: Option<Mutex<TransactionLogger>>,
}

impl Engine {
    /// Engine over a single store that serves all three tables.
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: LedgerStore + PortfolioStore + MarketStore + 'static,
    {
        Self::from_parts(store.clone(), store.clone(), store)
    }

    pub fn from_parts(
        ledger: Arc<dyn LedgerStore>,
        portfolio: Arc<dyn PortfolioStore>,
        market: Arc<dyn MarketStore>,
    ) -> Self {
        let simulator = MarketSimulator::new(market.clone(), DEFAULT_MAX_DELTA);
        Self {
            ledger,
            portfolio,
            market,
            locks: AccountLocks::new(),
            simulator,
            fortune: Box::new(RandomFortune),
            authorized: HashSet::new(),
            events: EventBus::new(),
            journal: None,
        }
    }

    pub fn with_simulator(mut self, simulator: MarketSimulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn with_fortune(mut self, fortune: Box<dyn Fortune>) -> Self {
        self.fortune = fortune;
        self
    }

    pub fn with_authorized(mut self, accounts: impl IntoIterator<Item = AccountId>) -> Self {
        self.authorized.extend(accounts);
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_journal(mut self, journal: TransactionLogger) -> Self {
        self.journal = Some(Mutex::new(journal));
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn locks(&self) -> &AccountLocks {
        &self.locks
    }

    pub fn is_authorized(&self, account: &AccountId) -> bool {
        self.authorized.contains(account)
    }

    pub fn market_ticks(&self) -> u64 {
        self.simulator.ticks()
    }

    /// Inserts catalog instruments that are not in the market table yet.
    pub fn seed_catalog(&self, catalog: &[Instrument]) -> Result<usize> {
        let inserted = self.market.seed(catalog)?;
        info!(
            "Seeded {} of {} catalog instruments",
            inserted,
            catalog.len()
        );
        Ok(inserted)
    }

    /// Moves `amount` from `from` to `to`.
    pub async fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: i64,
    ) -> Result<TransferReceipt> {
        let result = self.execute_transfer(from, to, amount).await;
        self.settle("Transfer", result)
    }

    /// Creates `amount` out of thin air on `to`.
    pub async fn grant(&self, to: &AccountId, amount: i64) -> Result<GrantReceipt> {
        let result = self.execute_grant(to, amount).await;
        self.settle("Grant", result)
    }

    /// Moves the entire balance of `from` to `to`, on behalf of `caller`.
    pub async fn seize(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<SeizureReceipt> {
        let result = self.execute_seize(caller, from, to).await;
        self.settle("Seizure", result)
    }

    pub async fn buy_stock(
        &self,
        account: &AccountId,
        instrument: &str,
        quantity: u64,
    ) -> Result<TradeReceipt> {
        let result = self.execute_buy(account, instrument, quantity).await;
        self.settle("Buy", result)
    }

    pub async fn sell_stock(
        &self,
        account: &AccountId,
        instrument: &str,
        quantity: u64,
    ) -> Result<TradeReceipt> {
        let result = self.execute_sell(account, instrument, quantity).await;
        self.settle("Sell", result)
    }

    pub async fn wager(&self, account: &AccountId, amount: i64) -> Result<WagerReceipt> {
        let result = self.execute_wager(account, amount).await;
        self.settle("Wager", result)
    }

    async fn execute_transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: i64,
    ) -> Result<TransferReceipt> {
        if from == to {
            return Err(EngineError::invalid("cannot transfer to the same account"));
        }
        if amount < 1 {
            return Err(EngineError::invalid(format!(
                "amount must be at least 1, got {}",
                amount
            )));
        }

        let _pair = self.locks.acquire_pair(from, to).await;

        let balance = self.ledger.balance(from)?;
        if balance < amount {
            return Err(EngineError::InsufficientFunds {
                balance,
                required: amount,
            });
        }
        ensure_room(self.ledger.balance(to)?, amount)?;

        let (from_balance, to_balance) = self.move_funds(from, to, amount)?;
        Ok(TransferReceipt::new(
            from.clone(),
            to.clone(),
            amount,
            from_balance,
            to_balance,
        ))
    }

    async fn execute_grant(&self, to: &AccountId, amount: i64) -> Result<GrantReceipt> {
        if amount < 1 {
            return Err(EngineError::invalid(format!(
                "amount must be at least 1, got {}",
                amount
            )));
        }

        let _guard = self.locks.acquire(to).await;

        ensure_room(self.ledger.balance(to)?, amount)?;
        let balance = self.ledger.adjust_balance(to, amount)?;
        Ok(GrantReceipt::new(to.clone(), amount, balance))
    }

    async fn execute_seize(
        &self,
        caller: &AccountId,
        from: &AccountId,
        to: &AccountId,
    ) -> Result<SeizureReceipt> {
        if !self.is_authorized(caller) {
            return Err(EngineError::Unauthorized(caller.clone()));
        }
        if from == to {
            return Err(EngineError::invalid("cannot seize into the same account"));
        }

        let _pair = self.locks.acquire_pair(from, to).await;

        let amount = self.ledger.balance(from)?;
        let receiver = self.ledger.balance(to)?;
        ensure_room(receiver, amount)?;

        let to_balance = if amount > 0 {
            self.move_funds(from, to, amount)?.1
        } else {
            receiver
        };
        Ok(SeizureReceipt::new(
            caller.clone(),
            from.clone(),
            to.clone(),
            amount,
            to_balance,
        ))
    }

    async fn execute_buy(
        &self,
        account: &AccountId,
        instrument: &str,
        quantity: u64,
    ) -> Result<TradeReceipt> {
        if quantity == 0 {
            return Err(EngineError::invalid("quantity must be at least 1"));
        }

        let _guard = self.locks.acquire(account).await;

        // Price is read under the lock, never before it.
        let price = self
            .market
            .instrument(instrument)?
            .ok_or_else(|| EngineError::UnknownInstrument(instrument.to_string()))?
            .price();
        let total = notional(price, quantity)?;

        let balance = self.ledger.balance(account)?;
        if balance < total {
            return Err(EngineError::InsufficientFunds {
                balance,
                required: total,
            });
        }
        let held = self.portfolio.holding(account, instrument)?;
        let holding = held
            .checked_add(quantity)
            .ok_or_else(|| EngineError::invalid("holding would overflow"))?;

        let balance = self.ledger.adjust_balance(account, -total)?;
        if let Err(e) = self.portfolio.set_holding(account, instrument, holding) {
            return Err(self.compensate(account, e, || {
                self.ledger.adjust_balance(account, total).map(|_| ())
            }));
        }

        Ok(TradeReceipt::new(
            account.clone(),
            instrument,
            Side::Buy,
            quantity,
            price,
            total,
            balance,
            holding,
        ))
    }

    async fn execute_sell(
        &self,
        account: &AccountId,
        instrument: &str,
        quantity: u64,
    ) -> Result<TradeReceipt> {
        if quantity == 0 {
            return Err(EngineError::invalid("quantity must be at least 1"));
        }

        let _guard = self.locks.acquire(account).await;

        let price = self
            .market
            .instrument(instrument)?
            .ok_or_else(|| EngineError::UnknownInstrument(instrument.to_string()))?
            .price();
        let held = self.portfolio.holding(account, instrument)?;
        if held < quantity {
            return Err(EngineError::InsufficientHoldings {
                instrument: instrument.to_string(),
                held,
                requested: quantity,
            });
        }
        let total = notional(price, quantity)?;
        ensure_room(self.ledger.balance(account)?, total)?;

        let holding = held - quantity;
        self.portfolio.set_holding(account, instrument, holding)?;
        let balance = match self.ledger.adjust_balance(account, total) {
            Ok(balance) => balance,
            Err(e) => {
                return Err(self.compensate(account, e, || {
                    self.portfolio.set_holding(account, instrument, held)
                }))
            }
        };

        Ok(TradeReceipt::new(
            account.clone(),
            instrument,
            Side::Sell,
            quantity,
            price,
            total,
            balance,
            holding,
        ))
    }

    async fn execute_wager(&self, account: &AccountId, amount: i64) -> Result<WagerReceipt> {
        if amount < wager::MIN_STAKE {
            return Err(EngineError::invalid(format!(
                "minimum stake is {}, got {}",
                wager::MIN_STAKE,
                amount
            )));
        }

        let _guard = self.locks.acquire(account).await;

        let balance = self.ledger.balance(account)?;
        if balance < amount {
            return Err(EngineError::InsufficientFunds {
                balance,
                required: amount,
            });
        }

        let won = self.fortune.wins();
        let payout = if won { wager::payout(amount) } else { 0 };
        // Stake and payout land as one write.
        let balance = self.ledger.adjust_balance(account, payout - amount)?;
        Ok(WagerReceipt::new(
            account.clone(),
            amount,
            won,
            payout,
            balance,
        ))
    }

    /// Debit `from`, then credit `to`. Caller holds both locks and has
    /// checked funds.
    fn move_funds(&self, from: &AccountId, to: &AccountId, amount: i64) -> Result<(i64, i64)> {
        let from_balance = self.ledger.adjust_balance(from, -amount)?;
        match self.ledger.adjust_balance(to, amount) {
            Ok(to_balance) => Ok((from_balance, to_balance)),
            Err(e) => Err(self.compensate(from, e, || {
                self.ledger.adjust_balance(from, amount).map(|_| ())
            })),
        }
    }

    /// Undoes the first write of an operation whose second write failed.
    fn compensate<F>(&self, account: &AccountId, cause: StoreError, undo: F) -> EngineError
    where
        F: FnOnce() -> std::result::Result<(), StoreError>,
    {
        match undo() {
            Ok(()) => {
                warn!("Rolled back partial write on {} after: {}", account, cause);
                EngineError::Store(cause)
            }
            Err(undo_err) => EngineError::Inconsistent {
                account: account.clone(),
                detail: format!("{}; rollback failed: {}", cause, undo_err),
            },
        }
    }

    fn settle<T>(&self, operation: &str, result: Result<T>) -> Result<T>
    where
        T: Clone + Into<Receipt>,
    {
        match &result {
            Ok(receipt) => {
                let receipt: Receipt = receipt.clone().into();
                info!("{} settled: {}", operation, receipt.id());
                self.record(&receipt);
                self.events.publish(EconomyEvent::Settled(receipt));
            }
            Err(e) if e.is_fatal() => {
                error!(
                    "{} left the stores inconsistent, operator intervention required: {}",
                    operation, e
                );
            }
            Err(e) if e.is_rejection() => warn!("{} rejected: {}", operation, e),
            Err(e) => error!("{} failed: {}", operation, e),
        }
        result
    }

    fn record(&self, receipt: &Receipt) {
        let Some(journal) = &self.journal else {
            return;
        };
        let tx = Transaction::from(receipt);
        let mut logger = journal.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = logger.log(&tx) {
            warn!("Failed to log transaction {}: {}", tx.id, e);
        }
    }

    pub fn balance(&self, account: &AccountId) -> Result<i64> {
        Ok(self.ledger.balance(account)?)
    }

    pub fn instruments(&self) -> Result<Vec<Instrument>> {
        Ok(self.market.list_instruments()?)
    }

    /// Balance plus every non-empty holding valued at the current price.
    pub fn portfolio(&self, account: &AccountId) -> Result<PortfolioView> {
        let balance = self.ledger.balance(account)?;
        let mut positions = Vec::new();

        for holding in self.portfolio.holdings(account)? {
            if holding.quantity == 0 {
                continue;
            }
            match self.market.instrument(&holding.instrument)? {
                Some(instrument) => positions.push(Position::new(
                    holding.instrument,
                    holding.quantity,
                    instrument.price(),
                )),
                None => warn!(
                    "{} holds unknown instrument {}",
                    account, holding.instrument
                ),
            }
        }

        Ok(PortfolioView::new(account.clone(), balance, positions))
    }

    /// One pass of the market simulator. Takes no account lock.
    pub fn run_market_tick(&self) -> Result<MarketSnapshot> {
        let moves = self.simulator.tick()?;
        let snapshot = MarketSnapshot::new(
            self.simulator.ticks(),
            chrono::Utc::now().timestamp_millis(),
            self.market.list_instruments()?,
        );
        debug!("Tick {}: {} instruments moved", snapshot.tick, moves.len());
        self.events
            .publish(EconomyEvent::MarketUpdated(snapshot.clone()));
        Ok(snapshot)
    }

    /// Unified command processor for the outward command layer.
    pub async fn process(&self, command: Command) -> Outcome {
        debug!("Processing {} command", command.name());

        let result = match command {
            Command::Transfer { from, to, amount } => {
                self.transfer(&from, &to, amount).await.map(settled)
            }
            Command::Grant { to, amount } => self.grant(&to, amount).await.map(settled),
            Command::Seize { caller, target } => {
                self.seize(&caller, &target, &caller).await.map(settled)
            }
            Command::Buy {
                account,
                instrument,
                quantity,
            } => self
                .buy_stock(&account, &instrument, quantity)
                .await
                .map(settled),
            Command::Sell {
                account,
                instrument,
                quantity,
            } => self
                .sell_stock(&account, &instrument, quantity)
                .await
                .map(settled),
            Command::Wager { account, amount } => self.wager(&account, amount).await.map(settled),
            Command::Balance { account } => self
                .balance(&account)
                .map(|balance| Outcome::Balance { account, balance }),
            Command::Portfolio { account } => self
                .portfolio(&account)
                .map(|view| Outcome::Portfolio { view }),
            Command::Market => self
                .instruments()
                .map(|instruments| Outcome::Market { instruments }),
        };

        result.unwrap_or_else(|e| {
            if e.is_rejection() {
                Outcome::Rejected {
                    reason: e.to_string(),
                }
            } else {
                Outcome::Failed {
                    reason: e.to_string(),
                    fatal: e.is_fatal(),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests;
