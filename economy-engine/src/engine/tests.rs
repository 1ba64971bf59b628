use super::*;
use crate::market::default_catalog;
use crate::store::MemoryStore;
use crate::wager::fixed::FixedFortune;
use economy::Holding;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;

const SAMSUNG: &str = "삼성전자";

fn id(s: &str) -> AccountId {
    AccountId::new(s)
}

fn create_test_engine() -> (Arc<MemoryStore>, Engine) {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone()).with_authorized([id("admin")]);
    engine.seed_catalog(&default_catalog()).unwrap();
    (store, engine)
}

fn create_test_engine_with_fortune(win: bool) -> (Arc<MemoryStore>, Engine) {
    let (store, engine) = create_test_engine();
    (store, engine.with_fortune(Box::new(FixedFortune::always(win))))
}

/// Delegates to a [`MemoryStore`], failing chosen writes.
#[derive(Default)]
struct FaultyStore {
    inner: MemoryStore,
    /// Accounts whose balance cannot be increased.
    fail_credit: Mutex<HashSet<AccountId>>,
    fail_holdings: Mutex<bool>,
}

impl FaultyStore {
    fn fail_credit_to(&self, account: &AccountId) {
        self.fail_credit.lock().unwrap().insert(account.clone());
    }

    fn fail_holding_writes(&self) {
        *self.fail_holdings.lock().unwrap() = true;
    }
}

impl LedgerStore for FaultyStore {
    fn balance(&self, account: &AccountId) -> std::result::Result<i64, StoreError> {
        self.inner.balance(account)
    }

    fn adjust_balance(
        &self,
        account: &AccountId,
        delta: i64,
    ) -> std::result::Result<i64, StoreError> {
        if delta > 0 && self.fail_credit.lock().unwrap().contains(account) {
            return Err(StoreError::unavailable("ledger offline"));
        }
        self.inner.adjust_balance(account, delta)
    }

    fn accounts(&self) -> std::result::Result<Vec<(AccountId, i64)>, StoreError> {
        self.inner.accounts()
    }
}

impl PortfolioStore for FaultyStore {
    fn holding(&self, account: &AccountId, instrument: &str) -> std::result::Result<u64, StoreError> {
        self.inner.holding(account, instrument)
    }

    fn set_holding(
        &self,
        account: &AccountId,
        instrument: &str,
        quantity: u64,
    ) -> std::result::Result<(), StoreError> {
        if *self.fail_holdings.lock().unwrap() {
            return Err(StoreError::unavailable("portfolio offline"));
        }
        self.inner.set_holding(account, instrument, quantity)
    }

    fn holdings(&self, account: &AccountId) -> std::result::Result<Vec<Holding>, StoreError> {
        self.inner.holdings(account)
    }
}

impl MarketStore for FaultyStore {
    fn list_instruments(&self) -> std::result::Result<Vec<Instrument>, StoreError> {
        self.inner.list_instruments()
    }

    fn instrument(&self, name: &str) -> std::result::Result<Option<Instrument>, StoreError> {
        self.inner.instrument(name)
    }

    fn set_price(&self, name: &str, price: u64) -> std::result::Result<(), StoreError> {
        self.inner.set_price(name, price)
    }

    fn seed(&self, catalog: &[Instrument]) -> std::result::Result<usize, StoreError> {
        self.inner.seed(catalog)
    }
}

fn create_faulty_engine() -> (Arc<FaultyStore>, Engine) {
    let store = Arc::new(FaultyStore::default());
    let engine = Engine::new(store.clone());
    engine.seed_catalog(&default_catalog()).unwrap();
    (store, engine)
}

#[tokio::test]
async fn test_buy_after_grant() {
    let (_, engine) = create_test_engine();
    let x = id("x");

    engine.grant(&x, 50_000).await.unwrap();
    let err = engine.buy_stock(&x, SAMSUNG, 1).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds {
            balance: 50_000,
            required: 70_000
        }
    );

    engine.grant(&x, 30_000).await.unwrap();
    let receipt = engine.buy_stock(&x, SAMSUNG, 1).await.unwrap();
    assert_eq!(receipt.price, 70_000);
    assert_eq!(receipt.total, 70_000);
    assert_eq!(receipt.balance, 10_000);
    assert_eq!(receipt.holding, 1);

    assert_eq!(engine.balance(&x).unwrap(), 10_000);
    let view = engine.portfolio(&x).unwrap();
    assert_eq!(view.positions, vec![Position::new(SAMSUNG, 1, 70_000)]);
}

#[tokio::test]
async fn test_grant_buy_grant_buy() {
    let (_, engine) = create_test_engine();
    let x = id("x");

    engine.grant(&x, 1_000).await.unwrap();
    assert_eq!(
        engine.buy_stock(&x, SAMSUNG, 1).await.unwrap_err(),
        EngineError::InsufficientFunds {
            balance: 1_000,
            required: 70_000
        }
    );
    assert_eq!(engine.balance(&x).unwrap(), 1_000);

    let grant = engine.grant(&x, 70_000).await.unwrap();
    assert_eq!(grant.balance, 71_000);

    let receipt = engine.buy_stock(&x, SAMSUNG, 1).await.unwrap();
    assert_eq!(receipt.balance, 1_000);
    assert_eq!(receipt.holding, 1);
    assert_eq!(engine.balance(&x).unwrap(), 1_000);
}

#[tokio::test]
async fn test_zero_price_snapshot_does_not_give_away_stock() {
    let snapshot: crate::store::StoreSnapshot = serde_json::from_str(
        r#"{"balances":{},"holdings":[],"instruments":[{"name":"a","price":0,"trend":"normal"}]}"#,
    )
    .unwrap();
    let engine = Engine::new(Arc::new(MemoryStore::from_snapshot(snapshot)));
    let x = id("x");

    assert_eq!(
        engine.buy_stock(&x, "a", 1_000_000).await.unwrap_err(),
        EngineError::InsufficientFunds {
            balance: 0,
            required: 1_000_000
        }
    );
    assert_eq!(engine.portfolio(&x).unwrap().positions, vec![]);
}

#[tokio::test]
async fn test_wager_win_pays_three_tenths() {
    let (_, engine) = create_test_engine_with_fortune(true);
    let x = id("x");
    engine.grant(&x, 1_000).await.unwrap();

    let receipt = engine.wager(&x, 500).await.unwrap();
    assert!(receipt.won);
    assert_eq!(receipt.payout, 150);
    assert_eq!(receipt.net(), -350);
    assert_eq!(engine.balance(&x).unwrap(), 650);
}

#[tokio::test]
async fn test_wager_loss_forfeits_stake() {
    let (_, engine) = create_test_engine_with_fortune(false);
    let x = id("x");
    engine.grant(&x, 1_000).await.unwrap();

    let receipt = engine.wager(&x, 500).await.unwrap();
    assert!(!receipt.won);
    assert_eq!(receipt.payout, 0);
    assert_eq!(engine.balance(&x).unwrap(), 500);
}

#[tokio::test]
async fn test_wager_limits() {
    let (_, engine) = create_test_engine_with_fortune(true);
    let x = id("x");
    engine.grant(&x, 1_000).await.unwrap();

    assert!(matches!(
        engine.wager(&x, 499).await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert_eq!(
        engine.wager(&x, 2_000).await.unwrap_err(),
        EngineError::InsufficientFunds {
            balance: 1_000,
            required: 2_000
        }
    );
    assert_eq!(engine.balance(&x).unwrap(), 1_000);
}

#[tokio::test]
async fn test_seize_moves_entire_balance() {
    let (_, engine) = create_test_engine();
    let (admin, a, b) = (id("admin"), id("a"), id("b"));
    engine.grant(&a, 300).await.unwrap();
    engine.grant(&b, 50).await.unwrap();

    let receipt = engine.seize(&admin, &a, &b).await.unwrap();
    assert_eq!(receipt.amount, 300);
    assert_eq!(receipt.to_balance, 350);
    assert_eq!(engine.balance(&a).unwrap(), 0);
    assert_eq!(engine.balance(&b).unwrap(), 350);
}

#[tokio::test]
async fn test_seize_empty_account_settles_with_zero() {
    let (_, engine) = create_test_engine();
    let (admin, a, b) = (id("admin"), id("a"), id("b"));
    engine.grant(&b, 50).await.unwrap();

    let receipt = engine.seize(&admin, &a, &b).await.unwrap();
    assert_eq!(receipt.amount, 0);
    assert_eq!(engine.balance(&b).unwrap(), 50);
}

#[tokio::test]
async fn test_seize_requires_authorization() {
    let (_, engine) = create_test_engine();
    let (mallory, a) = (id("mallory"), id("a"));
    engine.grant(&a, 300).await.unwrap();

    assert_eq!(
        engine.seize(&mallory, &a, &mallory).await.unwrap_err(),
        EngineError::Unauthorized(mallory.clone())
    );
    assert_eq!(engine.balance(&a).unwrap(), 300);
    assert_eq!(engine.balance(&mallory).unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_amounts_are_rejected_before_locking() {
    let (_, engine) = create_test_engine();
    let (a, b) = (id("a"), id("b"));
    engine.grant(&a, 1_000).await.unwrap();

    for result in [
        engine.transfer(&a, &a, 10).await.map(|_| ()),
        engine.transfer(&a, &b, 0).await.map(|_| ()),
        engine.transfer(&a, &b, -5).await.map(|_| ()),
        engine.grant(&a, 0).await.map(|_| ()),
        engine.buy_stock(&a, SAMSUNG, 0).await.map(|_| ()),
        engine.sell_stock(&a, SAMSUNG, 0).await.map(|_| ()),
        engine.seize(&id("admin"), &a, &a).await.map(|_| ()),
    ] {
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
    }
    assert_eq!(engine.balance(&a).unwrap(), 1_000);
    assert_eq!(engine.balance(&b).unwrap(), 0);
}

#[tokio::test]
async fn test_transfer_conserves_money() {
    let (_, engine) = create_test_engine();
    let (a, b) = (id("a"), id("b"));
    engine.grant(&a, 1_000).await.unwrap();

    let receipt = engine.transfer(&a, &b, 400).await.unwrap();
    assert_eq!((receipt.from_balance, receipt.to_balance), (600, 400));

    assert_eq!(
        engine.transfer(&b, &a, 401).await.unwrap_err(),
        EngineError::InsufficientFunds {
            balance: 400,
            required: 401
        }
    );
    assert_eq!(engine.balance(&a).unwrap() + engine.balance(&b).unwrap(), 1_000);
}

#[tokio::test]
async fn test_unknown_instrument() {
    let (_, engine) = create_test_engine();
    let x = id("x");
    engine.grant(&x, 1_000_000).await.unwrap();

    assert_eq!(
        engine.buy_stock(&x, "nope", 1).await.unwrap_err(),
        EngineError::UnknownInstrument("nope".into())
    );
    assert_eq!(
        engine.sell_stock(&x, "nope", 1).await.unwrap_err(),
        EngineError::UnknownInstrument("nope".into())
    );
    assert_eq!(engine.balance(&x).unwrap(), 1_000_000);
}

#[tokio::test]
async fn test_sell_requires_holdings() {
    let (store, engine) = create_test_engine();
    let x = id("x");
    engine.grant(&x, 140_000).await.unwrap();
    engine.buy_stock(&x, SAMSUNG, 2).await.unwrap();

    assert_eq!(
        engine.sell_stock(&x, SAMSUNG, 3).await.unwrap_err(),
        EngineError::InsufficientHoldings {
            instrument: SAMSUNG.into(),
            held: 2,
            requested: 3
        }
    );

    store.set_price(SAMSUNG, 80_000).unwrap();
    let receipt = engine.sell_stock(&x, SAMSUNG, 2).await.unwrap();
    assert_eq!(receipt.total, 160_000);
    assert_eq!(receipt.holding, 0);
    assert_eq!(engine.balance(&x).unwrap(), 160_000);

    // The zero row stays in the table but not in the view.
    assert_eq!(store.holdings(&x).unwrap().len(), 1);
    assert!(engine.portfolio(&x).unwrap().is_empty());
}

#[tokio::test]
async fn test_overflowing_trade_is_rejected() {
    let (store, engine) = create_test_engine();
    let x = id("x");
    engine.grant(&x, 1_000).await.unwrap();
    store.set_price(SAMSUNG, u64::MAX).unwrap();

    assert!(matches!(
        engine.buy_stock(&x, SAMSUNG, 2).await,
        Err(EngineError::InvalidAmount(_))
    ));
    assert_eq!(engine.balance(&x).unwrap(), 1_000);
}

#[tokio::test]
async fn test_trade_reads_price_after_lock() {
    let (store, engine) = create_test_engine();
    let engine = Arc::new(engine);
    let x = id("x");
    engine.grant(&x, 1_000_000).await.unwrap();

    let guard = engine.locks().acquire(&x).await;
    let task = {
        let engine = engine.clone();
        let x = x.clone();
        tokio::spawn(async move { engine.buy_stock(&x, SAMSUNG, 1).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!task.is_finished());

    store.set_price(SAMSUNG, 71_000).unwrap();
    drop(guard);

    let receipt = task.await.unwrap().unwrap();
    assert_eq!(receipt.price, 71_000);
    assert_eq!(engine.balance(&x).unwrap(), 929_000);
}

#[tokio::test]
async fn test_disjoint_accounts_progress_while_one_is_held() {
    let (_, engine) = create_test_engine();
    let (a, b) = (id("a"), id("b"));

    let _held = engine.locks().acquire(&a).await;
    let grant = timeout(Duration::from_millis(100), engine.grant(&b, 10)).await;
    assert!(grant.is_ok(), "grant to b must not wait on a");
    assert!(timeout(Duration::from_millis(50), engine.grant(&a, 10))
        .await
        .is_err());
}

#[tokio::test]
async fn test_failed_credit_is_rolled_back() {
    let (store, engine) = create_faulty_engine();
    let (a, b) = (id("a"), id("b"));
    engine.grant(&a, 1_000).await.unwrap();
    store.fail_credit_to(&b);

    let err = engine.transfer(&a, &b, 400).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert!(!err.is_fatal());
    assert_eq!(engine.balance(&a).unwrap(), 1_000);
    assert_eq!(engine.balance(&b).unwrap(), 0);
    assert!(!engine.locks().is_held(&a) && !engine.locks().is_held(&b));
}

#[tokio::test]
async fn test_failed_rollback_is_fatal() {
    let (store, engine) = create_faulty_engine();
    let (a, b) = (id("a"), id("b"));
    engine.grant(&a, 1_000).await.unwrap();
    store.fail_credit_to(&b);
    store.fail_credit_to(&a);

    let err = engine.transfer(&a, &b, 400).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, EngineError::Inconsistent { ref account, .. } if *account == a));

    let outcome = engine
        .process(Command::Transfer {
            from: a.clone(),
            to: b.clone(),
            amount: 100,
        })
        .await;
    assert!(outcome.is_fatal());
}

#[tokio::test]
async fn test_failed_holding_write_refunds_buyer() {
    let (store, engine) = create_faulty_engine();
    let x = id("x");
    engine.grant(&x, 100_000).await.unwrap();
    store.fail_holding_writes();

    let err = engine.buy_stock(&x, SAMSUNG, 1).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert_eq!(engine.balance(&x).unwrap(), 100_000);
    assert_eq!(store.holding(&x, SAMSUNG).unwrap(), 0);
}

#[tokio::test]
async fn test_failed_sale_credit_restores_holding() {
    let (store, engine) = create_faulty_engine();
    let x = id("x");
    engine.grant(&x, 70_000).await.unwrap();
    engine.buy_stock(&x, SAMSUNG, 1).await.unwrap();
    store.fail_credit_to(&x);

    let err = engine.sell_stock(&x, SAMSUNG, 1).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert_eq!(store.holding(&x, SAMSUNG).unwrap(), 1);
    assert_eq!(engine.balance(&x).unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_grants_are_not_lost() {
    let (_, engine) = create_test_engine();
    let engine = Arc::new(engine);
    let x = id("x");

    let handles: Vec<_> = (0..500)
        .map(|_| {
            let engine = engine.clone();
            let x = x.clone();
            tokio::spawn(async move { engine.grant(&x, 1).await })
        })
        .collect();
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(engine.balance(&x).unwrap(), 500);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_transfers_do_not_deadlock() {
    let (_, engine) = create_test_engine();
    let engine = Arc::new(engine);
    let (a, b) = (id("a"), id("b"));
    engine.grant(&a, 10_000).await.unwrap();
    engine.grant(&b, 10_000).await.unwrap();

    let handles: Vec<_> = (0..400)
        .map(|i| {
            let engine = engine.clone();
            let (from, to) = if i % 2 == 0 {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            tokio::spawn(async move { engine.transfer(&from, &to, 7).await })
        })
        .collect();

    let all = async {
        for h in handles {
            let _ = h.await.unwrap();
        }
    };
    timeout(Duration::from_secs(10), all)
        .await
        .expect("transfers deadlocked");

    assert_eq!(engine.balance(&a).unwrap() + engine.balance(&b).unwrap(), 20_000);
}

#[derive(Debug, Clone)]
enum Op {
    Transfer(usize, usize, i64),
    Grant(usize, i64),
    Seize(usize, usize),
    Buy(usize, usize, u64),
    Sell(usize, usize, u64),
    Wager(usize, i64),
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_random_interleavings_keep_books_consistent() {
    let (store, engine) = create_test_engine();
    let engine = Arc::new(engine.with_authorized([id("acct-0")]));
    let accounts: Vec<AccountId> = (0..4).map(|i| id(&format!("acct-{}", i))).collect();
    let names: Vec<String> = default_catalog()
        .iter()
        .map(|i| i.name().to_string())
        .collect();

    for account in &accounts {
        engine.grant(account, 200_000).await.unwrap();
    }

    let mut rng = StdRng::seed_from_u64(7);
    let ops: Vec<Op> = (0..600)
        .map(|_| {
            let a = rng.gen_range(0..accounts.len());
            let b = rng.gen_range(0..accounts.len());
            let n = rng.gen_range(0..names.len());
            match rng.gen_range(0..6) {
                0 => Op::Transfer(a, b, rng.gen_range(-10..20_000)),
                1 => Op::Grant(a, rng.gen_range(0..5_000)),
                2 => Op::Seize(a, b),
                3 => Op::Buy(a, n, rng.gen_range(0..3)),
                4 => Op::Sell(a, n, rng.gen_range(0..3)),
                _ => Op::Wager(a, rng.gen_range(400..3_000)),
            }
        })
        .collect();

    let ticker = {
        let engine = engine.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                engine.run_market_tick().unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let handles: Vec<_> = ops
        .into_iter()
        .map(|op| {
            let engine = engine.clone();
            let accounts = accounts.clone();
            let names = names.clone();
            tokio::spawn(async move {
                let caller = &accounts[0];
                let settled: Option<Receipt> = match op {
                    Op::Transfer(a, b, amt) => engine
                        .transfer(&accounts[a], &accounts[b], amt)
                        .await
                        .ok()
                        .map(Into::into),
                    Op::Grant(a, amt) => engine.grant(&accounts[a], amt).await.ok().map(Into::into),
                    Op::Seize(a, b) => engine
                        .seize(caller, &accounts[a], &accounts[b])
                        .await
                        .ok()
                        .map(Into::into),
                    Op::Buy(a, n, q) => engine
                        .buy_stock(&accounts[a], &names[n], q)
                        .await
                        .ok()
                        .map(Into::into),
                    Op::Sell(a, n, q) => engine
                        .sell_stock(&accounts[a], &names[n], q)
                        .await
                        .ok()
                        .map(Into::into),
                    Op::Wager(a, amt) => engine.wager(&accounts[a], amt).await.ok().map(Into::into),
                };
                settled
            })
        })
        .collect();

    let mut cash = 200_000 * accounts.len() as i64;
    let mut units: HashMap<String, i64> = HashMap::new();
    for h in handles {
        match h.await.unwrap() {
            Some(Receipt::Grant(r)) => cash += r.amount,
            Some(Receipt::Wager(r)) => cash += r.net(),
            Some(Receipt::Trade(r)) => match r.side {
                Side::Buy => {
                    cash -= r.total;
                    *units.entry(r.instrument).or_default() += r.quantity as i64;
                }
                Side::Sell => {
                    cash += r.total;
                    *units.entry(r.instrument).or_default() -= r.quantity as i64;
                }
            },
            Some(Receipt::Transfer(_)) | Some(Receipt::Seizure(_)) | None => {}
        }
    }
    ticker.await.unwrap();

    let rows = store.accounts().unwrap();
    assert!(rows.iter().all(|(_, balance)| *balance >= 0));
    assert_eq!(rows.iter().map(|(_, b)| b).sum::<i64>(), cash);

    for name in &names {
        let held: i64 = accounts
            .iter()
            .map(|a| store.holding(a, name).unwrap() as i64)
            .sum();
        assert_eq!(held, units.get(name).copied().unwrap_or(0), "{}", name);
    }
    assert!(store.list_instruments().unwrap().iter().all(|i| i.price() >= 1));
}

#[tokio::test]
async fn test_settled_operations_are_published() {
    let (_, engine) = create_test_engine();
    let mut rx = engine.events().subscribe();
    let x = id("x");

    let receipt = engine.grant(&x, 10).await.unwrap();
    match rx.recv().await.unwrap() {
        EconomyEvent::Settled(Receipt::Grant(r)) => assert_eq!(r, receipt),
        other => panic!("unexpected event {:?}", other),
    }

    // Rejections publish nothing.
    let _ = engine.transfer(&x, &id("y"), 1_000).await;
    assert!(rx.try_recv().is_err());

    let snapshot = engine.run_market_tick().unwrap();
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.instruments.len(), default_catalog().len());
    match rx.recv().await.unwrap() {
        EconomyEvent::MarketUpdated(s) => assert_eq!(s, snapshot),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_settled_operations_are_journaled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.csv");
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store).with_journal(TransactionLogger::new(path.clone()));
    let (a, b) = (id("a"), id("b"));

    let grant = engine.grant(&a, 500).await.unwrap();
    let transfer = engine.transfer(&a, &b, 200).await.unwrap();
    let _ = engine.transfer(&a, &b, 10_000).await;

    let journal = std::fs::read_to_string(&path).unwrap();
    assert!(journal.contains(&grant.id.to_string()));
    assert!(journal.contains(&transfer.id.to_string()));
    assert!(journal.contains(crate::models::MINT_ACCOUNT));
}

#[tokio::test]
async fn test_process_commands() {
    let (_, engine) = create_test_engine();
    let x = id("x");

    let outcome = engine
        .process(Command::Grant {
            to: x.clone(),
            amount: 70_000,
        })
        .await;
    assert!(matches!(outcome, Outcome::Settled { receipt: Receipt::Grant(_) }));

    let outcome = engine
        .process(Command::Buy {
            account: x.clone(),
            instrument: SAMSUNG.into(),
            quantity: 2,
        })
        .await;
    assert!(matches!(outcome, Outcome::Rejected { .. }));

    let outcome = engine
        .process(Command::Seize {
            caller: x.clone(),
            target: id("y"),
        })
        .await;
    assert!(matches!(outcome, Outcome::Rejected { .. }));

    assert_eq!(
        engine.process(Command::Balance { account: x.clone() }).await,
        Outcome::Balance {
            account: x.clone(),
            balance: 70_000
        }
    );

    match engine.process(Command::Market).await {
        Outcome::Market { instruments } => assert_eq!(instruments, default_catalog()),
        other => panic!("unexpected outcome {:?}", other),
    }

    match engine.process(Command::Portfolio { account: x.clone() }).await {
        Outcome::Portfolio { view } => {
            assert_eq!(view.balance, 70_000);
            assert!(view.positions.is_empty());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}
