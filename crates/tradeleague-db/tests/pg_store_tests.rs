//! PostgreSQL store tests
//!
//! Run with `DATABASE_URL` pointing at a scratch database:
//! `cargo test -p tradeleague-db -- --ignored`

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use tradeleague_arena::leagues::{FantasyLeague, LeagueMembership};
use tradeleague_arena::models::{Account, Holding, LedgerEntry, LotChange, TradeCommit};
use tradeleague_arena::store::{AccountStore, JobClaim, JobStore, LeagueStore};
use tradeleague_arena::ArenaError;
use tradeleague_db::{Database, DatabaseConfig, PgArenaStore};
use tradeleague_types::{AccountId, Currency, LeagueId, LotId, Symbol, TradeSide, TransactionId};

async fn store() -> PgArenaStore {
    let config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");
    let db = Database::connect(&config).await.expect("connect");
    db.migrate().await.expect("migrate");
    db.arena_store()
}

fn open_lot(account_id: AccountId, expected_version: u64) -> TradeCommit {
    let holding = Holding {
        lot_id: LotId::new(),
        account_id,
        symbol: Symbol::new("AAPL").unwrap(),
        quantity: dec!(2),
        acquisition_price: dec!(150),
        currency: Currency::USD,
        locked_until: None,
        acquired_at: Utc::now(),
    };
    TradeCommit {
        account_id,
        expected_version,
        entry: LedgerEntry {
            id: TransactionId::new(),
            account_id,
            lot_id: holding.lot_id,
            symbol: holding.symbol.clone(),
            side: TradeSide::Buy,
            quantity: dec!(2),
            price: dec!(150),
            currency: Currency::USD,
            fx_rate: dec!(1),
            realized_pnl: dec!(0),
            executed_at: Utc::now(),
        },
        lot_change: LotChange::Open(holding),
        season_pnl_delta: dec!(0),
        xp_delta: 10,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_commit_trade_rejects_stale_version() {
    let store = store().await;
    let id = AccountId::new();
    store
        .ensure_account(Account::new(id, "pg-ada", dec!(100000), Utc::now()))
        .await
        .unwrap();

    let updated = store.commit_trade(open_lot(id, 0)).await.unwrap();
    assert_eq!(updated.version, 1);
    assert_eq!(updated.xp, 10);

    let err = store.commit_trade(open_lot(id, 0)).await.unwrap_err();
    assert!(matches!(err, ArenaError::ConcurrentModification));
    assert_eq!(store.holdings(id).await.unwrap().len(), 1);
    assert_eq!(store.transactions(id, 10, 0).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_ensure_account_is_idempotent() {
    let store = store().await;
    let id = AccountId::new();
    let first = store
        .ensure_account(Account::new(id, "pg-first", dec!(100000), Utc::now()))
        .await
        .unwrap();
    let second = store
        .ensure_account(Account::new(id, "pg-second", dec!(5), Utc::now()))
        .await
        .unwrap();
    assert_eq!(second.username, first.username);
    assert_eq!(second.starting_capital, dec!(100000));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_job_claimed_once() {
    let store = store().await;
    let period = format!("test-{}", uuid::Uuid::new_v4());
    assert_eq!(store.claim_job("rating_update", &period).await.unwrap(), JobClaim::Claimed);
    assert_eq!(store.claim_job("rating_update", &period).await.unwrap(), JobClaim::Resumed);

    store
        .complete_job("rating_update", &period, serde_json::json!({ "processed": 0 }))
        .await
        .unwrap();
    assert_eq!(store.claim_job("rating_update", &period).await.unwrap(), JobClaim::Completed);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_rating_applied_once_per_snapshot_period() {
    let store = store().await;
    let id = AccountId::new();
    store
        .ensure_account(Account::new(id, "pg-rated", dec!(100000), Utc::now()))
        .await
        .unwrap();
    let period = format!("test-{}", uuid::Uuid::new_v4());

    assert!(store.apply_rating(id, 1250, &period, dec!(110000)).await.unwrap());
    assert!(!store.apply_rating(id, 1500, &period, dec!(130000)).await.unwrap());

    assert_eq!(store.account(id).await.unwrap().rating, 1250);
    assert_eq!(store.balance_snapshot(id, &period).await.unwrap(), Some(dec!(110000)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_member_cap_enforced() {
    let store = store().await;
    let now = Utc::now();
    let mut ids = Vec::new();
    for name in ["pg-owner", "pg-b", "pg-c"] {
        let id = AccountId::new();
        store.ensure_account(Account::new(id, name, dec!(100000), now)).await.unwrap();
        ids.push(id);
    }

    let league = FantasyLeague {
        id: LeagueId::new(),
        name: "PG Desk".into(),
        invite_code: uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase(),
        owner_id: ids[0],
        starting_capital: dec!(10000),
        starts_at: now,
        ends_at: now + Duration::days(7),
        max_members: 2,
        created_at: now,
    };
    store.insert_league(league.clone()).await.unwrap();
    assert!(matches!(store.insert_league(league.clone()).await, Err(_)));

    let member = |account_id: AccountId| LeagueMembership {
        league_id: league.id,
        account_id,
        username: "m".into(),
        baseline_value: dec!(100000),
        starting_value: dec!(10000),
        current_value: dec!(10000),
        rank: None,
        joined_at: now,
    };
    store.add_member(member(ids[0]), 2).await.unwrap();
    assert!(matches!(store.add_member(member(ids[0]), 2).await, Err(ArenaError::AlreadyMember)));
    store.add_member(member(ids[1]), 2).await.unwrap();
    assert!(matches!(
        store.add_member(member(ids[2]), 2).await,
        Err(ArenaError::LeagueFull { max: 2 })
    ));
}
