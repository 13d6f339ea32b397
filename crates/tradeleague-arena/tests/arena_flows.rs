//! End-to-end arena flows over the in-memory store

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tradeleague_arena::models::{Holding, LedgerEntry, LotChange, TradeCommit};
use tradeleague_arena::store::{AccountStore, JobStore, SeasonStore};
use tradeleague_arena::*;
use tradeleague_marketdata::{MarketDataResult, Quote, QuoteProvider, StaticQuoteProvider};
use tradeleague_types::TransactionId;

struct Fixture {
    store: Arc<InMemoryArenaStore>,
    quotes: Arc<StaticQuoteProvider>,
    arena: Arena,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryArenaStore::new());
    let quotes = Arc::new(StaticQuoteProvider::new());
    let config = ArenaConfig::default();
    let fx = Arc::new(config.static_fx_rates());
    let arena = Arena::new(store.clone(), quotes.clone(), fx, config);
    Fixture { store, quotes, arena }
}

fn sym(s: &str) -> Symbol {
    Symbol::new(s).unwrap()
}

fn buy(symbol: &str, quantity: Decimal) -> TradeRequest {
    TradeRequest {
        symbol: sym(symbol),
        quantity,
        side: TradeSide::Buy,
        lot_id: None,
        lock_days: None,
    }
}

fn sell(symbol: &str, quantity: Decimal, lot_id: LotId) -> TradeRequest {
    TradeRequest {
        symbol: sym(symbol),
        quantity,
        side: TradeSide::Sell,
        lot_id: Some(lot_id),
        lock_days: None,
    }
}

async fn account(f: &Fixture, name: &str) -> Account {
    f.arena.ensure_account(AccountId::new(), name, Utc::now()).await.unwrap()
}

// ============================================================================
// Trading
// ============================================================================

#[tokio::test]
async fn test_buy_then_sell_restores_cash() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    f.quotes.set_price(sym("AAPL"), dec!(150), Currency::USD);

    let bought = f.arena.trades.execute(ada.id, buy("AAPL", dec!(10)), Utc::now()).await.unwrap();
    assert_eq!(bought.cash_after, dec!(98500));
    assert_eq!(bought.realized_pnl, dec!(0));
    assert_eq!(bought.xp_awarded, 10);

    let lot_id = bought.transaction.lot_id;
    let sold = f.arena.trades.execute(ada.id, sell("AAPL", dec!(10), lot_id), Utc::now()).await.unwrap();
    assert_eq!(sold.realized_pnl, dec!(0));
    assert_eq!(sold.cash_after, dec!(100000));

    let ada = f.store.account(ada.id).await.unwrap();
    assert_eq!(f.arena.valuator.cash(&ada).await.unwrap(), dec!(100000));
    assert!(f.store.holdings(ada.id).await.unwrap().is_empty());
    assert_eq!(f.store.transactions(ada.id, 10, 0).await.unwrap().len(), 2);
    assert_eq!(ada.version, 2);
}

#[tokio::test]
async fn test_partial_sell_realizes_pnl_in_home_currency() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    f.quotes.set_price(sym("SHOP.TO"), dec!(100), Currency::CAD);

    let bought = f.arena.trades.execute(ada.id, buy("SHOP.TO", dec!(10)), Utc::now()).await.unwrap();
    assert_eq!(bought.cash_after, dec!(99270));

    f.quotes.set_price(sym("SHOP.TO"), dec!(120), Currency::CAD);
    let sold = f
        .arena
        .trades
        .execute(ada.id, sell("SHOP.TO", dec!(4), bought.transaction.lot_id), Utc::now())
        .await
        .unwrap();
    assert_eq!(sold.realized_pnl, dec!(58.40));
    assert_eq!(sold.cash_after, dec!(99620.40));

    let ada = f.store.account(ada.id).await.unwrap();
    assert_eq!(ada.season_pnl, dec!(58.40));
    assert_eq!(f.arena.valuator.cash(&ada).await.unwrap(), dec!(99620.40));
    let holdings = f.store.holdings(ada.id).await.unwrap();
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].quantity, dec!(6));
}

#[tokio::test]
async fn test_buy_rejected_when_cost_exceeds_cash() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    f.quotes.set_price(sym("BRK-A"), dec!(600000), Currency::USD);

    let err = f.arena.trades.execute(ada.id, buy("BRK-A", dec!(1)), Utc::now()).await.unwrap_err();
    match err {
        ArenaError::InsufficientFunds { required, available } => {
            assert_eq!(required, dec!(600000));
            assert_eq!(available, dec!(100000));
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }
    assert!(f.store.holdings(ada.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_locked_lot_cannot_be_sold_until_expiry() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    f.quotes.set_price(sym("NVDA"), dec!(100), Currency::USD);
    let now = Utc::now();

    let mut request = buy("NVDA", dec!(2));
    request.lock_days = Some(7);
    let bought = f.arena.trades.execute(ada.id, request, now).await.unwrap();
    let lot_id = bought.transaction.lot_id;

    let err = f.arena.trades.execute(ada.id, sell("NVDA", dec!(2), lot_id), now).await.unwrap_err();
    assert!(matches!(err, ArenaError::LockNotExpired { .. }));

    let later = now + Duration::days(8);
    assert!(f.arena.trades.execute(ada.id, sell("NVDA", dec!(2), lot_id), later).await.is_ok());
}

#[tokio::test]
async fn test_sell_validates_lot_ownership_and_size() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    let eve = account(&f, "eve").await;
    f.quotes.set_price(sym("MSFT"), dec!(400), Currency::USD);

    let bought = f.arena.trades.execute(ada.id, buy("MSFT", dec!(3)), Utc::now()).await.unwrap();
    let lot_id = bought.transaction.lot_id;

    let err = f.arena.trades.execute(eve.id, sell("MSFT", dec!(1), lot_id), Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::Forbidden(_)));

    let err = f.arena.trades.execute(ada.id, sell("MSFT", dec!(4), lot_id), Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::InvalidLot(_)));

    let err = f.arena.trades.execute(ada.id, sell("MSFT", dec!(1), LotId::new()), Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::InvalidLot(_)));

    let err = f.arena.trades.execute(ada.id, buy("MSFT", dec!(0)), Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::Validation(_)));
}

#[tokio::test]
async fn test_buy_without_quote_is_upstream_failure() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    let err = f.arena.trades.execute(ada.id, buy("ZZZZ", dec!(1)), Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::Upstream(_)));
}

#[tokio::test]
async fn test_valuation_falls_back_to_cost_basis() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    f.quotes.set_price(sym("AAPL"), dec!(100), Currency::USD);
    f.quotes.set_price(sym("MSFT"), dec!(200), Currency::USD);
    f.arena.trades.execute(ada.id, buy("AAPL", dec!(10)), Utc::now()).await.unwrap();
    f.arena.trades.execute(ada.id, buy("MSFT", dec!(5)), Utc::now()).await.unwrap();

    f.quotes.remove(&sym("AAPL"));
    f.quotes.set_price(sym("MSFT"), dec!(260), Currency::USD);

    let ada = f.store.account(ada.id).await.unwrap();
    let valuation = f.arena.valuator.value(&ada).await.unwrap();
    assert_eq!(valuation.cash, dec!(98000));
    assert_eq!(valuation.holdings_value, dec!(2300));
    assert_eq!(valuation.total, dec!(100300));
    let aapl = valuation.positions.iter().find(|p| p.symbol == sym("AAPL")).unwrap();
    assert_eq!(aapl.price_source, PriceSource::CostBasis);
}

// ============================================================================
// XP
// ============================================================================

#[tokio::test]
async fn test_xp_award_is_capped_and_levels_up() {
    let f = fixture();
    let ada = account(&f, "ada").await;

    let outcome = f
        .arena
        .xp
        .award(ada.id, XpAward { amount: 10_000, reason: XpReason::ChallengeCompleted })
        .await
        .unwrap();
    assert_eq!(outcome.awarded, MAX_SINGLE_XP_AWARD);
    assert_eq!(outcome.total_xp, 500);
    assert_eq!(outcome.progress.level, 7);
    assert!(outcome.leveled_up);

    let err = f
        .arena
        .xp
        .award(ada.id, XpAward { amount: 0, reason: XpReason::DailyLogin })
        .await
        .unwrap_err();
    assert!(matches!(err, ArenaError::Validation(_)));

    let levels: Vec<_> = f
        .store
        .all_notifications()
        .into_iter()
        .filter(|n| matches!(n.kind, NotificationKind::LevelUp { level: 7 }))
        .collect();
    assert_eq!(levels.len(), 1);
}

// ============================================================================
// Ratings
// ============================================================================

#[tokio::test]
async fn test_strong_week_promotes_silver_to_gold() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    let bob = account(&f, "bob").await;
    assert_eq!(ada.tier(), LeagueTier::Silver);

    f.quotes.set_price(sym("AAPL"), dec!(100), Currency::USD);
    f.arena.trades.execute(ada.id, buy("AAPL", dec!(100)), Utc::now()).await.unwrap();
    f.quotes.set_price(sym("AAPL"), dec!(300), Currency::USD);

    let period = PeriodKey::parse("2026-W42").unwrap();
    let summary = f.arena.ratings.run(&period).await.unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.promotions, 1);
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.failed, 0);

    let ada = f.store.account(ada.id).await.unwrap();
    assert_eq!(ada.rating, 1500);
    assert_eq!(ada.tier().display_name(), "Gold");
    assert_eq!(f.store.account(bob.id).await.unwrap().rating, 1000);

    let promoted = f.store.all_notifications().into_iter().any(|n| {
        n.account_id == ada.id
            && n.kind == NotificationKind::Promotion { from: LeagueTier::Silver, to: LeagueTier::Gold }
    });
    assert!(promoted);

    let next = period.next();
    assert_eq!(f.store.balance_snapshot(ada.id, next.as_str()).await.unwrap(), Some(dec!(120000)));

    // flat follow-up week measured from the recorded snapshot
    let summary = f.arena.ratings.run(&next).await.unwrap();
    assert_eq!(summary.unchanged, 2);
    assert_eq!(f.store.account(ada.id).await.unwrap().rating, 1500);
}

#[tokio::test]
async fn test_rating_run_is_claimed_once_per_period() {
    let f = fixture();
    account(&f, "ada").await;
    let period = PeriodKey::parse("2026-W42").unwrap();
    f.arena.ratings.run(&period).await.unwrap();

    let err = f.arena.ratings.run(&period).await.unwrap_err();
    assert!(matches!(err, ArenaError::AlreadyProcessed { .. }));
    assert_eq!(f.store.claim_job("rating_update", "2026-W42").await.unwrap(), JobClaim::Completed);
}

/// Quote feed that hangs once its budget of lookups is spent, until released
struct StallingQuotes {
    inner: StaticQuoteProvider,
    budget: AtomicUsize,
    released: AtomicBool,
}

#[async_trait]
impl QuoteProvider for StallingQuotes {
    fn name(&self) -> &'static str {
        "STALLING"
    }

    async fn latest_quote(&self, symbol: &Symbol) -> MarketDataResult<Quote> {
        if !self.released.load(Ordering::SeqCst) {
            let spent = self
                .budget
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err();
            if spent {
                std::future::pending::<()>().await;
            }
        }
        self.inner.latest_quote(symbol).await
    }
}

#[tokio::test]
async fn test_interrupted_rating_run_resumes_remaining_accounts() {
    let store = Arc::new(InMemoryArenaStore::new());
    let quotes = Arc::new(StallingQuotes {
        inner: StaticQuoteProvider::new(),
        budget: AtomicUsize::new(0),
        released: AtomicBool::new(true),
    });
    quotes.inner.set_price(sym("AAPL"), dec!(100), Currency::USD);
    let config = ArenaConfig::default();
    let fx = Arc::new(config.static_fx_rates());
    let arena = Arena::new(store.clone(), quotes.clone(), fx, config);

    let mut ids = Vec::new();
    for name in ["a1", "a2", "a3", "a4", "a5"] {
        let acct = arena.ensure_account(AccountId::new(), name, Utc::now()).await.unwrap();
        arena.trades.execute(acct.id, buy("AAPL", dec!(10)), Utc::now()).await.unwrap();
        ids.push(acct.id);
    }

    let period = PeriodKey::parse("2026-W42").unwrap();
    let next = period.next();
    quotes.released.store(false, Ordering::SeqCst);
    quotes.budget.store(2, Ordering::SeqCst);

    let cut = tokio::time::timeout(std::time::Duration::from_millis(200), arena.ratings.run(&period)).await;
    assert!(cut.is_err());

    let mut rated = 0;
    for id in &ids {
        if store.balance_snapshot(*id, next.as_str()).await.unwrap().is_some() {
            rated += 1;
        }
    }
    assert_eq!(rated, 2);

    quotes.released.store(true, Ordering::SeqCst);
    let summary = arena.ratings.run(&period).await.unwrap();
    assert!(summary.resumed);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 0);
    for id in &ids {
        assert!(store.balance_snapshot(*id, next.as_str()).await.unwrap().is_some());
    }

    let err = arena.ratings.run(&period).await.unwrap_err();
    assert!(matches!(err, ArenaError::AlreadyProcessed { .. }));
}

#[tokio::test]
async fn test_failed_rating_write_leaves_tier_and_notifications_untouched() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    f.quotes.set_price(sym("AAPL"), dec!(100), Currency::USD);
    f.arena.trades.execute(ada.id, buy("AAPL", dec!(100)), Utc::now()).await.unwrap();
    f.quotes.set_price(sym("AAPL"), dec!(300), Currency::USD);

    f.store.fail_rating_writes(true);
    let period = PeriodKey::parse("2026-W42").unwrap();
    let summary = f.arena.ratings.run(&period).await.unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.promotions, 0);

    assert_eq!(f.store.account(ada.id).await.unwrap().rating, 1000);
    assert_eq!(f.store.balance_snapshot(ada.id, period.next().as_str()).await.unwrap(), None);
    let promoted = f
        .store
        .all_notifications()
        .into_iter()
        .any(|n| matches!(n.kind, NotificationKind::Promotion { .. }));
    assert!(!promoted);
}

#[tokio::test]
async fn test_rating_failure_is_isolated_per_account() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    let broken = account(&f, "broken").await;

    // a JPY lot has no configured FX rate, so valuing this account fails
    let lot = Holding {
        lot_id: LotId::new(),
        account_id: broken.id,
        symbol: sym("7203.T"),
        quantity: dec!(1),
        acquisition_price: dec!(2500),
        currency: Currency::JPY,
        locked_until: None,
        acquired_at: Utc::now(),
    };
    f.store
        .commit_trade(TradeCommit {
            account_id: broken.id,
            expected_version: 0,
            entry: LedgerEntry {
                id: TransactionId::new(),
                account_id: broken.id,
                lot_id: lot.lot_id,
                symbol: lot.symbol.clone(),
                side: TradeSide::Buy,
                quantity: dec!(1),
                price: dec!(2500),
                currency: Currency::JPY,
                fx_rate: dec!(1),
                realized_pnl: dec!(0),
                executed_at: Utc::now(),
            },
            lot_change: LotChange::Open(lot),
            season_pnl_delta: dec!(0),
            xp_delta: 0,
        })
        .await
        .unwrap();

    let summary = f.arena.ratings.run(&PeriodKey::parse("2026-W42").unwrap()).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(f.store.account(ada.id).await.unwrap().rating, 1000);
}

// ============================================================================
// Seasons
// ============================================================================

#[tokio::test]
async fn test_season_rotation_archives_and_resets_once() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    let bob = account(&f, "bob").await;
    f.store.set_season_pnl(ada.id, dec!(250)).unwrap();
    f.store.set_season_pnl(bob.id, dec!(-50)).unwrap();

    let outcome = f.arena.seasons.rotate("2026-W42", Utc::now()).await.unwrap();
    assert_eq!(outcome.archive.season_number, 1);
    assert_eq!(outcome.archive.winner_account_id, Some(ada.id));
    assert_eq!(outcome.archive.winning_pnl, Some(dec!(250)));
    assert_eq!(outcome.archive.participant_count, 2);
    assert_eq!(outcome.next_season.number, 2);
    assert_eq!(outcome.next_season.state, SeasonState::Active);
    assert!(!outcome.resumed);

    let ada_after = f.store.account(ada.id).await.unwrap();
    assert_eq!(ada_after.season_pnl, dec!(0));
    assert_eq!(ada_after.best_season_pnl, dec!(250));
    assert_eq!(ada_after.season, 2);

    let err = f.arena.seasons.rotate("2026-W42", Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::AlreadyRotated { .. }));
    assert_eq!(f.arena.seasons.archives(10).await.unwrap().len(), 1);
    assert_eq!(f.store.account(ada.id).await.unwrap().season, 2);
    assert_eq!(f.store.current_season().await.unwrap().number, 2);
}

#[tokio::test]
async fn test_season_without_positive_pnl_has_no_winner() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    f.store.set_season_pnl(ada.id, dec!(-10)).unwrap();

    let outcome = f.arena.seasons.rotate("2026-W42", Utc::now()).await.unwrap();
    assert!(outcome.archive.winner_account_id.is_none());
    assert_eq!(outcome.archive.leaderboard.len(), 1);
}

#[tokio::test]
async fn test_interrupted_rotation_resumes_with_same_key() {
    let f = fixture();
    account(&f, "ada").await;

    let season = f.store.current_season().await.unwrap();
    f.store.begin_rotation(season.version, "2026-W42").await.unwrap();

    let err = f.arena.seasons.rotate("2026-W43", Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::RotationInProgress { key } if key == "2026-W42"));

    let outcome = f.arena.seasons.rotate("2026-W42", Utc::now()).await.unwrap();
    assert!(outcome.resumed);
    assert_eq!(outcome.next_season.number, 2);
}

#[tokio::test]
async fn test_replaying_an_older_rotation_key_is_rejected() {
    let f = fixture();
    account(&f, "ada").await;
    f.arena.seasons.rotate("2026-W42", Utc::now()).await.unwrap();
    f.arena.seasons.rotate("2026-W43", Utc::now()).await.unwrap();

    let err = f.arena.seasons.rotate("2026-W42", Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::AlreadyRotated { .. }));
    assert_eq!(f.store.current_season().await.unwrap().state, SeasonState::Active);
}

// ============================================================================
// Fantasy Leagues
// ============================================================================

fn league_request(max_members: u32) -> NewLeague {
    let now = Utc::now();
    NewLeague {
        name: "Lunch Desk".into(),
        starting_capital: dec!(10000),
        starts_at: now - Duration::hours(1),
        ends_at: now + Duration::days(30),
        max_members,
    }
}

#[tokio::test]
async fn test_join_rules() {
    let f = fixture();
    let owner = account(&f, "owner").await;
    let bob = account(&f, "bob").await;
    let cy = account(&f, "cy").await;
    let dee = account(&f, "dee").await;

    let league = f.arena.leagues.create(owner.id, league_request(3), Utc::now()).await.unwrap();
    assert_eq!(league.invite_code.len(), 8);

    let code = league.invite_code.to_lowercase();
    let membership = f.arena.leagues.join(bob.id, &code, Utc::now()).await.unwrap();
    assert_eq!(membership.current_value, dec!(10000));
    assert_eq!(membership.rank, Some(2));

    let err = f.arena.leagues.join(bob.id, &code, Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::AlreadyMember));

    f.arena.leagues.join(cy.id, &code, Utc::now()).await.unwrap();
    let err = f.arena.leagues.join(dee.id, &code, Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::LeagueFull { max: 3 }));

    let err = f.arena.leagues.join(dee.id, "NOPE2345", Utc::now()).await.unwrap_err();
    assert!(matches!(err, ArenaError::LeagueNotFound(_)));

    let after_end = league.ends_at + Duration::minutes(1);
    let other = f.arena.leagues.create(owner.id, league_request(5), Utc::now()).await.unwrap();
    let err = f.arena.leagues.join(dee.id, &other.invite_code, after_end).await.unwrap_err();
    assert!(matches!(err, ArenaError::LeagueEnded));
}

#[tokio::test]
async fn test_trade_passes_member_and_improves_rank() {
    let f = fixture();
    let ada = account(&f, "ada").await;
    let bob = account(&f, "bob").await;

    let league = f.arena.leagues.create(ada.id, league_request(10), Utc::now()).await.unwrap();
    f.arena.leagues.join(bob.id, &league.invite_code, Utc::now()).await.unwrap();

    f.quotes.set_price(sym("AAPL"), dec!(100), Currency::USD);
    f.arena.trades.execute(bob.id, buy("AAPL", dec!(10)), Utc::now()).await.unwrap();
    f.quotes.set_price(sym("AAPL"), dec!(200), Currency::USD);
    f.arena.trades.execute(bob.id, buy("AAPL", dec!(1)), Utc::now()).await.unwrap();

    let (_, members) = f.arena.leagues.standings(league.id).await.unwrap();
    assert_eq!(members[0].account_id, bob.id);
    assert_eq!(members[0].rank, Some(1));
    assert_eq!(members[0].current_value, dec!(11000));
    assert_eq!(members[1].account_id, ada.id);
    assert_eq!(members[1].rank, Some(2));

    let bob_notes = f.store.all_notifications();
    assert!(bob_notes.iter().any(|n| n.account_id == bob.id
        && matches!(&n.kind, NotificationKind::PassedMember { passed_account, .. } if *passed_account == ada.id)));
    assert!(bob_notes.iter().any(|n| n.account_id == bob.id
        && n.kind == NotificationKind::RankImproved { league_id: league.id, from: 2, to: 1 }));
    // rank decline is silent
    assert!(!bob_notes.iter().any(|n| n.account_id == ada.id
        && matches!(n.kind, NotificationKind::RankImproved { .. } | NotificationKind::PassedMember { .. })));
}
