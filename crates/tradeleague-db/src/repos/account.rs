//! Account, holding, ledger and snapshot repository

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbAccount, DbBalanceSnapshot, DbError, DbHolding, DbResult, DbTransaction};

/// Lot mutation in row form
#[derive(Debug, Clone)]
pub enum DbLotChange {
    Open(DbHolding),
    Reduce { lot_id: Uuid, remaining: Decimal },
    Close { lot_id: Uuid },
}

pub struct AccountRepo {
    pool: PgPool,
}

impl AccountRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert unless the id exists, then return the stored row
    pub async fn ensure(&self, account: &DbAccount) -> DbResult<DbAccount> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, xp, rating, season_pnl, best_season_pnl, season,
                starting_capital, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(account.xp)
        .bind(account.rating)
        .bind(account.season_pnl)
        .bind(account.best_season_pnl)
        .bind(account.season)
        .bind(account.starting_capital)
        .bind(account.version)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        self.find(account.id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("account {}", account.id)))
    }

    pub async fn find(&self, id: Uuid) -> DbResult<Option<DbAccount>> {
        let account = sqlx::query_as::<_, DbAccount>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    pub async fn list_ids(&self) -> DbResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM accounts ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn add_xp(&self, id: Uuid, amount: i64) -> DbResult<Option<DbAccount>> {
        let account = sqlx::query_as::<_, DbAccount>(
            "UPDATE accounts SET xp = xp + $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Insert the `period` snapshot and set the rating in one transaction.
    /// `Ok(false)` when the snapshot already existed; nothing is written.
    pub async fn apply_rating(&self, id: Uuid, rating: i64, period: &str, total_value: Decimal) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE accounts SET rating = $2 WHERE id = $1")
            .bind(id)
            .bind(rating)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::NotFound(format!("account {}", id)));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO balance_snapshots (account_id, period, total_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (account_id, period) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(period)
        .bind(total_value)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Top accounts by season P&L
    pub async fn season_leaderboard(&self, limit: i64) -> DbResult<Vec<DbAccount>> {
        let accounts = sqlx::query_as::<_, DbAccount>(
            "SELECT * FROM accounts ORDER BY season_pnl DESC, created_at, id LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    // =========================================================================
    // Trades
    // =========================================================================

    /// Apply one trade in a single transaction.
    ///
    /// The account row is updated with `version = version + 1` guarded by
    /// `version = expected_version`; zero rows means another commit won and
    /// the whole transaction is rolled back with `VersionConflict`.
    pub async fn commit_trade(
        &self,
        account_id: Uuid,
        expected_version: i64,
        lot_change: &DbLotChange,
        entry: &DbTransaction,
        season_pnl_delta: Decimal,
        xp_delta: i64,
    ) -> DbResult<DbAccount> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, DbAccount>(
            r#"
            UPDATE accounts
            SET season_pnl = season_pnl + $3, xp = xp + $4, version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(account_id)
        .bind(expected_version)
        .bind(season_pnl_delta)
        .bind(xp_delta)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            return Err(DbError::VersionConflict);
        };

        let lot_rows = match lot_change {
            DbLotChange::Open(h) => sqlx::query(
                r#"
                INSERT INTO holdings (lot_id, account_id, symbol, quantity, acquisition_price, currency,
                    locked_until, acquired_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(h.lot_id)
            .bind(h.account_id)
            .bind(&h.symbol)
            .bind(h.quantity)
            .bind(h.acquisition_price)
            .bind(&h.currency)
            .bind(h.locked_until)
            .bind(h.acquired_at)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
            DbLotChange::Reduce { lot_id, remaining } => {
                sqlx::query("UPDATE holdings SET quantity = $3 WHERE lot_id = $1 AND account_id = $2")
                    .bind(lot_id)
                    .bind(account_id)
                    .bind(remaining)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
            }
            DbLotChange::Close { lot_id } => {
                sqlx::query("DELETE FROM holdings WHERE lot_id = $1 AND account_id = $2")
                    .bind(lot_id)
                    .bind(account_id)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
            }
        };
        if lot_rows != 1 {
            let lot_id = match lot_change {
                DbLotChange::Open(h) => h.lot_id,
                DbLotChange::Reduce { lot_id, .. } | DbLotChange::Close { lot_id } => *lot_id,
            };
            return Err(DbError::NotFound(format!("lot {} for account {}", lot_id, account_id)));
        }

        sqlx::query(
            r#"
            INSERT INTO transactions (id, account_id, lot_id, symbol, side, quantity, price, currency,
                fx_rate, realized_pnl, executed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(entry.id)
        .bind(entry.account_id)
        .bind(entry.lot_id)
        .bind(&entry.symbol)
        .bind(&entry.side)
        .bind(entry.quantity)
        .bind(entry.price)
        .bind(&entry.currency)
        .bind(entry.fx_rate)
        .bind(entry.realized_pnl)
        .bind(entry.executed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    // =========================================================================
    // Holdings & Ledger
    // =========================================================================

    pub async fn holdings(&self, account_id: Uuid) -> DbResult<Vec<DbHolding>> {
        let holdings = sqlx::query_as::<_, DbHolding>(
            "SELECT * FROM holdings WHERE account_id = $1 ORDER BY acquired_at, lot_id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(holdings)
    }

    pub async fn holding(&self, lot_id: Uuid) -> DbResult<Option<DbHolding>> {
        let holding = sqlx::query_as::<_, DbHolding>("SELECT * FROM holdings WHERE lot_id = $1")
            .bind(lot_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(holding)
    }

    pub async fn realized_pnl_total(&self, account_id: Uuid) -> DbResult<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(realized_pnl), 0) FROM transactions WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    pub async fn transactions(&self, account_id: Uuid, limit: i64, offset: i64) -> DbResult<Vec<DbTransaction>> {
        let entries = sqlx::query_as::<_, DbTransaction>(
            "SELECT * FROM transactions WHERE account_id = $1 ORDER BY seq DESC LIMIT $2 OFFSET $3",
        )
        .bind(account_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    // =========================================================================
    // Balance Snapshots
    // =========================================================================

    pub async fn snapshot(&self, account_id: Uuid, period: &str) -> DbResult<Option<DbBalanceSnapshot>> {
        let snapshot = sqlx::query_as::<_, DbBalanceSnapshot>(
            "SELECT * FROM balance_snapshots WHERE account_id = $1 AND period = $2",
        )
        .bind(account_id)
        .bind(period)
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot)
    }
}
