//! # Ledger Repository
//!
//! Posting vouchers and reading the trial balance.
//!
//! Vouchers produced by stock operations are posted through
//! [`insert_entry`] inside the caller's transaction, so a receipt and its
//! voucher commit or roll back together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fogon_core::ledger::{trial_balance, Account, JournalEntry, JournalLine, NewJournalEntry, TrialBalance};
use fogon_core::{Money, DEFAULT_TENANT_ID};

/// Row shape of `journal_lines`; amounts are stored as integer centavos.
#[derive(Debug, sqlx::FromRow)]
struct JournalLineRow {
    account_code: String,
    debit_cents: i64,
    credit_cents: i64,
    memo: Option<String>,
}

impl From<JournalLineRow> for JournalLine {
    fn from(row: JournalLineRow) -> Self {
        JournalLine {
            account_code: row.account_code,
            debit: Money::from_cents(row.debit_cents),
            credit: Money::from_cents(row.credit_cents),
            memo: row.memo,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct JournalEntryRow {
    id: String,
    tenant_id: String,
    reference: Option<String>,
    description: String,
    posted_at: DateTime<Utc>,
}

/// Repository for the general ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Validates and posts a voucher atomically.
    ///
    /// ## Errors
    /// - `DbError::Domain` when the voucher breaks a double-entry rule
    /// - `DbError::ForeignKeyViolation` when an account is not in the chart
    pub async fn post(&self, entry: &NewJournalEntry) -> DbResult<JournalEntry> {
        let mut tx = self.pool.begin().await?;
        let posted = insert_entry(&mut tx, entry).await?;
        tx.commit().await?;
        Ok(posted)
    }

    /// Reads a posted voucher with its lines.
    pub async fn get_entry(&self, id: &str) -> DbResult<Option<JournalEntry>> {
        let Some(row) = sqlx::query_as::<_, JournalEntryRow>(
            "SELECT id, tenant_id, reference, description, posted_at FROM journal_entries WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, JournalLineRow>(
            r#"
            SELECT account_code, debit_cents, credit_cents, memo
            FROM journal_lines
            WHERE entry_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(JournalEntry {
            id: row.id,
            tenant_id: row.tenant_id,
            reference: row.reference,
            description: row.description,
            posted_at: row.posted_at,
            lines: lines.into_iter().map(JournalLine::from).collect(),
        }))
    }

    /// Lists vouchers whose reference matches, oldest first.
    pub async fn entries_by_reference(&self, reference: &str) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT id FROM journal_entries WHERE reference = ?1 ORDER BY posted_at, rowid",
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// The chart of accounts, ordered by code.
    pub async fn accounts(&self) -> DbResult<Vec<Account>> {
        let accounts =
            sqlx::query_as::<_, Account>("SELECT code, name, kind FROM accounts ORDER BY code")
                .fetch_all(&self.pool)
                .await?;
        Ok(accounts)
    }

    /// Trial balance over every posted line, with account names filled in.
    pub async fn trial_balance(&self) -> DbResult<TrialBalance> {
        let rows = sqlx::query_as::<_, JournalLineRow>(
            "SELECT account_code, debit_cents, credit_cents, memo FROM journal_lines",
        )
        .fetch_all(&self.pool)
        .await?;

        let lines: Vec<JournalLine> = rows.into_iter().map(JournalLine::from).collect();
        let mut balance = trial_balance(&lines);

        let names: HashMap<String, String> = self
            .accounts()
            .await?
            .into_iter()
            .map(|account| (account.code, account.name))
            .collect();
        for row in &mut balance.rows {
            row.account_name = names.get(&row.account_code).cloned();
        }

        debug!(
            accounts = balance.rows.len(),
            balanced = balance.is_balanced,
            "Trial balance computed"
        );
        Ok(balance)
    }
}

/// Validates `entry` and writes it with its lines on `conn`.
pub(crate) async fn insert_entry(
    conn: &mut SqliteConnection,
    entry: &NewJournalEntry,
) -> DbResult<JournalEntry> {
    entry.validate().map_err(DbError::from)?;

    let posted = JournalEntry {
        id: Uuid::new_v4().to_string(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        reference: entry.reference.clone(),
        description: entry.description.clone(),
        posted_at: Utc::now(),
        lines: entry.lines.clone(),
    };

    sqlx::query(
        r#"
        INSERT INTO journal_entries (id, tenant_id, reference, description, posted_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&posted.id)
    .bind(&posted.tenant_id)
    .bind(&posted.reference)
    .bind(&posted.description)
    .bind(posted.posted_at)
    .execute(&mut *conn)
    .await?;

    for (index, line) in posted.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO journal_lines (
                id, entry_id, line_no, account_code, debit_cents, credit_cents, memo
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&posted.id)
        .bind(index as i64 + 1)
        .bind(&line.account_code)
        .bind(line.debit.cents())
        .bind(line.credit.cents())
        .bind(&line.memo)
        .execute(&mut *conn)
        .await?;
    }

    let (debits, _) = entry.totals();
    info!(
        entry_id = %posted.id,
        description = %posted.description,
        amount = %debits,
        "Journal entry posted"
    );

    Ok(posted)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use fogon_core::ledger::{cost_of_sales_entry, goods_receipt_entry};
    use fogon_core::CoreError;

    async fn setup() -> LedgerRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().ledger()
    }

    #[tokio::test]
    async fn test_post_and_read_back() {
        let ledger = setup().await;
        let posted = ledger
            .post(&goods_receipt_entry(Money::from_cents(612_513), Some("FAC-1")))
            .await
            .unwrap();

        let entry = ledger.get_entry(&posted.id).await.unwrap().unwrap();
        assert_eq!(entry.reference.as_deref(), Some("FAC-1"));
        assert_eq!(entry.lines.len(), 2);
        assert_eq!(entry.lines[0].account_code, "1435");
        assert_eq!(entry.lines[0].debit.cents(), 612_513);
        assert!(entry.validate().is_ok());

        assert_eq!(ledger.entries_by_reference("FAC-1").await.unwrap(), vec![posted.id]);
        assert!(ledger.get_entry("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unbalanced_entry_is_not_written() {
        let ledger = setup().await;
        let entry = NewJournalEntry::new("bad")
            .line(JournalLine::debit("1435", Money::from_cents(100)))
            .line(JournalLine::credit("2205", Money::from_cents(90)));

        let err = ledger.post(&entry).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::UnbalancedEntry { .. })));

        let tb = ledger.trial_balance().await.unwrap();
        assert!(tb.rows.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account_rolls_back() {
        let ledger = setup().await;
        let entry = NewJournalEntry::new("unknown account")
            .line(JournalLine::debit("1435", Money::from_cents(100)))
            .line(JournalLine::credit("9999", Money::from_cents(100)));

        let err = ledger.post(&entry).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let tb = ledger.trial_balance().await.unwrap();
        assert!(tb.rows.is_empty());
    }

    #[tokio::test]
    async fn test_trial_balance() {
        let ledger = setup().await;
        ledger
            .post(&goods_receipt_entry(Money::from_cents(1_000_000), None))
            .await
            .unwrap();
        ledger
            .post(&cost_of_sales_entry(Money::from_cents(25_050), Some("VENTA-1")))
            .await
            .unwrap();

        let tb = ledger.trial_balance().await.unwrap();
        assert!(tb.is_balanced);
        assert_eq!(tb.total_debits.cents(), 1_025_050);
        assert_eq!(tb.rows.len(), 3);
        assert_eq!(tb.rows[0].account_name.as_deref(), Some("Inventario de mercancías"));
        assert_eq!(tb.rows[0].balance.cents(), 1_000_000 - 25_050);
    }

    #[tokio::test]
    async fn test_chart_of_accounts_seeded() {
        let ledger = setup().await;
        let codes: Vec<String> = ledger
            .accounts()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.code)
            .collect();
        assert_eq!(codes, ["1435", "2205", "6135"]);
    }
}
