//! # Ledger Module
//!
//! Double-entry vouchers and the trial balance.
//!
//! ## Invariants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Voucher (journal entry)                                                │
//! │                                                                         │
//! │   account  │   debit    │   credit                                      │
//! │  ──────────┼────────────┼───────────                                    │
//! │   1435     │  6.125,13  │                ← exactly one side > 0         │
//! │   2205     │            │  6.125,13      ← no negative amounts          │
//! │  ──────────┼────────────┼───────────                                    │
//! │   Σ        │  6.125,13  =  6.125,13      ← debits == credits            │
//! │                                                                         │
//! │  At least two lines. Amounts are Money (integer centavos).              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Account codes follow the Colombian PUC (Plan Único de Cuentas).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Chart of Accounts
// =============================================================================

/// PUC 1435: Inventario de mercancías no fabricadas por la empresa.
pub const INVENTORY_ACCOUNT: &str = "1435";

/// PUC 2205: Proveedores nacionales.
pub const SUPPLIERS_ACCOUNT: &str = "2205";

/// PUC 6135: Costo de ventas, comercio al por mayor y al por menor.
pub const COST_OF_SALES_ACCOUNT: &str = "6135";

/// Class of an account in the chart of accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
    Cost,
}

/// An account of the chart of accounts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Account {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
}

// =============================================================================
// Journal Entries
// =============================================================================

/// One line of a voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JournalLine {
    pub account_code: String,
    pub debit: Money,
    pub credit: Money,
    pub memo: Option<String>,
}

impl JournalLine {
    pub fn debit(account_code: impl Into<String>, amount: Money) -> Self {
        JournalLine {
            account_code: account_code.into(),
            debit: amount,
            credit: Money::zero(),
            memo: None,
        }
    }

    pub fn credit(account_code: impl Into<String>, amount: Money) -> Self {
        JournalLine {
            account_code: account_code.into(),
            debit: Money::zero(),
            credit: amount,
            memo: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// A voucher that has not been posted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewJournalEntry {
    pub reference: Option<String>,
    pub description: String,
    pub lines: Vec<JournalLine>,
}

impl NewJournalEntry {
    pub fn new(description: impl Into<String>) -> Self {
        NewJournalEntry {
            reference: None,
            description: description.into(),
            lines: Vec::new(),
        }
    }

    pub fn with_reference(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }

    pub fn line(mut self, line: JournalLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Total debits and total credits.
    pub fn totals(&self) -> (Money, Money) {
        totals(&self.lines)
    }

    /// Checks the double-entry invariants. See [`validate_lines`].
    pub fn validate(&self) -> CoreResult<()> {
        validate_lines(&self.lines)
    }
}

/// A posted voucher.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JournalEntry {
    pub id: String,
    pub tenant_id: String,
    pub reference: Option<String>,
    pub description: String,
    #[ts(as = "String")]
    pub posted_at: DateTime<Utc>,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Re-checks a stored voucher, e.g. after reading it back.
    pub fn validate(&self) -> CoreResult<()> {
        validate_lines(&self.lines)
    }
}

/// Checks the double-entry invariants over a set of voucher lines.
///
/// ## Errors
/// - [`CoreError::InvalidJournalLine`] for fewer than two lines, a line
///   with a negative amount, or a line that is not one-sided
/// - [`CoreError::UnbalancedEntry`] when debits differ from credits
pub fn validate_lines(lines: &[JournalLine]) -> CoreResult<()> {
    if lines.len() < 2 {
        return Err(CoreError::InvalidJournalLine {
            line: lines.len(),
            reason: "a voucher needs at least two lines".to_string(),
        });
    }

    for (index, line) in lines.iter().enumerate() {
        let number = index + 1;
        if line.debit.is_negative() || line.credit.is_negative() {
            return Err(CoreError::InvalidJournalLine {
                line: number,
                reason: "amounts cannot be negative".to_string(),
            });
        }
        if line.debit.is_positive() == line.credit.is_positive() {
            return Err(CoreError::InvalidJournalLine {
                line: number,
                reason: "exactly one of debit or credit must be positive".to_string(),
            });
        }
        if line.account_code.trim().is_empty() {
            return Err(CoreError::InvalidJournalLine {
                line: number,
                reason: "account code is required".to_string(),
            });
        }
    }

    let (debits, credits) = totals(lines);
    if debits != credits {
        return Err(CoreError::UnbalancedEntry { debits, credits });
    }

    Ok(())
}

fn totals(lines: &[JournalLine]) -> (Money, Money) {
    lines.iter().fold((Money::zero(), Money::zero()), |(d, c), line| {
        (d + line.debit, c + line.credit)
    })
}

// =============================================================================
// Voucher Builders
// =============================================================================

/// Inventory received on credit: Dr 1435 Inventario / Cr 2205 Proveedores.
pub fn goods_receipt_entry(amount: Money, reference: Option<&str>) -> NewJournalEntry {
    NewJournalEntry::new("Entrada de mercancía")
        .with_reference(reference)
        .line(JournalLine::debit(INVENTORY_ACCOUNT, amount))
        .line(JournalLine::credit(SUPPLIERS_ACCOUNT, amount))
}

/// Ingredients consumed by a sale: Dr 6135 Costo de ventas / Cr 1435 Inventario.
pub fn cost_of_sales_entry(amount: Money, reference: Option<&str>) -> NewJournalEntry {
    NewJournalEntry::new("Costo de ventas")
        .with_reference(reference)
        .line(JournalLine::debit(COST_OF_SALES_ACCOUNT, amount))
        .line(JournalLine::credit(INVENTORY_ACCOUNT, amount))
}

// =============================================================================
// Trial Balance
// =============================================================================

/// Per-account totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrialBalanceRow {
    pub account_code: String,
    /// Filled in by callers that know the chart of accounts.
    pub account_name: Option<String>,
    pub debits: Money,
    pub credits: Money,
    /// `debits - credits`.
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrialBalance {
    /// Ordered by account code.
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: Money,
    pub total_credits: Money,
    pub is_balanced: bool,
}

/// Builds a trial balance from posted journal lines.
///
/// ## Example
/// ```rust
/// use fogon_core::ledger::{goods_receipt_entry, trial_balance};
/// use fogon_core::Money;
///
/// let entry = goods_receipt_entry(Money::from_cents(612_513), None);
/// let tb = trial_balance(&entry.lines);
/// assert!(tb.is_balanced);
/// assert_eq!(tb.rows[0].account_code, "1435");
/// ```
pub fn trial_balance<'a, I>(lines: I) -> TrialBalance
where
    I: IntoIterator<Item = &'a JournalLine>,
{
    let mut accounts: BTreeMap<&str, (Money, Money)> = BTreeMap::new();
    for line in lines {
        let entry = accounts
            .entry(line.account_code.as_str())
            .or_insert((Money::zero(), Money::zero()));
        entry.0 += line.debit;
        entry.1 += line.credit;
    }

    let rows: Vec<TrialBalanceRow> = accounts
        .into_iter()
        .map(|(code, (debits, credits))| TrialBalanceRow {
            account_code: code.to_string(),
            account_name: None,
            debits,
            credits,
            balance: debits - credits,
        })
        .collect();

    let total_debits: Money = rows.iter().map(|row| row.debits).sum();
    let total_credits: Money = rows.iter().map(|row| row.credits).sum();

    TrialBalance {
        rows,
        total_debits,
        total_credits,
        is_balanced: total_debits == total_credits,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
