//! Customer credit ledger: bills raise what the customer owes, payments lower it.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::round2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryKind {
    Bill,
    Payment,
}

/// One movement on the customer's account, as loaded from bills or payments.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerMovement {
    pub id: Uuid,
    pub kind: LedgerEntryKind,
    pub entry_date: NaiveDate,
    pub reference: Option<String>,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLine {
    pub id: Uuid,
    pub kind: LedgerEntryKind,
    pub entry_date: NaiveDate,
    pub reference: Option<String>,
    pub debit: f64,
    pub credit: f64,
    pub running_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub opening_balance: f64,
    pub total_debit: f64,
    pub total_credit: f64,
    pub closing_balance: f64,
    pub lines: Vec<LedgerLine>,
}

/// Builds the ledger for a window. `opening_balance` must already include
/// everything that happened before the window; movements are expected in
/// date order.
pub fn build_ledger(opening_balance: f64, movements: &[LedgerMovement]) -> Ledger {
    let mut balance = round2(opening_balance);
    let mut total_debit = 0.0;
    let mut total_credit = 0.0;

    let lines = movements
        .iter()
        .map(|m| {
            let (debit, credit) = match m.kind {
                LedgerEntryKind::Bill => (m.amount, 0.0),
                LedgerEntryKind::Payment => (0.0, m.amount),
            };
            total_debit += debit;
            total_credit += credit;
            balance = round2(balance + debit - credit);
            LedgerLine {
                id: m.id,
                kind: m.kind,
                entry_date: m.entry_date,
                reference: m.reference.clone(),
                debit,
                credit,
                running_balance: balance,
            }
        })
        .collect();

    Ledger {
        opening_balance: round2(opening_balance),
        total_debit: round2(total_debit),
        total_credit: round2(total_credit),
        closing_balance: balance,
        lines,
    }
}

pub fn outstanding(opening_balance: f64, total_billed: f64, total_paid: f64) -> f64 {
    round2(opening_balance + total_billed - total_paid)
}

/// A credit limit of zero means the customer has no limit configured.
pub fn within_credit_limit(credit_limit: f64, outstanding: f64, new_bill_amount: f64) -> bool {
    if credit_limit <= 0.0 {
        return true;
    }
    round2(outstanding + new_bill_amount) <= round2(credit_limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(kind: LedgerEntryKind, day: u32, amount: f64) -> LedgerMovement {
        LedgerMovement {
            id: Uuid::new_v4(),
            kind,
            entry_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            reference: None,
            amount,
        }
    }

    #[test]
    fn running_balance_follows_bills_and_payments() {
        let movements = vec![
            movement(LedgerEntryKind::Bill, 1, 1_000.0),
            movement(LedgerEntryKind::Bill, 2, 2_500.5),
            movement(LedgerEntryKind::Payment, 3, 3_000.0),
        ];
        let ledger = build_ledger(500.0, &movements);

        let balances: Vec<f64> = ledger.lines.iter().map(|l| l.running_balance).collect();
        assert_eq!(balances, vec![1_500.0, 4_000.5, 1_000.5]);
        assert_eq!(ledger.total_debit, 3_500.5);
        assert_eq!(ledger.total_credit, 3_000.0);
        assert_eq!(ledger.closing_balance, 1_000.5);
        assert_eq!(ledger.lines[2].debit, 0.0);
        assert_eq!(ledger.lines[2].credit, 3_000.0);
    }

    #[test]
    fn empty_window_closes_at_opening() {
        let ledger = build_ledger(-250.0, &[]);
        assert_eq!(ledger.closing_balance, -250.0);
        assert!(ledger.lines.is_empty());
    }

    #[test]
    fn outstanding_nets_payments_against_bills() {
        assert_eq!(outstanding(100.0, 900.0, 400.0), 600.0);
    }

    #[test]
    fn credit_limit_is_inclusive() {
        assert!(within_credit_limit(10_000.0, 9_000.0, 1_000.0));
        assert!(!within_credit_limit(10_000.0, 9_000.0, 1_000.01));
    }

    #[test]
    fn zero_limit_means_unlimited() {
        assert!(within_credit_limit(0.0, 1_000_000.0, 50_000.0));
    }
}
