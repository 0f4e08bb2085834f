//! End-of-shift cash reconciliation.
//!
//! The salesman counts the cash drawer by denomination and declares what
//! came in over UPI and card. That is compared with what the shift should
//! have produced: fuel sold plus customer receipts, minus fuel handed out
//! on credit, minus expenses paid from the drawer.

use serde::{Deserialize, Serialize};

use super::round2;
use crate::dtos::lenient;

/// Face values in the order the counting sheet lists them.
pub const DENOMINATIONS: [u32; 11] = [2000, 1000, 500, 200, 100, 50, 20, 10, 5, 2, 1];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenominationCounts {
    #[serde(default, deserialize_with = "lenient::count")]
    pub notes_2000: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub notes_1000: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub notes_500: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub notes_200: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub notes_100: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub notes_50: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub notes_20: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub notes_10: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub coins_5: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub coins_2: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub coins_1: u32,
}

impl DenominationCounts {
    /// (face value, count) pairs, highest note first.
    pub fn pairs(&self) -> [(u32, u32); 11] {
        [
            (2000, self.notes_2000),
            (1000, self.notes_1000),
            (500, self.notes_500),
            (200, self.notes_200),
            (100, self.notes_100),
            (50, self.notes_50),
            (20, self.notes_20),
            (10, self.notes_10),
            (5, self.coins_5),
            (2, self.coins_2),
            (1, self.coins_1),
        ]
    }

    /// Builds counts from (face value, count) pairs. Unknown face values are ignored
    /// and repeated ones accumulate.
    #[cfg(test)]
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut counts = Self::default();
        for (value, count) in pairs {
            let slot = match value {
                2000 => &mut counts.notes_2000,
                1000 => &mut counts.notes_1000,
                500 => &mut counts.notes_500,
                200 => &mut counts.notes_200,
                100 => &mut counts.notes_100,
                50 => &mut counts.notes_50,
                20 => &mut counts.notes_20,
                10 => &mut counts.notes_10,
                5 => &mut counts.coins_5,
                2 => &mut counts.coins_2,
                1 => &mut counts.coins_1,
                _ => continue,
            };
            *slot = slot.saturating_add(count);
        }
        counts
    }

    /// Physical cash in the drawer, in whole rupees.
    pub fn cash_in_hand(&self) -> u64 {
        self.pairs()
            .iter()
            .map(|&(value, count)| value as u64 * count as u64)
            .sum()
    }
}

/// Totals the server derives from the shift's own records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemTotals {
    pub fuel_sales: f64,
    pub customer_receipt: f64,
    pub credit: f64,
    pub expenses: f64,
}

impl SystemTotals {
    pub fn expected_cash(&self) -> f64 {
        round2(self.fuel_sales + self.customer_receipt - self.credit)
    }
}

/// What the salesman declares at the end of the shift.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollectedAmounts {
    pub upi_received: f64,
    pub card_received: f64,
    pub denominations: DenominationCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashPosition {
    Balanced,
    Excess,
    Shortage,
}

impl CashPosition {
    pub fn from_balance(balance_amount: f64) -> Self {
        let paise = (balance_amount * 100.0).round() as i64;
        match paise {
            0 => CashPosition::Balanced,
            p if p > 0 => CashPosition::Excess,
            _ => CashPosition::Shortage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingSummary {
    pub cash_in_hand: f64,
    pub total_received: f64,
    pub expected_cash: f64,
    pub expenses: f64,
    pub balance_amount: f64,
    pub cash_position: CashPosition,
}

/// balance = (cash + UPI + card) - (fuel sales + receipts - credit) - expenses.
/// Zero means the drawer matches; positive is excess cash, negative a shortage.
pub fn reconcile(system: &SystemTotals, collected: &CollectedAmounts) -> AccountingSummary {
    let cash_in_hand = collected.denominations.cash_in_hand() as f64;
    let total_received = round2(cash_in_hand + collected.upi_received + collected.card_received);
    let expected_cash = system.expected_cash();
    let expenses = round2(system.expenses);
    let balance_amount = round2(total_received - expected_cash - expenses);

    AccountingSummary {
        cash_in_hand,
        total_received,
        expected_cash,
        expenses,
        balance_amount,
        cash_position: CashPosition::from_balance(balance_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collected(upi: f64, card: f64, pairs: &[(u32, u32)]) -> CollectedAmounts {
        CollectedAmounts {
            upi_received: upi,
            card_received: card,
            denominations: DenominationCounts::from_pairs(pairs.iter().copied()),
        }
    }

    #[test]
    fn counting_sheet_example() {
        let system = SystemTotals {
            fuel_sales: 1400.0,
            customer_receipt: 0.0,
            credit: 0.0,
            expenses: 50.0,
        };
        let summary = reconcile(&system, &collected(200.0, 0.0, &[(500, 2), (100, 3), (10, 1)]));

        assert_eq!(summary.cash_in_hand, 1310.0);
        assert_eq!(summary.total_received, 1510.0);
        assert_eq!(summary.expected_cash, 1400.0);
        assert_eq!(summary.balance_amount, 60.0);
        assert_eq!(summary.cash_position, CashPosition::Excess);
    }

    #[test]
    fn cash_in_hand_covers_every_denomination() {
        let all_ones = DenominationCounts::from_pairs(DENOMINATIONS.iter().map(|&v| (v, 1)));
        assert_eq!(all_ones.cash_in_hand(), 3888);

        let pairs = all_ones.pairs();
        let values: Vec<u32> = pairs.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, DENOMINATIONS.to_vec());
    }

    #[test]
    fn cash_in_hand_is_sum_of_count_times_value() {
        let pairs = [(2000, 3), (200, 7), (50, 11), (5, 9), (2, 4), (1, 13)];
        let counts = DenominationCounts::from_pairs(pairs);
        let expected: u64 = pairs.iter().map(|(v, c)| *v as u64 * *c as u64).sum();
        assert_eq!(counts.cash_in_hand(), expected);
    }

    #[test]
    fn large_counts_do_not_overflow() {
        let counts = DenominationCounts {
            notes_2000: u32::MAX,
            ..Default::default()
        };
        assert_eq!(counts.cash_in_hand(), 2000 * u32::MAX as u64);
    }

    #[test]
    fn expected_cash_subtracts_credit() {
        let system = SystemTotals {
            fuel_sales: 10_000.0,
            customer_receipt: 1_500.0,
            credit: 2_500.0,
            expenses: 0.0,
        };
        assert_eq!(system.expected_cash(), 9_000.0);
    }

    #[test]
    fn exact_match_is_balanced() {
        let system = SystemTotals {
            fuel_sales: 5_000.0,
            customer_receipt: 500.0,
            credit: 1_000.0,
            expenses: 120.0,
        };
        // expected cash 4500, expenses 120: the drawer must show 4620
        let summary = reconcile(&system, &collected(800.0, 380.0, &[(500, 6), (100, 2)]));
        assert_eq!(summary.total_received, 4380.0);
        assert_eq!(summary.balance_amount, -240.0);
        assert_eq!(summary.cash_position, CashPosition::Shortage);

        let summary = reconcile(&system, &collected(800.0, 500.0, &[(500, 6), (100, 2)]));
        assert_eq!(summary.total_received, 4500.0);
        assert_eq!(summary.balance_amount, -120.0);

        let summary = reconcile(&system, &collected(920.0, 500.0, &[(500, 6), (100, 2)]));
        assert_eq!(summary.balance_amount, 0.0);
        assert_eq!(summary.cash_position, CashPosition::Balanced);
    }

    #[test]
    fn shortage_is_negative_balance() {
        let system = SystemTotals {
            fuel_sales: 2_000.0,
            ..Default::default()
        };
        let summary = reconcile(&system, &collected(0.0, 0.0, &[(500, 3)]));
        assert_eq!(summary.balance_amount, -500.0);
        assert_eq!(summary.cash_position, CashPosition::Shortage);
    }

    #[test]
    fn all_zero_inputs_leave_minus_expected_cash() {
        let system = SystemTotals {
            fuel_sales: 3_250.5,
            customer_receipt: 100.0,
            credit: 50.0,
            expenses: 0.0,
        };
        let summary = reconcile(&system, &CollectedAmounts::default());
        assert_eq!(summary.cash_in_hand, 0.0);
        assert_eq!(summary.total_received, 0.0);
        assert_eq!(summary.balance_amount, -3_300.5);
    }

    #[test]
    fn reconcile_is_pure() {
        let system = SystemTotals {
            fuel_sales: 987.65,
            customer_receipt: 12.35,
            credit: 100.0,
            expenses: 33.3,
        };
        let input = collected(10.1, 20.2, &[(100, 8), (20, 3), (1, 7)]);
        assert_eq!(reconcile(&system, &input), reconcile(&system, &input));
    }

    #[test]
    fn paise_rounding_keeps_balanced_results_exact() {
        let system = SystemTotals {
            fuel_sales: 0.1 + 0.2,
            customer_receipt: 0.0,
            credit: 0.0,
            expenses: 0.0,
        };
        let summary = reconcile(&system, &collected(0.3, 0.0, &[]));
        assert_eq!(summary.balance_amount, 0.0);
        assert_eq!(summary.cash_position, CashPosition::Balanced);
    }

    #[test]
    fn blank_denomination_fields_deserialize_as_zero() {
        let counts: DenominationCounts = serde_json::from_str(
            r#"{"notes500": "2", "notes100": 3, "notes10": "1", "coins5": "", "coins1": null}"#,
        )
        .unwrap();
        assert_eq!(counts.notes_500, 2);
        assert_eq!(counts.coins_5, 0);
        assert_eq!(counts.notes_2000, 0);
        assert_eq!(counts.cash_in_hand(), 1310);
    }
}
