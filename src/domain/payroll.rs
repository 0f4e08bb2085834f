//! Salary ledger for a pay period.
//!
//! Monthly salaries accrue day by day (base / days in that calendar month),
//! daily wages accrue the base per day. Approved absences deduct a full or
//! half day's accrual.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::round2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "salary_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalaryType {
    Monthly,
    Daily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "absence_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceType {
    FullDay,
    HalfDay,
}

impl AbsenceType {
    fn fraction(self) -> f64 {
        match self {
            AbsenceType::FullDay => 1.0,
            AbsenceType::HalfDay => 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalaryTerms {
    pub salary_type: SalaryType,
    pub base_salary: f64,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

/// Whether two effective windows share a day. An open end runs forever.
pub fn windows_overlap(
    a_from: NaiveDate,
    a_to: Option<NaiveDate>,
    b_from: NaiveDate,
    b_to: Option<NaiveDate>,
) -> bool {
    a_from <= b_to.unwrap_or(NaiveDate::MAX) && b_from <= a_to.unwrap_or(NaiveDate::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Absence {
    pub date: NaiveDate,
    pub absence_type: AbsenceType,
    pub approved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollLine {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub payable_days: f64,
    pub absent_days: f64,
    pub gross_salary: f64,
    pub deductions: f64,
    pub net_salary: f64,
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (next, NaiveDate::from_ymd_opt(year, month, 1)) {
        (Some(next), Some(first)) => (next - first).num_days() as u32,
        _ => 30,
    }
}

fn daily_accrual(terms: &SalaryTerms, day: NaiveDate) -> f64 {
    match terms.salary_type {
        SalaryType::Monthly => terms.base_salary / days_in_month(day) as f64,
        SalaryType::Daily => terms.base_salary,
    }
}

/// Computes pay for `[from, to]` clipped to the terms' effective window.
/// Returns `None` when the window and the period do not overlap.
pub fn compute_payroll(
    terms: &SalaryTerms,
    from: NaiveDate,
    to: NaiveDate,
    absences: &[Absence],
) -> Option<PayrollLine> {
    let start = from.max(terms.effective_from);
    let end = match terms.effective_to {
        Some(effective_to) => to.min(effective_to),
        None => to,
    };
    if start > end {
        return None;
    }

    let mut gross = 0.0;
    let mut days = 0.0;
    for day in start.iter_days().take_while(|d| *d <= end) {
        gross += daily_accrual(terms, day);
        days += 1.0;
    }

    let mut deductions = 0.0;
    let mut absent_days = 0.0;
    for absence in absences
        .iter()
        .filter(|a| a.approved && a.date >= start && a.date <= end)
    {
        let fraction = absence.absence_type.fraction();
        deductions += daily_accrual(terms, absence.date) * fraction;
        absent_days += fraction;
    }

    let gross_salary = round2(gross);
    let deductions = round2(deductions);
    Some(PayrollLine {
        period_start: start,
        period_end: end,
        payable_days: days - absent_days,
        absent_days,
        gross_salary,
        deductions,
        net_salary: round2(gross_salary - deductions),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(base: f64) -> SalaryTerms {
        SalaryTerms {
            salary_type: SalaryType::Monthly,
            base_salary: base,
            effective_from: date(2024, 1, 1),
            effective_to: None,
        }
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(date(2024, 2, 10)), 29);
        assert_eq!(days_in_month(date(2023, 2, 10)), 28);
        assert_eq!(days_in_month(date(2024, 12, 31)), 31);
        assert_eq!(days_in_month(date(2024, 4, 1)), 30);
    }

    #[test]
    fn full_month_pays_base_salary() {
        let line = compute_payroll(&monthly(15_000.0), date(2024, 4, 1), date(2024, 4, 30), &[]).unwrap();
        assert_eq!(line.gross_salary, 15_000.0);
        assert_eq!(line.net_salary, 15_000.0);
        assert_eq!(line.payable_days, 30.0);
    }

    #[test]
    fn approved_absences_deduct_day_rate() {
        let absences = [
            Absence { date: date(2024, 4, 3), absence_type: AbsenceType::FullDay, approved: true },
            Absence { date: date(2024, 4, 4), absence_type: AbsenceType::HalfDay, approved: true },
            Absence { date: date(2024, 4, 5), absence_type: AbsenceType::FullDay, approved: false },
        ];
        let line = compute_payroll(&monthly(15_000.0), date(2024, 4, 1), date(2024, 4, 30), &absences).unwrap();
        assert_eq!(line.absent_days, 1.5);
        assert_eq!(line.deductions, 750.0);
        assert_eq!(line.net_salary, 14_250.0);
        assert_eq!(line.payable_days, 28.5);
    }

    #[test]
    fn daily_wage_accrues_per_day() {
        let terms = SalaryTerms {
            salary_type: SalaryType::Daily,
            base_salary: 600.0,
            effective_from: date(2024, 1, 1),
            effective_to: None,
        };
        let line = compute_payroll(&terms, date(2024, 5, 1), date(2024, 5, 10), &[]).unwrap();
        assert_eq!(line.gross_salary, 6_000.0);
    }

    #[test]
    fn period_is_clipped_to_effective_window() {
        let terms = SalaryTerms {
            effective_from: date(2024, 4, 16),
            ..monthly(30_000.0)
        };
        let line = compute_payroll(&terms, date(2024, 4, 1), date(2024, 4, 30), &[]).unwrap();
        assert_eq!(line.period_start, date(2024, 4, 16));
        assert_eq!(line.gross_salary, 15_000.0);
    }

    #[test]
    fn no_overlap_yields_nothing() {
        let terms = SalaryTerms {
            effective_to: Some(date(2024, 3, 31)),
            ..monthly(30_000.0)
        };
        assert!(compute_payroll(&terms, date(2024, 4, 1), date(2024, 4, 30), &[]).is_none());
    }

    #[test]
    fn period_spanning_months_uses_each_month_rate() {
        // each full calendar month pays the base once, whatever its length
        let line = compute_payroll(&monthly(31_000.0), date(2024, 1, 1), date(2024, 2, 29), &[]).unwrap();
        assert_eq!(line.gross_salary, 62_000.0);
    }

    #[test]
    fn effective_windows_overlap_on_shared_days() {
        let (mar, apr, may) = (date(2024, 3, 1), date(2024, 4, 1), date(2024, 5, 1));
        assert!(windows_overlap(mar, None, apr, None));
        assert!(windows_overlap(mar, Some(apr), apr, Some(may)));
        assert!(windows_overlap(apr, Some(apr), mar, None));
        assert!(!windows_overlap(mar, Some(date(2024, 3, 31)), apr, None));
        assert!(!windows_overlap(may, None, mar, Some(date(2024, 4, 30))));
    }
}
