//! Integer money arithmetic for revenue splits and payout staggering.
//!
//! All amounts are whole currency units in `i64`. Percentages are integer
//! percent values (50 = 50%). Rounding is half-up throughout so that a
//! participant never loses a unit to truncation; the platform share is
//! computed as a remainder and absorbs whatever rounding leaves over.

use chrono::{Datelike, Months, NaiveDate};

/// `amount * pct / 100` rounded half-up.
#[must_use]
pub fn pct_of(amount: i64, pct: i64) -> i64 {
    (amount * pct + 50) / 100
}

/// Split `total` into three monthly installments that sum back exactly.
///
/// The first two months get the half-up-rounded third; the final month gets
/// the remainder, so the three always reconcile to `total`.
#[must_use]
pub fn stagger_three_months(total: i64) -> [i64; 3] {
    let monthly = (total * 2 + 3) / 6;
    [monthly, monthly, total - 2 * monthly]
}

/// The payout date for installment `month_number` (1-based), anchored at
/// `start`: `month_number` months after the start month, on `day_of_month`,
/// clamped to the last day of that month.
#[must_use]
pub fn payout_date(start: NaiveDate, month_number: u32, day_of_month: u32) -> NaiveDate {
    let shifted = start + Months::new(month_number);
    let (year, month) = (shifted.year(), shifted.month());
    let last = days_in_month(year, month);
    NaiveDate::from_ymd_opt(year, month, day_of_month.min(last))
        .unwrap_or(shifted)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match next {
        Some(first_of_next) => first_of_next.pred_opt().map(|d| d.day()).unwrap_or(28),
        None => 28,
    }
}
