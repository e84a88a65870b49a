//! Monthly activity and churn aggregation.
//!
//! Steps:
//!   1. Count transactions per (customer, calendar month).
//!   2. Find each customer's first active month.
//!   3. Cross join each customer with every month from that first month
//!      through the current month.
//!   4. Left-merge the counts onto that skeleton, missing months = 0.
//!   5. Carry the previous month's count forward per customer.
//!   6. Derive the new-active and churn flags.

use crate::{
    transaction_generator::TransactionRecord,
    types::{month_start, CustomerId},
};
use chrono::{Months, NaiveDate};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyActivityCell {
    pub customer_id:            CustomerId,
    pub month:                  NaiveDate,
    pub transaction_count:      u64,
    pub transaction_count_prev: u64,
    pub is_new_active:          bool,
    pub is_churned:             bool,
}

impl MonthlyActivityCell {
    fn new(customer_id: CustomerId, month: NaiveDate, count: u64, prev: u64) -> Self {
        Self {
            customer_id,
            month,
            transaction_count:      count,
            transaction_count_prev: prev,
            is_new_active:          count > 0 && prev == 0,
            is_churned:             count == 0 && prev > 0,
        }
    }
}

/// Months from `first` through `last`, both month starts. Empty if
/// `first` is after `last`.
pub fn month_span(first: NaiveDate, last: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let first = month_start(first);
    let last = month_start(last);
    std::iter::successors(Some(first), move |m| m.checked_add_months(Months::new(1)))
        .take_while(move |m| *m <= last)
}

/// Activity cells plus the transactions that fell after the current month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityTable {
    cells:   Vec<MonthlyActivityCell>,
    dropped: u64,
}

impl ActivityTable {
    pub fn cells(&self) -> &[MonthlyActivityCell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<MonthlyActivityCell> {
        self.cells
    }

    /// Transactions dated after the current month; they have no cell.
    pub fn dropped_transactions(&self) -> u64 {
        self.dropped
    }
}

/// Build the activity table, ordered by (customer, month).
pub fn build_activity(transactions: &[TransactionRecord], today: NaiveDate) -> ActivityTable {
    let current_month = month_start(today);

    // (customer, month) -> count; BTreeMap keeps both keys ordered so the
    // first entry per customer is also their first active month.
    let mut by_month: BTreeMap<(CustomerId, NaiveDate), u64> = BTreeMap::new();
    let mut dropped = 0u64;
    for txn in transactions {
        let month = month_start(txn.timestamp.date());
        if month > current_month {
            log::debug!(
                "activity: customer {} transaction at {} is after {today}",
                txn.customer_id,
                txn.timestamp
            );
            dropped += 1;
            continue;
        }
        *by_month.entry((txn.customer_id, month)).or_insert(0) += 1;
    }
    if dropped > 0 {
        log::warn!(
            "activity: {dropped} transactions fall after the month of {today} and are not in the table"
        );
    }

    let mut first_month: BTreeMap<CustomerId, NaiveDate> = BTreeMap::new();
    for &(customer_id, month) in by_month.keys() {
        first_month.entry(customer_id).or_insert(month);
    }

    let mut cells = Vec::new();
    for (&customer_id, &first) in &first_month {
        let mut prev = 0u64;
        for month in month_span(first, current_month) {
            let count = by_month.get(&(customer_id, month)).copied().unwrap_or(0);
            cells.push(MonthlyActivityCell::new(customer_id, month, count, prev));
            prev = count;
        }
    }

    log::info!(
        "activity: {} customer-months for {} customers",
        cells.len(),
        first_month.len()
    );
    ActivityTable { cells, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, crate::types::DATE_FORMAT).unwrap()
    }

    #[test]
    fn month_span_is_inclusive() {
        let months: Vec<_> = month_span(d("2023-11-20"), d("2024-02-03")).collect();
        assert_eq!(
            months,
            vec![d("2023-11-01"), d("2023-12-01"), d("2024-01-01"), d("2024-02-01")]
        );
    }

    #[test]
    fn month_span_empty_when_reversed() {
        assert_eq!(month_span(d("2024-03-01"), d("2024-02-28")).count(), 0);
    }

    #[test]
    fn flags_follow_counts() {
        let m = d("2024-01-01");
        let fresh = MonthlyActivityCell::new(1, m, 2, 0);
        assert!(fresh.is_new_active && !fresh.is_churned);
        let churned = MonthlyActivityCell::new(1, m, 0, 3);
        assert!(!churned.is_new_active && churned.is_churned);
        let steady = MonthlyActivityCell::new(1, m, 1, 1);
        assert!(!steady.is_new_active && !steady.is_churned);
        let idle = MonthlyActivityCell::new(1, m, 0, 0);
        assert!(!idle.is_new_active && !idle.is_churned);
    }
}
