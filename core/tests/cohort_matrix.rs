//! Cohort transition matrix: skeleton shape, counting rules, and the
//! three-customer walkthrough.

use chrono::{NaiveDate, NaiveDateTime};
use lifecycle_core::{
    cohort::{CohortMatrix, DatePair},
    error::PipelineError,
    lifecycle::{LifecycleRecord, StatusLabel, StatusPair},
    store::{Table, TableStore},
};
use std::collections::HashSet;

// ── Fixture ──────────────────────────────────────────────────────────────────

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn today() -> NaiveDate {
    d("2024-01-15")
}

/// Customer 0 only registers. Customer 1 goes all the way to a deposit.
/// Customer 2 completes the profile and is denied.
fn three_customers() -> Vec<LifecycleRecord> {
    let c0 = LifecycleRecord::registered(0, "Ann Lee", "1 Main St", d("1990-02-03"), ts("2024-01-01 09:00:00"));

    let mut c1 = LifecycleRecord::registered(1, "Bob Ray", "2 Elm St", d("1985-07-12"), ts("2024-01-02 10:00:00"));
    c1.email_confirmed_at   = Some(ts("2024-01-03 08:00:00"));
    c1.profile_completed_at = Some(ts("2024-01-04 12:00:00"));
    c1.approved_at          = Some(ts("2024-01-06 15:30:00"));
    c1.deposited_at         = Some(ts("2024-01-10 11:11:11"));

    let mut c2 = LifecycleRecord::registered(2, "Cy Moss", "3 Oak Ave", d("2001-11-30"), ts("2024-01-03 07:00:00"));
    c2.email_confirmed_at   = Some(ts("2024-01-03 09:00:00"));
    c2.profile_completed_at = Some(ts("2024-01-04 18:00:00"));
    c2.denied_at            = Some(ts("2024-01-05 10:00:00"));

    vec![c0, c1, c2]
}

fn pair(from: StatusLabel, to: StatusLabel) -> StatusPair {
    StatusPair::new(from, to).unwrap()
}

fn cell_counts(matrix: &CohortMatrix, p: StatusPair, from: &str, to: &str) -> (u64, u64) {
    let cell = matrix
        .cell(p, DatePair { from: d(from), to: d(to) })
        .unwrap_or_else(|| panic!("no cell for {from} -> {to}"));
    (cell.population_count, cell.converted_count)
}

// ── Skeleton ─────────────────────────────────────────────────────────────────

#[test]
fn skeleton_is_ten_status_pairs_times_triangular_dates() {
    let matrix = CohortMatrix::build(&three_customers(), today(), None).unwrap();
    let n = 15u64; // 2024-01-01 ..= 2024-01-15
    assert_eq!(matrix.range().day_count(), n);
    assert_eq!(matrix.cell_count(), 10 * n * (n + 1) / 2);
    assert_eq!(matrix.cells().count() as u64, matrix.cell_count());
}

#[test]
fn every_key_is_emitted_once_and_ordered() {
    let matrix = CohortMatrix::build(&three_customers(), today(), None).unwrap();
    let mut seen = HashSet::new();
    for cell in matrix.cells() {
        assert!(cell.dates.from <= cell.dates.to);
        assert!(cell.diff_days() >= 0);
        assert!(
            seen.insert((cell.pair, cell.dates)),
            "duplicate key {:?} {:?}",
            cell.pair,
            cell.dates
        );
    }
}

#[test]
fn converted_never_exceeds_population() {
    let matrix = CohortMatrix::build(&three_customers(), today(), None).unwrap();
    for cell in matrix.cells() {
        assert!(
            cell.converted_count <= cell.population_count,
            "{:?} {:?}: {} > {}",
            cell.pair,
            cell.dates,
            cell.converted_count,
            cell.population_count
        );
    }
}

// ── Counting ─────────────────────────────────────────────────────────────────

#[test]
fn deposit_cell_counts_the_converted_customer() {
    let matrix = CohortMatrix::build(&three_customers(), today(), None).unwrap();
    let reg_dep = pair(StatusLabel::Registered, StatusLabel::Deposited);

    assert_eq!(cell_counts(&matrix, reg_dep, "2024-01-02", "2024-01-10"), (1, 1));
    // Customer 0 is in the population of 01-01 but never deposits.
    assert_eq!(cell_counts(&matrix, reg_dep, "2024-01-01", "2024-01-10"), (1, 0));
    // Population is repeated across every to-date of the from-date.
    assert_eq!(cell_counts(&matrix, reg_dep, "2024-01-02", "2024-01-02"), (1, 0));
}

#[test]
fn analysis_counts_both_approval_and_denial() {
    let matrix = CohortMatrix::build(&three_customers(), today(), None).unwrap();
    let prof_an = pair(StatusLabel::ProfileCompleted, StatusLabel::Analyzed);

    assert_eq!(cell_counts(&matrix, prof_an, "2024-01-04", "2024-01-05"), (2, 1));
    assert_eq!(cell_counts(&matrix, prof_an, "2024-01-04", "2024-01-06"), (2, 1));
    assert_eq!(cell_counts(&matrix, prof_an, "2024-01-04", "2024-01-07"), (2, 0));

    let an_dep = pair(StatusLabel::Analyzed, StatusLabel::Deposited);
    assert_eq!(cell_counts(&matrix, an_dep, "2024-01-06", "2024-01-10"), (1, 1));
    assert_eq!(cell_counts(&matrix, an_dep, "2024-01-05", "2024-01-10"), (1, 0));
}

#[test]
fn same_day_transitions_land_on_the_diagonal() {
    let matrix = CohortMatrix::build(&three_customers(), today(), None).unwrap();
    let reg_email = pair(StatusLabel::Registered, StatusLabel::EmailConfirmed);
    assert_eq!(cell_counts(&matrix, reg_email, "2024-01-03", "2024-01-03"), (1, 1));

    let total: u64 = matrix
        .cells()
        .filter(|c| c.pair == reg_email)
        .map(|c| c.converted_count)
        .sum();
    assert_eq!(total, 2, "two customers confirmed their email");
}

#[test]
fn empty_days_are_zero_filled() {
    let matrix = CohortMatrix::build(&three_customers(), today(), None).unwrap();
    let reg_email = pair(StatusLabel::Registered, StatusLabel::EmailConfirmed);
    assert_eq!(cell_counts(&matrix, reg_email, "2024-01-12", "2024-01-15"), (0, 0));
}

#[test]
fn observations_after_today_are_dropped() {
    let mut records = three_customers();
    records[1].deposited_at = Some(ts("2024-02-01 00:00:00"));
    let matrix = CohortMatrix::build(&records, today(), None).unwrap();
    assert!(matrix.dropped_observations() > 0);
    assert_eq!(matrix.range().end(), Some(today()));

    let reg_dep = pair(StatusLabel::Registered, StatusLabel::Deposited);
    let deposits: u64 = matrix
        .cells()
        .filter(|c| c.pair == reg_dep)
        .map(|c| c.converted_count)
        .sum();
    assert_eq!(deposits, 0);
}

#[test]
fn range_longer_than_the_limit_is_rejected() {
    let err = CohortMatrix::build(&three_customers(), today(), Some(10)).unwrap_err();
    match err {
        PipelineError::CohortRangeTooLarge { days, limit } => {
            assert_eq!(days, 15);
            assert_eq!(limit, 10);
        }
        other => panic!("expected CohortRangeTooLarge, got {other}"),
    }
    assert!(CohortMatrix::build(&three_customers(), today(), Some(15)).is_ok());
}

// ── Output ───────────────────────────────────────────────────────────────────

#[test]
fn cohort_file_is_byte_identical_across_runs() {
    let records = three_customers();
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        let store = TableStore::open(dir.path()).unwrap();
        let matrix = CohortMatrix::build(&records, today(), None).unwrap();
        let rows = store.write_cohort(&matrix).unwrap();
        assert_eq!(rows, 1200);
        outputs.push(std::fs::read(store.path(Table::Cohort)).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn cohort_file_has_expected_columns_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::open(dir.path()).unwrap();
    let matrix = CohortMatrix::build(&three_customers(), today(), None).unwrap();
    store.write_cohort(&matrix).unwrap();

    let mut reader = csv::Reader::from_path(store.path(Table::Cohort)).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        [
            "status_datetime_from",
            "status_datetime_to",
            "datetime_diff_days",
            "status_from",
            "status_to",
            "status_from_count",
            "status_to_count",
        ]
    );

    let hit = reader
        .records()
        .map(|r| r.unwrap())
        .find(|r| {
            &r[0] == "2024-01-02"
                && &r[1] == "2024-01-10"
                && &r[3] == StatusLabel::Registered.label()
                && &r[4] == StatusLabel::Deposited.label()
        })
        .expect("registration to deposit row present");
    assert_eq!(&hit[2], "8");
    assert_eq!(&hit[5], "1");
    assert_eq!(&hit[6], "1");
}

#[test]
fn empty_customer_base_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::open(dir.path()).unwrap();
    let matrix = CohortMatrix::build(&[], today(), None).unwrap();
    assert_eq!(store.write_cohort(&matrix).unwrap(), 0);

    let text = std::fs::read_to_string(store.path(Table::Cohort)).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("status_datetime_from,"));
}
