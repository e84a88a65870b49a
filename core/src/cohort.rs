//! Cohort aggregation engine: the status-transition matrix.
//!
//! For every StatusPair (from, to) and every DatePair (d1, d2) with
//! d1 <= d2 inside the run's date range, a cell reports:
//!   - population_count: customers who reached `from` on d1
//!   - converted_count:  those of them who reached `to` on d2
//!
//! The key space (the skeleton) is the cross join
//!   StatusPair (10) × DatePair (n(n+1)/2 for n days)
//! and every key is emitted, zero-filled where nothing was observed.
//!
//! COST: the skeleton is quadratic in the number of days. It is never
//! materialized; cells() walks it lazily and looks up the sparse counts.
//! Callers can read the range size from DateRange before building and
//! bound it with `max_days`.

use crate::{
    error::{PipelineError, PipelineResult},
    lifecycle::{LifecycleRecord, StatusPair},
    types::to_date,
};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

// ── Date dimension ───────────────────────────────────────────────────────────

/// Closed range of calendar days, possibly empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    bounds: Option<(NaiveDate, NaiveDate)>,
}

impl DateRange {
    /// [start, end]; empty when start > end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { bounds: (start <= end).then_some((start, end)) }
    }

    pub fn empty() -> Self {
        Self { bounds: None }
    }

    /// [earliest registration date, today]. Empty for an empty dataset.
    pub fn from_records(records: &[LifecycleRecord], today: NaiveDate) -> Self {
        records
            .iter()
            .map(|r| to_date(r.registered_at))
            .min()
            .map(|start| Self::new(start, today))
            .unwrap_or_else(Self::empty)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.bounds.map(|(_, e)| e)
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        matches!(self.bounds, Some((s, e)) if s <= date && date <= e)
    }

    /// Number of days n in the range.
    pub fn day_count(&self) -> u64 {
        match self.bounds {
            Some((s, e)) => (e - s).num_days() as u64 + 1,
            None => 0,
        }
    }

    /// n(n+1)/2: the number of feasible (d1 <= d2) pairs.
    pub fn date_pair_count(&self) -> u64 {
        let n = self.day_count();
        n * (n + 1) / 2
    }

    /// Every feasible date pair, ordered by (from, to), produced lazily.
    pub fn date_pairs(&self) -> DatePairs {
        DatePairs {
            end:       self.end(),
            next:      self.bounds.map(|(s, _)| (s, s)),
            remaining: self.date_pair_count(),
        }
    }
}

/// An ordered (from, to) pair of dates with from <= to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatePair {
    pub from: NaiveDate,
    pub to:   NaiveDate,
}

impl DatePair {
    pub fn diff_days(&self) -> i64 {
        (self.to - self.from).num_days()
    }
}

/// Lazy cross join of a DateRange with itself, filtered on from <= to.
pub struct DatePairs {
    end:       Option<NaiveDate>,
    next:      Option<(NaiveDate, NaiveDate)>,
    remaining: u64,
}

impl Iterator for DatePairs {
    type Item = DatePair;

    fn next(&mut self) -> Option<DatePair> {
        let (from, to) = self.next?;
        let end = self.end?;
        self.next = if to < end {
            Some((from, to + Duration::days(1)))
        } else if from < end {
            let next_from = from + Duration::days(1);
            Some((next_from, next_from))
        } else {
            None
        };
        self.remaining = self.remaining.saturating_sub(1);
        Some(DatePair { from, to })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (n, Some(n))
    }
}

impl ExactSizeIterator for DatePairs {}

// ── Cells ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CohortCell {
    pub pair:             StatusPair,
    pub dates:            DatePair,
    pub population_count: u64,
    pub converted_count:  u64,
}

impl CohortCell {
    pub fn diff_days(&self) -> i64 {
        self.dates.diff_days()
    }
}

/// Sparse observed counts for one status pair.
#[derive(Debug, Default)]
struct PairCounts {
    population: BTreeMap<NaiveDate, u64>,
    converted:  BTreeMap<(NaiveDate, NaiveDate), u64>,
}

impl PairCounts {
    /// Scan every record once for this pair. Returns the counts and the
    /// number of observations that fall outside `range`.
    fn scan(records: &[LifecycleRecord], pair: StatusPair, range: &DateRange) -> (Self, u64) {
        let mut counts = Self::default();
        let mut dropped = 0u64;
        for record in records {
            let Some(from_at) = record.timestamp(pair.from) else {
                continue;
            };
            let from = to_date(from_at);
            if !range.contains(from) {
                dropped += 1;
                continue;
            }
            *counts.population.entry(from).or_insert(0) += 1;

            if let Some(to_at) = record.timestamp(pair.to) {
                let to = to_date(to_at);
                if range.contains(to) {
                    *counts.converted.entry((from, to)).or_insert(0) += 1;
                } else {
                    dropped += 1;
                }
            }
        }
        (counts, dropped)
    }
}

/// The full transition matrix over one dataset.
#[derive(Debug)]
pub struct CohortMatrix {
    range:   DateRange,
    pairs:   Vec<(StatusPair, PairCounts)>,
    dropped: u64,
}

impl CohortMatrix {
    /// Count every status pair over `records`.
    ///
    /// Fails with CohortRangeTooLarge before scanning if the date range
    /// is longer than `max_days`.
    pub fn build(
        records: &[LifecycleRecord],
        today: NaiveDate,
        max_days: Option<u64>,
    ) -> PipelineResult<Self> {
        let range = DateRange::from_records(records, today);
        if let Some(limit) = max_days {
            if range.day_count() > limit {
                return Err(PipelineError::CohortRangeTooLarge {
                    days: range.day_count(),
                    limit,
                });
            }
        }

        let mut dropped = 0u64;
        let pairs = StatusPair::all()
            .into_iter()
            .map(|pair| {
                let (counts, out_of_range) = PairCounts::scan(records, pair, &range);
                dropped += out_of_range;
                (pair, counts)
            })
            .collect();

        let matrix = Self { range, pairs, dropped };
        if dropped > 0 {
            log::warn!(
                "cohort: {dropped} observations fall after {today} and are not in the matrix"
            );
        }
        log::debug!(
            "cohort: {} days, {} date pairs, {} cells",
            range.day_count(),
            range.date_pair_count(),
            matrix.cell_count()
        );
        Ok(matrix)
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    /// |StatusPair| × |DatePair|.
    pub fn cell_count(&self) -> u64 {
        self.pairs.len() as u64 * self.range.date_pair_count()
    }

    /// Observations that fell outside the date range.
    pub fn dropped_observations(&self) -> u64 {
        self.dropped
    }

    /// Every cell of the skeleton in (status pair, from, to) order,
    /// with observed counts merged in and zeros elsewhere.
    pub fn cells(&self) -> impl Iterator<Item = CohortCell> + '_ {
        let range = self.range;
        self.pairs.iter().flat_map(move |(pair, counts)| {
            range.date_pairs().map(move |dates| CohortCell {
                pair:             *pair,
                dates,
                population_count: counts.population.get(&dates.from).copied().unwrap_or(0),
                converted_count:  counts
                    .converted
                    .get(&(dates.from, dates.to))
                    .copied()
                    .unwrap_or(0),
            })
        })
    }

    /// Look up one cell; None if the key is outside the skeleton.
    pub fn cell(&self, pair: StatusPair, dates: DatePair) -> Option<CohortCell> {
        if dates.from > dates.to || !self.range.contains(dates.from) || !self.range.contains(dates.to) {
            return None;
        }
        let (_, counts) = self.pairs.iter().find(|(p, _)| *p == pair)?;
        Some(CohortCell {
            pair,
            dates,
            population_count: counts.population.get(&dates.from).copied().unwrap_or(0),
            converted_count:  counts.converted.get(&(dates.from, dates.to)).copied().unwrap_or(0),
        })
    }
}
