//! Flat-file persistence layer.
//!
//! RULE: Only the store reads or writes tables.
//! Stages hand typed rows to the store and get typed rows back;
//! they never touch CSV or file paths directly.
//!
//! Readers fail on the first bad row and report the table, the 1-based
//! data row, the column and the offending value.

use crate::{
    error::{PipelineError, PipelineResult},
    types::{DATETIME_FORMAT, DATE_FORMAT},
};
use chrono::{NaiveDate, NaiveDateTime};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

mod activity;
mod cohort;
mod customer;
mod funnel;
mod transaction;

/// Every table the pipeline reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Customers,
    Cohort,
    Funnel,
    Transactions,
    Activity,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Self::Customers    => "customer base",
            Self::Cohort       => "cohort",
            Self::Funnel       => "acquisition funnel",
            Self::Transactions => "transactions",
            Self::Activity     => "activity",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Customers    => "customer_datasource.csv",
            Self::Cohort       => "customer_datasource_cohort.csv",
            Self::Funnel       => "customer_datasource_acquisition_funnel.csv",
            Self::Transactions => "customer_transactions.csv",
            Self::Activity     => "customer_activity.csv",
        }
    }
}

/// A directory holding one CSV file per table.
#[derive(Debug, Clone)]
pub struct TableStore {
    dir: PathBuf,
}

impl TableStore {
    /// Open (or create) the output directory.
    pub fn open(dir: impl Into<PathBuf>) -> PipelineResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }

    fn reader(&self, table: Table) -> PipelineResult<csv::Reader<BufReader<File>>> {
        let path = self.path(table);
        let file = File::open(&path).map_err(|e| PipelineError::io(&path, e))?;
        Ok(csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(BufReader::new(file)))
    }

    fn writer(&self, table: Table) -> PipelineResult<csv::Writer<BufWriter<File>>> {
        let path = self.path(table);
        let file = File::create(&path).map_err(|e| PipelineError::io(&path, e))?;
        Ok(csv::Writer::from_writer(BufWriter::new(file)))
    }

    /// Flush a finished table. csv emits the header lazily with the first
    /// record, so an empty table gets `headers` written explicitly.
    fn finish(
        &self,
        table: Table,
        mut writer: csv::Writer<BufWriter<File>>,
        rows: u64,
        headers: &[&str],
    ) -> PipelineResult<()> {
        if rows == 0 {
            writer.write_record(headers).map_err(self.csv_err(table))?;
        }
        writer.flush().map_err(|e| PipelineError::io(self.path(table), e))
    }

    fn csv_err(&self, table: Table) -> impl Fn(csv::Error) -> PipelineError + '_ {
        move |e| PipelineError::csv(self.path(table), e)
    }
}

// ── Field codecs ─────────────────────────────────────────────────────────────

/// Identifies a field for error reporting.
#[derive(Debug, Clone, Copy)]
struct FieldRef {
    table:  Table,
    row:    usize,
    column: &'static str,
}

impl FieldRef {
    fn new(table: Table, row: usize, column: &'static str) -> Self {
        Self { table, row, column }
    }

    fn error(self, value: &str) -> PipelineError {
        PipelineError::Parse {
            table:  self.table.name(),
            row:    self.row,
            column: self.column,
            value:  value.to_string(),
        }
    }
}

fn parse_u64(field: FieldRef, value: &str) -> PipelineResult<u64> {
    value.trim().parse().map_err(|_| field.error(value))
}

fn parse_date(field: FieldRef, value: &str) -> PipelineResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| field.error(value))
}

fn parse_datetime(field: FieldRef, value: &str) -> PipelineResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), DATETIME_FORMAT).map_err(|_| field.error(value))
}

/// Empty cell means "not reached".
fn parse_opt_datetime(field: FieldRef, value: &str) -> PipelineResult<Option<NaiveDateTime>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_datetime(field, value).map(Some)
    }
}

fn fmt_datetime(ts: NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

fn fmt_opt_datetime(ts: Option<NaiveDateTime>) -> String {
    ts.map(fmt_datetime).unwrap_or_default()
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}
