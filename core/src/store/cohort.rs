use super::{fmt_date, Table, TableStore};
use crate::{cohort::CohortMatrix, error::PipelineResult};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CohortRow<'a> {
    status_datetime_from: String,
    status_datetime_to:   String,
    datetime_diff_days:   i64,
    status_from:          &'a str,
    status_to:            &'a str,
    status_from_count:    u64,
    status_to_count:      u64,
}

impl TableStore {
    // ── Cohort matrix ─────────────────────────────────────────────

    /// Stream every cell of the matrix to disk. Returns the row count.
    pub fn write_cohort(&self, matrix: &CohortMatrix) -> PipelineResult<u64> {
        let mut writer = self.writer(Table::Cohort)?;
        let mut rows = 0u64;
        for cell in matrix.cells() {
            writer
                .serialize(CohortRow {
                    status_datetime_from: fmt_date(cell.dates.from),
                    status_datetime_to:   fmt_date(cell.dates.to),
                    datetime_diff_days:   cell.diff_days(),
                    status_from:          cell.pair.from.label(),
                    status_to:            cell.pair.to.label(),
                    status_from_count:    cell.population_count,
                    status_to_count:      cell.converted_count,
                })
                .map_err(self.csv_err(Table::Cohort))?;
            rows += 1;
        }
        self.finish(Table::Cohort, writer, rows, &COHORT_HEADERS)?;
        Ok(rows)
    }
}

const COHORT_HEADERS: [&str; 7] = [
    "status_datetime_from",
    "status_datetime_to",
    "datetime_diff_days",
    "status_from",
    "status_to",
    "status_from_count",
    "status_to_count",
];
