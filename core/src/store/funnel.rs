use super::{fmt_date, Table, TableStore};
use crate::{error::PipelineResult, funnel::FunnelRow, types::CustomerId};
use serde::Serialize;

const FUNNEL_HEADERS: [&str; 3] = ["id", "date", "status"];

#[derive(Debug, Serialize)]
struct FunnelCsvRow {
    id:     CustomerId,
    date:   String,
    status: &'static str,
}

impl TableStore {
    // ── Acquisition funnel ────────────────────────────────────────

    pub fn write_funnel(&self, rows: &[FunnelRow]) -> PipelineResult<usize> {
        let mut writer = self.writer(Table::Funnel)?;
        for row in rows {
            writer
                .serialize(FunnelCsvRow {
                    id:     row.customer_id,
                    date:   fmt_date(row.date),
                    status: row.status.label(),
                })
                .map_err(self.csv_err(Table::Funnel))?;
        }
        self.finish(Table::Funnel, writer, rows.len() as u64, &FUNNEL_HEADERS)?;
        Ok(rows.len())
    }
}
