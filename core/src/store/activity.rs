use super::{flag, Table, TableStore};
use crate::{activity::MonthlyActivityCell, error::PipelineResult, types::{CustomerId, MONTH_FORMAT}};
use serde::Serialize;

const ACTIVITY_HEADERS: [&str; 6] = [
    "id",
    "transaction_month",
    "num_of_transactions",
    "num_of_transactions_prev",
    "flag_new_active",
    "flag_churn",
];

#[derive(Debug, Serialize)]
struct ActivityRow {
    id:                       CustomerId,
    transaction_month:        String,
    num_of_transactions:      u64,
    num_of_transactions_prev: u64,
    flag_new_active:          u8,
    flag_churn:               u8,
}

impl TableStore {
    // ── Activity / churn ──────────────────────────────────────────

    pub fn write_activity(&self, cells: &[MonthlyActivityCell]) -> PipelineResult<usize> {
        let mut writer = self.writer(Table::Activity)?;
        for cell in cells {
            writer
                .serialize(ActivityRow {
                    id:                       cell.customer_id,
                    transaction_month:        cell.month.format(MONTH_FORMAT).to_string(),
                    num_of_transactions:      cell.transaction_count,
                    num_of_transactions_prev: cell.transaction_count_prev,
                    flag_new_active:          flag(cell.is_new_active),
                    flag_churn:               flag(cell.is_churned),
                })
                .map_err(self.csv_err(Table::Activity))?;
        }
        self.finish(Table::Activity, writer, cells.len() as u64, &ACTIVITY_HEADERS)?;
        Ok(cells.len())
    }
}
