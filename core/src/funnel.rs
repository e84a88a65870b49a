//! Acquisition funnel: one row per (customer, stage reached).

use crate::{
    lifecycle::{LifecycleRecord, StatusLabel},
    types::{to_date, CustomerId},
};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunnelRow {
    pub customer_id: CustomerId,
    pub date:        NaiveDate,
    pub status:      StatusLabel,
}

/// Flatten the lifecycle records into the funnel table.
///
/// Rows are grouped by stage in rank order, records in input order within
/// each stage. Rank 4 uses the derived analysis timestamp.
pub fn build_funnel(records: &[LifecycleRecord]) -> Vec<FunnelRow> {
    let rows: Vec<FunnelRow> = StatusLabel::ALL
        .into_iter()
        .flat_map(move |status| {
            records.iter().filter_map(move |r| {
                r.timestamp(status).map(|ts| FunnelRow {
                    customer_id: r.id,
                    date:        to_date(ts),
                    status,
                })
            })
        })
        .collect();
    log::info!("funnel: {} rows from {} customers", rows.len(), records.len());
    rows
}
