use super::{
    fmt_date, fmt_datetime, fmt_opt_datetime, parse_date, parse_datetime, parse_opt_datetime,
    parse_u64, FieldRef, Table, TableStore,
};
use crate::{
    error::{PipelineError, PipelineResult},
    lifecycle::{DisplayStatus, LifecycleRecord},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const CUSTOMER_HEADERS: [&str; 11] = [
    "id",
    "name",
    "address",
    "birthdate",
    "status",
    "account_registration_dt",
    "account_email_confirmation_dt",
    "client_registration_dt",
    "client_approval_dt",
    "client_denial_dt",
    "client_initial_deposit_dt",
];

/// Raw customer base row. Every field stays textual until parsed so a
/// bad value is reported with its row and column.
#[derive(Debug, Serialize, Deserialize)]
struct CustomerRow {
    id:                            String,
    name:                          String,
    address:                       String,
    birthdate:                     String,
    status:                        String,
    account_registration_dt:       String,
    account_email_confirmation_dt: String,
    client_registration_dt:        String,
    client_approval_dt:            String,
    client_denial_dt:              String,
    client_initial_deposit_dt:     String,
}

impl CustomerRow {
    fn from_record(r: &LifecycleRecord) -> Self {
        Self {
            id:                            r.id.to_string(),
            name:                          r.name.clone(),
            address:                       r.address.clone(),
            birthdate:                     fmt_date(r.birthdate),
            status:                        r.current_status().label().to_string(),
            account_registration_dt:       fmt_datetime(r.registered_at),
            account_email_confirmation_dt: fmt_opt_datetime(r.email_confirmed_at),
            client_registration_dt:        fmt_opt_datetime(r.profile_completed_at),
            client_approval_dt:            fmt_opt_datetime(r.approved_at),
            client_denial_dt:              fmt_opt_datetime(r.denied_at),
            client_initial_deposit_dt:     fmt_opt_datetime(r.deposited_at),
        }
    }

    fn into_record(self, row: usize) -> PipelineResult<LifecycleRecord> {
        let field = |column| FieldRef::new(Table::Customers, row, column);
        let record = LifecycleRecord {
            id:                   parse_u64(field("id"), &self.id)?,
            name:                 self.name,
            address:              self.address,
            birthdate:            parse_date(field("birthdate"), &self.birthdate)?,
            registered_at:        parse_datetime(field("account_registration_dt"), &self.account_registration_dt)?,
            email_confirmed_at:   parse_opt_datetime(field("account_email_confirmation_dt"), &self.account_email_confirmation_dt)?,
            profile_completed_at: parse_opt_datetime(field("client_registration_dt"), &self.client_registration_dt)?,
            approved_at:          parse_opt_datetime(field("client_approval_dt"), &self.client_approval_dt)?,
            denied_at:            parse_opt_datetime(field("client_denial_dt"), &self.client_denial_dt)?,
            deposited_at:         parse_opt_datetime(field("client_initial_deposit_dt"), &self.client_initial_deposit_dt)?,
        };

        let status = DisplayStatus::from_label(self.status.trim())
            .ok_or_else(|| field("status").error(&self.status))?;
        record.validate()?;
        if status != record.current_status() {
            return Err(PipelineError::consistency(
                record.id,
                format!(
                    "status column says '{}' but timestamps imply '{}'",
                    status.label(),
                    record.current_status().label()
                ),
            ));
        }
        Ok(record)
    }
}

impl TableStore {
    // ── Customer base ─────────────────────────────────────────────

    pub fn write_customers(&self, records: &[LifecycleRecord]) -> PipelineResult<usize> {
        let mut writer = self.writer(Table::Customers)?;
        for record in records {
            writer
                .serialize(CustomerRow::from_record(record))
                .map_err(self.csv_err(Table::Customers))?;
        }
        self.finish(Table::Customers, writer, records.len() as u64, &CUSTOMER_HEADERS)?;
        log::debug!("store: wrote {} customers to {}", records.len(), self.path(Table::Customers).display());
        Ok(records.len())
    }

    /// Read and validate the customer base. Fails on the first row that
    /// does not parse, breaks an ordering invariant, or repeats an id.
    pub fn read_customers(&self) -> PipelineResult<Vec<LifecycleRecord>> {
        let mut reader = self.reader(Table::Customers)?;
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for (i, row) in reader.deserialize::<CustomerRow>().enumerate() {
            let row = row.map_err(self.csv_err(Table::Customers))?;
            let record = row.into_record(i + 1)?;
            if !seen.insert(record.id) {
                return Err(PipelineError::consistency(record.id, "duplicate customer id"));
            }
            records.push(record);
        }
        Ok(records)
    }
}
