use super::{fmt_datetime, parse_datetime, parse_u64, FieldRef, Table, TableStore};
use crate::{
    error::PipelineResult,
    transaction_generator::{Operation, TransactionRecord},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const TRANSACTION_HEADERS: [&str; 4] = ["id", "transaction_datetime", "operation", "amount"];

#[derive(Debug, Serialize, Deserialize)]
struct TransactionRow {
    id:                   String,
    transaction_datetime: String,
    operation:            String,
    amount:               String,
}

impl TransactionRow {
    fn from_record(t: &TransactionRecord) -> Self {
        Self {
            id:                   t.customer_id.to_string(),
            transaction_datetime: fmt_datetime(t.timestamp),
            operation:            t.operation.label().to_string(),
            amount:               t.amount.round_dp(2).to_string(),
        }
    }

    fn into_record(self, row: usize) -> PipelineResult<TransactionRecord> {
        let field = |column| FieldRef::new(Table::Transactions, row, column);
        let operation = Operation::from_label(self.operation.trim())
            .ok_or_else(|| field("operation").error(&self.operation))?;
        // Amounts are positive by contract; anything else is rejected.
        let amount = Decimal::from_str(self.amount.trim())
            .ok()
            .filter(|a| a.is_sign_positive() && !a.is_zero())
            .ok_or_else(|| field("amount").error(&self.amount))?;
        Ok(TransactionRecord {
            customer_id: parse_u64(field("id"), &self.id)?,
            timestamp:   parse_datetime(field("transaction_datetime"), &self.transaction_datetime)?,
            operation,
            amount,
        })
    }
}

impl TableStore {
    // ── Transactions ──────────────────────────────────────────────

    pub fn write_transactions(&self, transactions: &[TransactionRecord]) -> PipelineResult<usize> {
        let mut writer = self.writer(Table::Transactions)?;
        for txn in transactions {
            writer
                .serialize(TransactionRow::from_record(txn))
                .map_err(self.csv_err(Table::Transactions))?;
        }
        self.finish(Table::Transactions, writer, transactions.len() as u64, &TRANSACTION_HEADERS)?;
        Ok(transactions.len())
    }

    pub fn read_transactions(&self) -> PipelineResult<Vec<TransactionRecord>> {
        let mut reader = self.reader(Table::Transactions)?;
        let mut out = Vec::new();
        for (i, row) in reader.deserialize::<TransactionRow>().enumerate() {
            let row = row.map_err(self.csv_err(Table::Transactions))?;
            out.push(row.into_record(i + 1)?);
        }
        Ok(out)
    }
}
