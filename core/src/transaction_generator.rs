//! Transaction generator: synthetic income anchored to each deposit.
//!
//! Every customer with an initial deposit gets one transaction at the
//! deposit instant, followed by 0–9 further transactions stamped
//! uniformly between the deposit and now. All amounts are drawn
//! independently from [MIN_AMOUNT_CENTS, MAX_AMOUNT_CENTS].

use crate::{
    clock::RunClock,
    error::PipelineResult,
    lifecycle::LifecycleRecord,
    rng::{RngBank, StageRng, StageSlot},
    types::CustomerId,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MIN_AMOUNT_CENTS: i64 = 15_500;
pub const MAX_AMOUNT_CENTS: i64 = 38_900;
/// Follow-up transactions per customer are drawn from [0, this).
pub const MAX_EXTRA_TRANSACTIONS: u64 = 10;

/// Only income is generated, so balances never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Income,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Income" => Some(Self::Income),
            _        => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub customer_id: CustomerId,
    pub timestamp:   NaiveDateTime,
    pub operation:   Operation,
    pub amount:      Decimal,
}

pub struct TransactionGenerator;

impl TransactionGenerator {
    /// Generate transactions for every deposited customer, grouped by
    /// customer in input order; the deposit comes first in each group.
    pub fn generate(
        customers: &[LifecycleRecord],
        bank: &RngBank,
        clock: &RunClock,
    ) -> PipelineResult<Vec<TransactionRecord>> {
        let mut rng = bank.for_stage(StageSlot::Transaction);
        let now = clock.now();
        let mut out = Vec::new();
        let mut depositors = 0usize;

        for customer in customers {
            let Some(deposited_at) = customer.deposited_at else {
                continue;
            };
            depositors += 1;
            out.push(TransactionRecord {
                customer_id: customer.id,
                timestamp:   deposited_at,
                operation:   Operation::Income,
                amount:      random_amount(&mut rng),
            });

            let extra = rng.next_u64_below(MAX_EXTRA_TRANSACTIONS);
            for _ in 0..extra {
                out.push(TransactionRecord {
                    customer_id: customer.id,
                    timestamp:   rng.datetime_between(deposited_at, now),
                    operation:   Operation::Income,
                    amount:      random_amount(&mut rng),
                });
            }
        }

        log::info!(
            "{}: generated {} transactions for {depositors} depositors",
            rng.name,
            out.len()
        );
        Ok(out)
    }
}

fn random_amount(rng: &mut StageRng) -> Decimal {
    Decimal::new(rng.next_i64_inclusive(MIN_AMOUNT_CENTS, MAX_AMOUNT_CENTS), 2)
}
