//! Customer generator: synthetic lifecycle records.
//!
//! Each customer registers at a uniform instant inside the look-back
//! window, then walks the stage chain. At every stage a fair coin decides
//! whether the customer advances; an advancing stage is stamped uniformly
//! between the previous stage and now.
//!
//! Approval is rolled first once the profile is complete. Denial is only
//! rolled when approval was not granted, so the two never co-occur.

use crate::{
    clock::RunClock,
    config::PipelineConfig,
    error::{PipelineError, PipelineResult},
    lifecycle::LifecycleRecord,
    profile_source::ProfileSource,
    rng::{RngBank, StageRng, StageSlot},
};
use chrono::{Months, NaiveDateTime};

pub struct CustomerGenerator<P: ProfileSource> {
    count:       u64,
    months_back: u32,
    profiles:    P,
}

impl<P: ProfileSource> CustomerGenerator<P> {
    pub fn new(count: i64, months_back: i64, profiles: P) -> PipelineResult<Self> {
        let count = u64::try_from(count).map_err(|_| {
            PipelineError::Generation(format!("customer count must be >= 0, got {count}"))
        })?;
        let months_back = u32::try_from(months_back).map_err(|_| {
            PipelineError::Generation(format!("months_back must be >= 0, got {months_back}"))
        })?;
        Ok(Self { count, months_back, profiles })
    }

    pub fn from_config(config: &PipelineConfig, profiles: P) -> PipelineResult<Self> {
        config.validate()?;
        Self::new(config.customer_count, config.months_back, profiles)
    }

    /// Produce `count` validated records with ids `0..count`.
    pub fn generate(&mut self, bank: &RngBank, clock: &RunClock) -> PipelineResult<Vec<LifecycleRecord>> {
        let mut rng = bank.for_stage(StageSlot::Customer);
        let mut profile_rng = bank.for_stage(StageSlot::Profile);
        let now = clock.now();
        let window_start = now
            .checked_sub_months(Months::new(self.months_back))
            .ok_or_else(|| {
                PipelineError::Generation(format!(
                    "cannot go back {} months from {now}",
                    self.months_back
                ))
            })?;

        let mut records: Vec<LifecycleRecord> = Vec::new();
        usize::try_from(self.count)
            .ok()
            .and_then(|n| records.try_reserve_exact(n).ok())
            .ok_or_else(|| {
                PipelineError::Generation(format!(
                    "cannot hold {} customers in memory",
                    self.count
                ))
            })?;

        for id in 0..self.count {
            let profile = self.profiles.next_profile(&mut profile_rng, clock.today());
            let registered_at = rng.datetime_between(window_start, now);

            let mut record = LifecycleRecord::registered(
                id,
                profile.name,
                profile.address,
                profile.birthdate,
                registered_at,
            );
            record.email_confirmed_at = advance(&mut rng, Some(registered_at), now);
            record.profile_completed_at = advance(&mut rng, record.email_confirmed_at, now);
            record.approved_at = advance(&mut rng, record.profile_completed_at, now);
            if record.approved_at.is_none() {
                record.denied_at = advance(&mut rng, record.profile_completed_at, now);
            }
            record.deposited_at = advance(&mut rng, record.approved_at, now);

            record.validate()?;
            records.push(record);
        }

        let deposited = records.iter().filter(|r| r.deposited_at.is_some()).count();
        log::info!(
            "{}: generated {} customers over {} months ({deposited} with deposits)",
            rng.name,
            records.len(),
            self.months_back
        );
        Ok(records)
    }
}

/// Flip a fair coin; on heads, stamp the next stage after `prev`.
/// A stage is never reached if its predecessor was not.
fn advance(
    rng: &mut StageRng,
    prev: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let prev = prev?;
    if rng.coin() {
        Some(rng.datetime_between(prev, now))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_source::CuratedProfiles;

    #[test]
    fn negative_count_is_rejected_at_construction() {
        let err = CustomerGenerator::new(-5, 6, CuratedProfiles::new()).err().unwrap();
        assert!(matches!(err, PipelineError::Generation(_)), "{err}");
    }

    #[test]
    fn unallocatable_count_is_a_generation_error() {
        let clock = RunClock::system();
        let mut generator = CustomerGenerator::new(i64::MAX, 6, CuratedProfiles::new()).unwrap();
        let err = generator.generate(&RngBank::new(1), &clock).unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)), "{err}");
    }

    #[test]
    fn zero_customers_is_an_empty_dataset() {
        let clock = RunClock::system();
        let mut generator = CustomerGenerator::new(0, 6, CuratedProfiles::new()).unwrap();
        let records = generator.generate(&RngBank::new(1), &clock).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn advance_never_skips_a_missing_predecessor() {
        let mut rng = RngBank::new(5).for_stage(StageSlot::Customer);
        let now = RunClock::system().now();
        for _ in 0..100 {
            assert!(advance(&mut rng, None, now).is_none());
        }
    }
}
