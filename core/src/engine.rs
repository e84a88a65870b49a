//! The pipeline engine: runs every stage of a batch in a fixed order.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Registration   generate customers -> customer base
//!   2. Cohort         customer base      -> cohort matrix
//!   3. Funnel         customer base      -> acquisition funnel
//!   4. Transactions   customer base      -> transactions
//!   5. Activity       transactions       -> activity / churn
//!
//! RULES:
//!   - Every stage after registration reads its input back from disk,
//!     so each stage sees exactly what the previous one published.
//!   - No stage mutates another stage's table.
//!   - All randomness flows through the RngBank; all time through the RunClock.
//!   - The first failing stage halts the run; later stages never start.

use crate::{
    activity::build_activity,
    clock::RunClock,
    cohort::CohortMatrix,
    config::PipelineConfig,
    customer_generator::CustomerGenerator,
    error::{PipelineError, PipelineResult},
    funnel::build_funnel,
    profile_source::{CuratedProfiles, ProfileSource},
    rng::RngBank,
    store::{Table, TableStore},
    transaction_generator::TransactionGenerator,
};
use std::path::PathBuf;

/// The five stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Registration,
    Cohort,
    Funnel,
    Transactions,
    Activity,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Cohort       => "cohort",
            Self::Funnel       => "funnel",
            Self::Transactions => "transactions",
            Self::Activity     => "activity",
        }
    }

    pub fn input(self) -> Option<Table> {
        match self {
            Self::Registration => None,
            Self::Cohort | Self::Funnel | Self::Transactions => Some(Table::Customers),
            Self::Activity => Some(Table::Transactions),
        }
    }

    pub fn output(self) -> Table {
        match self {
            Self::Registration => Table::Customers,
            Self::Cohort       => Table::Cohort,
            Self::Funnel       => Table::Funnel,
            Self::Transactions => Table::Transactions,
            Self::Activity     => Table::Activity,
        }
    }

    fn files(self) -> String {
        match self.input() {
            Some(input) => format!("{} -> {}", input.file_name(), self.output().file_name()),
            None        => self.output().file_name().to_string(),
        }
    }
}

/// Row counts of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub customers:     usize,
    pub cohort_days:   u64,
    pub cohort_rows:   u64,
    pub funnel_rows:   usize,
    pub transactions:  usize,
    pub activity_rows: usize,
}

pub struct Pipeline<P: ProfileSource = CuratedProfiles> {
    pub clock:    RunClock,
    pub rng_bank: RngBank,
    pub store:    TableStore,
    config:       PipelineConfig,
    generator:    CustomerGenerator<P>,
}

impl Pipeline<CuratedProfiles> {
    /// Build a pipeline with the built-in profile source.
    pub fn build(config: PipelineConfig, clock: RunClock) -> PipelineResult<Self> {
        Self::with_profiles(config, clock, CuratedProfiles::new())
    }

    /// Small, seeded pipeline writing into `dir`, used by tests.
    pub fn build_test(seed: u64, dir: impl Into<PathBuf>, clock: RunClock) -> PipelineResult<Self> {
        let config = PipelineConfig { seed, ..PipelineConfig::default_test() }.with_output_dir(dir);
        Self::build(config, clock)
    }
}

impl<P: ProfileSource> Pipeline<P> {
    /// Validate the config and wire every stage. Invalid parameters fail
    /// here, before any file is touched.
    pub fn with_profiles(config: PipelineConfig, clock: RunClock, profiles: P) -> PipelineResult<Self> {
        let generator = CustomerGenerator::from_config(&config, profiles)?;
        let store = TableStore::open(&config.output_dir)?;
        Ok(Self {
            clock,
            rng_bank: RngBank::new(config.seed),
            store,
            config,
            generator,
        })
    }

    /// Run all stages in order. Stops at the first failure.
    pub fn run(&mut self) -> PipelineResult<RunSummary> {
        log::info!(
            "pipeline: {} customers, {} months back, seed {}, today {}, output {}",
            self.config.customer_count,
            self.config.months_back,
            self.config.seed,
            self.clock.today(),
            self.store.dir().display()
        );

        let customers = self.run_registration()?;
        let (cohort_days, cohort_rows) = self.run_cohort()?;
        let summary = RunSummary {
            customers,
            cohort_days,
            cohort_rows,
            funnel_rows:   self.run_funnel()?,
            transactions:  self.run_transactions()?,
            activity_rows: self.run_activity()?,
        };

        log::info!("pipeline: done {summary:?}");
        Ok(summary)
    }

    pub fn run_registration(&mut self) -> PipelineResult<usize> {
        let stage = Stage::Registration;
        let records = in_stage(stage, self.generator.generate(&self.rng_bank, &self.clock))?;
        let written = in_stage(stage, self.store.write_customers(&records))?;
        log::info!("stage={} wrote {written} rows", stage.name());
        Ok(written)
    }

    /// Returns (days in range, rows written).
    pub fn run_cohort(&self) -> PipelineResult<(u64, u64)> {
        let stage = Stage::Cohort;
        let customers = in_stage(stage, self.store.read_customers())?;
        let matrix = in_stage(
            stage,
            CohortMatrix::build(&customers, self.clock.today(), self.config.max_cohort_days),
        )?;
        let days = matrix.range().day_count();
        log::info!(
            "stage={} {} days -> {} date pairs x 10 status pairs = {} rows",
            stage.name(),
            days,
            matrix.range().date_pair_count(),
            matrix.cell_count()
        );
        let written = in_stage(stage, self.store.write_cohort(&matrix))?;
        Ok((days, written))
    }

    pub fn run_funnel(&self) -> PipelineResult<usize> {
        let stage = Stage::Funnel;
        let customers = in_stage(stage, self.store.read_customers())?;
        let rows = build_funnel(&customers);
        let written = in_stage(stage, self.store.write_funnel(&rows))?;
        log::info!("stage={} wrote {written} rows", stage.name());
        Ok(written)
    }

    pub fn run_transactions(&self) -> PipelineResult<usize> {
        let stage = Stage::Transactions;
        let customers = in_stage(stage, self.store.read_customers())?;
        let txns = in_stage(
            stage,
            TransactionGenerator::generate(&customers, &self.rng_bank, &self.clock),
        )?;
        let written = in_stage(stage, self.store.write_transactions(&txns))?;
        log::info!("stage={} wrote {written} rows", stage.name());
        Ok(written)
    }

    pub fn run_activity(&self) -> PipelineResult<usize> {
        let stage = Stage::Activity;
        let txns = in_stage(stage, self.store.read_transactions())?;
        let table = build_activity(&txns, self.clock.today());
        let written = in_stage(stage, self.store.write_activity(table.cells()))?;
        log::info!("stage={} wrote {written} rows", stage.name());
        Ok(written)
    }
}

/// Attach the stage and its files to a failure.
fn in_stage<T>(stage: Stage, result: PipelineResult<T>) -> PipelineResult<T> {
    result.map_err(|source| {
        log::error!("stage={} failed: {source}", stage.name());
        PipelineError::StageFailed {
            stage:  stage.name(),
            file:   stage.files(),
            source: Box::new(source),
        }
    })
}
