//! pipeline-runner: generate the customer lifecycle dataset and every
//! reporting table built from it.
//!
//! Usage:
//!   pipeline-runner --customers 10 --months-back 6
//!
//! Seed, output directory and cohort range limit come from the JSON file
//! named by PIPELINE_CONFIG, when set. The two flags override that file.

use anyhow::{bail, Context, Result};
use lifecycle_core::{
    clock::RunClock,
    config::PipelineConfig,
    engine::{Pipeline, RunSummary},
    store::Table,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = resolve_config(env::var("PIPELINE_CONFIG").ok().as_deref(), &args)?;

    println!("Customer lifecycle pipeline");
    println!("  customers:   {}", config.customer_count);
    println!("  months back: {}", config.months_back);
    println!("  seed:        {}", config.seed);
    println!("  output:      {}", config.output_dir.display());
    println!();

    let mut pipeline = Pipeline::build(config, RunClock::system())?;
    let summary = pipeline.run()?;
    print_summary(&pipeline, &summary);
    Ok(())
}

fn print_summary(pipeline: &Pipeline, summary: &RunSummary) {
    let path = |t: Table| pipeline.store.path(t).display().to_string();
    println!("=== RUN SUMMARY ===");
    println!("  today:          {}", pipeline.clock.today());
    println!("  customers:      {:>8}  {}", summary.customers, path(Table::Customers));
    println!(
        "  cohort rows:    {:>8}  {} ({} days)",
        summary.cohort_rows,
        path(Table::Cohort),
        summary.cohort_days
    );
    println!("  funnel rows:    {:>8}  {}", summary.funnel_rows, path(Table::Funnel));
    println!("  transactions:   {:>8}  {}", summary.transactions, path(Table::Transactions));
    println!("  activity rows:  {:>8}  {}", summary.activity_rows, path(Table::Activity));
}

/// Config file named by PIPELINE_CONFIG (defaults when unset), then the
/// command-line flags on top.
fn resolve_config(config_path: Option<&str>, args: &[String]) -> Result<PipelineConfig> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config from {path}"))?,
        None => PipelineConfig::default(),
    };
    if let Some(n) = parse_flag(args, "--customers")? {
        config.customer_count = n;
    }
    if let Some(m) = parse_flag(args, "--months-back")? {
        config.months_back = m;
    }
    log::debug!("effective config: {config:?}");
    Ok(config)
}

/// Value following `flag`, if the flag is present. A present flag with a
/// missing or non-integer value is an error.
fn parse_flag(args: &[String], flag: &str) -> Result<Option<i64>> {
    let Some(pos) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let Some(raw) = args.get(pos + 1) else {
        bail!("{flag} needs a value");
    };
    let value = raw
        .parse()
        .with_context(|| format!("{flag} expects an integer, got {raw:?}"))?;
    Ok(Some(value))
}
