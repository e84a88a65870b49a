use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CUSTOMER_COUNT: i64 = 10;
pub const DEFAULT_MONTHS_BACK: i64 = 6;
pub const DEFAULT_SEED: u64 = 42;

/// Run parameters for one pipeline execution.
///
/// `customer_count` and `months_back` are signed so that a negative value
/// coming from a config file or the command line is reported as a
/// generation error instead of failing to deserialize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub customer_count:  i64,
    pub months_back:     i64,
    pub seed:            u64,
    pub output_dir:      PathBuf,
    /// Upper bound on the cohort date range in days; unbounded when None.
    pub max_cohort_days: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            customer_count:  DEFAULT_CUSTOMER_COUNT,
            months_back:     DEFAULT_MONTHS_BACK,
            seed:            DEFAULT_SEED,
            output_dir:      PathBuf::from("output"),
            max_cohort_days: None,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config file. Missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::io(path, e))?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        log::debug!("loaded config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Small, fast configuration used by tests.
    pub fn default_test() -> Self {
        Self {
            customer_count:  25,
            months_back:     2,
            seed:            12345,
            output_dir:      PathBuf::from("output"),
            max_cohort_days: Some(400),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Reject parameters no generator can honor.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.customer_count < 0 {
            return Err(PipelineError::Generation(format!(
                "customer_count must be >= 0, got {}",
                self.customer_count
            )));
        }
        if self.months_back < 0 {
            return Err(PipelineError::Generation(format!(
                "months_back must be >= 0, got {}",
                self.months_back
            )));
        }
        if u32::try_from(self.months_back).is_err() {
            return Err(PipelineError::Generation(format!(
                "months_back {} is out of range",
                self.months_back
            )));
        }
        if self.max_cohort_days == Some(0) {
            return Err(PipelineError::Generation(
                "max_cohort_days must be > 0 when set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "customer_count": 3 }"#).unwrap();
        assert_eq!(config.customer_count, 3);
        assert_eq!(config.months_back, DEFAULT_MONTHS_BACK);
        assert_eq!(config.seed, DEFAULT_SEED);
        assert!(config.max_cohort_days.is_none());
    }

    #[test]
    fn negative_count_is_a_generation_error() {
        let config = PipelineConfig { customer_count: -1, ..PipelineConfig::default() };
        assert!(matches!(config.validate(), Err(PipelineError::Generation(_))));
    }

    #[test]
    fn negative_months_back_is_a_generation_error() {
        let config = PipelineConfig { months_back: -3, ..PipelineConfig::default() };
        assert!(matches!(config.validate(), Err(PipelineError::Generation(_))));
    }

    #[test]
    fn load_reads_partial_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(&path, r#"{ "seed": 7, "output_dir": "out/batch", "max_cohort_days": 90 }"#).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.output_dir, PathBuf::from("out/batch"));
        assert_eq!(config.max_cohort_days, Some(90));
        assert_eq!(config.customer_count, DEFAULT_CUSTOMER_COUNT);
    }

    #[test]
    fn load_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        match PipelineConfig::load(&path).unwrap_err() {
            PipelineError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected Io, got {other}"),
        }
    }

    #[test]
    fn load_malformed_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ seed: ").unwrap();
        assert!(matches!(PipelineConfig::load(&path), Err(PipelineError::Config(_))));
    }

    #[test]
    fn defaults_validate() {
        PipelineConfig::default().validate().unwrap();
        PipelineConfig::default_test().validate().unwrap();
    }
}
