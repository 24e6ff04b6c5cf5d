//! Pipeline configuration.
//!
//! Values come from three layers, highest priority first: command-line
//! overrides (applied by the binary), a TOML file, and the defaults below.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::info;

/// How null person scores are filled before fitting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeStrategy {
    #[default]
    Mean,
    Median,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the IMDb dump files
    pub data_dir: PathBuf,
    /// Directory for intermediate tables and the model artifact
    pub out_dir: PathBuf,
    /// Raw rows read per chunk when streaming a dump file
    pub chunk_rows: usize,
    pub title_type: String,
    pub min_year: u16,
    pub max_year: u16,
    /// Runtime bounds enforced on prediction requests
    pub min_runtime: u32,
    pub max_runtime: u32,
    /// Aka region filter; `None` keeps every region
    pub region: Option<String>,
    pub target_languages: Vec<String>,
    pub acting_categories: Vec<String>,
    pub impute: ImputeStrategy,
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            out_dir: PathBuf::from("artifacts"),
            chunk_rows: data_loader::DEFAULT_CHUNK_ROWS,
            title_type: "movie".to_string(),
            min_year: 1930,
            max_year: 2025,
            min_runtime: 30,
            max_runtime: 400,
            region: Some("IN".to_string()),
            target_languages: ["hi", "ta", "te", "ml", "kn", "bn", "mr", "pa", "gu", "or", "ur"]
                .into_iter()
                .map(String::from)
                .collect(),
            acting_categories: vec!["actor".to_string(), "actress".to_string()],
            impute: ImputeStrategy::Mean,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Read a TOML file; absent keys take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_rows == 0 {
            bail!("chunk_rows must be at least 1");
        }
        if self.min_year > self.max_year {
            bail!("min_year {} is after max_year {}", self.min_year, self.max_year);
        }
        if self.min_runtime > self.max_runtime {
            bail!(
                "min_runtime {} exceeds max_runtime {}",
                self.min_runtime,
                self.max_runtime
            );
        }
        if !(0.0..1.0).contains(&self.test_fraction) {
            bail!("test_fraction must be in [0, 1), got {}", self.test_fraction);
        }
        if self.target_languages.is_empty() {
            bail!("target_languages must not be empty");
        }
        Ok(())
    }

    pub fn year_range(&self) -> RangeInclusive<u16> {
        self.min_year..=self.max_year
    }

    pub fn runtime_range(&self) -> RangeInclusive<u32> {
        self.min_runtime..=self.max_runtime
    }

    pub fn target_set(&self) -> BTreeSet<String> {
        self.target_languages.iter().cloned().collect()
    }
}
