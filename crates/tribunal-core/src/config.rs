//! YAML configuration: run settings and criterion definitions.

use crate::engine::BatchOptions;
use crate::errors::EvalError;
use crate::model::{Criterion, CriterionSet};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_SIZES: &[usize] = &[5, 13];

fn default_unit_workers() -> usize {
    4
}

fn default_evaluation_workers() -> usize {
    8
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Games evaluated in parallel.
    #[serde(default = "default_unit_workers")]
    pub max_workers: usize,
    /// Judge calls in flight process-wide.
    #[serde(default = "default_evaluation_workers")]
    pub evaluation_workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeSettings {
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Environment variable the API key is read from; the key itself never
    /// appears in configuration files.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Total attempts per criterion, first call included.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub processing: ProcessingSettings,
    pub judge: JudgeSettings,
    pub criteria_path: PathBuf,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, EvalError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EvalError::Config(format!("cannot read settings {}: {e}", path.display()))
        })?;
        let settings: Settings = serde_yaml::from_str(&raw).map_err(|e| {
            EvalError::Config(format!("invalid settings {}: {e}", path.display()))
        })?;
        settings.validate()?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    fn validate(&self) -> Result<(), EvalError> {
        if self.processing.max_workers == 0 {
            return Err(EvalError::Config("max_workers must be at least 1".into()));
        }
        if self.processing.evaluation_workers == 0 {
            return Err(EvalError::Config(
                "evaluation_workers must be at least 1".into(),
            ));
        }
        if self.judge.timeout_seconds == 0 {
            return Err(EvalError::Config(
                "timeout_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            unit_concurrency: self.processing.max_workers,
            evaluation_concurrency: self.processing.evaluation_workers,
            max_retries: self.judge.max_retries,
            attempt_timeout: Duration::from_secs(self.judge.timeout_seconds),
        }
    }

    pub fn api_key(&self) -> Result<String, EvalError> {
        std::env::var(&self.judge.api_key_env).map_err(|_| {
            EvalError::Config(format!(
                "environment variable {} is not set",
                self.judge.api_key_env
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawCriterion {
    name: String,
    description: String,
    #[serde(default)]
    applicable_games: Option<Vec<usize>>,
    #[serde(default)]
    order: i32,
}

#[derive(Debug, Deserialize)]
struct CriteriaFile {
    #[serde(default)]
    common_criteria: Vec<RawCriterion>,
    /// Keyed by a size label such as `13_player`; the leading digits give
    /// the game size the section applies to.
    #[serde(default)]
    game_specific_criteria: BTreeMap<String, Vec<RawCriterion>>,
}

fn parse_size_label(label: &str) -> Result<usize, EvalError> {
    let digits: String = label.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().map_err(|_| {
        EvalError::Config(format!(
            "game_specific_criteria key '{label}' does not start with a player count"
        ))
    })
}

/// Load the criterion set from a criteria YAML file. Common criteria
/// default to every standard size; size-specific sections pin their
/// criteria to exactly one size.
pub fn load_criteria(path: &Path) -> Result<CriterionSet, EvalError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| EvalError::Config(format!("cannot read criteria {}: {e}", path.display())))?;
    let file: CriteriaFile = serde_yaml::from_str(&raw)
        .map_err(|e| EvalError::Config(format!("invalid criteria {}: {e}", path.display())))?;

    let mut criteria = Vec::new();
    for c in file.common_criteria {
        criteria.push(Criterion {
            name: c.name,
            description: c.description,
            applicable_sizes: c.applicable_games.unwrap_or_else(|| DEFAULT_SIZES.to_vec()),
            display_order: c.order,
        });
    }
    for (label, section) in file.game_specific_criteria {
        let size = parse_size_label(&label)?;
        for c in section {
            criteria.push(Criterion {
                name: c.name,
                description: c.description,
                applicable_sizes: vec![size],
                display_order: c.order,
            });
        }
    }

    if criteria.is_empty() {
        return Err(EvalError::Config(format!(
            "criteria file {} defines no criteria",
            path.display()
        )));
    }
    let set = CriterionSet::new(criteria)?;
    info!(path = %path.display(), criteria = set.len(), "loaded criteria");
    Ok(set)
}
