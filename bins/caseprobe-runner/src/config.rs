// Harness configuration for caseprobe
//
// Sources, later ones win:
// 1. Built-in defaults
// 2. JSON file passed with `--config`
// 3. CASEPROBE_* environment variables
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::engine::DEFAULT_SOLUTION_STACK_BYTES;
use crate::report::ReportOptions;

pub const ENV_TRIM_OUTPUT: &str = "CASEPROBE_TRIM_OUTPUT";
pub const ENV_REALTIME_PRECISION: &str = "CASEPROBE_REALTIME_PRECISION";
pub const ENV_LOG_FORMAT: &str = "CASEPROBE_LOG_FORMAT";
pub const ENV_SOLUTION_STACK_MB: &str = "CASEPROBE_SOLUTION_STACK_MB";

/// Finest rounding that still means something for a wall clock in seconds
pub const MAX_REALTIME_PRECISION: u32 = 9;

pub const DEFAULT_SOLUTION_STACK_MB: usize = DEFAULT_SOLUTION_STACK_BYTES / MIB;
pub const MAX_SOLUTION_STACK_MB: usize = 8192;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Strip surrounding whitespace from captured stdout and failure messages
    pub trim_output: bool,
    /// Round `realtime` to this many decimal places; unset keeps full precision
    pub realtime_precision: Option<u32>,
    /// Stack reserved for each solution thread, in MiB
    pub solution_stack_mb: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            trim_output: false,
            realtime_precision: None,
            solution_stack_mb: DEFAULT_SOLUTION_STACK_MB,
        }
    }
}

impl HarnessConfig {
    /// Load a configuration file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            bail!("Config file not found: {}", config_path.display());
        }

        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: HarnessConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults or the given file, then environment overrides
    pub fn resolve(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(precision) = self.realtime_precision {
            if precision > MAX_REALTIME_PRECISION {
                bail!(
                    "realtime_precision must be at most {}, got {}",
                    MAX_REALTIME_PRECISION,
                    precision
                );
            }
        }
        if !(1..=MAX_SOLUTION_STACK_MB).contains(&self.solution_stack_mb) {
            bail!(
                "solution_stack_mb must be between 1 and {}, got {}",
                MAX_SOLUTION_STACK_MB,
                self.solution_stack_mb
            );
        }
        Ok(())
    }

    /// Invalid values are ignored with a warning; they never abort a run
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TRIM_OUTPUT) {
            match parse_flag(&raw) {
                Some(flag) => self.trim_output = flag,
                None => warn!(variable = ENV_TRIM_OUTPUT, value = %raw, "Ignoring invalid boolean"),
            }
        }

        if let Some(raw) = lookup(ENV_REALTIME_PRECISION) {
            match raw.trim().parse::<u32>() {
                Ok(digits) if digits <= MAX_REALTIME_PRECISION => {
                    self.realtime_precision = Some(digits)
                }
                _ => warn!(
                    variable = ENV_REALTIME_PRECISION,
                    value = %raw,
                    "Ignoring invalid precision (expected 0-{})",
                    MAX_REALTIME_PRECISION
                ),
            }
        }

        if let Some(raw) = lookup(ENV_SOLUTION_STACK_MB) {
            match raw.trim().parse::<usize>() {
                Ok(mb) if (1..=MAX_SOLUTION_STACK_MB).contains(&mb) => self.solution_stack_mb = mb,
                _ => warn!(
                    variable = ENV_SOLUTION_STACK_MB,
                    value = %raw,
                    "Ignoring invalid stack size (expected 1-{} MiB)",
                    MAX_SOLUTION_STACK_MB
                ),
            }
        }
    }

    pub fn solution_stack_bytes(&self) -> usize {
        self.solution_stack_mb * MIB
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            trim_output: self.trim_output,
            realtime_precision: self.realtime_precision,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Diagnostic log rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(env::var(ENV_LOG_FORMAT).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}
