//! Scenario files and the default projection inputs.
//!
//! A scenario is a TOML file describing one projection. Keys that are
//! left out take the same defaults as the command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{
    InputSet, MonthNames, ProjectionError, ProjectionResult, RateSchedule, validate,
};

pub const DEFAULT_INITIAL_PRINCIPAL: f64 = 100_000.0;
pub const DEFAULT_RATE: f64 = 1.5;
pub const DEFAULT_SUPPORT_RATE: f64 = 0.6;
pub const DEFAULT_SUPPORT_DELAY: u32 = 4;
pub const DEFAULT_MONTHS: u32 = 12;

/// Longest horizon accepted from any front end (100 years).
pub const MAX_MONTHS: u32 = 1_200;

/// Rejects a month count above [`MAX_MONTHS`] before any per-month storage is allocated.
pub fn check_month_count(months: u32) -> ProjectionResult<()> {
    if months > MAX_MONTHS {
        return Err(ProjectionError::invalid(format!(
            "months must be <= {MAX_MONTHS}, got {months}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    #[serde(default = "default_initial_principal")]
    pub initial_principal: f64,

    /// A single number for a uniform rate, or one number per month.
    #[serde(default = "default_rate")]
    pub rate: RateSchedule,

    #[serde(default = "default_support_rate")]
    pub support_rate: f64,

    #[serde(default = "default_support_delay")]
    pub support_delay: u32,

    #[serde(default = "default_months")]
    pub months: u32,

    /// Amount withdrawn each month. Empty means nothing is withdrawn.
    #[serde(default)]
    pub withdrawals: Vec<f64>,

    #[serde(default)]
    pub month_names: MonthNames,
}

impl Default for ScenarioFile {
    fn default() -> Self {
        Self {
            initial_principal: default_initial_principal(),
            rate: default_rate(),
            support_rate: default_support_rate(),
            support_delay: default_support_delay(),
            months: default_months(),
            withdrawals: Vec::new(),
            month_names: MonthNames::default(),
        }
    }
}

fn default_initial_principal() -> f64 {
    DEFAULT_INITIAL_PRINCIPAL
}

fn default_rate() -> RateSchedule {
    RateSchedule::Uniform(DEFAULT_RATE)
}

fn default_support_rate() -> f64 {
    DEFAULT_SUPPORT_RATE
}

fn default_support_delay() -> u32 {
    DEFAULT_SUPPORT_DELAY
}

fn default_months() -> u32 {
    DEFAULT_MONTHS
}

impl ScenarioFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse scenario file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&ScenarioFile::default())
            .context("Failed to serialize default scenario")
    }

    /// Builds and validates the projection inputs described by this scenario.
    pub fn into_inputs(self) -> ProjectionResult<InputSet> {
        check_month_count(self.months)?;
        let inputs = InputSet::monthly(
            self.initial_principal,
            self.withdrawals,
            self.rate,
            self.support_rate,
            self.support_delay as usize,
            self.months as usize,
            self.month_names,
        );
        validate(&inputs)?;
        Ok(inputs)
    }
}
