use serde::Deserialize;

use crate::errors::{CalculatorError, CalculatorResult};

/// Configuration structure for the calculator
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    /// Arithmetic policies
    #[serde(default)]
    pub arithmetic: ArithmeticConfig,
    /// Configuration for output formatting
    #[serde(default)]
    pub output: OutputConfig,
    /// Configuration for script file discovery
    #[serde(default)]
    pub scripts: ScriptConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ArithmeticConfig {
    #[serde(default)]
    pub negative_root: NegativeRootPolicy,
}

/// What `square_root` does with a negative radicand
#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum NegativeRootPolicy {
    /// Fail with `InvalidArgument`
    #[default]
    Error,
    /// Return `f64::NAN`
    NaN,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_true")]
    pub color: bool,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    Xml,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScriptConfig {
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_extensions() -> Vec<String> {
    vec!["calc".to_string()]
}

fn default_exclude_dirs() -> Vec<String> {
    vec!["target".to_string(), ".git".to_string()]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Console,
            color: true,
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
        }
    }
}

impl Config {
    /// Rejects settings that would make script discovery impossible
    pub fn validate(&self) -> CalculatorResult<()> {
        if self.scripts.extensions.is_empty() {
            return Err(CalculatorError::InvalidConfig {
                message: "scripts.extensions must list at least one extension".to_string(),
            });
        }
        if let Some(ext) = self.scripts.extensions.iter().find(|e| e.trim().is_empty()) {
            return Err(CalculatorError::InvalidConfig {
                message: format!("scripts.extensions contains a blank entry: {:?}", ext),
            });
        }
        Ok(())
    }
}
