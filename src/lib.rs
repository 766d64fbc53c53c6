//! # calc-kit
//!
//! A small integer/real calculator with well-defined failures, plus the
//! tooling to drive it from the command line or from script files.
//!
//! ## Features
//!
//! - `add` on `i64` with wrapping overflow
//! - `divide` on `i64`, truncating toward zero, failing with a
//!   "divide by zero" error instead of returning infinity or NaN
//! - `sqrt` on `f64` with a configurable policy for negative input
//! - Script files with word, infix and comma-separated syntax
//! - Console, JSON and XML reports
//! - TOML configuration
//!
//! ## Usage
//!
//! ```bash
//! calc add 1 2
//! calc eval "3 / 0"
//! calc --json run scripts/
//! ```

pub mod calculator;
pub mod config;
pub mod errors;
pub mod operation;
pub mod parser;
pub mod reports;
pub mod session;

use std::fs;
use std::path::Path;

pub use calculator::Calculator;
pub use config::{Config, NegativeRootPolicy, OutputFormat};
pub use errors::{CalculatorError, CalculatorResult, DIVIDE_BY_ZERO_MESSAGE};
pub use operation::{Evaluation, Operation, OperationKind, Value};
pub use parser::{parse_line, parse_operation};
pub use session::Session;

/// Configuration file looked up when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = ".calc-kit.toml";

/// Loads configuration from a file or returns default configuration
pub fn load_config(config_path: Option<&str>) -> CalculatorResult<Config> {
    let config_file = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

    if Path::new(config_file).exists() {
        let content = fs::read_to_string(config_file)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_default() {
        let config = load_config(Some("/nonexistent/calc-kit.toml")).unwrap();

        assert_eq!(config.arithmetic.negative_root, NegativeRootPolicy::Error);
        assert_eq!(config.output.format, OutputFormat::Console);
        assert!(config.output.color);
    }

    #[test]
    fn test_config_file_loading() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join(DEFAULT_CONFIG_FILE);
        let mut file = std::fs::File::create(&config_file).unwrap();

        writeln!(file, r#"
[arithmetic]
negative_root = "NaN"

[output]
format = "Json"
color = false

[scripts]
extensions = ["calc", "csv"]
"#).unwrap();

        let config = load_config(Some(config_file.to_str().unwrap())).unwrap();

        assert_eq!(config.arithmetic.negative_root, NegativeRootPolicy::NaN);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.output.color);
        assert_eq!(config.scripts.extensions, vec!["calc", "csv"]);
        assert_eq!(config.scripts.exclude_dirs, vec!["target", ".git"]);
    }

    #[test]
    fn test_config_file_with_bad_value() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&config_file, "[output]\nformat = \"Yaml\"\n").unwrap();

        let result = load_config(Some(config_file.to_str().unwrap()));
        assert!(matches!(result, Err(CalculatorError::Config(_))));
    }

    #[test]
    fn test_config_file_failing_validation() {
        let dir = tempdir().unwrap();
        let config_file = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&config_file, "[scripts]\nextensions = []\n").unwrap();

        let result = load_config(Some(config_file.to_str().unwrap()));
        assert!(matches!(result, Err(CalculatorError::InvalidConfig { .. })));
    }
}
