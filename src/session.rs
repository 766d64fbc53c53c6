use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::calculator::Calculator;
use crate::config::Config;
use crate::errors::{CalculatorError, CalculatorResult};
use crate::operation::{Evaluation, Operation};
use crate::parser::{is_header_row, parse_line};

/// Source label for operations given directly rather than read from a file
pub const ARGS_SOURCE: &str = "<args>";

/// Largest script file the session will read
pub const MAX_SCRIPT_SIZE: u64 = 1024 * 1024;

/// Above this many script files, a directory run goes parallel
pub const PARALLEL_THRESHOLD: usize = 5;

/// Evaluates operations and collects the outcome of each one
pub struct Session {
    pub evaluations: Vec<Evaluation>,
    pub config: Config,
    calculator: Calculator,
    root_path: PathBuf,
}

impl Session {
    /// Creates a session with default configuration rooted at the current directory
    pub fn new() -> CalculatorResult<Self> {
        Self::with_config(Config::default(), PathBuf::from("."))
    }

    /// Creates a session with the specified configuration and root path
    ///
    /// # Arguments
    /// * `config` - Calculator policies and output settings
    /// * `root_path` - Script files must live under this directory
    pub fn with_config(config: Config, root_path: PathBuf) -> CalculatorResult<Self> {
        config.validate()?;

        let canonical_root = root_path
            .canonicalize()
            .map_err(|e| CalculatorError::Canonicalization {
                path: root_path.display().to_string(),
                source: e,
            })?;

        Ok(Session {
            evaluations: Vec::new(),
            calculator: Calculator::with_policy(config.arithmetic.negative_root),
            config,
            root_path: canonical_root,
        })
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    /// Evaluates `operation` and records the outcome
    pub fn evaluate(&mut self, source: &str, line_number: usize, operation: Operation) -> &Evaluation {
        let evaluation = evaluate_with(&self.calculator, source, line_number, operation);
        self.evaluations.push(evaluation);
        &self.evaluations[self.evaluations.len() - 1]
    }

    /// Parses and evaluates one line. Parse failures are recorded like any
    /// other failed evaluation. Returns `None` for blank and comment lines.
    pub fn evaluate_line(&mut self, source: &str, line_number: usize, line: &str) -> Option<&Evaluation> {
        let evaluation = evaluate_line_with(&self.calculator, source, line_number, line)?;
        self.evaluations.push(evaluation);
        self.evaluations.last()
    }

    /// Determines if a file is a calculator script based on its extension
    fn is_script_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| self.config.scripts.extensions.iter().any(|e| e == ext))
    }

    /// Finds script files under `root_path`, sorted by path
    pub fn find_script_files(&self, root_path: &Path) -> Vec<PathBuf> {
        let mut script_files: Vec<PathBuf> = WalkDir::new(root_path)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                // Never descend into excluded directories
                if e.depth() > 0 && e.file_type().is_dir() {
                    let dir_name = e.file_name().to_str().unwrap_or("");
                    return !self.config.scripts.exclude_dirs.iter().any(|d| d == dir_name);
                }
                true
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_script_file(e.path()))
            .map(|e| e.into_path())
            .collect();

        script_files.sort();
        script_files
    }

    /// Validates that a file path is within the session root
    fn validate_path(&self, path: &Path) -> CalculatorResult<()> {
        let canonical_path = path
            .canonicalize()
            .map_err(|e| CalculatorError::Canonicalization {
                path: path.display().to_string(),
                source: e,
            })?;

        if !canonical_path.starts_with(&self.root_path) {
            return Err(CalculatorError::PathTraversal {
                path: canonical_path.display().to_string(),
                root: self.root_path.display().to_string(),
            });
        }

        Ok(())
    }

    fn read_script(&self, file_path: &Path) -> CalculatorResult<String> {
        self.validate_path(file_path)?;

        let metadata = fs::metadata(file_path)?;
        if metadata.len() > MAX_SCRIPT_SIZE {
            return Err(CalculatorError::FileTooLarge {
                path: file_path.display().to_string(),
                size: metadata.len(),
                max_size: MAX_SCRIPT_SIZE,
            });
        }

        Ok(fs::read_to_string(file_path)?)
    }

    /// Evaluates every operation in a script file
    pub fn run_file(&mut self, file_path: &Path) -> CalculatorResult<()> {
        let content = self.read_script(file_path)?;
        let evaluations = evaluate_script(&self.calculator, file_path, &content);
        self.evaluations.extend(evaluations);
        Ok(())
    }

    /// Evaluates every script file found under `path`
    pub fn run_directory(&mut self, path: &Path) -> CalculatorResult<()> {
        let script_files = self.find_script_files(path);

        info!(count = script_files.len(), dir = %path.display(), "found script files");

        if script_files.len() > PARALLEL_THRESHOLD {
            self.run_files_parallel(script_files)
        } else {
            self.run_files_sequential(script_files)
        }
    }

    /// Runs `path` as a directory of scripts or as a single script
    pub fn run_path(&mut self, path: &Path) -> CalculatorResult<()> {
        if path.is_dir() {
            self.run_directory(path)
        } else {
            self.run_file(path)
        }
    }

    // Nothing is committed unless every file could be read
    fn run_files_sequential(&mut self, script_files: Vec<PathBuf>) -> CalculatorResult<()> {
        let mut evaluations = Vec::new();
        for file_path in script_files {
            let content = self.read_script(&file_path)?;
            evaluations.extend(evaluate_script(&self.calculator, &file_path, &content));
        }
        self.evaluations.extend(evaluations);
        Ok(())
    }

    fn run_files_parallel(&mut self, script_files: Vec<PathBuf>) -> CalculatorResult<()> {
        let shared_errors = Mutex::new(Vec::new());
        let calculator = self.calculator;

        // Results are collected per file so the merged order matches file order
        let per_file: Vec<Vec<Evaluation>> = script_files
            .par_iter()
            .map(|file_path| match self.read_script(file_path) {
                Ok(content) => evaluate_script(&calculator, file_path, &content),
                Err(e) => {
                    if let Ok(mut errors) = shared_errors.lock() {
                        errors.push(format!("Failed to run {}: {}", file_path.display(), e));
                    }
                    Vec::new()
                }
            })
            .collect();

        let errors = shared_errors
            .into_inner()
            .map_err(|e| CalculatorError::ParallelProcessing {
                message: e.to_string(),
            })?;
        if !errors.is_empty() {
            return Err(CalculatorError::ParallelProcessing {
                message: errors.join(", "),
            });
        }

        self.evaluations.extend(per_file.into_iter().flatten());
        Ok(())
    }

    pub fn failures(&self) -> impl Iterator<Item = &Evaluation> {
        self.evaluations.iter().filter(|e| !e.is_success())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}

fn evaluate_with(calculator: &Calculator, source: &str, line_number: usize, operation: Operation) -> Evaluation {
    let expression = operation.to_string();
    let (value, error) = match operation.apply(calculator) {
        Ok(value) => {
            debug!(%source, line_number, %expression, %value, "evaluated");
            (Some(value), None)
        }
        Err(e) => {
            warn!(%source, line_number, %expression, error = %e, "evaluation failed");
            (None, Some(e.to_string()))
        }
    };

    Evaluation {
        source: source.to_string(),
        line_number,
        operation: Some(operation.kind()),
        expression,
        value,
        error,
    }
}

fn evaluate_line_with(calculator: &Calculator, source: &str, line_number: usize, line: &str) -> Option<Evaluation> {
    match parse_line(line) {
        Ok(Some(operation)) => Some(evaluate_with(calculator, source, line_number, operation)),
        Ok(None) => None,
        Err(e) => {
            warn!(%source, line_number, error = %e, "unparseable line");
            Some(Evaluation {
                source: source.to_string(),
                line_number,
                operation: None,
                expression: line.trim().to_string(),
                value: None,
                error: Some(e.to_string()),
            })
        }
    }
}

fn evaluate_script(calculator: &Calculator, file_path: &Path, content: &str) -> Vec<Evaluation> {
    info!(file = %file_path.display(), "running script");
    let source = file_path.display().to_string();
    let mut lines = content.lines().enumerate().peekable();

    // A leading column-name row such as `input1,input2,expected` is not an operation
    while let Some((_, line)) = lines.peek() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            lines.next();
            continue;
        }
        if is_header_row(line) {
            debug!(%source, header = line.trim(), "skipping header row");
            lines.next();
        }
        break;
    }

    lines
        .filter_map(|(index, line)| evaluate_line_with(calculator, &source, index + 1, line))
        .collect()
}
