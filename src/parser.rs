//! Textual operation syntax.
//!
//! A line holds one operation in any of these spellings:
//!
//! ```text
//! add 1 2        divide 3 0        sqrt 9       (word form)
//! 1 + 2          3 / 0             sqrt(9)  √9  (infix form)
//! add,1,2        divide,3,0        sqrt,9       (comma-separated row)
//! ```
//!
//! Blank lines and `#` comments are skipped. In script files, a leading row
//! of column names (`input1,input2,expected`) is skipped as a header.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{CalculatorError, CalculatorResult};
use crate::operation::{Operation, OperationKind};

static SKIP_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(#.*)?$").unwrap());

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(add|divide|div|sqrt|square_root|squareroot)((?:\s+\S+)*)\s*$").unwrap()
});

static INFIX_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([+-]?\d+)\s*([+/])\s*([+-]?\d+)\s*$").unwrap());

static ROOT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:sqrt\s*\(\s*([^()\s]+)\s*\)|√\s*([^()\s]+))\s*$").unwrap()
});

static CSV_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(add|divide|div|sqrt|square_root|squareroot)\s*((?:,\s*[^,]*?\s*)*)$").unwrap()
});

static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[A-Za-z_][A-Za-z0-9_ ]*(?:,\s*[A-Za-z_][A-Za-z0-9_ ]*)+\s*$").unwrap()
});

/// True for a comma-separated row of column names, e.g. `input1,input2,expected`.
/// Rows with numeric fields, such as `add,1,2`, never qualify.
pub fn is_header_row(line: &str) -> bool {
    HEADER_PATTERN.is_match(line)
}

/// Parses one script line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> CalculatorResult<Option<Operation>> {
    if SKIP_PATTERN.is_match(line) {
        return Ok(None);
    }

    if let Some(captures) = ROOT_PATTERN.captures(line) {
        let operand = captures
            .get(1)
            .or_else(|| captures.get(2))
            .map_or("", |m| m.as_str());
        return build(line, OperationKind::SquareRoot, &[operand]).map(Some);
    }

    if let Some(captures) = INFIX_PATTERN.captures(line) {
        let kind = if &captures[2] == "+" {
            OperationKind::Add
        } else {
            OperationKind::Divide
        };
        return build(line, kind, &[&captures[1], &captures[3]]).map(Some);
    }

    if let Some(captures) = CSV_PATTERN.captures(line) {
        if line.contains(',') {
            let kind = keyword_kind(&captures[1]);
            let operands: Vec<&str> = captures[2]
                .split(',')
                .skip(1)
                .map(str::trim)
                .collect();
            return build(line, kind, &operands).map(Some);
        }
    }

    if let Some(captures) = WORD_PATTERN.captures(line) {
        let kind = keyword_kind(&captures[1]);
        let operands: Vec<&str> = captures[2].split_whitespace().collect();
        return build(line, kind, &operands).map(Some);
    }

    Err(CalculatorError::UnknownOperation {
        input: line.trim().to_string(),
    })
}

/// Parses a single operation, treating blank input as an error
pub fn parse_operation(input: &str) -> CalculatorResult<Operation> {
    parse_line(input)?.ok_or_else(|| CalculatorError::UnknownOperation {
        input: input.trim().to_string(),
    })
}

fn keyword_kind(keyword: &str) -> OperationKind {
    match keyword.to_ascii_lowercase().as_str() {
        "add" => OperationKind::Add,
        "divide" | "div" => OperationKind::Divide,
        _ => OperationKind::SquareRoot,
    }
}

fn build(line: &str, kind: OperationKind, operands: &[&str]) -> CalculatorResult<Operation> {
    if operands.len() != kind.arity() {
        return Err(CalculatorError::Parse {
            input: line.trim().to_string(),
            reason: format!(
                "{} expects {} operand(s), got {}",
                kind.name(),
                kind.arity(),
                operands.len()
            ),
        });
    }

    match kind {
        OperationKind::Add => Ok(Operation::Add {
            a: parse_integer(line, operands[0])?,
            b: parse_integer(line, operands[1])?,
        }),
        OperationKind::Divide => Ok(Operation::Divide {
            a: parse_integer(line, operands[0])?,
            b: parse_integer(line, operands[1])?,
        }),
        OperationKind::SquareRoot => Ok(Operation::SquareRoot {
            a: parse_real(line, operands[0])?,
        }),
    }
}

fn parse_integer(line: &str, operand: &str) -> CalculatorResult<i64> {
    operand.parse::<i64>().map_err(|e| CalculatorError::Parse {
        input: line.trim().to_string(),
        reason: format!("'{}' is not an integer: {}", operand, e),
    })
}

fn parse_real(line: &str, operand: &str) -> CalculatorResult<f64> {
    operand.parse::<f64>().map_err(|e| CalculatorError::Parse {
        input: line.trim().to_string(),
        reason: format!("'{}' is not a number: {}", operand, e),
    })
}
