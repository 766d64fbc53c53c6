use serde::{Serialize, Serializer};
use std::fmt;

use crate::calculator::Calculator;
use crate::errors::CalculatorResult;

/// A single arithmetic request with its operands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Add { a: i64, b: i64 },
    Divide { a: i64, b: i64 },
    SquareRoot { a: f64 },
}

/// Kinds of operations the calculator supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OperationKind {
    Add,
    Divide,
    SquareRoot,
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Divide => "divide",
            OperationKind::SquareRoot => "sqrt",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            OperationKind::Add => "+",
            OperationKind::Divide => "/",
            OperationKind::SquareRoot => "√",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            OperationKind::Add | OperationKind::Divide => 2,
            OperationKind::SquareRoot => 1,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            OperationKind::Add => "green",
            OperationKind::Divide => "cyan",
            OperationKind::SquareRoot => "magenta",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OperationKind::Add => "Addition",
            OperationKind::Divide => "Integer division",
            OperationKind::SquareRoot => "Square root",
        }
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Add { .. } => OperationKind::Add,
            Operation::Divide { .. } => OperationKind::Divide,
            Operation::SquareRoot { .. } => OperationKind::SquareRoot,
        }
    }

    /// Runs the operation on `calculator`
    pub fn apply(&self, calculator: &Calculator) -> CalculatorResult<Value> {
        match *self {
            Operation::Add { a, b } => Ok(Value::Integer(calculator.add(a, b))),
            Operation::Divide { a, b } => calculator.divide(a, b).map(Value::Integer),
            Operation::SquareRoot { a } => calculator.square_root(a).map(Value::Real),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add { a, b } | Operation::Divide { a, b } => {
                write!(f, "{} {} {}", a, self.kind().symbol(), b)
            }
            Operation::SquareRoot { a } => write!(f, "sqrt({})", a),
        }
    }
}

/// Result of a successful operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
        }
    }
}

// Non-finite reals have no JSON representation, so they go out as text
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Value::Integer(v) => serializer.serialize_i64(v),
            Value::Real(v) if v.is_finite() => serializer.serialize_f64(v),
            Value::Real(v) => serializer.serialize_str(&v.to_string()),
        }
    }
}

/// Record of one evaluated operation, successful or not
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Where the operation came from: `<args>` or a script path
    pub source: String,
    /// Line within the source, 1-based
    pub line_number: usize,
    /// Operation kind, absent when the line could not be parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationKind>,
    /// Canonical text of the operation, or the raw line on parse failure
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Evaluation {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
