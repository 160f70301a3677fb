use std::{fmt, str::FromStr};

use crate::error::EvalError;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    /// Loose equality (`==`)
    Equal,
    /// Strict equality (`===`)
    Identical,
    /// Loose inequality (`!=`)
    NotEqual,
    /// Strict inequality (`!==`)
    NotIdentical,
    /// Less than (`<`)
    Less,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    Greater,
    /// Greater than or equal (`>=`)
    GreaterEqual,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    /// Addition (`+`)
    Add,
    /// Subtraction (`-`)
    Subtract,
    /// Multiplication (`*`)
    Multiply,
    /// Division (`/`)
    Divide,
    /// Modulo (`%`)
    Modulo,
}

/// Short-circuiting logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// Logical AND (`&&`)
    And,
    /// Logical OR (`||`)
    Or,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Numeric negation (`-`)
    Negate,
    /// Boolean not (`!`)
    Not,
}

impl ComparisonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::Identical => "===",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::NotIdentical => "!==",
            ComparisonOp::Less => "<",
            ComparisonOp::LessEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterEqual => ">=",
        }
    }
}

impl ArithmeticOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::Modulo => "%",
        }
    }
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        }
    }
}

impl FromStr for ComparisonOp {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(ComparisonOp::Equal),
            "===" => Ok(ComparisonOp::Identical),
            "!=" => Ok(ComparisonOp::NotEqual),
            "!==" => Ok(ComparisonOp::NotIdentical),
            "<" => Ok(ComparisonOp::Less),
            "<=" => Ok(ComparisonOp::LessEqual),
            ">" => Ok(ComparisonOp::Greater),
            ">=" => Ok(ComparisonOp::GreaterEqual),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }
}

impl FromStr for ArithmeticOp {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(ArithmeticOp::Add),
            "-" => Ok(ArithmeticOp::Subtract),
            "*" => Ok(ArithmeticOp::Multiply),
            "/" => Ok(ArithmeticOp::Divide),
            "%" => Ok(ArithmeticOp::Modulo),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }
}

impl FromStr for LogicalOp {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "&&" | "and" => Ok(LogicalOp::And),
            "||" | "or" => Ok(LogicalOp::Or),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_round_trip() {
        for op in [ComparisonOp::Identical, ComparisonOp::LessEqual] {
            assert_eq!(op.to_string().parse::<ComparisonOp>(), Ok(op));
        }
        assert_eq!("%".parse::<ArithmeticOp>(), Ok(ArithmeticOp::Modulo));
        assert_eq!("and".parse::<LogicalOp>(), Ok(LogicalOp::And));
    }

    #[test]
    fn test_unknown_operator() {
        assert_eq!(
            "<>".parse::<ComparisonOp>(),
            Err(EvalError::UnknownOperator("<>".into()))
        );
        assert!("**".parse::<ArithmeticOp>().is_err());
    }
}
