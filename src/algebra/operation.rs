/// Operations over operands
///
/// An operation is what a prediction stores per argument position: how to
/// compute that argument from the window. `Random` is the nullary
/// wildcard, `Unary` forwards one operand, `Binary` combines two numeric
/// operands with an arithmetic operator.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::algebra::operand::Operand;
use crate::trace::statement::Statement;
use crate::value::Value;

/// Arithmetic operators for binary operations
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// The full operator catalogue
pub const BINARY_OPERATORS: [BinaryOperator; 5] = [
    BinaryOperator::Add,
    BinaryOperator::Sub,
    BinaryOperator::Mul,
    BinaryOperator::Div,
    BinaryOperator::Mod,
];

impl BinaryOperator {
    pub fn apply(&self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Sub => left - right,
            BinaryOperator::Mul => left * right,
            BinaryOperator::Div => left / right,
            // Always NaN: a modulo prediction can never match a target.
            BinaryOperator::Mod => f64::NAN,
        }
    }

    /// Whether operand order is irrelevant. `Div` reports symmetric; the
    /// model never consults the flag for it, so the upstream oddity stands.
    pub fn is_symmetric(&self) -> bool {
        match self {
            BinaryOperator::Add => true,
            BinaryOperator::Sub => false,
            BinaryOperator::Mul => true,
            BinaryOperator::Div => true,
            BinaryOperator::Mod => true,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
        }
    }
}

/// How one argument of a predicted statement is derived
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Matches any value; evaluates to null
    Random,

    /// Forwards a single operand
    Unary(Operand),

    /// Combines two numeric operands
    Binary {
        operator: BinaryOperator,
        left: Operand,
        right: Operand,
    },
}

impl Operation {
    pub fn evaluate(&self, window: &[Statement]) -> Value {
        match self {
            Operation::Random => Value::Null,
            Operation::Unary(operand) => operand.evaluate(window),
            Operation::Binary {
                operator,
                left,
                right,
            } => {
                let left = left.evaluate(window).as_num();
                let right = right.evaluate(window).as_num();
                match (left, right) {
                    (Some(l), Some(r)) => Value::Num(operator.apply(l, r)),
                    _ => Value::Null,
                }
            }
        }
    }

    /// True if evaluating against the window yields the target value.
    /// `Random` matches anything.
    pub fn matches_value(&self, window: &[Statement], target: &Value) -> bool {
        match self {
            Operation::Random => true,
            _ => self.evaluate(window) == *target,
        }
    }

    pub fn is_random(&self) -> bool {
        matches!(self, Operation::Random)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Random => Ok(()),
            Operation::Unary(operand) => write!(f, "{}", operand),
            Operation::Binary {
                operator,
                left,
                right,
            } => write!(f, "{} {} {}", left, operator.symbol(), right),
        }
    }
}
