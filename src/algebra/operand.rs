/// Symbolic operands
///
/// An operand is a reference to a value derivable from the statements
/// already observed in the current window: a constant, an argument or
/// result cell of an earlier statement, an aggregate over a result column,
/// or a set projection. `query_index` is a position within the window, not
/// within the whole transaction; the builders rewrite it as the window
/// slides.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::trace::statement::Statement;
use crate::value::{UnorderedSet, Value};

/// Aggregation functions over a numeric result column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregator {
    Sum,
    Avg,
    Len,
    Max,
    Min,
}

/// The full aggregator catalogue
pub const AGGREGATORS: [Aggregator; 5] = [
    Aggregator::Sum,
    Aggregator::Avg,
    Aggregator::Len,
    Aggregator::Max,
    Aggregator::Min,
];

impl Aggregator {
    /// Apply to a non-empty slice of numbers. Empty columns are handled by
    /// the operand before this is reached.
    pub fn apply(&self, nums: &[f64]) -> f64 {
        match self {
            Aggregator::Sum => nums.iter().sum(),
            Aggregator::Avg => nums.iter().sum::<f64>() / nums.len() as f64,
            Aggregator::Len => nums.len() as f64,
            Aggregator::Max => nums.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregator::Min => nums.iter().copied().fold(f64::INFINITY, f64::min),
        }
    }
}

/// A symbolic reference into the window
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    /// A literal value
    Const(Value),

    /// An argument of the statement at `query_index`
    Arg {
        template_id: u32,
        query_index: usize,
        arg_index: usize,
    },

    /// A result cell of the statement at `query_index`
    ResultCell {
        template_id: u32,
        query_index: usize,
        row: usize,
        col: usize,
    },

    /// An aggregate over a numeric result column
    Aggregate {
        query_index: usize,
        aggregator: Aggregator,
        col: usize,
    },

    /// An IN-list argument of the statement at `query_index`
    ArgSet {
        template_id: u32,
        query_index: usize,
        arg_index: usize,
    },

    /// The set of non-null cells in one result column
    ColumnSet {
        template_id: u32,
        query_index: usize,
        col: usize,
    },
}

impl Operand {
    /// Evaluate against a window of statements.
    ///
    /// Panics if the statement at the recorded window position does not
    /// carry the recorded template id: the model no longer describes the
    /// trace it was built from.
    pub fn evaluate(&self, window: &[Statement]) -> Value {
        match self {
            Operand::Const(value) => value.clone(),
            Operand::Arg {
                template_id,
                query_index,
                arg_index,
            } => {
                let statement = checked_statement(window, *template_id, *query_index);
                statement.arguments[*arg_index].clone()
            }
            Operand::ResultCell {
                template_id,
                query_index,
                row,
                col,
            } => {
                let statement = checked_statement(window, *template_id, *query_index);
                statement
                    .result_rows
                    .get(*row)
                    .and_then(|r| r.get(*col))
                    .cloned()
                    .unwrap_or(Value::Null)
            }
            Operand::Aggregate {
                query_index,
                aggregator,
                col,
            } => {
                let statement = &window[*query_index];
                let column: Vec<f64> = statement
                    .result_rows
                    .iter()
                    .filter_map(|row| row.get(*col).and_then(Value::as_num))
                    .collect();
                if column.is_empty() {
                    Value::Num(0.0)
                } else {
                    Value::Num(aggregator.apply(&column))
                }
            }
            Operand::ArgSet {
                template_id,
                query_index,
                arg_index,
            } => {
                let statement = checked_statement(window, *template_id, *query_index);
                statement.arguments[*arg_index].clone()
            }
            Operand::ColumnSet {
                template_id,
                query_index,
                col,
            } => {
                let statement = checked_statement(window, *template_id, *query_index);
                let mut set = UnorderedSet::new();
                for row in &statement.result_rows {
                    if let Some(cell) = row.get(*col) {
                        if !cell.is_null() {
                            set.insert(cell.clone());
                        }
                    }
                }
                Value::Set(set)
            }
        }
    }

    /// The recorded window position. `Const` and `Aggregate` report their
    /// stored index too; only argument and cell operands ever anchor the
    /// collapse walk.
    pub fn query_index(&self) -> usize {
        match self {
            Operand::Const(_) => 0,
            Operand::Arg { query_index, .. }
            | Operand::ResultCell { query_index, .. }
            | Operand::Aggregate { query_index, .. }
            | Operand::ArgSet { query_index, .. }
            | Operand::ColumnSet { query_index, .. } => *query_index,
        }
    }

    /// The same operand anchored at a different window position.
    pub fn with_query_index(&self, index: usize) -> Operand {
        let mut op = self.clone();
        match &mut op {
            Operand::Const(_) => {}
            Operand::Arg { query_index, .. }
            | Operand::ResultCell { query_index, .. }
            | Operand::Aggregate { query_index, .. }
            | Operand::ArgSet { query_index, .. }
            | Operand::ColumnSet { query_index, .. } => *query_index = index,
        }
        op
    }

    /// The argument position this operand projects, for argument-reading
    /// operands.
    pub fn arg_index(&self) -> Option<usize> {
        match self {
            Operand::Arg { arg_index, .. } | Operand::ArgSet { arg_index, .. } => Some(*arg_index),
            _ => None,
        }
    }

    /// True for operands that read an argument of an earlier statement and
    /// are therefore subject to collapsing.
    pub fn reads_argument(&self) -> bool {
        matches!(self, Operand::Arg { .. } | Operand::ArgSet { .. })
    }
}

fn checked_statement<'a>(
    window: &'a [Statement],
    template_id: u32,
    query_index: usize,
) -> &'a Statement {
    let statement = window.get(query_index).unwrap_or_else(|| {
        panic!(
            "model corruption: window position {} out of range (window holds {})",
            query_index,
            window.len()
        )
    });
    if statement.template_id != template_id {
        panic!(
            "model corruption: operand expects template {} at window position {}, found {}",
            template_id, query_index, statement.template_id
        );
    }
    statement
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(value) => write!(f, "{}", value),
            Operand::Arg {
                query_index,
                arg_index,
                ..
            } => write!(f, "Query{}({})", query_index, arg_index),
            Operand::ResultCell {
                query_index,
                row,
                col,
                ..
            } => write!(f, "Query{}[{},{}]", query_index, row, col),
            Operand::Aggregate {
                query_index, col, ..
            } => write!(f, "Query{}.aggregate({})", query_index, col),
            Operand::ArgSet {
                query_index,
                arg_index,
                ..
            } => write!(f, "Query{}({}l)", query_index, arg_index),
            Operand::ColumnSet {
                query_index, col, ..
            } => write!(f, "Query{}[{}l]", query_index, col),
        }
    }
}
