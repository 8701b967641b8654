/// Per-position operand enumeration
///
/// While training walks a transaction, every position exports the operands
/// that can be read from its statement, partitioned by type: scalar
/// numbers, scalar strings, numeric lists, string lists. The four lists
/// are parallel and trimmed to the trailing `LOOK_BACK_LEN` positions.
///
/// Constants are enumerated before the rest of a statement's operands:
/// they are candidates for the statement's own arguments as well as its
/// successors'. Operands are stored with window index 0; the search
/// rewrites the index to the operand's position when it scans.
use crate::algebra::operand::{Operand, AGGREGATORS};
use crate::model::window::LOOK_BACK_LEN;
use crate::trace::statement::Statement;
use crate::value::Value;

#[derive(Clone, Debug, Default)]
pub struct OperandLists {
    pub num_ops: Vec<Vec<Operand>>,
    pub str_ops: Vec<Vec<Operand>>,
    pub num_list_ops: Vec<Vec<Operand>>,
    pub str_list_ops: Vec<Vec<Operand>>,
}

impl OperandLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of window positions currently held. The scalar lists may
    /// transiently hold one more (the pending position's constants).
    pub fn len(&self) -> usize {
        self.num_list_ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_list_ops.is_empty()
    }

    /// Open a new position with the statement's constant arguments.
    pub fn enumerate_constants(&mut self, statement: &Statement) {
        let mut num_ops = Vec::new();
        let mut str_ops = Vec::new();
        for argument in &statement.arguments {
            match argument {
                Value::Num(_) => num_ops.push(Operand::Const(argument.clone())),
                Value::Str(_) => str_ops.push(Operand::Const(argument.clone())),
                _ => {}
            }
        }
        self.num_ops.push(num_ops);
        self.str_ops.push(str_ops);
        debug_assert_eq!(self.num_ops.len(), self.str_ops.len());
        debug_assert_eq!(self.num_ops.len(), self.num_list_ops.len() + 1);
    }

    /// Complete the pending position with the statement's remaining
    /// operands, then trim to the trailing window.
    pub fn enumerate_statement(&mut self, statement: &Statement, with_aggregates: bool) {
        let mut num_ops = Vec::new();
        let mut str_ops = Vec::new();
        let mut num_list_ops = Vec::new();
        let mut str_list_ops = Vec::new();

        self.enumerate_result_cells(statement, &mut num_ops, &mut str_ops);
        self.enumerate_arguments(statement, &mut num_ops, &mut str_ops);
        if with_aggregates {
            self.enumerate_aggregates(statement, &mut num_ops);
        }
        self.enumerate_argument_sets(statement, &mut num_list_ops, &mut str_list_ops);
        self.enumerate_column_sets(statement, &mut num_list_ops, &mut str_list_ops);

        let position = self.num_list_ops.len();
        self.num_ops[position].extend(num_ops);
        self.str_ops[position].extend(str_ops);
        self.num_list_ops.push(num_list_ops);
        self.str_list_ops.push(str_list_ops);

        if self.num_list_ops.len() > LOOK_BACK_LEN {
            self.num_ops.remove(0);
            self.str_ops.remove(0);
            self.num_list_ops.remove(0);
            self.str_list_ops.remove(0);
        }
        debug_assert!(self.num_list_ops.len() <= LOOK_BACK_LEN);
        debug_assert_eq!(self.num_ops.len(), self.num_list_ops.len());
    }

    /// Result cells are only projected when the statement returned exactly
    /// one row; multi-row results are served by column sets instead.
    fn enumerate_result_cells(
        &self,
        statement: &Statement,
        num_ops: &mut Vec<Operand>,
        str_ops: &mut Vec<Operand>,
    ) {
        if statement.result_rows.len() != 1 {
            return;
        }
        for (col, cell) in statement.result_rows[0].iter().enumerate() {
            let operand = Operand::ResultCell {
                template_id: statement.template_id,
                query_index: 0,
                row: 0,
                col,
            };
            match cell {
                Value::Num(_) => num_ops.push(operand),
                Value::Str(_) => str_ops.push(operand),
                _ => {}
            }
        }
    }

    fn enumerate_arguments(
        &self,
        statement: &Statement,
        num_ops: &mut Vec<Operand>,
        str_ops: &mut Vec<Operand>,
    ) {
        for (arg_index, argument) in statement.arguments.iter().enumerate() {
            let operand = Operand::Arg {
                template_id: statement.template_id,
                query_index: 0,
                arg_index,
            };
            match argument {
                Value::Num(_) => num_ops.push(operand),
                Value::Str(_) => str_ops.push(operand),
                _ => {}
            }
        }
    }

    fn enumerate_aggregates(&self, statement: &Statement, num_ops: &mut Vec<Operand>) {
        let first_row = match statement.result_rows.first() {
            Some(row) => row,
            None => return,
        };
        for (col, cell) in first_row.iter().enumerate() {
            if !matches!(cell, Value::Num(_)) {
                continue;
            }
            for aggregator in AGGREGATORS {
                num_ops.push(Operand::Aggregate {
                    query_index: 0,
                    aggregator,
                    col,
                });
            }
        }
    }

    /// Non-empty set arguments, typed by their first element.
    fn enumerate_argument_sets(
        &self,
        statement: &Statement,
        num_list_ops: &mut Vec<Operand>,
        str_list_ops: &mut Vec<Operand>,
    ) {
        for (arg_index, argument) in statement.arguments.iter().enumerate() {
            let set = match argument.as_set() {
                Some(set) if !set.is_empty() => set,
                _ => continue,
            };
            let operand = Operand::ArgSet {
                template_id: statement.template_id,
                query_index: 0,
                arg_index,
            };
            match set.first() {
                Some(Value::Num(_)) => num_list_ops.push(operand),
                Some(Value::Str(_)) => str_list_ops.push(operand),
                _ => {}
            }
        }
    }

    /// One set per result column, typed by the first non-null cell.
    fn enumerate_column_sets(
        &self,
        statement: &Statement,
        num_list_ops: &mut Vec<Operand>,
        str_list_ops: &mut Vec<Operand>,
    ) {
        let first_row = match statement.result_rows.first() {
            Some(row) => row,
            None => return,
        };
        for col in 0..first_row.len() {
            let column_type = statement
                .result_rows
                .iter()
                .filter_map(|row| row.get(col))
                .find(|cell| !cell.is_null());
            let operand = Operand::ColumnSet {
                template_id: statement.template_id,
                query_index: 0,
                col,
            };
            match column_type {
                Some(Value::Num(_)) => num_list_ops.push(operand),
                Some(Value::Str(_)) => str_list_ops.push(operand),
                _ => {}
            }
        }
    }

    /// Candidate list for an argument of the given value, by type: scalars
    /// select the scalar lists, sets select the list lists via their first
    /// element. Null arguments and empty sets have no candidates.
    pub fn candidates_for(&self, argument: &Value) -> Option<&[Vec<Operand>]> {
        match argument {
            Value::Num(_) => Some(&self.num_ops),
            Value::Str(_) => Some(&self.str_ops),
            Value::Set(set) => match set.first() {
                Some(Value::Num(_)) => Some(&self.num_list_ops),
                Some(Value::Str(_)) => Some(&self.str_list_ops),
                _ => None,
            },
            Value::Null => None,
        }
    }
}
