/// Prediction enumeration
///
/// Given the operand lists accumulated over a window and the statement to
/// be predicted, find the operations that derive each argument, then
/// materialise the Cartesian product as predictions.
use crate::algebra::operand::Operand;
use crate::algebra::operation::Operation;
use crate::builder::operands::OperandLists;
use crate::model::prediction::Prediction;
use crate::trace::statement::Statement;
use crate::value::Value;

/// One training transaction's view of the argument being derived: the
/// window preceding the predicted statement, and the argument's value in
/// that transaction.
pub type SearchContext<'a> = (&'a [Statement], &'a Value);

/// Scan candidate operands newest-position-first for ones whose evaluation
/// equals the target in *every* context. Falls back to a single `Random`
/// when nothing matches.
pub fn search_unary_ops(
    candidates: &[Vec<Operand>],
    contexts: &[SearchContext<'_>],
) -> Vec<Operation> {
    let mut operations = Vec::new();
    for position in (0..candidates.len()).rev() {
        for operand in &candidates[position] {
            let anchored = operand.with_query_index(position);
            if contexts
                .iter()
                .all(|(window, target)| anchored.evaluate(window) == **target)
            {
                operations.push(Operation::Unary(anchored));
            }
        }
    }
    if operations.is_empty() {
        operations.push(Operation::Random);
    }
    operations
}

/// Candidate operations for one argument: pick the candidate space by the
/// argument's type, then search it. Arguments with no candidate space
/// (nulls, empty sets) go straight to the `Random` fallback.
pub fn operations_for_argument(
    lists: &OperandLists,
    argument: &Value,
    contexts: &[SearchContext<'_>],
) -> Vec<Operation> {
    match lists.candidates_for(argument) {
        Some(candidates) => search_unary_ops(candidates, contexts),
        None => vec![Operation::Random],
    }
}

/// Materialise one prediction per tuple of the per-argument candidate
/// sets. An empty product still yields a single all-`Random` prediction of
/// the right arity.
pub fn enumerate_predictions(template_id: u32, ops_per_arg: &[Vec<Operation>]) -> Vec<Prediction> {
    let combinations: usize = ops_per_arg.iter().map(Vec::len).product();
    if combinations == 0 {
        return vec![Prediction::random(template_id, ops_per_arg.len())];
    }
    let mut predictions = Vec::with_capacity(combinations);
    let mut current = Vec::with_capacity(ops_per_arg.len());
    combine(template_id, ops_per_arg, 0, &mut current, &mut predictions);
    predictions
}

fn combine(
    template_id: u32,
    ops_per_arg: &[Vec<Operation>],
    arg_index: usize,
    current: &mut Vec<Operation>,
    predictions: &mut Vec<Prediction>,
) {
    if arg_index >= ops_per_arg.len() {
        predictions.push(Prediction::new(template_id, current.clone()));
        return;
    }
    for operation in &ops_per_arg[arg_index] {
        current.push(operation.clone());
        combine(template_id, ops_per_arg, arg_index + 1, current, predictions);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(template_id: u32, args: Vec<Value>) -> Statement {
        Statement::new(template_id, vec![], args, true)
    }

    #[test]
    fn test_search_prefers_recent_positions() {
        let window = vec![
            statement(1, vec![Value::Num(5.0)]),
            statement(2, vec![Value::Num(5.0)]),
        ];
        let candidates = vec![
            vec![Operand::Arg {
                template_id: 1,
                query_index: 0,
                arg_index: 0,
            }],
            vec![Operand::Arg {
                template_id: 2,
                query_index: 0,
                arg_index: 0,
            }],
        ];
        let target = Value::Num(5.0);
        let contexts = [(window.as_slice(), &target)];
        let found = search_unary_ops(&candidates, &contexts);
        assert_eq!(found.len(), 2);
        // Newest window position comes first, index rewritten to match.
        assert_eq!(
            found[0],
            Operation::Unary(Operand::Arg {
                template_id: 2,
                query_index: 1,
                arg_index: 0,
            })
        );
    }

    #[test]
    fn test_search_intersects_across_transactions() {
        let window_a = vec![statement(1, vec![Value::Num(5.0), Value::Num(9.0)])];
        let window_b = vec![statement(1, vec![Value::Num(7.0), Value::Num(9.0)])];
        let candidates = vec![vec![
            Operand::Arg {
                template_id: 1,
                query_index: 0,
                arg_index: 0,
            },
            Operand::Arg {
                template_id: 1,
                query_index: 0,
                arg_index: 1,
            },
        ]];
        // First transaction's target is its first argument, second
        // transaction's matches only the shared second argument.
        let target_a = Value::Num(9.0);
        let target_b = Value::Num(9.0);
        let contexts = [
            (window_a.as_slice(), &target_a),
            (window_b.as_slice(), &target_b),
        ];
        let found = search_unary_ops(&candidates, &contexts);
        assert_eq!(
            found,
            vec![Operation::Unary(Operand::Arg {
                template_id: 1,
                query_index: 0,
                arg_index: 1,
            })]
        );
    }

    #[test]
    fn test_search_falls_back_to_random() {
        let window = vec![statement(1, vec![Value::Num(5.0)])];
        let candidates = vec![vec![Operand::Arg {
            template_id: 1,
            query_index: 0,
            arg_index: 0,
        }]];
        let target = Value::Num(42.0);
        let contexts = [(window.as_slice(), &target)];
        assert_eq!(
            search_unary_ops(&candidates, &contexts),
            vec![Operation::Random]
        );
    }

    #[test]
    fn test_enumerate_is_the_cartesian_product() {
        let ops_per_arg = vec![
            vec![
                Operation::Unary(Operand::Const(Value::Num(1.0))),
                Operation::Unary(Operand::Const(Value::Num(2.0))),
            ],
            vec![Operation::Unary(Operand::Const(Value::Num(3.0)))],
        ];
        let predictions = enumerate_predictions(9, &ops_per_arg);
        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|p| p.template_id == 9));
        assert!(predictions.iter().all(|p| p.param_ops.len() == 2));
        assert!(predictions.iter().all(|p| !p.is_random));
    }

    #[test]
    fn test_zero_arity_enumerates_one_prediction() {
        let predictions = enumerate_predictions(3, &[]);
        assert_eq!(predictions.len(), 1);
        assert!(predictions[0].param_ops.is_empty());
    }

    #[test]
    fn test_empty_product_yields_a_random_prediction() {
        let ops_per_arg = vec![vec![], vec![Operation::Random]];
        let predictions = enumerate_predictions(3, &ops_per_arg);
        assert_eq!(predictions.len(), 1);
        assert!(predictions[0].is_random);
        assert_eq!(predictions[0].param_ops.len(), 2);
    }
}
