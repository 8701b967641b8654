/// Candidate next statements
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::algebra::operation::Operation;
use crate::trace::statement::Statement;

/// A prediction of how *all* arguments of the next statement are derived
///
/// `hits` counts how many training observations the prediction survived;
/// it is the only field that changes after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    pub template_id: u32,

    pub param_ops: Vec<Operation>,

    pub hits: u64,

    /// True if any argument operation is `Random`
    pub is_random: bool,
}

impl Prediction {
    pub fn new(template_id: u32, param_ops: Vec<Operation>) -> Self {
        let is_random = param_ops.iter().any(Operation::is_random);
        Self {
            template_id,
            param_ops,
            hits: 0,
            is_random,
        }
    }

    /// A placeholder prediction that matches any statement of the template.
    pub fn random(template_id: u32, arity: usize) -> Self {
        Self::new(template_id, vec![Operation::Random; arity])
    }

    pub fn hit(&mut self) {
        self.hits += 1;
    }

    /// True if this prediction accounts for `statement` given the window it
    /// was observed in: same template, and every argument either derived by
    /// its operation or covered by a `Random` wildcard.
    pub fn matches(&self, window: &[Statement], statement: &Statement) -> bool {
        if self.template_id != statement.template_id {
            return false;
        }
        if self.is_random {
            return true;
        }
        statement
            .arguments
            .iter()
            .enumerate()
            .all(|(i, argument)| self.param_ops[i].matches_value(window, argument))
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops: Vec<String> = self.param_ops.iter().map(|op| op.to_string()).collect();
        write!(
            f,
            "query {} hits {} ops [{}]",
            self.template_id,
            self.hits,
            ops.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::operand::Operand;
    use crate::value::Value;

    #[test]
    fn test_is_random_closure() {
        let mixed = Prediction::new(
            1,
            vec![
                Operation::Unary(Operand::Const(Value::Num(1.0))),
                Operation::Random,
            ],
        );
        assert!(mixed.is_random);

        let concrete = Prediction::new(1, vec![Operation::Unary(Operand::Const(Value::Num(1.0)))]);
        assert!(!concrete.is_random);

        let empty = Prediction::new(1, vec![]);
        assert!(!empty.is_random);
    }

    #[test]
    fn test_random_prediction_matches_same_template_only() {
        let prediction = Prediction::random(4, 2);
        let same = Statement::new(4, vec![], vec![Value::Num(1.0), Value::Num(2.0)], true);
        let other = Statement::new(5, vec![], vec![Value::Num(1.0), Value::Num(2.0)], true);
        assert!(prediction.matches(&[], &same));
        assert!(!prediction.matches(&[], &other));
    }

    #[test]
    fn test_concrete_prediction_requires_matching_arguments() {
        let prediction = Prediction::new(
            2,
            vec![Operation::Unary(Operand::Const(Value::Num(7.0)))],
        );
        let hit = Statement::new(2, vec![], vec![Value::Num(7.0)], true);
        let miss = Statement::new(2, vec![], vec![Value::Num(8.0)], true);
        assert!(prediction.matches(&[], &hit));
        assert!(!prediction.matches(&[], &miss));
    }

    #[test]
    fn test_hit_is_monotone() {
        let mut prediction = Prediction::random(1, 0);
        prediction.hit();
        prediction.hit();
        assert_eq!(prediction.hits, 2);
    }
}
