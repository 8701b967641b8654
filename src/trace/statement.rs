/// Parsed trace statements
use serde::{Deserialize, Serialize};

use crate::trace::registry::TemplateRegistry;
use crate::value::Value;

/// One statement observed in the workload trace
///
/// `template_id` identifies the normalised SQL shape; `arguments` holds the
/// literal values extracted from it, in statement order. `result_rows` is
/// what the trace recorded the statement returning (empty for writes and
/// for predicted statements).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Statement {
    pub template_id: u32,

    pub result_rows: Vec<Vec<Value>>,

    pub arguments: Vec<Value>,

    pub is_select: bool,
}

impl Statement {
    pub fn new(
        template_id: u32,
        result_rows: Vec<Vec<Value>>,
        arguments: Vec<Value>,
        is_select: bool,
    ) -> Self {
        Self {
            template_id,
            result_rows,
            arguments,
            is_select,
        }
    }

    /// True if the two statements have the same template and the same
    /// argument values. Result rows are not compared; a prediction carries
    /// none.
    pub fn same(&self, other: &Statement) -> bool {
        self.template_id == other.template_id && self.arguments == other.arguments
    }

    /// Fill the statement's template with its argument values, producing
    /// runnable SQL. Placeholders are consumed first-occurrence-wise in
    /// argument order: `?d` for numbers, `?s` for strings (the template
    /// keeps the surrounding quotes), `?l` for IN-list sets.
    pub fn render(&self, registry: &TemplateRegistry) -> String {
        let mut sql = registry.template(self.template_id).to_string();
        for argument in &self.arguments {
            match argument {
                Value::Num(n) => sql = sql.replacen("?d", &n.to_string(), 1),
                Value::Str(s) => sql = sql.replacen("?s", s, 1),
                Value::Set(set) => sql = sql.replacen("?l", &set.to_string(), 1),
                Value::Null => {}
            }
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::UnorderedSet;

    fn registry_with(template: &str) -> (TemplateRegistry, u32) {
        let mut registry = TemplateRegistry::new();
        let id = registry.id(template);
        (registry, id)
    }

    #[test]
    fn test_render_fills_placeholders_in_order() {
        let (registry, id) = registry_with(
            "SELECT * FROM users WHERE id = ?d AND name = '?s' AND tag IN (?l)",
        );
        let statement = Statement::new(
            id,
            vec![],
            vec![
                Value::Num(7.0),
                Value::Str("alice".to_string()),
                Value::Set(UnorderedSet::from_values(vec![
                    Value::Num(1.0),
                    Value::Num(2.0),
                ])),
            ],
            true,
        );
        assert_eq!(
            statement.render(&registry),
            "SELECT * FROM users WHERE id = 7 AND name = 'alice' AND tag IN (1, 2)"
        );
    }

    #[test]
    fn test_same_ignores_result_rows() {
        let a = Statement::new(3, vec![vec![Value::Num(1.0)]], vec![Value::Num(2.0)], true);
        let b = Statement::new(3, vec![], vec![Value::Num(2.0)], true);
        assert!(a.same(&b));
    }

    #[test]
    fn test_same_compares_arguments() {
        let a = Statement::new(3, vec![], vec![Value::Num(2.0)], true);
        let b = Statement::new(3, vec![], vec![Value::Num(5.0)], true);
        assert!(!a.same(&b));
    }
}
