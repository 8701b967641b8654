/// Stream-scoped graph training
///
/// The graph trainer consumes the statement stream in trace order, no
/// cluster grouping: each consecutive pair contributes to one edge, and
/// predictions are keyed by the path of the last seven template ids.
use crate::builder::operands::OperandLists;
use crate::builder::search::{enumerate_predictions, operations_for_argument, SearchContext};
use crate::config::BuilderConfig;
use crate::model::graph::GraphModel;
use crate::model::window::{WindowQueue, LOOK_BACK_LEN};
use crate::trace::statement::Statement;

pub struct GraphModelBuilder {
    config: BuilderConfig,
    lists: OperandLists,
    window: Vec<Statement>,
    queue: WindowQueue,
    current: Option<Statement>,
}

impl GraphModelBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            lists: OperandLists::new(),
            window: Vec::new(),
            queue: WindowQueue::new(),
            current: None,
        }
    }

    /// Feed the next statement of the stream into the model.
    pub fn observe(&mut self, model: &mut GraphModel, statement: &Statement) {
        self.lists.enumerate_constants(statement);

        if let Some(current) = &self.current {
            let edge = model
                .edge_list_mut(current.template_id)
                .edge_mut(statement.template_id);
            edge.weight += 1;

            let path = self.queue.path();
            let mut matched = edge.matching_predictions(&path, &self.window, statement);
            if matched.is_empty() {
                let mut ops_per_arg = Vec::with_capacity(statement.arguments.len());
                for argument in &statement.arguments {
                    let contexts: [SearchContext<'_>; 1] = [(self.window.as_slice(), argument)];
                    ops_per_arg.push(operations_for_argument(&self.lists, argument, &contexts));
                }
                let predictions = enumerate_predictions(statement.template_id, &ops_per_arg);
                matched = edge.add_predictions(path, predictions);
            }
            if let Some(predictions) = edge.predictions.get_mut(&path) {
                for index in matched {
                    predictions[index].hit();
                }
            }
        }

        self.current = Some(statement.clone());
        self.queue.push(statement.template_id);
        self.window.push(statement.clone());
        if self.window.len() > LOOK_BACK_LEN {
            self.window.remove(0);
        }

        self.lists
            .enumerate_statement(statement, self.config.enumerate_aggregates);
    }

    /// Train on a statement stream, optionally only its leading part.
    pub fn train(
        &mut self,
        model: &mut GraphModel,
        statements: &[Statement],
        limit: Option<usize>,
    ) {
        let count = limit
            .unwrap_or(statements.len())
            .min(statements.len());
        for statement in &statements[..count] {
            self.observe(model, statement);
        }
        tracing::info!(
            statements = count,
            vertices = model.vertex_count(),
            "graph model trained"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::parser::StatementParser;
    use crate::trace::registry::TemplateRegistry;

    fn parse_all(trace: &str) -> (TemplateRegistry, Vec<Statement>) {
        let parser = StatementParser::new();
        let mut registry = TemplateRegistry::new();
        let statements = trace
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| parser.parse_line(&mut registry, l).unwrap())
            .collect();
        (registry, statements)
    }

    #[test]
    fn test_edge_weights_count_transitions() {
        let (_, statements) = parse_all(
            r#"{"sql": "SELECT a FROM t WHERE id = 1"}
{"sql": "SELECT b FROM u WHERE id = 1"}
{"sql": "SELECT a FROM t WHERE id = 2"}
{"sql": "SELECT b FROM u WHERE id = 2"}"#,
        );
        let mut model = GraphModel::new();
        let mut builder = GraphModelBuilder::new(BuilderConfig::default());
        builder.train(&mut model, &statements, None);

        let a = statements[0].template_id;
        let b = statements[1].template_id;
        assert_eq!(model.edge_list(a).unwrap().edge(b).unwrap().weight, 2);
        assert_eq!(model.edge_list(b).unwrap().edge(a).unwrap().weight, 1);
    }

    #[test]
    fn test_matching_predictions_gain_hits_instead_of_duplicates() {
        // The same two-statement pattern repeats with the argument carried
        // over, so the second pass must re-hit the existing prediction.
        let (_, statements) = parse_all(
            r#"{"sql": "SELECT a FROM t WHERE id = 3", "results": [[3]]}
{"sql": "SELECT b FROM u WHERE ref = 3"}
{"sql": "SELECT a FROM t WHERE id = 3", "results": [[3]]}
{"sql": "SELECT b FROM u WHERE ref = 3"}
{"sql": "SELECT a FROM t WHERE id = 3", "results": [[3]]}
{"sql": "SELECT b FROM u WHERE ref = 3"}"#,
        );
        let mut model = GraphModel::new();
        let mut builder = GraphModelBuilder::new(BuilderConfig::default());
        builder.train(&mut model, &statements, None);

        let a = statements[0].template_id;
        let b = statements[1].template_id;
        let edge = model.edge_list(a).unwrap().edge(b).unwrap();
        let total_hits: u64 = edge
            .predictions
            .values()
            .flat_map(|p| p.iter())
            .map(|p| p.hits)
            .sum();
        // Three a->b transitions, each under a different path the first
        // time it is seen; hits accumulate without loss.
        assert_eq!(edge.weight, 3);
        assert!(total_hits >= 3);
    }

    #[test]
    fn test_empty_stream_builds_empty_model() {
        let mut model = GraphModel::new();
        let mut builder = GraphModelBuilder::new(BuilderConfig::default());
        builder.train(&mut model, &[], None);
        assert!(model.is_empty());
    }
}
