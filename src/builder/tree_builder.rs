/// Cluster-scoped tree training
///
/// A cluster's transactions all issue the same template sequence, so one
/// frontier walk over the prototype transaction trains the tree for every
/// transaction at once: candidate predictions are enumerated against the
/// prototype and verified against the whole cluster.
use crate::algebra::operand::Operand;
use crate::algebra::operation::Operation;
use crate::builder::operands::OperandLists;
use crate::builder::search::{enumerate_predictions, SearchContext};
use crate::config::BuilderConfig;
use crate::model::prediction::Prediction;
use crate::model::tree::{NodeId, PredictionTree, TreeModel};
use crate::model::window::LOOK_BACK_LEN;
use crate::trace::statement::Statement;
use crate::trace::transaction::Transaction;

pub struct TreeModelBuilder {
    config: BuilderConfig,
    cap_triggers: u64,
}

impl TreeModelBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self {
            config,
            cap_triggers: 0,
        }
    }

    /// How often the frontier cap stopped a cluster's expansion.
    pub fn cap_triggers(&self) -> u64 {
        self.cap_triggers
    }

    /// Train the model on one cluster. The tree rooted at the cluster's
    /// first template id is created on first sight with an all-`Random`
    /// root of the right arity.
    pub fn train_cluster(&mut self, model: &mut TreeModel, cluster: &[Transaction]) {
        let proto = match cluster.first() {
            Some(transaction) if !transaction.is_empty() => transaction,
            _ => return,
        };
        let first = &proto[0];
        let tree = model.tree_or_insert(
            first.template_id,
            Prediction::random(first.template_id, first.arguments.len()),
        );

        let mut lists = OperandLists::new();
        let mut frontier: Vec<NodeId> = vec![tree.root()];
        for (position, statement) in proto.iter().enumerate() {
            lists.enumerate_constants(statement);
            if position > 0 {
                frontier = self.advance_frontier(tree, &lists, cluster, position, &frontier);
                if frontier.is_empty() {
                    break;
                }
            }
            lists.enumerate_statement(statement, self.config.enumerate_aggregates);
        }
    }

    /// Advance every frontier node past `position`: reuse children that
    /// carry the position's template id, enumerate fresh predictions where
    /// there are none, verify everything against the whole cluster.
    fn advance_frontier(
        &mut self,
        tree: &mut PredictionTree,
        lists: &OperandLists,
        cluster: &[Transaction],
        position: usize,
        frontier: &[NodeId],
    ) -> Vec<NodeId> {
        let predicted = &cluster[0][position];
        let template_id = predicted.template_id;
        let arity = predicted.arguments.len();
        let window_len = position.min(LOOK_BACK_LEN);
        let windows: Vec<&[Statement]> = cluster
            .iter()
            .map(|transaction| &transaction[position - window_len..position])
            .collect();
        // The frontier node holds the newest statement in the window.
        let node_pos = window_len - 1;

        let mut next = Vec::new();
        for &node in frontier {
            let mut children: Vec<NodeId> = tree
                .children(node)
                .iter()
                .copied()
                .filter(|&child| tree.prediction(child).template_id == template_id)
                .collect();

            if children.is_empty() {
                let mut ops_per_arg = Vec::with_capacity(arity);
                for arg in 0..arity {
                    let contexts: Vec<SearchContext<'_>> = cluster
                        .iter()
                        .enumerate()
                        .map(|(t, transaction)| {
                            (windows[t], &transaction[position].arguments[arg])
                        })
                        .collect();
                    ops_per_arg.push(search_collapsed(
                        tree,
                        node,
                        node_pos,
                        lists,
                        &predicted.arguments[arg],
                        &contexts,
                    ));
                }
                let predictions = enumerate_predictions(template_id, &ops_per_arg);
                children = predictions
                    .into_iter()
                    .map(|prediction| tree.add_child(node, prediction))
                    .collect();
            }

            let mut kept = Vec::new();
            for child in children {
                let mut matched = false;
                for (t, transaction) in cluster.iter().enumerate() {
                    if tree.prediction(child).matches(windows[t], &transaction[position]) {
                        tree.prediction_mut(child).hit();
                        matched = true;
                    }
                }
                if matched {
                    kept.push(child);
                }
            }
            if kept.is_empty() {
                let child = tree.add_child(node, Prediction::random(template_id, arity));
                for _ in cluster {
                    tree.prediction_mut(child).hit();
                }
                kept.push(child);
            }

            next.extend(kept);
            if next.len() > self.config.max_frontier_nodes {
                self.cap_triggers += 1;
                tracing::warn!(
                    position,
                    frontier = next.len(),
                    triggers = self.cap_triggers,
                    "frontier cap reached, expansion of this cluster stops"
                );
                return Vec::new();
            }
        }
        next
    }
}

/// Search one argument's candidate space with collapsing anchored at the
/// frontier node. Collapsed duplicates are dropped so the Cartesian
/// product stays small.
fn search_collapsed(
    tree: &PredictionTree,
    node: NodeId,
    node_pos: usize,
    lists: &OperandLists,
    argument: &crate::value::Value,
    contexts: &[SearchContext<'_>],
) -> Vec<Operation> {
    let candidates = match lists.candidates_for(argument) {
        Some(candidates) => candidates,
        None => return vec![Operation::Random],
    };
    let mut operations: Vec<Operation> = Vec::new();
    for position in (0..candidates.len()).rev() {
        for operand in &candidates[position] {
            let anchored = operand.with_query_index(position);
            let collapsed = collapse_operand(tree, node, node_pos, &anchored);
            if operations.contains(&Operation::Unary(collapsed.clone())) {
                continue;
            }
            if contexts
                .iter()
                .all(|(window, target)| collapsed.evaluate(window) == **target)
            {
                operations.push(Operation::Unary(collapsed));
            }
        }
    }
    if operations.is_empty() {
        operations.push(Operation::Random);
    }
    operations
}

/// Rewrite an operand that reads an ancestor statement's argument to that
/// argument's ultimate source. Walks parents until the node at the
/// operand's window position, then substitutes the operation that ancestor
/// recorded for the argument, recursing while it is itself an
/// argument-reader.
pub fn collapse_operand(
    tree: &PredictionTree,
    node: NodeId,
    node_pos: usize,
    operand: &Operand,
) -> Operand {
    let arg_index = match operand.arg_index() {
        Some(index) => index,
        None => return operand.clone(),
    };
    let mut parent = Some(node);
    let mut parent_pos = node_pos;
    while let Some(current) = parent {
        if parent_pos <= operand.query_index() {
            break;
        }
        parent = tree.parent(current);
        parent_pos -= 1;
    }
    let anchor = match parent {
        Some(anchor) => anchor,
        None => return operand.clone(),
    };
    match &tree.prediction(anchor).param_ops[arg_index] {
        Operation::Random => operand.clone(),
        Operation::Unary(inner) => {
            if inner.reads_argument() {
                collapse_operand(tree, anchor, parent_pos, inner)
            } else {
                inner.clone()
            }
        }
        Operation::Binary { .. } => operand.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_collapse_rewrites_to_the_ultimate_source() {
        // root -> n1 -> n2, where n2 derives its argument from n1's
        // argument, and n1 derives its own from a column set of the
        // transaction's first statement.
        let column_set = Operand::ColumnSet {
            template_id: 0,
            query_index: 0,
            col: 0,
        };
        let arg_set_1 = Operand::ArgSet {
            template_id: 1,
            query_index: 1,
            arg_index: 0,
        };
        let mut tree = PredictionTree::new(Prediction::new(
            0,
            vec![Operation::Unary(Operand::Const(Value::Num(0.0)))],
        ));
        let n1 = tree.add_child(
            tree.root(),
            Prediction::new(1, vec![Operation::Unary(column_set.clone())]),
        );
        let n2 = tree.add_child(n1, Prediction::new(2, vec![Operation::Unary(arg_set_1.clone())]));

        // An operand reading n1's argument collapses to the column set.
        assert_eq!(collapse_operand(&tree, n2, 2, &arg_set_1), column_set);

        // An operand reading n2's own argument chases through n1 too.
        let arg_set_2 = Operand::ArgSet {
            template_id: 2,
            query_index: 2,
            arg_index: 0,
        };
        assert_eq!(collapse_operand(&tree, n2, 2, &arg_set_2), column_set);
    }

    #[test]
    fn test_collapse_leaves_random_sources_alone() {
        let mut tree = PredictionTree::new(Prediction::random(0, 1));
        let n1 = tree.add_child(tree.root(), Prediction::random(1, 1));
        let operand = Operand::ArgSet {
            template_id: 0,
            query_index: 0,
            arg_index: 0,
        };
        assert_eq!(collapse_operand(&tree, n1, 1, &operand), operand);
    }

    #[test]
    fn test_collapse_ignores_non_argument_operands() {
        let tree = PredictionTree::new(Prediction::random(0, 1));
        let operand = Operand::ColumnSet {
            template_id: 0,
            query_index: 0,
            col: 2,
        };
        assert_eq!(collapse_operand(&tree, tree.root(), 0, &operand), operand);
    }
}
