/// Tree-walking predictor
///
/// Follows the trained tree alongside the running transaction. Every
/// observed statement moves to the best-matching child; prediction reads
/// the children of the current node, suppresses non-SELECT speculation and
/// materialises argument values against the running window.
use crate::model::prediction::Prediction;
use crate::model::tree::{NodeId, PredictionTree, TreeModel};
use crate::model::window::LOOK_BACK_LEN;
use crate::trace::registry::TemplateRegistry;
use crate::trace::statement::Statement;
use crate::trace::transaction::is_delimiter;

pub struct TreePredictor<'a> {
    model: &'a TreeModel,
    registry: &'a TemplateRegistry,
    tree: Option<&'a PredictionTree>,
    node: Option<NodeId>,
    transaction: Vec<Statement>,
    new_transaction: bool,
}

impl<'a> TreePredictor<'a> {
    pub fn new(model: &'a TreeModel, registry: &'a TemplateRegistry) -> Self {
        Self {
            model,
            registry,
            tree: None,
            node: None,
            transaction: Vec::new(),
            new_transaction: true,
        }
    }

    /// Advance with the statement the client actually issued.
    pub fn move_to_next(&mut self, observed: &Statement) {
        if is_delimiter(self.registry, observed) {
            self.reset();
            return;
        }
        if self.new_transaction && self.node.is_none() {
            self.new_transaction = false;
            if let Some(tree) = self.model.tree(observed.template_id) {
                self.tree = Some(tree);
                self.node = Some(tree.root());
            }
            self.transaction.push(observed.clone());
            return;
        }
        if let (Some(tree), Some(node)) = (self.tree, self.node) {
            let window = window_of(&self.transaction);
            let mut best: Option<NodeId> = None;
            for &child in tree.children(node) {
                let prediction = tree.prediction(child);
                if prediction.matches(window, observed)
                    && best.map_or(true, |b| prediction.hits > tree.prediction(b).hits)
                {
                    best = Some(child);
                }
            }
            self.node = best;
        }
        self.transaction.push(observed.clone());
    }

    /// The most likely next statement with concrete argument values, or
    /// `None` when the tree has nothing confident to offer here.
    pub fn predict_next(&self) -> Option<Statement> {
        let tree = self.tree?;
        let node = self.node?;
        let children = tree.children(node);
        if children.is_empty() {
            return None;
        }

        let mode = modal_template(tree, children);
        let template = self.registry.template(mode);
        if !template.trim_start().to_lowercase().starts_with("select") {
            // Non-SELECT statements are never speculated upon.
            return None;
        }

        let mut chosen: Option<&Prediction> = None;
        for &child in children {
            let prediction = tree.prediction(child);
            if prediction.template_id != mode || prediction.is_random {
                continue;
            }
            if chosen.map_or(true, |c| prediction.hits > c.hits) {
                chosen = Some(prediction);
            }
        }
        if chosen.is_none() {
            for &child in children {
                let prediction = tree.prediction(child);
                if prediction.template_id != mode {
                    continue;
                }
                if chosen.map_or(true, |c| prediction.hits > c.hits) {
                    chosen = Some(prediction);
                }
            }
        }
        let prediction = chosen?;
        if prediction.is_random {
            return None;
        }

        let window = window_of(&self.transaction);
        let arguments = prediction
            .param_ops
            .iter()
            .map(|op| op.evaluate(window))
            .collect();
        Some(Statement::new(prediction.template_id, Vec::new(), arguments, true))
    }

    /// Forget the running transaction, ready for the next one.
    pub fn end_transaction(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.tree = None;
        self.node = None;
        self.transaction.clear();
        self.new_transaction = true;
    }
}

fn window_of(transaction: &[Statement]) -> &[Statement] {
    let len = transaction.len().min(LOOK_BACK_LEN);
    &transaction[transaction.len() - len..]
}

/// The template id occurring most often among the children; ties resolve
/// to the first-seen id.
fn modal_template(tree: &PredictionTree, children: &[NodeId]) -> u32 {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for &child in children {
        let id = tree.prediction(child).template_id;
        match counts.iter_mut().find(|(tid, _)| *tid == id) {
            Some((_, count)) => *count += 1,
            None => counts.push((id, 1)),
        }
    }
    let mut mode = counts[0];
    for &candidate in &counts[1..] {
        if candidate.1 > mode.1 {
            mode = candidate;
        }
    }
    mode.0
}
