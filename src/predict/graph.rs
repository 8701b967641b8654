/// Graph-walking predictor
use crate::model::graph::GraphModel;
use crate::model::window::{WindowQueue, LOOK_BACK_LEN};
use crate::trace::registry::TemplateRegistry;
use crate::trace::statement::Statement;

pub struct GraphPredictor<'a> {
    model: &'a GraphModel,
    registry: &'a TemplateRegistry,
    current: u32,
    window: Vec<Statement>,
    queue: WindowQueue,
}

impl<'a> GraphPredictor<'a> {
    pub fn new(model: &'a GraphModel, registry: &'a TemplateRegistry) -> Self {
        Self {
            model,
            registry,
            current: 0,
            window: Vec::new(),
            queue: WindowQueue::new(),
        }
    }

    /// The best prediction keyed by the current path across the current
    /// vertex's edges, with argument values materialised.
    pub fn predict_next(&self) -> Option<Statement> {
        if self.window.is_empty() {
            return None;
        }
        let path = self.queue.path();
        let best = self.model.edge_list(self.current)?.best_prediction(&path)?;
        if best.is_random {
            return None;
        }
        let arguments = best
            .param_ops
            .iter()
            .map(|op| op.evaluate(&self.window))
            .collect();
        let template = self.registry.template(best.template_id);
        let is_select = template.trim_start().to_lowercase().starts_with("select");
        Some(Statement::new(best.template_id, Vec::new(), arguments, is_select))
    }

    /// Advance with the statement the client actually issued.
    pub fn move_to_next(&mut self, observed: &Statement) {
        self.current = observed.template_id;
        self.window.push(observed.clone());
        if self.window.len() > LOOK_BACK_LEN {
            self.window.remove(0);
        }
        self.queue.push(observed.template_id);
    }
}
