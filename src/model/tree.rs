/// Prediction trees
///
/// One tree per first-statement template id. Depth corresponds to
/// in-transaction position; any root-to-leaf path is a template sequence
/// observed in training. Nodes live in an index arena with parent links:
/// the builder's collapse walk needs cheap upward traversal, and indices
/// avoid cyclic ownership.
use fxhash::FxHashMap;

use crate::model::prediction::Prediction;

/// Index of a node within its tree's arena
pub type NodeId = usize;

#[derive(Clone, Debug)]
pub struct NodeRecord {
    pub prediction: Prediction,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A single prediction tree
#[derive(Clone, Debug)]
pub struct PredictionTree {
    nodes: Vec<NodeRecord>,
}

impl PredictionTree {
    /// Create a tree holding only the root. The root payload is a
    /// placeholder for the transaction's first statement and stays
    /// all-`Random`.
    pub fn new(root: Prediction) -> Self {
        Self {
            nodes: vec![NodeRecord {
                prediction: root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id]
    }

    pub fn prediction(&self, id: NodeId) -> &Prediction {
        &self.nodes[id].prediction
    }

    pub fn prediction_mut(&mut self, id: NodeId) -> &mut Prediction {
        &mut self.nodes[id].prediction
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Append a child under `parent`, returning its id.
    pub fn add_child(&mut self, parent: NodeId, prediction: Prediction) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeRecord {
            prediction,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Total number of nodes.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Every prediction in the tree, in arena order.
    pub fn predictions(&self) -> impl Iterator<Item = &Prediction> {
        self.nodes.iter().map(|node| &node.prediction)
    }

    /// Average child count over non-leaf nodes; 0 for a lone root.
    pub fn avg_degree(&self) -> f64 {
        let non_leaves = self.nodes.iter().filter(|n| !n.children.is_empty()).count();
        if non_leaves == 0 {
            return 0.0;
        }
        let total_degree: usize = self.nodes.iter().map(|n| n.children.len()).sum();
        total_degree as f64 / non_leaves as f64
    }

    /// Render the tree with box-drawing connectors, one node per line.
    pub fn render(&self) -> String {
        self.render_node(self.root()).join("\n")
    }

    fn render_node(&self, id: NodeId) -> Vec<String> {
        let node = &self.nodes[id];
        let mut lines = vec![node.prediction.to_string()];
        for (i, &child) in node.children.iter().enumerate() {
            let last = i == node.children.len() - 1;
            let (first_prefix, rest_prefix) = if last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let child_lines = self.render_node(child);
            lines.push(format!("{}{}", first_prefix, child_lines[0]));
            for line in &child_lines[1..] {
                lines.push(format!("{}{}", rest_prefix, line));
            }
        }
        lines
    }

    fn node_json(&self, id: NodeId) -> serde_json::Value {
        let node = &self.nodes[id];
        serde_json::json!({
            "prediction": &node.prediction,
            "children": node
                .children
                .iter()
                .map(|&child| self.node_json(child))
                .collect::<Vec<_>>(),
        })
    }
}

/// All prediction trees, keyed by first-statement template id
#[derive(Clone, Debug, Default)]
pub struct TreeModel {
    trees: FxHashMap<u32, PredictionTree>,
}

impl TreeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self, first_template_id: u32) -> Option<&PredictionTree> {
        self.trees.get(&first_template_id)
    }

    /// The tree rooted at the given first-statement id, created with the
    /// supplied root payload on first sight.
    pub fn tree_or_insert(&mut self, first_template_id: u32, root: Prediction) -> &mut PredictionTree {
        self.trees
            .entry(first_template_id)
            .or_insert_with(|| PredictionTree::new(root))
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &PredictionTree)> {
        self.trees.iter()
    }

    /// Pretty-printed structural JSON of every tree.
    pub fn to_json(&self) -> String {
        let mut roots: Vec<&u32> = self.trees.keys().collect();
        roots.sort();
        let trees: serde_json::Map<String, serde_json::Value> = roots
            .into_iter()
            .map(|root| {
                let tree = &self.trees[root];
                (root.to_string(), tree.node_json(tree.root()))
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::Value::Object(trees))
            .unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_links() {
        let mut tree = PredictionTree::new(Prediction::random(0, 1));
        let a = tree.add_child(tree.root(), Prediction::random(1, 0));
        let b = tree.add_child(tree.root(), Prediction::random(2, 0));
        let c = tree.add_child(a, Prediction::random(3, 0));
        assert_eq!(tree.children(tree.root()), &[a, b]);
        assert_eq!(tree.parent(c), Some(a));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.size(), 4);
    }

    #[test]
    fn test_avg_degree() {
        let mut tree = PredictionTree::new(Prediction::random(0, 0));
        assert_eq!(tree.avg_degree(), 0.0);
        let a = tree.add_child(tree.root(), Prediction::random(1, 0));
        tree.add_child(tree.root(), Prediction::random(2, 0));
        tree.add_child(a, Prediction::random(3, 0));
        // Root has 2 children, `a` has 1: average 1.5 over two non-leaves.
        assert!((tree.avg_degree() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_uses_box_drawing() {
        let mut tree = PredictionTree::new(Prediction::random(0, 0));
        tree.add_child(tree.root(), Prediction::random(1, 0));
        tree.add_child(tree.root(), Prediction::random(2, 0));
        let rendered = tree.render();
        assert!(rendered.contains("├── "));
        assert!(rendered.contains("└── "));
    }

    #[test]
    fn test_model_reuses_trees() {
        let mut model = TreeModel::new();
        model.tree_or_insert(7, Prediction::random(7, 2));
        let tree = model.tree_or_insert(7, Prediction::random(7, 5));
        // First root wins; the second payload is ignored.
        assert_eq!(tree.prediction(0).param_ops.len(), 2);
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_to_json_is_structural() {
        let mut model = TreeModel::new();
        model.tree_or_insert(3, Prediction::random(3, 1));
        let json = model.to_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("3").is_some());
    }
}
