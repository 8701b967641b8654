/// The query-labelled prediction multigraph
///
/// Vertices are template ids; an edge records how often one statement
/// followed another and, per window path, which predictions derived the
/// successor's arguments. Edges only ever gain paths and predictions.
use fxhash::FxHashMap;

use crate::model::prediction::Prediction;
use crate::model::window::QueryPath;
use crate::trace::statement::Statement;

/// An edge to one successor template
#[derive(Clone, Debug)]
pub struct Edge {
    pub to: u32,
    pub weight: u64,
    pub predictions: FxHashMap<QueryPath, Vec<Prediction>>,
}

impl Edge {
    pub fn new(to: u32) -> Self {
        Self {
            to,
            weight: 0,
            predictions: FxHashMap::default(),
        }
    }

    /// The highest-hit prediction stored under this path.
    pub fn best_with_path(&self, path: &QueryPath) -> Option<&Prediction> {
        self.predictions
            .get(path)?
            .iter()
            .reduce(|best, p| if p.hits > best.hits { p } else { best })
    }

    /// Indices of the predictions under `path` that match the observed
    /// statement against the given window.
    pub fn matching_predictions(
        &self,
        path: &QueryPath,
        window: &[Statement],
        statement: &Statement,
    ) -> Vec<usize> {
        match self.predictions.get(path) {
            Some(predictions) => predictions
                .iter()
                .enumerate()
                .filter(|(_, p)| p.matches(window, statement))
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Append predictions under `path`, returning their indices.
    pub fn add_predictions(&mut self, path: QueryPath, predictions: Vec<Prediction>) -> Vec<usize> {
        let slot = self.predictions.entry(path).or_default();
        let start = slot.len();
        slot.extend(predictions);
        (start..slot.len()).collect()
    }
}

/// The outgoing edges of one vertex
#[derive(Clone, Debug, Default)]
pub struct EdgeList {
    edges: FxHashMap<u32, Edge>,
}

impl EdgeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The edge to `to`, created on first sight.
    pub fn edge_mut(&mut self, to: u32) -> &mut Edge {
        self.edges.entry(to).or_insert_with(|| Edge::new(to))
    }

    pub fn edge(&self, to: u32) -> Option<&Edge> {
        self.edges.get(&to)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &Edge)> {
        self.edges.iter()
    }

    /// The best prediction for the path across all outgoing edges.
    pub fn best_prediction(&self, path: &QueryPath) -> Option<&Prediction> {
        let mut best: Option<&Prediction> = None;
        for edge in self.edges.values() {
            if let Some(candidate) = edge.best_with_path(path) {
                if best.map_or(true, |b| candidate.hits > b.hits) {
                    best = Some(candidate);
                }
            }
        }
        best
    }
}

/// The whole graph model
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
    vertex_edges: FxHashMap<u32, EdgeList>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge_list(&self, from: u32) -> Option<&EdgeList> {
        self.vertex_edges.get(&from)
    }

    /// The edge list of `from`, created on first sight.
    pub fn edge_list_mut(&mut self, from: u32) -> &mut EdgeList {
        self.vertex_edges.entry(from).or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_edges.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_edges.len()
    }

    /// Pretty-printed structural JSON: vertices, edges, path-keyed
    /// prediction lists. Paths render as `"[id,id,…]"` keys.
    pub fn to_json(&self) -> String {
        let mut vertices: Vec<&u32> = self.vertex_edges.keys().collect();
        vertices.sort();
        let body: serde_json::Map<String, serde_json::Value> = vertices
            .into_iter()
            .map(|v| {
                let edge_list = &self.vertex_edges[v];
                let mut targets: Vec<&u32> = edge_list.edges.keys().collect();
                targets.sort();
                let edges: serde_json::Map<String, serde_json::Value> = targets
                    .into_iter()
                    .map(|to| {
                        let edge = &edge_list.edges[to];
                        let paths: serde_json::Map<String, serde_json::Value> = edge
                            .predictions
                            .iter()
                            .map(|(path, predictions)| {
                                (
                                    path.to_string(),
                                    serde_json::json!(predictions),
                                )
                            })
                            .collect();
                        (
                            to.to_string(),
                            serde_json::json!({
                                "weight": edge.weight,
                                "predictions": paths,
                            }),
                        )
                    })
                    .collect();
                (v.to_string(), serde_json::Value::Object(edges))
            })
            .collect();
        serde_json::to_string_pretty(&serde_json::Value::Object(body))
            .unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_of(ids: [u32; 7]) -> QueryPath {
        QueryPath(ids)
    }

    #[test]
    fn test_edges_are_created_on_demand() {
        let mut graph = GraphModel::new();
        let edge = graph.edge_list_mut(1).edge_mut(2);
        edge.weight += 1;
        assert_eq!(graph.edge_list(1).unwrap().edge(2).unwrap().weight, 1);
        assert!(graph.edge_list(9).is_none());
    }

    #[test]
    fn test_best_prediction_prefers_hits() {
        let mut graph = GraphModel::new();
        let path = path_of([0, 0, 0, 0, 0, 0, 1]);
        {
            let edge = graph.edge_list_mut(1).edge_mut(2);
            let mut low = Prediction::random(2, 0);
            low.hits = 1;
            let mut high = Prediction::random(2, 0);
            high.hits = 5;
            edge.add_predictions(path, vec![low, high]);
        }
        {
            let edge = graph.edge_list_mut(1).edge_mut(3);
            let mut mid = Prediction::random(3, 0);
            mid.hits = 3;
            edge.add_predictions(path, vec![mid]);
        }
        let best = graph.edge_list(1).unwrap().best_prediction(&path).unwrap();
        assert_eq!(best.template_id, 2);
        assert_eq!(best.hits, 5);
    }

    #[test]
    fn test_unknown_path_has_no_prediction() {
        let mut graph = GraphModel::new();
        graph.edge_list_mut(1).edge_mut(2);
        let missing = path_of([9, 9, 9, 9, 9, 9, 9]);
        assert!(graph.edge_list(1).unwrap().best_prediction(&missing).is_none());
    }

    #[test]
    fn test_to_json_renders_path_keys() {
        let mut graph = GraphModel::new();
        let path = path_of([0, 0, 0, 0, 0, 0, 1]);
        graph
            .edge_list_mut(1)
            .edge_mut(2)
            .add_predictions(path, vec![Prediction::random(2, 0)]);
        let json = graph.to_json();
        assert!(json.contains("[0,0,0,0,0,0,1]"));
    }
}
