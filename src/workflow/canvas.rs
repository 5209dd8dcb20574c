/// Free-form builder canvas
///
/// Nodes carry a kind, a label and the record data they stand for; edges are
/// source/target pairs, at most one per ordered pair. Connections are not
/// checked for cycles or kind compatibility.
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

const CANVAS_EXTENT: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Task,
    Agent,
    Model,
    Tool,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Task => "task",
            NodeKind::Agent => "agent",
            NodeKind::Model => "model",
            NodeKind::Tool => "tool",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    fn random() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            x: rng.gen_range(0.0..CANVAS_EXTENT),
            y: rng.gen_range(0.0..CANVAS_EXTENT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub data: Value,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Canvas {
    nodes: Vec<CanvasNode>,
    edges: Vec<CanvasEdge>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CanvasEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Place an empty node of `kind` at a random spot
    ///
    /// The id is the node count after insertion.
    pub fn add_node(&mut self, kind: NodeKind) -> &CanvasNode {
        let id = (self.nodes.len() + 1).to_string();
        let label = format!("New {}", kind);
        let data = json!({ "label": label, "type": kind.as_str() });
        self.push(id, kind, label, data)
    }

    /// Place a node standing for a stored record, keyed by the record id
    pub fn add_record_node(&mut self, id: &str, kind: NodeKind, data: Value) -> &CanvasNode {
        let label = data
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} {}", kind, id));
        self.push(id.to_string(), kind, label, data)
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        match self.nodes.iter_mut().find(|node| node.id == id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Drop a node and every edge touching it
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.id != id);
        self.edges.retain(|edge| edge.source != id && edge.target != id);
        self.nodes.len() != before
    }

    /// Link two nodes; an existing link between the same pair is returned as is
    pub fn connect(&mut self, source: &str, target: &str) -> &CanvasEdge {
        if let Some(index) = self
            .edges
            .iter()
            .position(|edge| edge.source == source && edge.target == target)
        {
            return &self.edges[index];
        }
        // Node ids may contain '-', so the derived id is not always unique
        let mut id = format!("e{}-{}", source, target);
        if self.edges.iter().any(|edge| edge.id == id) {
            id = format!("{}-{}", id, self.edges.len());
        }
        self.edges.push(CanvasEdge {
            id,
            source: source.to_string(),
            target: target.to_string(),
        });
        &self.edges[self.edges.len() - 1]
    }

    fn push(&mut self, id: String, kind: NodeKind, label: String, data: Value) -> &CanvasNode {
        self.nodes.push(CanvasNode {
            id,
            kind,
            label,
            data,
            position: Position::random(),
        });
        &self.nodes[self.nodes.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_nodes_are_numbered_and_inside_the_canvas() {
        let mut canvas = Canvas::new();
        for _ in 0..3 {
            canvas.add_node(NodeKind::Agent);
        }

        let node = canvas.add_node(NodeKind::Tool);
        assert_eq!(node.id, "4");
        assert_eq!(node.label, "New tool");
        assert_eq!(node.data["type"], "tool");
        assert!((0.0..500.0).contains(&node.position.x));
        assert!((0.0..500.0).contains(&node.position.y));
    }

    #[test]
    fn connect_accepts_any_pair() {
        let mut canvas = Canvas::new();
        canvas.add_node(NodeKind::Task);
        canvas.add_node(NodeKind::Model);

        canvas.connect("1", "2");
        canvas.connect("2", "1");
        canvas.connect("1", "1");

        assert_eq!(canvas.edges().len(), 3);
        let ids: std::collections::HashSet<_> = canvas.edges().iter().map(|e| &e.id).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(canvas.edges()[0].source, "1");
        assert_eq!(canvas.edges()[0].target, "2");
    }

    #[test]
    fn connecting_the_same_pair_twice_keeps_one_edge() {
        let mut canvas = Canvas::new();
        canvas.add_node(NodeKind::Agent);
        canvas.add_node(NodeKind::Tool);

        let first = canvas.connect("1", "2").clone();
        let second = canvas.connect("1", "2").clone();

        assert_eq!(first, second);
        assert_eq!(canvas.edges().len(), 1);
        assert_eq!(canvas.edges()[0].id, "e1-2");
    }

    #[test]
    fn edge_ids_stay_unique_for_dashed_node_ids() {
        let mut canvas = Canvas::new();
        canvas.connect("a-b", "c");
        canvas.connect("a", "b-c");

        assert_eq!(canvas.edges().len(), 2);
        assert_ne!(canvas.edges()[0].id, canvas.edges()[1].id);
    }

    #[test]
    fn removing_a_node_drops_its_edges() {
        let mut canvas = Canvas::new();
        canvas.add_node(NodeKind::Task);
        canvas.add_node(NodeKind::Agent);
        canvas.add_node(NodeKind::Tool);
        canvas.connect("1", "2");
        canvas.connect("2", "3");

        assert!(canvas.remove_node("3"));
        assert!(!canvas.remove_node("3"));
        assert_eq!(canvas.nodes().len(), 2);
        assert_eq!(canvas.edges().len(), 1);
    }

    #[test]
    fn record_nodes_use_the_record_name() {
        let mut canvas = Canvas::new();
        let node = canvas.add_record_node("abc", NodeKind::Task, json!({ "name": "Ingest" }));
        assert_eq!(node.id, "abc");
        assert_eq!(node.label, "Ingest");
        assert!(canvas.node("abc").is_some());
    }
}
