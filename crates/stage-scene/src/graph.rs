//! Arena-backed scene graph
//!
//! Nodes live in a flat `Vec` and refer to each other by `NodeIndex`.
//! The graph keeps a uuid index so script bindings can resolve their node
//! without walking the tree.

use serde_json::{Map, Value};
use stage_animation::{AnimationClip, AnimationMixer};
use stage_core::{mat4_mul, NodeId, Result, Shared, StageError, Transform};
use std::collections::HashMap;
use std::sync::Arc;

/// Active scene, shared between the player and script handles
pub type SharedScene = Shared<SceneGraph>;

/// Position of a node within its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub fn raw(self) -> usize {
        self.0
    }
}

/// A single scene-graph node
#[derive(Debug, Clone)]
pub struct Node {
    pub uuid: NodeId,
    pub name: String,
    /// Object type as written in the document ("Mesh", "Group", ...)
    pub kind: String,
    pub transform: Transform,
    pub visible: bool,
    pub user_data: Map<String, Value>,
    /// Clips attached to this node by the document
    pub animations: Vec<Arc<AnimationClip>>,
    /// Blend state, present on the root once animations are bound
    pub mixer: Option<AnimationMixer>,
    parent: Option<NodeIndex>,
    children: Vec<NodeIndex>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            uuid: NodeId::generate(),
            name: name.into(),
            kind: kind.into(),
            transform: Transform::default(),
            visible: true,
            user_data: Map::new(),
            animations: Vec::new(),
            mixer: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = NodeId::from_raw(uuid);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_animation(mut self, clip: AnimationClip) -> Self {
        self.animations.push(Arc::new(clip));
        self
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}

/// A rooted tree of nodes
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    by_uuid: HashMap<NodeId, NodeIndex>,
}

impl SceneGraph {
    /// Create a graph whose root is `root`
    pub fn new(root: Node) -> Self {
        let mut by_uuid = HashMap::new();
        by_uuid.insert(root.uuid.clone(), NodeIndex(0));
        Self {
            nodes: vec![root],
            by_uuid,
        }
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    /// Attach `node` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeIndex, mut node: Node) -> Result<NodeIndex> {
        if parent.0 >= self.nodes.len() {
            return Err(StageError::NodeNotFound(format!("index {}", parent.0)));
        }
        if self.by_uuid.contains_key(&node.uuid) {
            return Err(StageError::SceneError(format!(
                "duplicate node uuid '{}'",
                node.uuid
            )));
        }

        let index = NodeIndex(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.by_uuid.insert(node.uuid.clone(), index);
        self.nodes.push(node);
        self.nodes[parent.0].children.push(index);
        Ok(index)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(index.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_uuid(&self, uuid: &str) -> Option<NodeIndex> {
        self.by_uuid.get(&NodeId::from_raw(uuid)).copied()
    }

    /// First node named `name` in pre-order
    pub fn find_by_name(&self, name: &str) -> Option<NodeIndex> {
        self.find_by_name_under(self.root(), name)
    }

    /// First node named `name` in the subtree rooted at `start` (inclusive)
    pub fn find_by_name_under(&self, start: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.traverse(start)
            .into_iter()
            .find(|&idx| self.nodes[idx.0].name == name)
    }

    /// Pre-order walk of the subtree rooted at `start`
    pub fn traverse(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::new();
        if start.0 >= self.nodes.len() {
            return order;
        }
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx.0].children.iter().rev().copied());
        }
        order
    }

    /// Indices of every node in pre-order from the root
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.traverse(self.root())
            .into_iter()
            .map(move |idx| (idx, &self.nodes[idx.0]))
    }

    /// Compose local transforms from the root down to `index`
    pub fn world_matrix(&self, index: NodeIndex) -> Option<[[f32; 4]; 4]> {
        let mut node = self.get(index)?;
        let mut matrix = node.transform.to_matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            matrix = mat4_mul(&node.transform.to_matrix(), &matrix);
        }
        Some(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_core::Vec3;

    fn sample_graph() -> SceneGraph {
        let mut graph = SceneGraph::new(Node::new("Scene", "Scene").with_uuid("root"));
        let root = graph.root();
        let group = graph
            .add_child(root, Node::new("Group", "Group").with_uuid("g"))
            .unwrap();
        graph
            .add_child(group, Node::new("Cube", "Mesh").with_uuid("cube"))
            .unwrap();
        graph
            .add_child(root, Node::new("Light", "PointLight").with_uuid("light"))
            .unwrap();
        graph
    }

    #[test]
    fn test_traverse_is_preorder() {
        let graph = sample_graph();
        let names: Vec<_> = graph.iter().map(|(_, n)| n.name.as_str()).collect();
        assert_eq!(names, vec!["Scene", "Group", "Cube", "Light"]);
    }

    #[test]
    fn test_find_by_uuid_is_recursive() {
        let graph = sample_graph();
        let cube = graph.find_by_uuid("cube").unwrap();
        assert_eq!(graph.get(cube).unwrap().name, "Cube");
        assert!(graph.find_by_uuid("missing").is_none());
    }

    #[test]
    fn test_find_by_name_under_subtree() {
        let graph = sample_graph();
        let group = graph.find_by_name("Group").unwrap();
        assert!(graph.find_by_name_under(group, "Cube").is_some());
        assert!(graph.find_by_name_under(group, "Light").is_none());
    }

    #[test]
    fn test_parent_links() {
        let graph = sample_graph();
        let cube = graph.find_by_uuid("cube").unwrap();
        let group = graph.get(cube).unwrap().parent().unwrap();
        assert_eq!(graph.get(group).unwrap().name, "Group");
        assert!(graph.get(graph.root()).unwrap().parent().is_none());
    }

    #[test]
    fn test_duplicate_uuid_rejected() {
        let mut graph = sample_graph();
        let root = graph.root();
        let err = graph
            .add_child(root, Node::new("Again", "Mesh").with_uuid("cube"))
            .unwrap_err();
        assert!(matches!(err, StageError::SceneError(_)));
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut graph = SceneGraph::new(
            Node::new("Scene", "Scene")
                .with_transform(Transform::from_position(Vec3::new(1.0, 0.0, 0.0))),
        );
        let root = graph.root();
        let child = graph
            .add_child(
                root,
                Node::new("Child", "Mesh")
                    .with_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();
        let m = graph.world_matrix(child).unwrap();
        assert_eq!(m[3], [1.0, 2.0, 0.0, 1.0]);
    }
}
