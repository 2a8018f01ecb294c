use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

/// Index of a node inside a [`SceneGraph`]. Only the graph hands these out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

pub struct Node<T> {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub payload: T,
}

impl<T> Node<T> {
    pub fn local_transform(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(self.translation), self.rotation)
    }

    /// Signed rotation about the vertical axis, in radians. Only meaningful
    /// for nodes that are only ever turned with [`SceneGraph::rotate_y`].
    pub fn yaw(&self) -> f32 {
        let q = self.rotation.quaternion();
        2.0 * q.j.atan2(q.w)
    }
}

/// Arena-backed transform tree. Nodes are appended after their parent, so a
/// parent's index is always lower than any of its children's.
pub struct SceneGraph<T> {
    nodes: Vec<Node<T>>,
}

impl<T> SceneGraph<T> {
    pub fn new(root: T) -> Self {
        SceneGraph {
            nodes: vec![Node {
                name: "scene".to_string(),
                parent: None,
                children: Vec::new(),
                translation: Vector3::zeros(),
                rotation: UnitQuaternion::identity(),
                payload: root,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: &str,
        translation: Vector3<f32>,
        payload: T,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            translation,
            rotation: UnitQuaternion::identity(),
            payload,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<T>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Rotates a node about its own vertical axis. Descendants follow through
    /// the composed transform.
    pub fn rotate_y(&mut self, id: NodeId, angle: f32) {
        let node = &mut self.nodes[id.0];
        node.rotation *= UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle);
    }

    pub fn world_transform(&self, id: NodeId) -> Isometry3<f32> {
        let node = &self.nodes[id.0];
        match node.parent {
            Some(parent) => self.world_transform(parent) * node.local_transform(),
            None => node.local_transform(),
        }
    }

    pub fn world_position(&self, id: NodeId) -> Point3<f32> {
        self.world_transform(id) * Point3::origin()
    }

    /// World transforms for every node, indexed like the arena.
    pub fn world_transforms(&self) -> Vec<Isometry3<f32>> {
        let mut transforms: Vec<Isometry3<f32>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.local_transform();
            let world = match node.parent {
                Some(parent) => transforms[parent.0] * local,
                None => local,
            };
            transforms.push(world);
        }
        transforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn nested() -> (SceneGraph<()>, NodeId, NodeId, NodeId) {
        let mut graph = SceneGraph::new(());
        let pivot = graph.add_child(graph.root(), "pivot", Vector3::zeros(), ());
        let body = graph.add_child(pivot, "body", Vector3::new(5.0, 0.0, 0.0), ());
        let moon = graph.add_child(body, "moon", Vector3::new(1.0, 0.0, 0.0), ());
        (graph, pivot, body, moon)
    }

    #[test]
    fn children_follow_parent_rotation() {
        let (mut graph, pivot, body, moon) = nested();
        graph.rotate_y(pivot, FRAC_PI_2);

        // +x rotated a quarter turn about +y lands on -z
        let (body, moon) = (graph.world_position(body), graph.world_position(moon));
        assert_relative_eq!(body, Point3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
        assert_relative_eq!(moon, Point3::new(0.0, 0.0, -6.0), epsilon = 1e-5);
    }

    #[test]
    fn rotations_accumulate() {
        let (mut graph, pivot, _, _) = nested();
        graph.rotate_y(pivot, 0.25);
        graph.rotate_y(pivot, 0.5);
        assert_relative_eq!(graph.node(pivot).yaw(), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn batch_transforms_match_single_lookups() {
        let (mut graph, pivot, _, moon) = nested();
        graph.rotate_y(pivot, 1.3);
        let all = graph.world_transforms();
        assert_eq!(all.len(), graph.len());
        let batched = all[moon.index()] * Point3::origin();
        assert_relative_eq!(batched, graph.world_position(moon), epsilon = 1e-5);
    }

    #[test]
    fn lookup_by_name() {
        let (graph, _, body, _) = nested();
        assert_eq!(graph.find("body"), Some(body));
        assert_eq!(graph.find("missing"), None);
        assert_eq!(graph.node(body).children.len(), 1);
    }
}
