// SPDX-License-Identifier: MIT OR Apache-2.0
//! The scene capability trait and its in-memory reference implementation.

use crate::connection::{Connection, ConnectionId};
use crate::node::{Attr, Node, NodeId, NodeKind};
use glam::Mat4;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Error raised by scene operations
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Node handle does not resolve to a live node
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Attribute does not exist on the node
    #[error("attribute `{attr}` not found on node `{node}`")]
    AttributeNotFound {
        /// Node name
        node: String,
        /// Attribute name
        attr: String,
    },

    /// Attribute already exists on the node
    #[error("attribute `{attr}` already exists on node `{node}`")]
    AttributeExists {
        /// Node name
        node: String,
        /// Attribute name
        attr: String,
    },

    /// Destination attribute has no incoming connection to remove
    #[error("attribute `{attr}` on node `{node}` is not connected")]
    NotConnected {
        /// Node name
        node: String,
        /// Attribute name
        attr: String,
    },

    /// Reparenting would create a hierarchy cycle
    #[error("cannot parent `{node}` under its own descendant `{parent}`")]
    CircularHierarchy {
        /// Node being reparented
        node: String,
        /// Offending parent
        parent: String,
    },

    /// Node kind does not support the operation
    #[error("node `{node}` is a {kind:?}, which does not support this operation")]
    WrongKind {
        /// Node name
        node: String,
        /// Actual kind
        kind: NodeKind,
    },
}

/// Capability surface the rigging core requires from the host scene graph.
///
/// Every persistent effect of the core goes through this trait: node and
/// attribute creation, connection wiring and traversal, hierarchy edits,
/// deletion, and world-transform alignment.
pub trait Scene {
    /// Create a transform (group) node at world root
    fn create_group(&mut self, name: &str) -> NodeId;

    /// Create a joint node at world root
    fn create_joint(&mut self, name: &str) -> NodeId;

    /// Create a skin deformer node
    fn create_skin_deformer(&mut self, name: &str) -> NodeId;

    /// Create a curve shape node carrying control points
    fn create_curve(&mut self, name: &str, points: Vec<[f32; 3]>) -> NodeId;

    /// Whether the handle resolves to a live node
    fn exists(&self, node: NodeId) -> bool;

    /// Kind of the node
    fn node_kind(&self, node: NodeId) -> Result<NodeKind, SceneError>;

    /// Current name of the node
    fn node_name(&self, node: NodeId) -> Result<String, SceneError>;

    /// Rename the node
    fn rename(&mut self, node: NodeId, name: &str) -> Result<(), SceneError>;

    /// Hide or show the node in outliner-style listings
    fn set_hidden(&mut self, node: NodeId, hidden: bool) -> Result<(), SceneError>;

    /// Whether the node is hidden
    fn is_hidden(&self, node: NodeId) -> Result<bool, SceneError>;

    /// Add a user-defined attribute
    fn add_attribute(&mut self, node: NodeId, name: &str) -> Result<(), SceneError>;

    /// Whether the node carries the attribute (built-in or user-defined)
    fn has_attribute(&self, node: NodeId, name: &str) -> bool;

    /// User-defined attribute names in creation order
    fn user_attributes(&self, node: NodeId) -> Result<Vec<String>, SceneError>;

    /// Connect a source attribute to a destination attribute.
    ///
    /// A destination holds at most one incoming connection; connecting to
    /// an occupied destination replaces the existing link (last writer
    /// wins, as host connection engines do). Sources fan out freely.
    fn connect(&mut self, from: &Attr, to: &Attr) -> Result<ConnectionId, SceneError>;

    /// Remove the incoming connection of the destination attribute
    fn disconnect(&mut self, to: &Attr) -> Result<(), SceneError>;

    /// Destination attributes fed by this attribute
    fn attr_outputs(&self, attr: &Attr) -> Vec<Attr>;

    /// Source attributes feeding this attribute
    fn attr_inputs(&self, attr: &Attr) -> Vec<Attr>;

    /// Parent of the node, `None` at world root
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Direct children of the node
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Move the node under a new parent (`None` = world root), preserving
    /// its world placement
    fn reparent(&mut self, node: NodeId, new_parent: Option<NodeId>) -> Result<(), SceneError>;

    /// Delete the node, its entire subtree, and every connection touching
    /// a deleted node
    fn delete(&mut self, node: NodeId) -> Result<(), SceneError>;

    /// Live nodes whose name starts with the prefix, in creation order
    fn find_by_prefix(&self, prefix: &str) -> Vec<NodeId>;

    /// Local transform relative to the parent
    fn local_transform(&self, node: NodeId) -> Result<Mat4, SceneError>;

    /// Set the local transform
    fn set_local_transform(&mut self, node: NodeId, local: Mat4) -> Result<(), SceneError>;

    /// World transform (composition of the parent chain)
    fn world_transform(&self, node: NodeId) -> Result<Mat4, SceneError>;

    /// Set the target's local transform so its world transform matches the
    /// source's
    fn align_world_transform(&mut self, source: NodeId, target: NodeId)
        -> Result<(), SceneError>;

    /// Control points of a curve shape node
    fn curve_points(&self, node: NodeId) -> Result<Vec<[f32; 3]>, SceneError>;

    /// Render an attribute address as `node.attr` for diagnostics
    fn attr_path(&self, attr: &Attr) -> Result<String, SceneError> {
        Ok(format!("{}.{}", self.node_name(attr.node)?, attr.name))
    }
}

/// In-memory scene graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryScene {
    /// Nodes in the scene
    nodes: IndexMap<NodeId, Node>,
    /// Connections between attributes
    connections: IndexMap<ConnectionId, Connection>,
}

impl MemoryScene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Look up the first live node with the exact name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .values()
            .find(|n| n.name == name)
            .map(|n| n.id)
    }

    fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::NodeNotFound(id))
    }

    fn require_attr(&self, attr: &Attr) -> Result<(), SceneError> {
        let node = self.node(attr.node)?;
        if node.has_attr(&attr.name) {
            Ok(())
        } else {
            Err(SceneError::AttributeNotFound {
                node: node.name.clone(),
                attr: attr.name.clone(),
            })
        }
    }

    /// Collect `node` and every descendant, depth-first
    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = vec![node];
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            for child in self.children(current) {
                out.push(child);
                stack.push(child);
            }
        }
        out
    }

    fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }
}

impl Scene for MemoryScene {
    fn create_group(&mut self, name: &str) -> NodeId {
        self.add_node(Node::new(NodeKind::Transform, name))
    }

    fn create_joint(&mut self, name: &str) -> NodeId {
        self.add_node(Node::new(NodeKind::Joint, name))
    }

    fn create_skin_deformer(&mut self, name: &str) -> NodeId {
        self.add_node(Node::new(NodeKind::SkinDeformer, name))
    }

    fn create_curve(&mut self, name: &str, points: Vec<[f32; 3]>) -> NodeId {
        let mut node = Node::new(NodeKind::CurveShape, name);
        node.points = Some(points);
        self.add_node(node)
    }

    fn exists(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    fn node_kind(&self, node: NodeId) -> Result<NodeKind, SceneError> {
        Ok(self.node(node)?.kind)
    }

    fn node_name(&self, node: NodeId) -> Result<String, SceneError> {
        Ok(self.node(node)?.name.clone())
    }

    fn rename(&mut self, node: NodeId, name: &str) -> Result<(), SceneError> {
        self.node_mut(node)?.name = name.to_owned();
        Ok(())
    }

    fn set_hidden(&mut self, node: NodeId, hidden: bool) -> Result<(), SceneError> {
        self.node_mut(node)?.hidden = hidden;
        Ok(())
    }

    fn is_hidden(&self, node: NodeId) -> Result<bool, SceneError> {
        Ok(self.node(node)?.hidden)
    }

    fn add_attribute(&mut self, node: NodeId, name: &str) -> Result<(), SceneError> {
        let record = self.node(node)?;
        if record.has_attr(name) {
            return Err(SceneError::AttributeExists {
                node: record.name.clone(),
                attr: name.to_owned(),
            });
        }
        self.node_mut(node)?.user_attrs.insert(name.to_owned());
        Ok(())
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.nodes
            .get(&node)
            .is_some_and(|n| n.has_attr(name))
    }

    fn user_attributes(&self, node: NodeId) -> Result<Vec<String>, SceneError> {
        Ok(self.node(node)?.user_attrs.iter().cloned().collect())
    }

    fn connect(&mut self, from: &Attr, to: &Attr) -> Result<ConnectionId, SceneError> {
        self.require_attr(from)?;
        self.require_attr(to)?;

        // One incoming connection per destination; a new link evicts the old
        self.connections.retain(|_, c| c.to != *to);

        let connection = Connection::new(from.clone(), to.clone());
        let id = connection.id;
        self.connections.insert(id, connection);
        Ok(id)
    }

    fn disconnect(&mut self, to: &Attr) -> Result<(), SceneError> {
        let found = self
            .connections
            .values()
            .find(|c| c.to == *to)
            .map(|c| c.id);
        match found {
            Some(id) => {
                self.connections.swap_remove(&id);
                Ok(())
            }
            None => Err(SceneError::NotConnected {
                node: self.node(to.node)?.name.clone(),
                attr: to.name.clone(),
            }),
        }
    }

    fn attr_outputs(&self, attr: &Attr) -> Vec<Attr> {
        self.connections
            .values()
            .filter(|c| c.from == *attr)
            .map(|c| c.to.clone())
            .collect()
    }

    fn attr_inputs(&self, attr: &Attr) -> Vec<Attr> {
        self.connections
            .values()
            .filter(|c| c.to == *attr)
            .map(|c| c.from.clone())
            .collect()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.parent == Some(node))
            .map(|n| n.id)
            .collect()
    }

    fn reparent(&mut self, node: NodeId, new_parent: Option<NodeId>) -> Result<(), SceneError> {
        let world = self.world_transform(node)?;
        let parent_world = match new_parent {
            Some(p) => {
                if p == node || self.is_descendant_of(p, node) {
                    return Err(SceneError::CircularHierarchy {
                        node: self.node(node)?.name.clone(),
                        parent: self.node(p)?.name.clone(),
                    });
                }
                self.world_transform(p)?
            }
            None => Mat4::IDENTITY,
        };
        let record = self.node_mut(node)?;
        record.parent = new_parent;
        record.local = parent_world.inverse() * world;
        Ok(())
    }

    fn delete(&mut self, node: NodeId) -> Result<(), SceneError> {
        if !self.exists(node) {
            return Err(SceneError::NodeNotFound(node));
        }
        let doomed = self.subtree(node);
        for id in &doomed {
            self.nodes.swap_remove(id);
        }
        self.connections
            .retain(|_, c| !doomed.iter().any(|id| c.involves_node(*id)));
        Ok(())
    }

    fn find_by_prefix(&self, prefix: &str) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| n.name.starts_with(prefix))
            .map(|n| n.id)
            .collect()
    }

    fn local_transform(&self, node: NodeId) -> Result<Mat4, SceneError> {
        Ok(self.node(node)?.local)
    }

    fn set_local_transform(&mut self, node: NodeId, local: Mat4) -> Result<(), SceneError> {
        self.node_mut(node)?.local = local;
        Ok(())
    }

    fn world_transform(&self, node: NodeId) -> Result<Mat4, SceneError> {
        let record = self.node(node)?;
        match record.parent {
            Some(p) => Ok(self.world_transform(p)? * record.local),
            None => Ok(record.local),
        }
    }

    fn align_world_transform(
        &mut self,
        source: NodeId,
        target: NodeId,
    ) -> Result<(), SceneError> {
        let world = self.world_transform(source)?;
        let parent_world = match self.parent(target) {
            Some(p) => self.world_transform(p)?,
            None => Mat4::IDENTITY,
        };
        self.node_mut(target)?.local = parent_world.inverse() * world;
        Ok(())
    }

    fn curve_points(&self, node: NodeId) -> Result<Vec<[f32; 3]>, SceneError> {
        let record = self.node(node)?;
        record.points.clone().ok_or(SceneError::WrongKind {
            node: record.name.clone(),
            kind: record.kind,
        })
    }
}
