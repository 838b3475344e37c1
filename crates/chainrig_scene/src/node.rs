// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the scene graph.

use glam::Mat4;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a scene node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain transform (group) node
    Transform,
    /// Skeletal joint
    Joint,
    /// Skin deformer bound to a joint chain
    SkinDeformer,
    /// Curve shape (display-only controller geometry)
    CurveShape,
}

impl NodeKind {
    /// Whether nodes of this kind carry the standard channel attributes
    /// (`translateX`..`scaleZ`, `worldMatrix`).
    pub fn has_channels(self) -> bool {
        matches!(self, Self::Transform | Self::Joint)
    }
}

/// Standard channel attributes present on every transform and joint.
pub const CHANNEL_ATTRS: [&str; 10] = [
    "translateX",
    "translateY",
    "translateZ",
    "rotateX",
    "rotateY",
    "rotateZ",
    "scaleX",
    "scaleY",
    "scaleZ",
    "worldMatrix",
];

/// Built-in input attribute on skin deformers that receives joint matrices.
pub const SKIN_MATRIX_ATTR: &str = "matrix";

/// An attribute address: a node plus the attribute name on it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attr {
    /// Node the attribute lives on
    pub node: NodeId,
    /// Attribute name
    pub name: String,
}

impl Attr {
    /// Create a new attribute address
    pub fn new(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
        }
    }
}

/// A node instance in the scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node kind
    pub kind: NodeKind,
    /// Node name (unique names are the caller's concern, as in most DCC scenes)
    pub name: String,
    /// Parent node, `None` at world root
    pub parent: Option<NodeId>,
    /// Local transform relative to the parent
    pub local: Mat4,
    /// Hidden from outliner-style listings
    pub hidden: bool,
    /// User-defined attributes, in creation order
    pub user_attrs: IndexSet<String>,
    /// Curve control points (curve shapes only)
    pub points: Option<Vec<[f32; 3]>>,
}

impl Node {
    /// Create a new node of the given kind
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            name: name.into(),
            parent: None,
            local: Mat4::IDENTITY,
            hidden: false,
            user_attrs: IndexSet::new(),
            points: None,
        }
    }

    /// Check whether the node carries an attribute, built-in or user-defined
    pub fn has_attr(&self, name: &str) -> bool {
        if self.kind.has_channels() && CHANNEL_ATTRS.contains(&name) {
            return true;
        }
        if self.kind == NodeKind::SkinDeformer && name == SKIN_MATRIX_ATTR {
            return true;
        }
        self.user_attrs.contains(name)
    }
}
