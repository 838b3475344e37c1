// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) definitions between node attributes.

use crate::node::{Attr, NodeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// A directed connection between two attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Source attribute
    pub from: Attr,
    /// Destination attribute
    pub to: Attr,
}

impl Connection {
    /// Create a new connection
    pub fn new(from: Attr, to: Attr) -> Self {
        Self {
            id: ConnectionId::new(),
            from,
            to,
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from.node == node_id || self.to.node == node_id
    }

    /// Check if this connection involves a specific attribute
    pub fn involves_attr(&self, attr: &Attr) -> bool {
        self.from == *attr || self.to == *attr
    }
}
