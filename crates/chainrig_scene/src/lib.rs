// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene-graph capability layer for `ChainRig`.
//!
//! This crate models the host-application surface the rigging core consumes:
//! - Node creation (transform groups, joints, skin deformers, curve shapes)
//! - Per-node user attributes and attribute-to-attribute connections
//! - Transform hierarchy with world-placement-preserving reparenting
//! - Subtree deletion, renaming, name-prefix queries
//! - Controller-shape generation
//!
//! ## Architecture
//!
//! The [`Scene`] trait is the capability contract; [`MemoryScene`] is an
//! in-memory reference implementation used as the test double and as a
//! standalone scene for headless tooling. The rigging core only ever talks
//! to the trait.

pub mod node;
pub mod connection;
pub mod scene;
pub mod shape;

pub use node::{Attr, Node, NodeId, NodeKind};
pub use connection::{Connection, ConnectionId};
pub use scene::{MemoryScene, Scene, SceneError};
pub use shape::{generate_shape, ControllerShape};
