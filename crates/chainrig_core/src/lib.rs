// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rigging-graph management core for `ChainRig`.
//!
//! This crate organizes skeletal joint chains inside a live scene graph:
//! - Bound chains: joint chains skinned to geometry
//! - Driver chains: detached proxy chains that animate bound chains
//! - Connectors: pass-through attribute links wiring driver outputs to
//!   bound inputs
//!
//! ## Architecture
//!
//! Every entity is persisted as a *manager node* in the scene: a hidden,
//! prefix-named transform whose hub attribute fans out to the members it
//! manages. Entities are plain in-process views, reconstructible at any
//! time by walking the manager's connections (graph-as-database). All
//! persistent effects go through the [`chainrig_scene::Scene`] capability;
//! mutations are synchronous and non-transactional, with rollback lists on
//! construction and `cleanup_*_managers` sweeps for eventual consistency.

pub mod error;
pub mod topology;
pub mod manager;
pub mod bound;
pub mod driver;
pub mod connector;

pub use error::RigError;
pub use topology::{duplicate_single_chain, is_single_chain, reorder_single_chain};
pub use manager::{
    cleanup_bound_managers, cleanup_connector_managers, cleanup_driver_managers,
    DRIVER_SLOT_LIMIT,
};
pub use bound::{BoundChain, BoundChainInfo};
pub use driver::{DriverChain, DriverChainInfo};
pub use connector::{Connector, ConnectorInfo};
