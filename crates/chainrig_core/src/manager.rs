// SPDX-License-Identifier: MIT OR Apache-2.0
//! Manager-node helpers.
//!
//! A manager node is the durable graph handle for a rig entity. Its name
//! carries a fixed prefix plus the entity's internal name, and its hub
//! attribute fans out to the members it manages. Entities are rebuilt from
//! a manager by walking those connections; nothing is stored outside the
//! scene.

use crate::error::RigError;
use crate::topology::{is_single_chain, reorder_single_chain};
use chainrig_scene::{Attr, NodeId, NodeKind, Scene};

/// Name prefix of bound-chain manager nodes
pub const BOUND_PREFIX: &str = "MNG_BOUND_";
/// Name prefix of driver-chain manager nodes
pub const DRIVER_PREFIX: &str = "MNG_DRIVER_";
/// Name prefix of connector manager nodes
pub const CONNECTOR_PREFIX: &str = "MNG_CONNECTOR_";

/// Hub attribute on bound managers
pub const BOUND_HUB: &str = "boundMng";
/// Hub attribute on driver managers
pub const DRIVER_HUB: &str = "drvMng";
/// Hub attribute on connector managers
pub const CONNECTOR_HUB: &str = "cntMng";

/// Cross-link attribute on driver and connector managers
pub const LINK_ATTR: &str = "Manager";

/// Marker attribute wiring a joint to its bound manager
pub const BOUND_MARKER: &str = "bound";
/// Marker attribute wiring a joint to its driver manager
pub const DRIVER_MARKER: &str = "driver";

/// Default ceiling on drivers attached to one bound manager.
///
/// Ten per chain; more than that is nonsense.
pub const DRIVER_SLOT_LIMIT: usize = 10;

/// Create a bound manager node `MNG_BOUND_<name>` with its hub attribute
pub fn add_bound_manager(scene: &mut impl Scene, name: &str) -> Result<NodeId, RigError> {
    let manager = scene.create_group(&format!("{BOUND_PREFIX}{name}"));
    scene.add_attribute(manager, BOUND_HUB)?;
    scene.set_hidden(manager, true)?;
    tracing::debug!("created bound manager `{BOUND_PREFIX}{name}`");
    Ok(manager)
}

/// Create a driver manager node `MNG_DRIVER_<name>` with hub and link
/// attributes
pub fn add_driver_manager(scene: &mut impl Scene, name: &str) -> Result<NodeId, RigError> {
    let manager = scene.create_group(&format!("{DRIVER_PREFIX}{name}"));
    scene.add_attribute(manager, DRIVER_HUB)?;
    scene.add_attribute(manager, LINK_ATTR)?;
    scene.set_hidden(manager, true)?;
    tracing::debug!("created driver manager `{DRIVER_PREFIX}{name}`");
    Ok(manager)
}

/// Create a connector manager node `MNG_CONNECTOR_<name>` with hub and link
/// attributes
pub fn add_connector_manager(scene: &mut impl Scene, name: &str) -> Result<NodeId, RigError> {
    let manager = scene.create_group(&format!("{CONNECTOR_PREFIX}{name}"));
    scene.add_attribute(manager, CONNECTOR_HUB)?;
    scene.add_attribute(manager, LINK_ATTR)?;
    scene.set_hidden(manager, true)?;
    tracing::debug!("created connector manager `{CONNECTOR_PREFIX}{name}`");
    Ok(manager)
}

/// Strip the expected prefix off a manager's name, yielding the internal
/// name. Fails with [`RigError::ManagerMismatch`] when the prefix is absent.
pub fn internal_name(
    scene: &impl Scene,
    manager: NodeId,
    prefix: &str,
    expected: &'static str,
) -> Result<String, RigError> {
    let name = scene.node_name(manager)?;
    match name.strip_prefix(prefix) {
        Some(stripped) => Ok(stripped.to_owned()),
        None => Err(RigError::ManagerMismatch {
            node: name,
            expected,
        }),
    }
}

/// Recover the joint chain managed by a bound manager, in root-to-leaf
/// order. Fails when the manager prefix is wrong or the recovered set is
/// not a single chain.
pub fn joints_from_bound_manager(
    scene: &impl Scene,
    manager: NodeId,
) -> Result<Vec<NodeId>, RigError> {
    internal_name(scene, manager, BOUND_PREFIX, "bound")?;
    let members: Vec<NodeId> = scene
        .attr_outputs(&Attr::new(manager, BOUND_HUB))
        .into_iter()
        .map(|a| a.node)
        .collect();
    let joints = reorder_single_chain(scene, &members)?;
    if is_single_chain(scene, &joints) {
        Ok(joints)
    } else {
        Err(RigError::Topology(
            "bound manager does not connect to a proper joint chain; remove and rebuild"
                .to_owned(),
        ))
    }
}

/// Recover the joints managed by a driver manager.
///
/// The driver hub also fans out to the master group pair, so non-joint
/// members are filtered. Driver chains are detached duplicates and may be
/// mid-heal, so a failed reorder falls back to hub order instead of
/// raising.
pub fn joints_from_driver_manager(
    scene: &impl Scene,
    manager: NodeId,
) -> Result<Vec<NodeId>, RigError> {
    internal_name(scene, manager, DRIVER_PREFIX, "driver")?;
    let joints: Vec<NodeId> = scene
        .attr_outputs(&Attr::new(manager, DRIVER_HUB))
        .into_iter()
        .map(|a| a.node)
        .filter(|&n| matches!(scene.node_kind(n), Ok(NodeKind::Joint)))
        .collect();
    Ok(reorder_single_chain(scene, &joints).unwrap_or(joints))
}

/// Recover the ordered driver-output / bound-input attribute pairs from a
/// connector manager's helper node.
///
/// Reads the helper's user-defined `c_*` pass-through attributes in
/// creation order; each one's incoming connection is the driver output and
/// its outgoing connection the bound input.
pub fn connector_io_from_manager(
    scene: &impl Scene,
    manager: NodeId,
) -> Result<(Vec<Attr>, Vec<Attr>), RigError> {
    internal_name(scene, manager, CONNECTOR_PREFIX, "connector")?;
    let helpers = scene.attr_outputs(&Attr::new(manager, CONNECTOR_HUB));
    let helper = helpers
        .first()
        .map(|a| a.node)
        .ok_or_else(|| RigError::MissingLink {
            manager: scene.node_name(manager).unwrap_or_default(),
            missing: "helper node",
        })?;

    let mut driver_outputs = Vec::new();
    let mut bound_inputs = Vec::new();
    for attr_name in scene.user_attributes(helper)? {
        if !attr_name.starts_with("c_") {
            continue;
        }
        let passthrough = Attr::new(helper, attr_name);
        let source = scene
            .attr_inputs(&passthrough)
            .into_iter()
            .next()
            .ok_or_else(|| RigError::MissingLink {
                manager: scene.node_name(manager).unwrap_or_default(),
                missing: "pass-through input",
            })?;
        let dest = scene
            .attr_outputs(&passthrough)
            .into_iter()
            .next()
            .ok_or_else(|| RigError::MissingLink {
                manager: scene.node_name(manager).unwrap_or_default(),
                missing: "pass-through output",
            })?;
        driver_outputs.push(source);
        bound_inputs.push(dest);
    }
    Ok((driver_outputs, bound_inputs))
}

/// Find the first free driver slot on a bound manager.
///
/// Slot attributes `Manager0..Manager<limit-1>` are allocated lazily: a
/// slot that has never been used is created on demand. Fails loudly with
/// [`RigError::SlotExhaustion`] when every slot up to the ceiling holds an
/// incoming connection.
pub fn empty_driver_slot(
    scene: &mut impl Scene,
    bound_manager: NodeId,
    limit: usize,
) -> Result<Attr, RigError> {
    internal_name(scene, bound_manager, BOUND_PREFIX, "bound")?;
    for x in 0..limit {
        let slot_name = format!("{LINK_ATTR}{x}");
        if !scene.has_attribute(bound_manager, &slot_name) {
            scene.add_attribute(bound_manager, &slot_name)?;
            return Ok(Attr::new(bound_manager, slot_name));
        }
        let slot = Attr::new(bound_manager, slot_name);
        if scene.attr_inputs(&slot).is_empty() {
            return Ok(slot);
        }
    }
    Err(RigError::SlotExhaustion {
        manager: scene.node_name(bound_manager)?,
        limit,
    })
}

/// Disconnect every joint from a bound manager's hub
pub fn clear_bound_manager(scene: &mut impl Scene, manager: NodeId) -> Result<(), RigError> {
    let joints = joints_from_bound_manager(scene, manager)?;
    for j in joints {
        scene.disconnect(&Attr::new(j, BOUND_MARKER))?;
    }
    Ok(())
}

/// Disconnect every joint from a driver manager's hub
pub fn clear_driver_manager(scene: &mut impl Scene, manager: NodeId) -> Result<(), RigError> {
    let joints = joints_from_driver_manager(scene, manager)?;
    for j in joints {
        scene.disconnect(&Attr::new(j, DRIVER_MARKER))?;
    }
    Ok(())
}

fn cleanup_managers(
    scene: &mut impl Scene,
    prefix: &str,
    hub: &str,
) -> Result<usize, RigError> {
    let mut removed = 0;
    for manager in scene.find_by_prefix(prefix) {
        let is_transform = matches!(scene.node_kind(manager), Ok(NodeKind::Transform));
        if is_transform && scene.attr_outputs(&Attr::new(manager, hub)).is_empty() {
            tracing::info!("removing empty manager `{}`", scene.node_name(manager)?);
            scene.delete(manager)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Delete every bound manager whose hub manages nothing; returns the count
pub fn cleanup_bound_managers(scene: &mut impl Scene) -> Result<usize, RigError> {
    cleanup_managers(scene, BOUND_PREFIX, BOUND_HUB)
}

/// Delete every driver manager whose hub manages nothing; returns the count
pub fn cleanup_driver_managers(scene: &mut impl Scene) -> Result<usize, RigError> {
    cleanup_managers(scene, DRIVER_PREFIX, DRIVER_HUB)
}

/// Delete every connector manager whose hub manages nothing; returns the
/// count
pub fn cleanup_connector_managers(scene: &mut impl Scene) -> Result<usize, RigError> {
    cleanup_managers(scene, CONNECTOR_PREFIX, CONNECTOR_HUB)
}

/// Compensating-action list for non-atomic construction sequences.
///
/// Scene mutations are not transactional; constructors record every node
/// they create and delete them in reverse order when a later step fails,
/// so a validation error cannot strand helper nodes.
#[derive(Debug, Default)]
pub(crate) struct Rollback {
    created: Vec<NodeId>,
}

impl Rollback {
    /// Record a freshly created node
    pub fn track(&mut self, node: NodeId) -> NodeId {
        self.created.push(node);
        node
    }

    /// Delete every recorded node that is still alive, newest first
    pub fn abort(self, scene: &mut impl Scene) {
        for node in self.created.into_iter().rev() {
            if scene.exists(node) {
                if let Ok(name) = scene.node_name(node) {
                    tracing::debug!("rolling back `{name}`");
                }
                let _ = scene.delete(node);
            }
        }
    }

    /// Keep everything; the sequence completed
    pub fn commit(self) {}
}
