// SPDX-License-Identifier: MIT OR Apache-2.0
//! Driver chains: detached proxy joint chains that animate bound chains
//! through connectors.

use crate::error::RigError;
use crate::manager::{
    add_driver_manager, clear_driver_manager, internal_name, joints_from_driver_manager,
    Rollback, CONNECTOR_PREFIX, DRIVER_HUB, DRIVER_MARKER, DRIVER_PREFIX, LINK_ATTR,
};
use chainrig_scene::{generate_shape, Attr, ControllerShape, NodeId, Scene};
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// Marker attribute on the master group
const MASTER_MARKER: &str = "driverGrp";
/// Marker attribute on the master offset group
const MASTER_OFFSET_MARKER: &str = "driverGrpOffset";

/// A proxy joint chain with its manager node and master group pair.
///
/// The master *offset* group holds the chain's placement under whatever
/// parent it is given; the inner master group is the direct parent of the
/// chain's start joint. Both carry marker attributes wired from the
/// manager hub so they can be rediscovered from the graph alone.
#[derive(Debug)]
pub struct DriverChain {
    name: String,
    joints: Vec<NodeId>,
    start: NodeId,
    end: NodeId,
    parent: Option<NodeId>,
    manager: NodeId,
    master_grp: NodeId,
    master_offset: NodeId,
    pub(crate) connector_plugs: Vec<NodeId>,
}

impl DriverChain {
    /// Build a driver chain over an existing detached joint chain.
    ///
    /// Requires a non-empty joint list (a driver chain has no meaningful
    /// empty state). Creates the manager node, wires every joint's
    /// `driver` marker to the hub, and builds the master group pair around
    /// the start joint.
    pub fn new(
        scene: &mut impl Scene,
        joints: Vec<NodeId>,
        name: &str,
    ) -> Result<Self, RigError> {
        if joints.is_empty() {
            return Err(RigError::EmptyChain);
        }

        let mut rollback = Rollback::default();
        match Self::build(scene, joints, name, &mut rollback) {
            Ok(chain) => {
                rollback.commit();
                Ok(chain)
            }
            Err(e) => {
                rollback.abort(scene);
                Err(e)
            }
        }
    }

    fn build(
        scene: &mut impl Scene,
        joints: Vec<NodeId>,
        name: &str,
        rollback: &mut Rollback,
    ) -> Result<Self, RigError> {
        let start = joints[0];
        let end = *joints.last().unwrap_or(&start);

        let manager = rollback.track(add_driver_manager(scene, name)?);
        for &j in &joints {
            if !scene.has_attribute(j, DRIVER_MARKER) {
                scene.add_attribute(j, DRIVER_MARKER)?;
            }
            scene.connect(&Attr::new(manager, DRIVER_HUB), &Attr::new(j, DRIVER_MARKER))?;
        }

        let (master_grp, master_offset) =
            make_master_grp(scene, manager, name, start, rollback)?;

        Ok(Self {
            name: name.to_owned(),
            joints,
            start,
            end,
            parent: None,
            manager,
            master_grp,
            master_offset,
            connector_plugs: Vec::new(),
        })
    }

    /// Rebuild a driver chain from its manager node.
    ///
    /// Joints come back from the hub in canonical order when the chain
    /// still reorders cleanly, hub order otherwise. The master group pair
    /// is rediscovered via its marker attributes; a missing half triggers
    /// self-healing (stale partner deleted, fresh pair created) rather
    /// than a hard failure. Connector references are recovered from the
    /// manager's outgoing `Manager` links.
    pub fn from_manager(scene: &mut impl Scene, manager: NodeId) -> Result<Self, RigError> {
        let name = internal_name(scene, manager, DRIVER_PREFIX, "driver")?;
        let joints = joints_from_driver_manager(scene, manager)?;
        if joints.is_empty() {
            return Err(RigError::EmptyChain);
        }
        let start = joints[0];
        let end = *joints.last().unwrap_or(&start);

        let (master_grp, master_offset) =
            discover_master_grp(scene, manager, &name, start)?;

        let connector_plugs = scene
            .attr_outputs(&Attr::new(manager, LINK_ATTR))
            .into_iter()
            .map(|a| a.node)
            .filter(|&n| {
                scene
                    .node_name(n)
                    .is_ok_and(|name| name.starts_with(CONNECTOR_PREFIX))
            })
            .collect();

        Ok(Self {
            name,
            joints,
            start,
            end,
            parent: scene.parent(master_offset),
            manager,
            master_grp,
            master_offset,
            connector_plugs,
        })
    }

    /// Replace the joint membership, rewiring the manager hub to the new
    /// set
    pub fn set_joints(
        &mut self,
        scene: &mut impl Scene,
        joints: Vec<NodeId>,
    ) -> Result<(), RigError> {
        if joints.is_empty() {
            return Err(RigError::EmptyChain);
        }
        clear_driver_manager(scene, self.manager)?;
        for &j in &joints {
            if !scene.has_attribute(j, DRIVER_MARKER) {
                scene.add_attribute(j, DRIVER_MARKER)?;
            }
            scene.connect(
                &Attr::new(self.manager, DRIVER_HUB),
                &Attr::new(j, DRIVER_MARKER),
            )?;
        }
        self.start = joints[0];
        self.end = *joints.last().unwrap_or(&self.start);
        self.joints = joints;
        Ok(())
    }

    /// Reparent the master offset group under the given transform and
    /// record it as this chain's logical parent
    pub fn set_parent(
        &mut self,
        scene: &mut impl Scene,
        parent: NodeId,
    ) -> Result<(), RigError> {
        scene.reparent(self.master_offset, Some(parent))?;
        self.parent = Some(parent);
        Ok(())
    }

    /// Dress every joint with a display-only controller curve.
    ///
    /// Generates a temporary shape transform per joint, transfers its
    /// curve child onto the joint as `<joint>Shape`, and discards the
    /// temporary transform. Purely cosmetic; no persisted entity state.
    pub fn create_joint_controller(
        &self,
        scene: &mut impl Scene,
        shape: ControllerShape,
    ) -> Result<(), RigError> {
        for &j in &self.joints {
            let joint_name = scene.node_name(j)?;
            let temp = generate_shape(scene, shape, &format!("temp_{joint_name}"));
            // generate_shape yields exactly one curve child
            if let Some(curve) = scene.children(temp).into_iter().next() {
                scene.rename(curve, &format!("{joint_name}Shape"))?;
                scene.reparent(curve, Some(j))?;
                scene.set_local_transform(curve, Mat4::IDENTITY)?;
            }
            scene.delete(temp)?;
        }
        Ok(())
    }

    /// Delete the manager node and the master offset group, consuming the
    /// entity. The offset group's subtree goes with it, joints included.
    pub fn delete(self, scene: &mut impl Scene) -> Result<(), RigError> {
        tracing::info!("deleting driver chain `{}`", self.name);
        scene.delete(self.manager)?;
        if scene.exists(self.master_offset) {
            scene.delete(self.master_offset)?;
        }
        Ok(())
    }

    /// Internal name (manager name without the prefix)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This chain's manager node
    pub fn manager(&self) -> NodeId {
        self.manager
    }

    /// Joints in root-to-leaf order
    pub fn joints(&self) -> &[NodeId] {
        &self.joints
    }

    /// Number of joints
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// First joint of the chain
    pub fn start_joint(&self) -> NodeId {
        self.start
    }

    /// Last joint of the chain
    pub fn end_joint(&self) -> NodeId {
        self.end
    }

    /// Logical parent recorded by [`Self::set_parent`]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Master group and master offset group, in that order
    pub fn master_grp_pair(&self) -> (NodeId, NodeId) {
        (self.master_grp, self.master_offset)
    }

    /// Managers of the connectors fed by this chain
    pub fn connector_plugs(&self) -> &[NodeId] {
        &self.connector_plugs
    }

    /// Read-only snapshot for diagnostics and external tooling
    pub fn info(&self, scene: &impl Scene) -> Result<DriverChainInfo, RigError> {
        let mut joints = Vec::with_capacity(self.joints.len());
        for &j in &self.joints {
            joints.push(scene.node_name(j)?);
        }
        let mut connector_plugs = Vec::with_capacity(self.connector_plugs.len());
        for &c in &self.connector_plugs {
            connector_plugs.push(scene.node_name(c)?);
        }
        let parent = match self.parent {
            Some(p) => Some(scene.node_name(p)?),
            None => None,
        };
        Ok(DriverChainInfo {
            name: self.name.clone(),
            manager: scene.node_name(self.manager)?,
            joints,
            start_joint: scene.node_name(self.start)?,
            end_joint: scene.node_name(self.end)?,
            parent,
            joint_count: self.joints.len(),
            master_groups: [
                scene.node_name(self.master_grp)?,
                scene.node_name(self.master_offset)?,
            ],
            connector_plugs,
        })
    }
}

/// Create the master group pair around the chain's start joint.
///
/// The offset group is world-aligned to the start joint; the inner master
/// group sits at identity beneath it and adopts the start joint. Both are
/// marked and wired to the manager hub for later rediscovery.
fn make_master_grp(
    scene: &mut impl Scene,
    manager: NodeId,
    name: &str,
    start: NodeId,
    rollback: &mut Rollback,
) -> Result<(NodeId, NodeId), RigError> {
    let master_grp = rollback.track(scene.create_group(&format!("masterGrp_{name}")));
    let master_offset = rollback.track(scene.create_group(&format!("masterGrp_{name}Offset")));
    scene.reparent(master_grp, Some(master_offset))?;
    scene.align_world_transform(start, master_offset)?;
    scene.reparent(start, Some(master_grp))?;

    scene.add_attribute(master_grp, MASTER_MARKER)?;
    scene.add_attribute(master_offset, MASTER_OFFSET_MARKER)?;
    scene.connect(
        &Attr::new(manager, DRIVER_HUB),
        &Attr::new(master_grp, MASTER_MARKER),
    )?;
    scene.connect(
        &Attr::new(manager, DRIVER_HUB),
        &Attr::new(master_offset, MASTER_OFFSET_MARKER),
    )?;
    Ok((master_grp, master_offset))
}

/// Rediscover the master group pair from the manager hub, healing a
/// partial pair by rebuilding it.
fn discover_master_grp(
    scene: &mut impl Scene,
    manager: NodeId,
    name: &str,
    start: NodeId,
) -> Result<(NodeId, NodeId), RigError> {
    let mut master_grp = None;
    let mut master_offset = None;
    for out in scene.attr_outputs(&Attr::new(manager, DRIVER_HUB)) {
        if scene.has_attribute(out.node, MASTER_MARKER) {
            master_grp = Some(out.node);
        }
        if scene.has_attribute(out.node, MASTER_OFFSET_MARKER) {
            master_offset = Some(out.node);
        }
    }

    match (master_grp, master_offset) {
        (Some(grp), Some(offset)) => Ok((grp, offset)),
        (grp, offset) => {
            tracing::info!("driver `{name}` has a partial master group pair, rebuilding");
            // Lift the chain out before discarding the stale pair
            scene.reparent(start, None)?;
            if let Some(stale) = grp {
                scene.delete(stale)?;
            }
            if let Some(stale) = offset {
                scene.delete(stale)?;
            }
            let mut rollback = Rollback::default();
            match make_master_grp(scene, manager, name, start, &mut rollback) {
                Ok(pair) => {
                    rollback.commit();
                    Ok(pair)
                }
                Err(e) => {
                    rollback.abort(scene);
                    Err(e)
                }
            }
        }
    }
}

/// Snapshot of a [`DriverChain`] for diagnostics/serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverChainInfo {
    /// Internal name
    pub name: String,
    /// Manager node name
    pub manager: String,
    /// Joint names in root-to-leaf order
    pub joints: Vec<String>,
    /// Start joint name
    pub start_joint: String,
    /// End joint name
    pub end_joint: String,
    /// Logical parent name, if any
    pub parent: Option<String>,
    /// Number of joints
    pub joint_count: usize,
    /// Master group and master offset group names, in that order
    pub master_groups: [String; 2],
    /// Connector manager names fed by this chain
    pub connector_plugs: Vec<String>,
}
