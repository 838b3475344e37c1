// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bound chains: skinned joint chains and the operations that attach
//! driver chains to them.

use crate::connector::Connector;
use crate::driver::DriverChain;
use crate::error::RigError;
use crate::manager::{
    add_bound_manager, clear_bound_manager, internal_name, joints_from_bound_manager,
    Rollback, BOUND_HUB, BOUND_MARKER, BOUND_PREFIX, CONNECTOR_PREFIX, LINK_ATTR,
};
use crate::topology::{duplicate_single_chain, is_single_chain};
use chainrig_scene::{Attr, NodeId, NodeKind, Scene};
use glam::Mat4;
use serde::{Deserialize, Serialize};

/// A skinned joint chain and its manager node.
///
/// The manager hub's outgoing connections are the source of truth for
/// membership; the entity itself is a reconstructible view. The skin list
/// is a derived cache of the deformers currently fed by the joints'
/// world matrices, recomputed on construction and on membership changes.
#[derive(Debug)]
pub struct BoundChain {
    name: String,
    joints: Vec<NodeId>,
    start: Option<NodeId>,
    end: Option<NodeId>,
    parent: Option<NodeId>,
    manager: NodeId,
    connector_plugs: Vec<NodeId>,
    skin_nodes: Vec<NodeId>,
}

impl BoundChain {
    /// Build a bound chain over existing skinned joints.
    ///
    /// The joint list must be a single chain in root-to-leaf order (empty
    /// is allowed; membership can be set later). Creates the manager node
    /// and wires every joint's `bound` marker attribute to the hub — that
    /// linkage is how the chain is later reconstructed from the node
    /// alone.
    pub fn new(
        scene: &mut impl Scene,
        joints: Vec<NodeId>,
        name: &str,
    ) -> Result<Self, RigError> {
        if !is_single_chain(scene, &joints) {
            return Err(RigError::Topology(
                "bound chain joints must form a single chain in root-to-leaf order".to_owned(),
            ));
        }

        let mut rollback = Rollback::default();
        let manager = match Self::create_manager(scene, &joints, name, &mut rollback) {
            Ok(manager) => {
                rollback.commit();
                manager
            }
            Err(e) => {
                rollback.abort(scene);
                return Err(e);
            }
        };

        let mut chain = Self {
            name: name.to_owned(),
            joints,
            start: None,
            end: None,
            parent: None,
            manager,
            connector_plugs: Vec::new(),
            skin_nodes: Vec::new(),
        };
        chain.refresh_endpoints(scene);
        chain.refresh_skin_list(scene);
        Ok(chain)
    }

    fn create_manager(
        scene: &mut impl Scene,
        joints: &[NodeId],
        name: &str,
        rollback: &mut Rollback,
    ) -> Result<NodeId, RigError> {
        let manager = rollback.track(add_bound_manager(scene, name)?);
        for &j in joints {
            if !scene.has_attribute(j, BOUND_MARKER) {
                scene.add_attribute(j, BOUND_MARKER)?;
            }
            tracing::debug!(
                "connecting manager `{}` to joint `{}`",
                scene.node_name(manager)?,
                scene.node_name(j)?
            );
            scene.connect(&Attr::new(manager, BOUND_HUB), &Attr::new(j, BOUND_MARKER))?;
        }
        Ok(manager)
    }

    /// Rebuild a bound chain from its manager node.
    ///
    /// Reads the hub's outgoing connections to recover the joint set,
    /// reorders it into canonical root-to-leaf order, and derives the
    /// internal name by stripping the manager prefix. Connector references
    /// are recovered from the manager's occupied driver slots. Fails when
    /// the recovered set is not a valid single chain.
    pub fn from_manager(scene: &impl Scene, manager: NodeId) -> Result<Self, RigError> {
        let name = internal_name(scene, manager, BOUND_PREFIX, "bound")?;
        let joints = joints_from_bound_manager(scene, manager)?;

        let mut connector_plugs = Vec::new();
        for slot_name in scene.user_attributes(manager)? {
            if !slot_name.starts_with(LINK_ATTR) {
                continue;
            }
            for input in scene.attr_inputs(&Attr::new(manager, slot_name.clone())) {
                let is_connector = scene
                    .node_name(input.node)
                    .is_ok_and(|n| n.starts_with(CONNECTOR_PREFIX));
                if is_connector {
                    connector_plugs.push(input.node);
                }
            }
        }

        let mut chain = Self {
            name,
            joints,
            start: None,
            end: None,
            parent: None,
            manager,
            connector_plugs,
            skin_nodes: Vec::new(),
        };
        chain.refresh_endpoints(scene);
        chain.refresh_skin_list(scene);
        Ok(chain)
    }

    /// Recompute start/end/parent from the current joint list
    fn refresh_endpoints(&mut self, scene: &impl Scene) {
        self.start = self.joints.first().copied();
        self.end = self.joints.last().copied();
        self.parent = self.start.and_then(|s| scene.parent(s));
    }

    /// Recompute the derived skin-deformer list from the current graph
    /// state.
    ///
    /// Scans each joint's `worldMatrix` outputs for skin deformers. The
    /// list is a cache, never authoritative.
    pub fn refresh_skin_list(&mut self, scene: &impl Scene) {
        self.skin_nodes.clear();
        for &j in &self.joints {
            for out in scene.attr_outputs(&Attr::new(j, "worldMatrix")) {
                let is_skin = matches!(scene.node_kind(out.node), Ok(NodeKind::SkinDeformer));
                if is_skin && !self.skin_nodes.contains(&out.node) {
                    self.skin_nodes.push(out.node);
                }
            }
        }
    }

    /// Create a proxy driver chain plus the connector wiring it to this
    /// chain, one pass-through link per (attribute, joint) pair.
    ///
    /// Every named attribute must exist on every bound joint — validated
    /// up front, before any graph mutation. The bound joints are
    /// duplicated into a detached chain named `drv_*<suffix>`, hung under
    /// a fresh master group pair aligned to this chain's parent (identity
    /// at world root), and wired back through a new [`Connector`]. The
    /// connector's manager is recorded on both chains.
    pub fn create_default_driver(
        &mut self,
        scene: &mut impl Scene,
        attributes: &[&str],
        suffix: &str,
    ) -> Result<(DriverChain, Connector), RigError> {
        for &attr in attributes {
            for &j in &self.joints {
                if !scene.has_attribute(j, attr) {
                    return Err(RigError::MissingAttribute {
                        joint: scene.node_name(j)?,
                        attr: attr.to_owned(),
                    });
                }
            }
        }

        let mut rollback = Rollback::default();
        match self.build_default_driver(scene, attributes, suffix, &mut rollback) {
            Ok(result) => {
                rollback.commit();
                Ok(result)
            }
            Err(e) => {
                rollback.abort(scene);
                Err(e)
            }
        }
    }

    fn build_default_driver(
        &mut self,
        scene: &mut impl Scene,
        attributes: &[&str],
        suffix: &str,
        rollback: &mut Rollback,
    ) -> Result<(DriverChain, Connector), RigError> {
        let driver_name = format!("drv_{}{suffix}", self.name);

        let driver_joints = duplicate_single_chain(scene, &self.joints)?;
        for &dj in &driver_joints {
            rollback.track(dj);
            let renamed = scene.node_name(dj)?.replace("dup_", "drv_") + suffix;
            scene.rename(dj, &renamed)?;
        }

        let mut driver = DriverChain::new(scene, driver_joints, &driver_name)?;
        rollback.track(driver.manager());
        let (master_grp, master_offset) = driver.master_grp_pair();
        rollback.track(master_offset);

        // Seat the master offset group where this chain's parent sits,
        // then hang the duplicate chain beneath it
        scene.reparent(driver.start_joint(), None)?;
        match self.start.and_then(|s| scene.parent(s)) {
            Some(parent) => scene.align_world_transform(parent, master_offset)?,
            None => scene.set_local_transform(master_offset, Mat4::IDENTITY)?,
        }
        scene.reparent(driver.start_joint(), Some(master_grp))?;

        let mut driver_outputs = Vec::new();
        let mut bound_inputs = Vec::new();
        for &attr in attributes {
            for &dj in driver.joints() {
                driver_outputs.push(Attr::new(dj, attr));
            }
            for &j in &self.joints {
                bound_inputs.push(Attr::new(j, attr));
            }
        }

        let connector = Connector::new(
            scene,
            self.manager,
            driver.manager(),
            driver_outputs,
            bound_inputs,
            &format!("con_{}{suffix}", self.name),
        )?;

        self.connector_plugs.push(connector.manager());
        driver.connector_plugs.push(connector.manager());
        Ok((driver, connector))
    }

    /// Delete the connector at the given index, leaving its driver chain
    /// intact
    pub fn delete_connection(
        &mut self,
        scene: &mut impl Scene,
        index: usize,
    ) -> Result<(), RigError> {
        let plug = *self
            .connector_plugs
            .get(index)
            .ok_or(RigError::ConnectorOutOfRange {
                index,
                count: self.connector_plugs.len(),
            })?;
        Connector::from_manager(scene, plug)?.delete(scene)?;
        self.connector_plugs.remove(index);
        Ok(())
    }

    /// Delete every connector, leaving the driver chains intact
    pub fn delete_connections(&mut self, scene: &mut impl Scene) -> Result<(), RigError> {
        for plug in std::mem::take(&mut self.connector_plugs) {
            Connector::from_manager(scene, plug)?.delete(scene)?;
        }
        Ok(())
    }

    /// Delete the connector at the given index together with its driver
    /// chain (master groups included)
    pub fn delete_driver(
        &mut self,
        scene: &mut impl Scene,
        index: usize,
    ) -> Result<(), RigError> {
        let plug = *self
            .connector_plugs
            .get(index)
            .ok_or(RigError::ConnectorOutOfRange {
                index,
                count: self.connector_plugs.len(),
            })?;
        let connector = Connector::from_manager(scene, plug)?;
        let driver = DriverChain::from_manager(scene, connector.driver_manager())?;
        connector.delete(scene)?;
        driver.delete(scene)?;
        self.connector_plugs.remove(index);
        Ok(())
    }

    /// Delete every connector together with its driver chain
    pub fn delete_drivers(&mut self, scene: &mut impl Scene) -> Result<(), RigError> {
        for plug in std::mem::take(&mut self.connector_plugs) {
            let connector = Connector::from_manager(scene, plug)?;
            let driver = DriverChain::from_manager(scene, connector.driver_manager())?;
            connector.delete(scene)?;
            driver.delete(scene)?;
        }
        Ok(())
    }

    /// Replace the joint membership.
    ///
    /// Clears the manager hub, rewires it to the new set, and recomputes
    /// every derived field, skin list included.
    pub fn set_joints(
        &mut self,
        scene: &mut impl Scene,
        joints: Vec<NodeId>,
    ) -> Result<(), RigError> {
        if !is_single_chain(scene, &joints) {
            return Err(RigError::Topology(
                "bound chain joints must form a single chain in root-to-leaf order".to_owned(),
            ));
        }
        clear_bound_manager(scene, self.manager)?;
        for &j in &joints {
            if !scene.has_attribute(j, BOUND_MARKER) {
                scene.add_attribute(j, BOUND_MARKER)?;
            }
            scene.connect(
                &Attr::new(self.manager, BOUND_HUB),
                &Attr::new(j, BOUND_MARKER),
            )?;
        }
        self.joints = joints;
        self.refresh_endpoints(scene);
        self.refresh_skin_list(scene);
        Ok(())
    }

    /// Rename the manager node to `MNG_BOUND_<name>` and adopt the new
    /// internal name
    pub fn set_name(&mut self, scene: &mut impl Scene, name: &str) -> Result<(), RigError> {
        scene.rename(self.manager, &format!("{BOUND_PREFIX}{name}"))?;
        self.name = name.to_owned();
        Ok(())
    }

    /// Delete the manager node, consuming the entity. Joints, drivers, and
    /// connectors are untouched; tear those down first via
    /// [`Self::delete_drivers`] if the whole rig should go.
    pub fn delete(self, scene: &mut impl Scene) -> Result<(), RigError> {
        tracing::info!("deleting bound chain `{}`", self.name);
        scene.delete(self.manager)?;
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

    /// First joint of the chain, if any
    pub fn start_joint(&self) -> Option<NodeId> {
        self.start
    }

    /// Last joint of the chain, if any
    pub fn end_joint(&self) -> Option<NodeId> {
        self.end
    }

    /// Hierarchy parent of the start joint, if any
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Managers of the connectors attached to this chain
    pub fn connector_plugs(&self) -> &[NodeId] {
        &self.connector_plugs
    }

    /// Cached skin-deformer list (see [`Self::refresh_skin_list`])
    pub fn skin_nodes(&self) -> &[NodeId] {
        &self.skin_nodes
    }

    /// Read-only snapshot for diagnostics and external tooling
    pub fn info(&self, scene: &impl Scene) -> Result<BoundChainInfo, RigError> {
        let mut joints = Vec::with_capacity(self.joints.len());
        for &j in &self.joints {
            joints.push(scene.node_name(j)?);
        }
        let mut connector_plugs = Vec::with_capacity(self.connector_plugs.len());
        for &c in &self.connector_plugs {
            connector_plugs.push(scene.node_name(c)?);
        }
        let mut skin_nodes = Vec::with_capacity(self.skin_nodes.len());
        for &s in &self.skin_nodes {
            skin_nodes.push(scene.node_name(s)?);
        }
        let resolve = |node: Option<NodeId>| -> Result<Option<String>, RigError> {
            match node {
                Some(n) => Ok(Some(scene.node_name(n)?)),
                None => Ok(None),
            }
        };
        Ok(BoundChainInfo {
            name: self.name.clone(),
            manager: scene.node_name(self.manager)?,
            joints,
            start_joint: resolve(self.start)?,
            end_joint: resolve(self.end)?,
            parent: resolve(self.parent)?,
            joint_count: self.joints.len(),
            connector_plugs,
            skin_nodes,
        })
    }
}

/// Snapshot of a [`BoundChain`] for diagnostics/serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundChainInfo {
    /// Internal name
    pub name: String,
    /// Manager node name
    pub manager: String,
    /// Joint names in root-to-leaf order
    pub joints: Vec<String>,
    /// Start joint name, if any
    pub start_joint: Option<String>,
    /// End joint name, if any
    pub end_joint: Option<String>,
    /// Parent transform name, if any
    pub parent: Option<String>,
    /// Number of joints
    pub joint_count: usize,
    /// Connector manager names attached to this chain
    pub connector_plugs: Vec<String>,
    /// Skin deformer names currently fed by the chain
    pub skin_nodes: Vec<String>,
}
