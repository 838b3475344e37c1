// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connector entities: indirect attribute links from driver outputs to
//! bound inputs.

use crate::error::RigError;
use crate::manager::{
    add_connector_manager, connector_io_from_manager, empty_driver_slot, internal_name,
    Rollback, CONNECTOR_HUB, CONNECTOR_PREFIX, DRIVER_SLOT_LIMIT, LINK_ATTR,
};
use chainrig_scene::{Attr, NodeId, Scene};
use serde::{Deserialize, Serialize};

/// Marker attribute wiring a helper node to its connector manager
const HELPER_MARKER: &str = "connector";

/// A set of pass-through links wiring one driver chain to one bound chain.
///
/// Each link goes `driver output -> c_<i> -> bound input` through a hidden
/// helper node rather than attribute-to-attribute, so the link survives
/// renames on either side and can be introspected later. Index `i` of the
/// outputs corresponds to index `i` of the inputs throughout; the order
/// defines which attribute drives which.
#[derive(Debug)]
pub struct Connector {
    name: String,
    driver_outputs: Vec<Attr>,
    bound_inputs: Vec<Attr>,
    bound_manager: NodeId,
    driver_manager: NodeId,
    manager: NodeId,
    helper_nodes: Vec<NodeId>,
}

impl Connector {
    /// Wire a new connector between a driver manager and a bound manager.
    ///
    /// Fails with [`RigError::Cardinality`] before touching the scene when
    /// the output and input lists differ in length. Creates the hidden
    /// helper node with one zero-padded `c_<i>` pass-through attribute per
    /// pair, the connector's own manager, and the cross-links: the driver
    /// manager feeds this manager's `Manager` attribute, and this manager
    /// occupies the first free driver slot on the bound manager. Any
    /// failure past the first mutation rolls the created nodes back.
    pub fn new(
        scene: &mut impl Scene,
        bound_manager: NodeId,
        driver_manager: NodeId,
        driver_outputs: Vec<Attr>,
        bound_inputs: Vec<Attr>,
        name: &str,
    ) -> Result<Self, RigError> {
        if driver_outputs.len() != bound_inputs.len() {
            return Err(RigError::Cardinality {
                outputs: driver_outputs.len(),
                inputs: bound_inputs.len(),
            });
        }

        let mut rollback = Rollback::default();
        match Self::build(
            scene,
            bound_manager,
            driver_manager,
            driver_outputs,
            bound_inputs,
            name,
            &mut rollback,
        ) {
            Ok(connector) => {
                rollback.commit();
                Ok(connector)
            }
            Err(e) => {
                rollback.abort(scene);
                Err(e)
            }
        }
    }

    fn build(
        scene: &mut impl Scene,
        bound_manager: NodeId,
        driver_manager: NodeId,
        driver_outputs: Vec<Attr>,
        bound_inputs: Vec<Attr>,
        name: &str,
        rollback: &mut Rollback,
    ) -> Result<Self, RigError> {
        let helper = rollback.track(scene.create_group(&format!("connector_{name}")));
        scene.set_hidden(helper, true)?;

        for (x, (output, input)) in driver_outputs.iter().zip(&bound_inputs).enumerate() {
            let attr_name = format!("c_{x:03}");
            scene.add_attribute(helper, &attr_name)?;
            let passthrough = Attr::new(helper, attr_name);
            scene.connect(output, &passthrough)?;
            scene.connect(&passthrough, input)?;
        }

        let manager = rollback.track(add_connector_manager(scene, name)?);
        scene.add_attribute(helper, HELPER_MARKER)?;
        scene.connect(
            &Attr::new(manager, CONNECTOR_HUB),
            &Attr::new(helper, HELPER_MARKER),
        )?;

        scene.connect(
            &Attr::new(driver_manager, LINK_ATTR),
            &Attr::new(manager, LINK_ATTR),
        )?;
        let slot = empty_driver_slot(scene, bound_manager, DRIVER_SLOT_LIMIT)?;
        scene.connect(&Attr::new(manager, LINK_ATTR), &slot)?;

        tracing::debug!(
            "wired connector `{name}` with {} pass-through links",
            driver_outputs.len()
        );

        Ok(Self {
            name: name.to_owned(),
            driver_outputs,
            bound_inputs,
            bound_manager,
            driver_manager,
            manager,
            helper_nodes: vec![helper],
        })
    }

    /// Rebuild a connector from its manager node.
    ///
    /// Recovers the ordered output/input pairs from the helper node's
    /// pass-through attributes, and the owning managers from the manager's
    /// own `Manager` connections.
    pub fn from_manager(scene: &impl Scene, manager: NodeId) -> Result<Self, RigError> {
        let name = internal_name(scene, manager, CONNECTOR_PREFIX, "connector")?;
        let (driver_outputs, bound_inputs) = connector_io_from_manager(scene, manager)?;

        let link = Attr::new(manager, LINK_ATTR);
        let driver_manager = scene
            .attr_inputs(&link)
            .first()
            .map(|a| a.node)
            .ok_or_else(|| RigError::MissingLink {
                manager: scene.node_name(manager).unwrap_or_default(),
                missing: "driver manager",
            })?;
        let bound_manager = scene
            .attr_outputs(&link)
            .first()
            .map(|a| a.node)
            .ok_or_else(|| RigError::MissingLink {
                manager: scene.node_name(manager).unwrap_or_default(),
                missing: "bound manager",
            })?;

        let helper_nodes = scene
            .attr_outputs(&Attr::new(manager, CONNECTOR_HUB))
            .into_iter()
            .map(|a| a.node)
            .collect();

        Ok(Self {
            name,
            driver_outputs,
            bound_inputs,
            bound_manager,
            driver_manager,
            manager,
            helper_nodes,
        })
    }

    /// Delete the manager node and every helper node this connector
    /// created, consuming the entity. The chains on either side stay
    /// intact.
    pub fn delete(self, scene: &mut impl Scene) -> Result<(), RigError> {
        tracing::info!("deleting connector `{}`", self.name);
        scene.delete(self.manager)?;
        for helper in self.helper_nodes {
            if scene.exists(helper) {
                scene.delete(helper)?;
            }
        }
        Ok(())
    }

    /// Internal name (manager name without the prefix)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This connector's manager node
    pub fn manager(&self) -> NodeId {
        self.manager
    }

    /// Manager of the bound chain this connector feeds
    pub fn bound_manager(&self) -> NodeId {
        self.bound_manager
    }

    /// Manager of the driver chain feeding this connector
    pub fn driver_manager(&self) -> NodeId {
        self.driver_manager
    }

    /// Driver-side source attributes, in pairing order
    pub fn driver_outputs(&self) -> &[Attr] {
        &self.driver_outputs
    }

    /// Bound-side destination attributes, in pairing order
    pub fn bound_inputs(&self) -> &[Attr] {
        &self.bound_inputs
    }

    /// Helper nodes owned by this connector
    pub fn helper_nodes(&self) -> &[NodeId] {
        &self.helper_nodes
    }

    /// Read-only snapshot for diagnostics and external tooling
    pub fn info(&self, scene: &impl Scene) -> Result<ConnectorInfo, RigError> {
        let resolve = |node: NodeId| -> Option<String> {
            scene.exists(node).then(|| scene.node_name(node).ok()).flatten()
        };
        let mut driver_outputs = Vec::with_capacity(self.driver_outputs.len());
        for attr in &self.driver_outputs {
            driver_outputs.push(scene.attr_path(attr)?);
        }
        let mut bound_inputs = Vec::with_capacity(self.bound_inputs.len());
        for attr in &self.bound_inputs {
            bound_inputs.push(scene.attr_path(attr)?);
        }
        Ok(ConnectorInfo {
            name: self.name.clone(),
            manager: scene.node_name(self.manager)?,
            driver_outputs,
            bound_inputs,
            bound_manager: resolve(self.bound_manager),
            driver_manager: resolve(self.driver_manager),
        })
    }
}

/// Snapshot of a [`Connector`] for diagnostics/serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorInfo {
    /// Internal name
    pub name: String,
    /// Manager node name
    pub manager: String,
    /// Driver-side attribute paths, in pairing order
    pub driver_outputs: Vec<String>,
    /// Bound-side attribute paths, in pairing order
    pub bound_inputs: Vec<String>,
    /// Bound manager name, if still alive
    pub bound_manager: Option<String>,
    /// Driver manager name, if still alive
    pub driver_manager: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{add_bound_manager, add_driver_manager};
    use chainrig_scene::MemoryScene;

    fn plugs(scene: &mut MemoryScene, prefix: &str, count: usize) -> Vec<Attr> {
        (0..count)
            .map(|i| {
                let j = scene.create_joint(&format!("{prefix}{i}"));
                Attr::new(j, "translateX")
            })
            .collect()
    }

    #[test]
    fn test_cardinality_mismatch_creates_nothing() {
        let mut scene = MemoryScene::new();
        let bnd = add_bound_manager(&mut scene, "Arm").unwrap();
        let drv = add_driver_manager(&mut scene, "drv_Arm").unwrap();
        let outputs = plugs(&mut scene, "d", 3);
        let inputs = plugs(&mut scene, "b", 2);
        let nodes_before = scene.node_count();
        let connections_before = scene.connection_count();

        let err = Connector::new(&mut scene, bnd, drv, outputs, inputs, "con_Arm");
        assert!(matches!(
            err,
            Err(RigError::Cardinality {
                outputs: 3,
                inputs: 2
            })
        ));
        assert_eq!(scene.node_count(), nodes_before);
        assert_eq!(scene.connection_count(), connections_before);
    }

    #[test]
    fn test_passthrough_attrs_are_zero_padded() {
        let mut scene = MemoryScene::new();
        let bnd = add_bound_manager(&mut scene, "Arm").unwrap();
        let drv = add_driver_manager(&mut scene, "drv_Arm").unwrap();
        let outputs = plugs(&mut scene, "d", 3);
        let inputs = plugs(&mut scene, "b", 3);

        let con = Connector::new(&mut scene, bnd, drv, outputs, inputs, "con_Arm").unwrap();
        let helper = con.helper_nodes()[0];
        assert_eq!(scene.node_name(helper).unwrap(), "connector_con_Arm");
        assert!(scene.is_hidden(helper).unwrap());
        let attrs = scene.user_attributes(helper).unwrap();
        assert_eq!(attrs, vec!["c_000", "c_001", "c_002", "connector"]);
    }

    #[test]
    fn test_roundtrip_preserves_pairing_order() {
        let mut scene = MemoryScene::new();
        let bnd = add_bound_manager(&mut scene, "Arm").unwrap();
        let drv = add_driver_manager(&mut scene, "drv_Arm").unwrap();
        let outputs = plugs(&mut scene, "d", 4);
        let inputs = plugs(&mut scene, "b", 4);

        let con = Connector::new(
            &mut scene,
            bnd,
            drv,
            outputs.clone(),
            inputs.clone(),
            "con_Arm",
        )
        .unwrap();
        let rebuilt = Connector::from_manager(&scene, con.manager()).unwrap();
        assert_eq!(rebuilt.name(), "con_Arm");
        assert_eq!(rebuilt.driver_outputs(), outputs.as_slice());
        assert_eq!(rebuilt.bound_inputs(), inputs.as_slice());
        assert_eq!(rebuilt.bound_manager(), bnd);
        assert_eq!(rebuilt.driver_manager(), drv);
    }

    #[test]
    fn test_delete_removes_manager_and_helper() {
        let mut scene = MemoryScene::new();
        let bnd = add_bound_manager(&mut scene, "Arm").unwrap();
        let drv = add_driver_manager(&mut scene, "drv_Arm").unwrap();
        let outputs = plugs(&mut scene, "d", 2);
        let inputs = plugs(&mut scene, "b", 2);

        let con = Connector::new(&mut scene, bnd, drv, outputs, inputs, "con_Arm").unwrap();
        let manager = con.manager();
        let helper = con.helper_nodes()[0];
        con.delete(&mut scene).unwrap();
        assert!(!scene.exists(manager));
        assert!(!scene.exists(helper));
        assert!(scene.exists(bnd));
        assert!(scene.exists(drv));
    }

    #[test]
    fn test_from_manager_rejects_wrong_prefix() {
        let mut scene = MemoryScene::new();
        let bnd = add_bound_manager(&mut scene, "Arm").unwrap();
        let err = Connector::from_manager(&scene, bnd);
        assert!(matches!(err, Err(RigError::ManagerMismatch { .. })));
    }
}
