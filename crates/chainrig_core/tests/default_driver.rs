// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end scenarios: building a default driver over a bound chain and
//! tearing the pieces down in different orders.

use chainrig_core::{
    cleanup_bound_managers, cleanup_connector_managers, cleanup_driver_managers, BoundChain,
    Connector, DriverChain, RigError,
};
use chainrig_scene::{Attr, MemoryScene, NodeId, Scene};
use glam::{Mat4, Vec3};

fn arm_chain(scene: &mut MemoryScene) -> Vec<NodeId> {
    let mut joints = Vec::new();
    for (i, name) in ["j0", "j1", "j2"].iter().enumerate() {
        let j = scene.create_joint(name);
        scene
            .set_local_transform(j, Mat4::from_translation(Vec3::new(0.0, i as f32 + 1.0, 0.0)))
            .unwrap();
        if let Some(&prev) = joints.last() {
            scene.reparent(j, Some(prev)).unwrap();
        }
        joints.push(j);
    }
    joints
}

#[test]
fn test_default_driver_naming_and_passthroughs() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints, "Arm").unwrap();
    assert_eq!(scene.node_name(arm.manager()).unwrap(), "MNG_BOUND_Arm");

    let (driver, connector) = arm
        .create_default_driver(&mut scene, &["translateX"], "")
        .unwrap();

    assert_eq!(
        scene.node_name(driver.manager()).unwrap(),
        "MNG_DRIVER_drv_Arm"
    );
    assert_eq!(
        scene.node_name(connector.manager()).unwrap(),
        "MNG_CONNECTOR_con_Arm"
    );
    assert_eq!(driver.joint_count(), 3);
    let driver_names: Vec<String> = driver
        .joints()
        .iter()
        .map(|j| scene.node_name(*j).unwrap())
        .collect();
    assert_eq!(driver_names, vec!["drv_j0", "drv_j1", "drv_j2"]);

    let helper = connector.helper_nodes()[0];
    let passthroughs: Vec<String> = scene
        .user_attributes(helper)
        .unwrap()
        .into_iter()
        .filter(|a| a.starts_with("c_"))
        .collect();
    assert_eq!(passthroughs, vec!["c_000", "c_001", "c_002"]);

    // Each driver joint's translateX feeds the matching bound joint
    for (i, (dj, bj)) in driver.joints().iter().zip(arm.joints()).enumerate() {
        let passthrough = Attr::new(helper, format!("c_{i:03}"));
        assert_eq!(
            scene.attr_inputs(&passthrough),
            vec![Attr::new(*dj, "translateX")]
        );
        assert_eq!(
            scene.attr_outputs(&passthrough),
            vec![Attr::new(*bj, "translateX")]
        );
    }

    assert_eq!(arm.connector_plugs(), &[connector.manager()]);
    assert_eq!(driver.connector_plugs(), &[connector.manager()]);
}

#[test]
fn test_master_offset_aligns_to_bound_parent() {
    let mut scene = MemoryScene::new();
    let anchor = scene.create_group("clavicle");
    scene
        .set_local_transform(anchor, Mat4::from_translation(Vec3::new(3.0, 7.0, 0.0)))
        .unwrap();
    let joints = arm_chain(&mut scene);
    scene.reparent(joints[0], Some(anchor)).unwrap();

    let mut arm = BoundChain::new(&mut scene, joints, "Arm").unwrap();
    let (driver, _connector) = arm
        .create_default_driver(&mut scene, &["translateX"], "")
        .unwrap();

    let (master_grp, master_offset) = driver.master_grp_pair();
    let anchor_world = scene.world_transform(anchor).unwrap();
    let offset_world = scene.world_transform(master_offset).unwrap();
    assert!(anchor_world.abs_diff_eq(offset_world, 1e-5));
    assert_eq!(scene.parent(driver.start_joint()), Some(master_grp));
}

#[test]
fn test_master_offset_resets_at_world_root() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints, "Arm").unwrap();

    let (driver, _connector) = arm
        .create_default_driver(&mut scene, &["translateX"], "")
        .unwrap();
    let (_, master_offset) = driver.master_grp_pair();
    let local = scene.local_transform(master_offset).unwrap();
    assert!(local.abs_diff_eq(Mat4::IDENTITY, 1e-5));
}

#[test]
fn test_suffix_threads_through_names() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints, "Arm").unwrap();

    let (driver, connector) = arm
        .create_default_driver(&mut scene, &["rotateZ"], "_fk")
        .unwrap();
    assert_eq!(
        scene.node_name(driver.manager()).unwrap(),
        "MNG_DRIVER_drv_Arm_fk"
    );
    assert_eq!(
        scene.node_name(connector.manager()).unwrap(),
        "MNG_CONNECTOR_con_Arm_fk"
    );
    assert_eq!(
        scene.node_name(driver.joints()[0]).unwrap(),
        "drv_j0_fk"
    );
}

#[test]
fn test_delete_connection_keeps_driver_intact() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints, "Arm").unwrap();
    let (driver, connector) = arm
        .create_default_driver(&mut scene, &["translateX"], "")
        .unwrap();
    let connector_manager = connector.manager();
    let helper = connector.helper_nodes()[0];
    let (master_grp, master_offset) = driver.master_grp_pair();

    arm.delete_connection(&mut scene, 0).unwrap();

    assert!(!scene.exists(connector_manager));
    assert!(!scene.exists(helper));
    assert!(scene.exists(driver.manager()));
    assert!(scene.exists(master_grp));
    assert!(scene.exists(master_offset));
    assert!(arm.connector_plugs().is_empty());
}

#[test]
fn test_delete_driver_removes_everything() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints.clone(), "Arm").unwrap();
    let (driver, connector) = arm
        .create_default_driver(&mut scene, &["translateX"], "")
        .unwrap();
    let driver_manager = driver.manager();
    let connector_manager = connector.manager();
    let (_, master_offset) = driver.master_grp_pair();
    let driver_joints = driver.joints().to_vec();

    arm.delete_driver(&mut scene, 0).unwrap();

    assert!(!scene.exists(connector_manager));
    assert!(!scene.exists(driver_manager));
    assert!(!scene.exists(master_offset));
    assert!(driver_joints.iter().all(|j| !scene.exists(*j)));
    // Bound side untouched
    assert!(joints.iter().all(|j| scene.exists(*j)));
    assert!(scene.exists(arm.manager()));
}

#[test]
fn test_ten_drivers_fit_eleventh_fails_cleanly() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints, "Arm").unwrap();

    for i in 0..10 {
        arm.create_default_driver(&mut scene, &["translateX"], &format!("_{i}"))
            .unwrap();
    }
    assert_eq!(arm.connector_plugs().len(), 10);

    let nodes_before = scene.node_count();
    let err = arm.create_default_driver(&mut scene, &["translateX"], "_10");
    assert!(matches!(err, Err(RigError::SlotExhaustion { limit: 10, .. })));
    // The aborted construction rolled its nodes back
    assert_eq!(scene.node_count(), nodes_before);
    assert_eq!(arm.connector_plugs().len(), 10);
}

#[test]
fn test_delete_connections_and_drivers_in_bulk() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints, "Arm").unwrap();
    let (driver_a, _) = arm
        .create_default_driver(&mut scene, &["translateX"], "_a")
        .unwrap();
    let (driver_b, _) = arm
        .create_default_driver(&mut scene, &["translateX"], "_b")
        .unwrap();

    // Dropping connectors alone leaves both driver chains standing
    arm.delete_connections(&mut scene).unwrap();
    assert!(arm.connector_plugs().is_empty());
    assert!(scene.exists(driver_a.manager()));
    assert!(scene.exists(driver_b.manager()));
    assert!(scene.find_by_prefix("MNG_CONNECTOR_").is_empty());

    // Re-attach, then tear everything down
    arm.create_default_driver(&mut scene, &["translateX"], "_c")
        .unwrap();
    arm.delete_drivers(&mut scene).unwrap();
    assert!(arm.connector_plugs().is_empty());
    assert!(scene.find_by_prefix("MNG_CONNECTOR_con_Arm_c").is_empty());
    assert!(scene.find_by_prefix("MNG_DRIVER_drv_Arm_c").is_empty());
    // The orphaned drivers from the first round are untouched
    assert!(scene.exists(driver_a.manager()));
}

#[test]
fn test_reconstruction_roundtrip_after_default_driver() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints.clone(), "Arm").unwrap();
    let (driver, connector) = arm
        .create_default_driver(&mut scene, &["translateX", "rotateZ"], "")
        .unwrap();

    let arm2 = BoundChain::from_manager(&scene, arm.manager()).unwrap();
    assert_eq!(arm2.joints(), joints.as_slice());
    assert_eq!(arm2.connector_plugs(), &[connector.manager()]);

    let driver2 = DriverChain::from_manager(&mut scene, driver.manager()).unwrap();
    assert_eq!(driver2.joints(), driver.joints());
    assert_eq!(driver2.connector_plugs(), &[connector.manager()]);

    let connector2 = Connector::from_manager(&scene, connector.manager()).unwrap();
    assert_eq!(connector2.driver_outputs(), connector.driver_outputs());
    assert_eq!(connector2.bound_inputs(), connector.bound_inputs());
    assert_eq!(connector2.bound_manager(), arm.manager());
    assert_eq!(connector2.driver_manager(), driver.manager());
}

#[test]
fn test_cleanup_sweeps_remove_only_empty_managers() {
    let mut scene = MemoryScene::new();
    let joints = arm_chain(&mut scene);
    let mut arm = BoundChain::new(&mut scene, joints, "Arm").unwrap();
    arm.create_default_driver(&mut scene, &["translateX"], "")
        .unwrap();

    // Live managers survive the sweeps
    assert_eq!(cleanup_bound_managers(&mut scene).unwrap(), 0);
    assert_eq!(cleanup_driver_managers(&mut scene).unwrap(), 0);
    assert_eq!(cleanup_connector_managers(&mut scene).unwrap(), 0);

    // Orphaned empty managers do not
    chainrig_core::manager::add_bound_manager(&mut scene, "Stale").unwrap();
    chainrig_core::manager::add_driver_manager(&mut scene, "Stale").unwrap();
    chainrig_core::manager::add_connector_manager(&mut scene, "Stale").unwrap();
    assert_eq!(cleanup_bound_managers(&mut scene).unwrap(), 1);
    assert_eq!(cleanup_driver_managers(&mut scene).unwrap(), 1);
    assert_eq!(cleanup_connector_managers(&mut scene).unwrap(), 1);
}
