// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pure joint-chain topology checks and reordering.
//!
//! A *single chain* is a joint sequence in root-to-leaf order where every
//! member but the first is the direct hierarchy child of its predecessor.
//! All entity constructors funnel their joint lists through these functions.

use crate::error::RigError;
use chainrig_scene::{NodeId, NodeKind, Scene};

/// Check whether the list is a single joint chain in root-to-leaf order.
///
/// Walks adjacent pairs from tail to head: each successor must be a joint
/// and the direct child of its predecessor. Lists of length 0 or 1 pass
/// vacuously.
pub fn is_single_chain(scene: &impl Scene, joints: &[NodeId]) -> bool {
    for x in (1..joints.len()).rev() {
        let child = joints[x];
        let parent = joints[x - 1];
        if !matches!(scene.node_kind(child), Ok(NodeKind::Joint)) {
            return false;
        }
        if scene.parent(child) != Some(parent) {
            return false;
        }
    }
    true
}

/// Reorder an unordered single-chain joint set into root-to-leaf order.
///
/// Finds the leaf (the member with no children inside the set), then walks
/// parent pointers upward, accepting only ancestors that are members, until
/// the set is consumed. Fails with [`RigError::Topology`] when no leaf
/// exists or the upward walk leaves the set early (branched or disjoint
/// input). With more than one leaf candidate only the first encountered is
/// used, so the result is deterministic only for well-formed input.
pub fn reorder_single_chain(
    scene: &impl Scene,
    joints: &[NodeId],
) -> Result<Vec<NodeId>, RigError> {
    if joints.is_empty() {
        return Ok(Vec::new());
    }

    let mut reordered = Vec::with_capacity(joints.len());
    let mut bottom = None;
    for &j in joints {
        let has_member_child = scene.children(j).iter().any(|c| joints.contains(c));
        if !has_member_child {
            bottom = Some(j);
            reordered.push(j);
            break;
        }
    }
    let mut bottom = bottom.ok_or_else(|| {
        RigError::Topology("no leaf joint found in the given set".to_owned())
    })?;

    while reordered.len() < joints.len() {
        match scene.parent(bottom) {
            Some(next) if joints.contains(&next) => {
                bottom = next;
                reordered.push(next);
            }
            _ => {
                return Err(RigError::Topology(
                    "chain walk left the joint set before consuming it; unable to reorder"
                        .to_owned(),
                ))
            }
        }
    }

    reordered.reverse();
    Ok(reordered)
}

/// Duplicate a single chain into a fresh, hierarchy-detached chain.
///
/// Each duplicate is named `dup_<source>`, parented under the previous
/// duplicate, and world-aligned to its source. The duplicate chain hangs at
/// world root. Fails with [`RigError::Topology`] when the input is not a
/// single chain.
pub fn duplicate_single_chain(
    scene: &mut impl Scene,
    joints: &[NodeId],
) -> Result<Vec<NodeId>, RigError> {
    if !is_single_chain(scene, joints) {
        return Err(RigError::Topology(
            "input joint list is not a single chain; refusing to duplicate".to_owned(),
        ));
    }

    let mut duplicates: Vec<NodeId> = Vec::with_capacity(joints.len());
    for &j in joints {
        let name = format!("dup_{}", scene.node_name(j)?);
        let dup = scene.create_joint(&name);
        if let Some(&prev) = duplicates.last() {
            scene.reparent(dup, Some(prev))?;
        }
        scene.align_world_transform(j, dup)?;
        duplicates.push(dup);
    }
    Ok(duplicates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainrig_scene::MemoryScene;
    use glam::{Mat4, Vec3};

    fn make_chain(scene: &mut MemoryScene, names: &[&str]) -> Vec<NodeId> {
        let mut joints = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let j = scene.create_joint(name);
            scene
                .set_local_transform(j, Mat4::from_translation(Vec3::new(0.0, i as f32, 0.0)))
                .unwrap();
            if let Some(&prev) = joints.last() {
                scene.reparent(j, Some(prev)).unwrap();
            }
            joints.push(j);
        }
        joints
    }

    #[test]
    fn test_is_single_chain() {
        let mut scene = MemoryScene::new();
        let chain = make_chain(&mut scene, &["j0", "j1", "j2"]);
        assert!(is_single_chain(&scene, &chain));
    }

    #[test]
    fn test_is_single_chain_rejects_wrong_order() {
        let mut scene = MemoryScene::new();
        let chain = make_chain(&mut scene, &["j0", "j1", "j2"]);
        let shuffled = vec![chain[1], chain[0], chain[2]];
        assert!(!is_single_chain(&scene, &shuffled));
    }

    #[test]
    fn test_is_single_chain_rejects_non_joint() {
        let mut scene = MemoryScene::new();
        let j0 = scene.create_joint("j0");
        let grp = scene.create_group("grp");
        scene.reparent(grp, Some(j0)).unwrap();
        assert!(!is_single_chain(&scene, &[j0, grp]));
    }

    #[test]
    fn test_is_single_chain_rejects_skipped_generation() {
        let mut scene = MemoryScene::new();
        let chain = make_chain(&mut scene, &["j0", "j1", "j2"]);
        // j2 is a grandchild of j0, not a direct child
        assert!(!is_single_chain(&scene, &[chain[0], chain[2]]));
    }

    #[test]
    fn test_reorder_restores_canonical_order() {
        let mut scene = MemoryScene::new();
        let chain = make_chain(&mut scene, &["j0", "j1", "j2", "j3"]);
        let shuffled = vec![chain[2], chain[0], chain[3], chain[1]];
        let reordered = reorder_single_chain(&scene, &shuffled).unwrap();
        assert_eq!(reordered, chain);
    }

    #[test]
    fn test_reorder_rejects_branching() {
        let mut scene = MemoryScene::new();
        let root = scene.create_joint("root");
        let left = scene.create_joint("left");
        let right = scene.create_joint("right");
        scene.reparent(left, Some(root)).unwrap();
        scene.reparent(right, Some(root)).unwrap();
        let err = reorder_single_chain(&scene, &[root, left, right]);
        assert!(matches!(err, Err(RigError::Topology(_))));
    }

    #[test]
    fn test_reorder_rejects_disjoint_set() {
        let mut scene = MemoryScene::new();
        let a = make_chain(&mut scene, &["a0", "a1"]);
        let b = make_chain(&mut scene, &["b0", "b1"]);
        let err = reorder_single_chain(&scene, &[a[0], a[1], b[1]]);
        assert!(matches!(err, Err(RigError::Topology(_))));
    }

    #[test]
    fn test_duplicate_chain_is_detached_and_aligned() {
        let mut scene = MemoryScene::new();
        let root_grp = scene.create_group("rig");
        let chain = make_chain(&mut scene, &["j0", "j1"]);
        scene.reparent(chain[0], Some(root_grp)).unwrap();

        let dups = duplicate_single_chain(&mut scene, &chain).unwrap();
        assert_eq!(dups.len(), 2);
        assert_eq!(scene.node_name(dups[0]).unwrap(), "dup_j0");
        assert_eq!(scene.parent(dups[0]), None);
        assert_eq!(scene.parent(dups[1]), Some(dups[0]));
        assert!(is_single_chain(&scene, &dups));
        for (src, dup) in chain.iter().zip(&dups) {
            let a = scene.world_transform(*src).unwrap();
            let b = scene.world_transform(*dup).unwrap();
            assert!(a.abs_diff_eq(b, 1e-5));
        }
    }

    #[test]
    fn test_duplicate_rejects_broken_chain() {
        let mut scene = MemoryScene::new();
        let a = scene.create_joint("a");
        let b = scene.create_joint("b");
        let err = duplicate_single_chain(&mut scene, &[a, b]);
        assert!(matches!(err, Err(RigError::Topology(_))));
    }
}
