// SPDX-License-Identifier: MIT OR Apache-2.0
//! Controller-shape generation.
//!
//! Generates display-only curve controllers sized for a 15-unit-tall figure.
//! The rigging core consumes this when dressing driver joints with
//! selectable shapes.

use crate::node::NodeId;
use crate::scene::Scene;
use serde::{Deserialize, Serialize};

/// Available controller shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerShape {
    /// Planar circle
    Circle,
    /// Planar square
    Square,
    /// Three-ring sphere outline
    Sphere,
    /// Wireframe cube
    Cube,
    /// Flat arrow
    Arrow,
    /// Flat cross
    Cross,
    /// Octahedral diamond
    Diamond,
}

impl ControllerShape {
    /// Control points of the shape's curve
    pub fn points(self) -> Vec<[f32; 3]> {
        match self {
            Self::Circle => vec![
                [0.0, 1.0, 0.0],
                [0.0, 0.707, -0.707],
                [0.0, 0.0, -1.0],
                [0.0, -0.707, -0.707],
                [0.0, -1.0, 0.0],
                [0.0, -0.707, 0.707],
                [0.0, 0.0, 1.0],
                [0.0, 0.707, 0.707],
                [0.0, 1.0, 0.0],
            ],
            Self::Square => vec![
                [-1.0, 0.0, 1.0],
                [-1.0, 0.0, -1.0],
                [1.0, 0.0, -1.0],
                [1.0, 0.0, 1.0],
                [-1.0, 0.0, 1.0],
            ],
            Self::Sphere => vec![
                [-1.0, 0.0, 0.0],
                [-0.66, 0.0, -0.66],
                [0.0, 0.0, -1.0],
                [0.66, 0.0, -0.66],
                [1.0, 0.0, 0.0],
                [0.66, 0.0, 0.66],
                [0.0, 0.0, 1.0],
                [-0.66, 0.0, 0.66],
                [-1.0, 0.0, 0.0],
                [-0.66, 0.66, 0.0],
                [0.0, 1.0, 0.0],
                [0.66, 0.66, 0.0],
                [1.0, 0.0, 0.0],
                [0.66, -0.66, 0.0],
                [0.0, -1.0, 0.0],
                [-0.66, -0.66, 0.0],
                [-1.0, 0.0, 0.0],
                [-0.66, 0.66, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.66, 0.66],
                [0.0, 0.0, 1.0],
                [0.0, -0.66, 0.66],
                [0.0, -1.0, 0.0],
                [0.0, -0.66, -0.66],
                [0.0, 0.0, -1.0],
                [0.0, 0.66, -0.66],
                [0.0, 1.0, 0.0],
            ],
            Self::Cube => vec![
                [1.0, -1.0, 1.0],
                [1.0, -1.0, -1.0],
                [-1.0, -1.0, -1.0],
                [-1.0, -1.0, 1.0],
                [1.0, -1.0, 1.0],
                [1.0, 1.0, 1.0],
                [1.0, 1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [-1.0, 1.0, 1.0],
                [1.0, 1.0, 1.0],
                [-1.0, 1.0, 1.0],
                [-1.0, -1.0, 1.0],
                [-1.0, -1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [1.0, 1.0, -1.0],
                [1.0, -1.0, -1.0],
            ],
            Self::Arrow => vec![
                [-0.5, 0.0, -1.0],
                [-0.5, 0.0, 0.25],
                [-1.0, 0.0, 0.25],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 0.25],
                [0.5, 0.0, 0.25],
                [0.5, 0.0, -1.0],
                [-0.5, 0.0, -1.0],
            ],
            Self::Cross => vec![
                [-0.33333, 0.0, 1.0],
                [-0.33333, 0.0, 0.333_333],
                [-1.0, 0.0, 0.333_333],
                [-1.0, 0.0, -0.333_333],
                [-0.33333, 0.0, -0.333_333],
                [-0.33333, 0.0, -1.0],
                [0.333_333, 0.0, -1.0],
                [0.333_333, 0.0, -0.333_333],
                [1.0, 0.0, -0.333_333],
                [1.0, 0.0, 0.333_333],
                [0.333_333, 0.0, 0.333_333],
                [0.333_333, 0.0, 1.0],
                [-0.33333, 0.0, 1.0],
            ],
            Self::Diamond => vec![
                [0.0, 0.0, 1.0],
                [-1.0, 0.0, 0.0],
                [0.0, 0.0, -1.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, -1.0],
                [0.0, -1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [-1.0, 0.0, 0.0],
                [0.0, -1.0, 0.0],
                [1.0, 0.0, 0.0],
            ],
        }
    }
}

/// Generate a controller: a transform node with a curve-shape child.
///
/// The transform lands at world root with an identity placement; callers
/// align and reparent it as needed.
pub fn generate_shape(scene: &mut impl Scene, shape: ControllerShape, name: &str) -> NodeId {
    let transform = scene.create_group(name);
    let curve = scene.create_curve(&format!("{name}Shape"), shape.points());
    // Freshly created nodes sit at identity, so this cannot cycle or fail
    let _ = scene.reparent(curve, Some(transform));
    transform
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;

    #[test]
    fn test_generate_shape_builds_transform_with_curve_child() {
        let mut scene = MemoryScene::new();
        let ctl = generate_shape(&mut scene, ControllerShape::Cube, "ctl_test");
        let children = scene.children(ctl);
        assert_eq!(children.len(), 1);
        assert_eq!(scene.node_name(children[0]).unwrap(), "ctl_testShape");
        assert_eq!(
            scene.curve_points(children[0]).unwrap(),
            ControllerShape::Cube.points()
        );
    }

    #[test]
    fn test_closed_shapes_loop_back() {
        for shape in [
            ControllerShape::Circle,
            ControllerShape::Square,
            ControllerShape::Arrow,
            ControllerShape::Cross,
        ] {
            let points = shape.points();
            assert_eq!(points.first(), points.last());
        }
    }
}
