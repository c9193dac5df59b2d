use glam::{EulerRot, Quat, Vec3};

use super::{add_lights, camera_node, BuiltScene, CAMERA_POSITION};
use crate::input::FrameInput;
use crate::scene::{Camera, Geometry, Material, Node, NodeId, Scene, Side};
use crate::transform::compute_world_transforms;

/// Radians per frame on each of X and Y.
const SPIN_PER_FRAME: f32 = 0.01;

/// A spinning green cube. Needs no assets.
pub struct BasicScene {
    pub(super) built: BuiltScene,
    cube: NodeId,
    angle: f32,
}

impl BasicScene {
    pub fn build(aspect: f32) -> Self {
        let mut scene = Scene::new();
        let camera = scene.add(camera_node(
            Camera {
                fov: 75.0,
                near: 0.1,
                far: 1000.0,
                aspect,
            },
            CAMERA_POSITION,
            Vec3::ZERO,
        ));
        add_lights(&mut scene);
        let cube = scene.add(Node::mesh(
            "cube",
            Geometry::Box {
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            },
            Material::Basic {
                color: 0x00ff00,
                side: Side::Front,
            },
        ));
        compute_world_transforms(&mut scene);

        Self {
            built: BuiltScene { scene, camera },
            cube,
            angle: 0.0,
        }
    }

    pub fn update(&mut self, _input: &FrameInput) {
        self.angle += SPIN_PER_FRAME;
        let scene = &mut self.built.scene;
        if let Some(t) = scene.transform_mut(self.cube) {
            t.rotation = Quat::from_euler(EulerRot::XYZ, self.angle, self.angle, 0.0);
        }
        compute_world_transforms(scene);
    }

    pub fn cube(&self) -> NodeId {
        self.cube
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_spins_per_frame() {
        let mut s = BasicScene::build(1.0);
        for _ in 0..10 {
            s.update(&FrameInput::new(0.016));
        }
        let rotation = s.built.scene.get(s.cube()).unwrap().transform.rotation;
        let (x, y, _) = rotation.to_euler(EulerRot::XYZ);
        assert!((x - 0.1).abs() < 1e-4, "x={x}");
        assert!((y - 0.1).abs() < 1e-4, "y={y}");
    }

    #[test]
    fn test_camera_settings() {
        let s = BasicScene::build(1.25);
        let camera = s.built.camera().unwrap();
        assert_eq!((camera.fov, camera.near, camera.far, camera.aspect), (75.0, 0.1, 1000.0, 1.25));
        assert_eq!(s.built.scene.get(s.built.camera).unwrap().transform.position, CAMERA_POSITION);
    }
}
