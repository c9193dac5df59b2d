//! Scene variants. One is chosen at start-up by name and driven once per
//! animation frame through [`ActiveScene::update`].

mod basic;
mod main;

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

use crate::assets::{AssetRegistry, ModelInfo};
use crate::config::AppConfig;
use crate::controller::ControllerRig;
use crate::error::SceneError;
use crate::input::FrameInput;
use crate::scene::{Camera, Light, Node, NodeId, NodeKind, Scene};

pub use basic::BasicScene;
pub use main::MainScene;

pub(crate) const HEMISPHERE_SKY: u32 = 0x606060;
pub(crate) const HEMISPHERE_GROUND: u32 = 0x404040;
pub(crate) const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 1.6, 3.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    Main,
    Basic,
}

impl SceneKind {
    pub fn from_name(name: &str) -> Result<Self, SceneError> {
        match name {
            "main" => Ok(SceneKind::Main),
            "basic" => Ok(SceneKind::Basic),
            other => Err(SceneError::UnknownScene(other.to_string())),
        }
    }

    /// Whether the scene reads the model manifest before it can be built.
    pub fn needs_assets(&self) -> bool {
        matches!(self, SceneKind::Main)
    }
}

/// Inputs for building a scene.
pub struct SceneContext<'a, A> {
    pub config: &'a AppConfig,
    pub assets: &'a AssetRegistry<A>,
    /// Canvas width / height.
    pub aspect: f32,
}

/// A built scene graph and the camera it is viewed through.
pub struct BuiltScene {
    pub scene: Scene,
    pub camera: NodeId,
}

impl BuiltScene {
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Some(node) = self.scene.get_mut(self.camera) {
            if let NodeKind::Camera(camera) = &mut node.kind {
                camera.aspect = aspect;
            }
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.scene.get(self.camera)?.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }
}

pub enum ActiveScene {
    Main(MainScene),
    Basic(BasicScene),
}

impl ActiveScene {
    pub fn create<A: ModelInfo>(kind: SceneKind, ctx: &SceneContext<'_, A>) -> Result<Self, SceneError> {
        log::info!("Building {kind:?} scene");
        Ok(match kind {
            SceneKind::Main => ActiveScene::Main(MainScene::build(ctx)?),
            SceneKind::Basic => ActiveScene::Basic(BasicScene::build(ctx.aspect)),
        })
    }

    pub fn update(&mut self, input: &FrameInput) {
        match self {
            ActiveScene::Main(s) => s.update(input),
            ActiveScene::Basic(s) => s.update(input),
        }
    }

    pub fn built(&self) -> &BuiltScene {
        match self {
            ActiveScene::Main(s) => &s.built,
            ActiveScene::Basic(s) => &s.built,
        }
    }

    pub fn built_mut(&mut self) -> &mut BuiltScene {
        match self {
            ActiveScene::Main(s) => &mut s.built,
            ActiveScene::Basic(s) => &mut s.built,
        }
    }

    /// Controller rig, for scenes that have one.
    pub fn controllers_mut(&mut self) -> Option<&mut ControllerRig> {
        match self {
            ActiveScene::Main(s) => Some(&mut s.rig),
            ActiveScene::Basic(_) => None,
        }
    }
}

/// Camera node placed at `position` and turned toward `target`.
pub(crate) fn camera_node(camera: Camera, position: Vec3, target: Vec3) -> Node {
    let world = Mat4::look_at_rh(position, target, Vec3::Y).inverse();
    let (_, rotation, _) = world.to_scale_rotation_translation();
    Node::new("camera", NodeKind::Camera(camera))
        .with_position(position)
        .with_rotation(rotation)
}

/// Hemisphere fill plus a white directional light from (1, 1, 1).
pub(crate) fn add_lights(scene: &mut Scene) {
    scene.add(Node::new(
        "hemisphereLight",
        NodeKind::Light(Light::Hemisphere {
            sky: HEMISPHERE_SKY,
            ground: HEMISPHERE_GROUND,
            intensity: 1.0,
        }),
    ));
    scene.add(
        Node::new(
            "directionalLight",
            NodeKind::Light(Light::Directional {
                color: 0xffffff,
                intensity: 1.0,
            }),
        )
        .with_position(Vec3::ONE.normalize()),
    );
}

/// Rotation that lays an XY plane flat on the ground.
pub(crate) fn ground_rotation() -> glam::Quat {
    glam::Quat::from_rotation_x(-FRAC_PI_2)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Model stand-in that knows only its material names.
    pub(crate) struct FakeModel(pub Vec<&'static str>);

    impl ModelInfo for FakeModel {
        fn has_material(&self, name: &str) -> bool {
            self.0.contains(&name)
        }
    }

    pub(crate) fn registry(entries: &[(&str, &[&'static str])]) -> AssetRegistry<FakeModel> {
        AssetRegistry::from_entries(
            entries
                .iter()
                .map(|(file, materials)| (file.to_string(), FakeModel(materials.to_vec()))),
        )
    }

    #[test]
    fn test_scene_kind_from_name() {
        assert_eq!(SceneKind::from_name("main").unwrap(), SceneKind::Main);
        assert_eq!(SceneKind::from_name("basic").unwrap(), SceneKind::Basic);
        assert!(matches!(
            SceneKind::from_name("moon"),
            Err(SceneError::UnknownScene(name)) if name == "moon"
        ));
        assert!(SceneKind::Main.needs_assets());
        assert!(!SceneKind::Basic.needs_assets());
    }

    #[test]
    fn test_camera_node_looks_at_target() {
        let node = camera_node(
            Camera { fov: 60.0, near: 0.1, far: 100.0, aspect: 1.0 },
            CAMERA_POSITION,
            Vec3::new(0.0, 2.0, 0.0),
        );
        let forward = node.transform.rotation * Vec3::NEG_Z;
        let expected = (Vec3::new(0.0, 2.0, 0.0) - CAMERA_POSITION).normalize();
        assert!(forward.abs_diff_eq(expected, 1e-5), "forward={forward:?}");
    }

    #[test]
    fn test_create_basic_without_assets() {
        let config = AppConfig::embedded().unwrap();
        let assets = registry(&[]);
        let ctx = SceneContext { config: &config, assets: &assets, aspect: 2.0 };
        let mut active = ActiveScene::create(SceneKind::Basic, &ctx).unwrap();
        assert!(active.controllers_mut().is_none());
        assert_eq!(active.built().camera().unwrap().aspect, 2.0);
        active.built_mut().set_aspect(0.5);
        assert_eq!(active.built().camera().unwrap().aspect, 0.5);
    }

    #[test]
    fn test_create_main_needs_snow_scene() {
        let config = AppConfig::embedded().unwrap();
        let assets = registry(&[("torch.glb", &[])]);
        let ctx = SceneContext { config: &config, assets: &assets, aspect: 1.0 };
        assert!(matches!(
            ActiveScene::create(SceneKind::Main, &ctx),
            Err(SceneError::MissingAsset(name)) if name == "snowScene.glb"
        ));
    }
}
