use glam::Vec3;

use super::{add_lights, camera_node, ground_rotation, BuiltScene, SceneContext, CAMERA_POSITION};
use crate::assets::ModelInfo;
use crate::controller::{ControllerRig, Handedness, RayTarget, RigConfig};
use crate::error::SceneError;
use crate::input::FrameInput;
use crate::locomotion::{apply_thumbstick, LocomotionConfig};
use crate::scene::{Background, Camera, Geometry, Material, Node, NodeId, NodeKind, Scene, Side};
use crate::transform::compute_world_transforms;

pub const SNOW_SCENE_ASSET: &str = "snowScene.glb";
pub const TORCH_ASSET: &str = "torch.glb";
const SNOW_MATERIAL: &str = "Snow";

const SPHERE_RADIUS: f32 = 0.2;
const SPHERE_POSITION: Vec3 = Vec3::new(5.0, 1.0, -8.0);
const HIGHLIGHT_SCALE: f32 = 1.2;
const CONTROLLER_SLOTS: usize = 2;

/// The snow park: HDR sky, snow model and ground, one highlightable sphere,
/// and two controllers riding on a dolly with the camera.
pub struct MainScene {
    pub(super) built: BuiltScene,
    pub(super) rig: ControllerRig,
    dolly: NodeId,
    sphere: NodeId,
    locomotion: LocomotionConfig,
    move_hand: Handedness,
}

impl MainScene {
    pub fn build<A: ModelInfo>(ctx: &SceneContext<'_, A>) -> Result<Self, SceneError> {
        let snow = ctx
            .assets
            .get(SNOW_SCENE_ASSET)
            .ok_or_else(|| SceneError::MissingAsset(SNOW_SCENE_ASSET.to_string()))?;

        let mut scene = Scene::new();
        scene.background = match &ctx.config.assets.environment {
            Some(path) => Background::Equirectangular(path.clone()),
            None => Background::Color(0x000000),
        };

        let dolly = scene.add(Node::group("dolly"));
        let camera = scene.add_child(
            dolly,
            camera_node(
                Camera {
                    fov: 60.0,
                    near: 0.1,
                    far: 100.0,
                    aspect: ctx.aspect,
                },
                CAMERA_POSITION,
                Vec3::new(0.0, 2.0, 0.0),
            ),
        );

        add_lights(&mut scene);

        scene.add(Node::new(
            "snowScene",
            NodeKind::Model {
                asset: SNOW_SCENE_ASSET.to_string(),
            },
        ));

        if snow.has_material(SNOW_MATERIAL) {
            scene.add(
                Node::mesh(
                    "ground",
                    Geometry::Plane {
                        width: 100.0,
                        height: 100.0,
                        width_segments: 20,
                        height_segments: 20,
                    },
                    Material::FromAsset {
                        asset: SNOW_SCENE_ASSET.to_string(),
                        name: SNOW_MATERIAL.to_string(),
                    },
                )
                .with_rotation(ground_rotation()),
            );
        } else {
            log::warn!("{SNOW_SCENE_ASSET} has no `{SNOW_MATERIAL}` material; skipping ground");
        }

        let sphere_geometry = Geometry::Sphere {
            radius: SPHERE_RADIUS,
            width_segments: 20,
        };
        let sphere = scene.add(
            Node::mesh(
                "sphere",
                sphere_geometry,
                Material::Basic {
                    color: 0x00ff00,
                    side: Side::Front,
                },
            )
            .with_position(SPHERE_POSITION),
        );
        let highlight = scene.add(
            Node::mesh(
                "highlight",
                sphere_geometry,
                Material::Basic {
                    color: 0xffffff,
                    side: Side::Back,
                },
            )
            .with_scale(Vec3::splat(HIGHLIGHT_SCALE)),
        );

        let interaction = &ctx.config.interaction;
        let torch_asset = ctx.assets.contains(TORCH_ASSET).then(|| TORCH_ASSET.to_string());
        if torch_asset.is_none() {
            log::warn!("{TORCH_ASSET} not loaded; the torch hand gets a pointer line");
        }
        let mut rig = ControllerRig::new(
            &mut scene,
            dolly,
            CONTROLLER_SLOTS,
            highlight,
            RigConfig {
                pointer_hand: interaction.pointer_hand,
                torch_hand: interaction.torch_hand,
                torch_asset,
            },
        );
        rig.add_target(RayTarget {
            node: sphere,
            radius: sphere_geometry.bounding_radius(),
        });

        compute_world_transforms(&mut scene);

        Ok(Self {
            built: BuiltScene { scene, camera },
            rig,
            dolly,
            sphere,
            locomotion: LocomotionConfig {
                dead_zone: interaction.thumbstick_dead_zone,
                move_speed: interaction.move_speed,
                turn_speed: interaction.turn_speed,
            },
            move_hand: interaction.move_hand,
        })
    }

    pub fn update(&mut self, input: &FrameInput) {
        let scene = &mut self.built.scene;
        self.rig.process_events(scene);

        if input.session_active {
            if let Some(pad) = input.gamepad(self.move_hand) {
                if let Some(dolly) = scene.transform_mut(self.dolly) {
                    apply_thumbstick(dolly, pad, input.dt, &self.locomotion);
                }
            }
            for (slot, pose) in &input.controller_poses {
                self.rig.set_pose(scene, *slot, pose);
            }
        }

        compute_world_transforms(scene);
        self.rig.update(scene);
    }

    pub fn dolly(&self) -> NodeId {
        self.dolly
    }

    pub fn sphere(&self) -> NodeId {
        self.sphere
    }

    pub fn rig(&self) -> &ControllerRig {
        &self.rig
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::controller::{ControllerEvent, TargetRayMode};
    use crate::input::GamepadSnapshot;
    use crate::scenes::tests::registry;
    use crate::torch;
    use glam::{Mat4, Quat};

    fn build(entries: &[(&str, &[&'static str])]) -> MainScene {
        let config = AppConfig::embedded().unwrap();
        let assets = registry(entries);
        MainScene::build(&SceneContext {
            config: &config,
            assets: &assets,
            aspect: 1.5,
        })
        .unwrap()
    }

    fn full() -> MainScene {
        build(&[(SNOW_SCENE_ASSET, &["Snow", "Bark"]), (TORCH_ASSET, &[])])
    }

    fn session_frame() -> FrameInput {
        let mut input = FrameInput::new(0.5);
        input.session_active = true;
        input
    }

    fn connect(s: &mut MainScene, slot: usize, handedness: Handedness) {
        s.rig.push_event(
            slot,
            ControllerEvent::Connected {
                handedness,
                target_ray_mode: TargetRayMode::TrackedPointer,
            },
        );
    }

    /// Pose that puts the controller at `from` (dolly space) aiming at `to`.
    fn aim(from: Vec3, to: Vec3) -> Mat4 {
        Mat4::look_at_rh(from, to, Vec3::Y).inverse()
    }

    #[test]
    fn test_builds_expected_nodes() {
        let s = full();
        let scene = &s.built.scene;
        assert!(matches!(scene.background, Background::Equirectangular(ref p) if p.ends_with("snowy_park.hdr")));

        let camera = s.built.camera().unwrap();
        assert_eq!((camera.fov, camera.near, camera.far, camera.aspect), (60.0, 0.1, 100.0, 1.5));
        assert_eq!(scene.parent(s.built.camera), Some(s.dolly()));

        let sphere = scene.get(s.sphere()).unwrap();
        assert_eq!(sphere.transform.position, SPHERE_POSITION);
        assert!(!s.rig().highlight_visible(scene));
        assert_eq!(s.rig().slots().len(), 2);
        for slot in s.rig().slots() {
            assert_eq!(scene.parent(slot.controller), Some(s.dolly()));
        }
    }

    #[test]
    fn test_ground_uses_snow_material() {
        let s = full();
        let scene = &s.built.scene;
        let ground = scene
            .roots()
            .iter()
            .copied()
            .find(|&id| scene.get(id).map(|n| n.name == "ground").unwrap_or(false))
            .unwrap();
        let node = scene.get(ground).unwrap();
        let NodeKind::Mesh(mesh) = &node.kind else {
            panic!("ground should be a mesh");
        };
        assert_eq!(
            mesh.material,
            Material::FromAsset {
                asset: SNOW_SCENE_ASSET.into(),
                name: "Snow".into()
            }
        );
        assert!(node.transform.rotation.abs_diff_eq(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2), 1e-6));
    }

    #[test]
    fn test_ground_skipped_without_snow_material() {
        let s = build(&[(SNOW_SCENE_ASSET, &["Bark"]), (TORCH_ASSET, &[])]);
        let scene = &s.built.scene;
        assert!(!scene
            .roots()
            .iter()
            .any(|&id| scene.get(id).map(|n| n.name == "ground").unwrap_or(false)));
    }

    #[test]
    fn test_torch_hand_gets_torch() {
        let mut s = full();
        connect(&mut s, 0, Handedness::Left);
        s.update(&session_frame());
        let controller = s.rig().slots()[0].controller;
        assert!(s.built.scene.find_child(controller, torch::SPOTLIGHT_GROUP).is_some());
    }

    #[test]
    fn test_no_torch_asset_falls_back_to_line() {
        let mut s = build(&[(SNOW_SCENE_ASSET, &["Snow"])]);
        connect(&mut s, 0, Handedness::Left);
        s.update(&session_frame());
        let controller = s.rig().slots()[0].controller;
        assert!(s.built.scene.find_child(controller, "line").is_some());
        assert!(s.built.scene.find_child(controller, torch::SPOTLIGHT_GROUP).is_none());
    }

    #[test]
    fn test_pointer_select_highlights_sphere() {
        let mut s = full();
        connect(&mut s, 1, Handedness::Right);
        s.rig.push_event(1, ControllerEvent::SelectStart);

        let mut input = session_frame();
        input.controller_poses.push((1, aim(Vec3::new(0.0, 1.0, 0.0), SPHERE_POSITION)));
        s.update(&input);

        let scene = &s.built.scene;
        assert!(s.rig().highlight_visible(scene));
        assert_eq!(scene.parent(s.rig().highlight()), Some(s.sphere()));
    }

    #[test]
    fn test_pointer_aimed_away_keeps_highlight_hidden() {
        let mut s = full();
        connect(&mut s, 1, Handedness::Right);
        s.rig.push_event(1, ControllerEvent::SelectStart);

        let mut input = session_frame();
        input.controller_poses.push((1, aim(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 10.0))));
        s.update(&input);

        assert!(!s.rig().highlight_visible(&s.built.scene));
    }

    #[test]
    fn test_thumbstick_moves_dolly_only_in_session() {
        let pad = GamepadSnapshot {
            handedness: Handedness::Left,
            axes: vec![0.0, 0.0, 0.0, -1.0],
        };

        let mut s = full();
        let mut idle = FrameInput::new(0.5);
        idle.gamepads.push(pad.clone());
        s.update(&idle);
        assert_eq!(s.built.scene.get(s.dolly()).unwrap().transform.position, Vec3::ZERO);

        let mut input = session_frame();
        input.gamepads.push(pad);
        s.update(&input);
        let z = s.built.scene.get(s.dolly()).unwrap().transform.position.z;
        assert!((z + 1.0).abs() < 1e-5, "z={z}");

        // The camera rides along.
        let camera = s.built.scene.world_position(s.built.camera).unwrap();
        assert!((camera.z - (CAMERA_POSITION.z - 1.0)).abs() < 1e-5);
    }

    #[test]
    fn test_right_thumbstick_ignored() {
        let mut s = full();
        let mut input = session_frame();
        input.gamepads.push(GamepadSnapshot {
            handedness: Handedness::Right,
            axes: vec![0.0, 0.0, 1.0, 1.0],
        });
        s.update(&input);
        let t = s.built.scene.get(s.dolly()).unwrap().transform;
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }
}
