use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec3};
use snowxr_shared::spotlight::VolumetricSpotlight;

use crate::scene::{Geometry, Light, Material, Node, NodeId, NodeKind, Scene};

/// Name of the group toggled by select on the torch hand.
pub const SPOTLIGHT_GROUP: &str = "spotlight";
pub const TORCH_MODEL: &str = "torch";

const TORCH_SCALE: f32 = 0.2;
const SPOT_COLOR: u32 = 0xffffff;
const CONE_OFFSET_Z: f32 = -2.6;

/// Give a controller the torch model and a hidden spotlight group
/// (spot light, its target, and a volumetric light cone). Existing children
/// of the controller are expected to be cleared by the caller.
pub fn equip(scene: &mut Scene, controller: NodeId, asset: &str) -> NodeId {
    scene.add_child(
        controller,
        Node::new(TORCH_MODEL, NodeKind::Model { asset: asset.to_string() }).with_scale(Vec3::splat(TORCH_SCALE)),
    );

    let group = scene.add_child(controller, Node::group(SPOTLIGHT_GROUP).hidden());
    let target = scene.add_child(group, Node::group("spotlight_target").with_position(Vec3::NEG_Z));
    scene.add_child(
        group,
        Node::new(
            "spotlight_light",
            NodeKind::Light(Light::Spot {
                color: SPOT_COLOR,
                intensity: 2.0,
                distance: 12.0,
                angle: PI / 15.0,
                penumbra: 0.3,
                target,
            }),
        ),
    );
    scene.add_child(
        group,
        Node::mesh(
            "spotlight_cone",
            Geometry::Cylinder {
                radius_top: 0.03,
                radius_bottom: 1.0,
                height: 5.0,
                radial_segments: 32,
                height_segments: 5,
                open_ended: true,
            },
            Material::VolumetricSpotlight(VolumetricSpotlight::default().with_color(SPOT_COLOR)),
        )
        .with_rotation(Quat::from_rotation_x(FRAC_PI_2))
        .with_position(Vec3::new(0.0, 0.0, CONE_OFFSET_Z)),
    );

    group
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equip_builds_hidden_spotlight() {
        let mut scene = Scene::new();
        let controller = scene.add(Node::group("leftController"));
        let group = equip(&mut scene, controller, "torch.glb");

        assert_eq!(scene.find_child(controller, SPOTLIGHT_GROUP), Some(group));
        assert!(!scene.is_visible(group));
        assert_eq!(scene.children(group).len(), 3);

        let torch = scene.find_child(controller, TORCH_MODEL).unwrap();
        let node = scene.get(torch).unwrap();
        assert_eq!(node.kind, NodeKind::Model { asset: "torch.glb".into() });
        assert_eq!(node.transform.scale, Vec3::splat(0.2));
    }

    #[test]
    fn test_spot_light_aims_down_negative_z() {
        let mut scene = Scene::new();
        let controller = scene.add(Node::group("leftController"));
        let group = equip(&mut scene, controller, "torch.glb");

        let light = scene.find_child(group, "spotlight_light").unwrap();
        let NodeKind::Light(Light::Spot { target, angle, .. }) = scene.get(light).unwrap().kind else {
            panic!("expected spot light");
        };
        assert!((angle - PI / 15.0).abs() < 1e-6);
        assert_eq!(scene.get(target).unwrap().transform.position, Vec3::NEG_Z);
    }

    #[test]
    fn test_cone_uses_volumetric_material() {
        let mut scene = Scene::new();
        let controller = scene.add(Node::group("leftController"));
        let group = equip(&mut scene, controller, "torch.glb");
        let cone = scene.find_child(group, "spotlight_cone").unwrap();
        match &scene.get(cone).unwrap().kind {
            NodeKind::Mesh(mesh) => {
                let Material::VolumetricSpotlight(u) = &mesh.material else {
                    panic!("expected volumetric material");
                };
                assert_eq!(u.light_color, [1.0, 1.0, 1.0]);
                assert_eq!(u.attenuation, 5.0);
                assert_eq!(u.angle_power, 1.2);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(scene.get(cone).unwrap().transform.position.z, -2.6);
    }
}
