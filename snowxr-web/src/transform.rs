use glam::Mat4;

use crate::scene::{NodeId, Scene, TransformState};

/// Compute world transform matrices for every node reachable from the roots,
/// composing parent * local on the way down.
pub fn compute_world_transforms(scene: &mut Scene) {
    let mut stack: Vec<(NodeId, Mat4)> = scene.roots().iter().rev().map(|r| (*r, Mat4::IDENTITY)).collect();

    while let Some((id, parent_world)) = stack.pop() {
        let Some(node) = scene.get_mut(id) else {
            continue;
        };
        let world = parent_world * compose_local_transform(&node.transform);
        node.world_transform = world;
        node.transform.dirty = false;

        for child in node.children.iter().rev() {
            stack.push((*child, world));
        }
    }
}

/// Compose a local transform matrix from position, rotation, and scale.
pub fn compose_local_transform(t: &TransformState) -> Mat4 {
    Mat4::from_scale_rotation_translation(t.scale, t.rotation, t.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;
    use glam::{Quat, Vec3};

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_child_inherits_parent_translation() {
        let mut scene = Scene::new();
        let dolly = scene.add(Node::group("dolly").with_position(Vec3::new(0.0, 0.0, 5.0)));
        let cam = scene.add_child(dolly, Node::group("camera").with_position(Vec3::new(0.0, 1.6, 3.0)));
        compute_world_transforms(&mut scene);
        assert!(approx_vec(scene.world_position(cam).unwrap(), Vec3::new(0.0, 1.6, 8.0)));
    }

    #[test]
    fn test_parent_rotation_and_scale_apply() {
        let mut scene = Scene::new();
        let parent = scene.add(
            Node::group("parent")
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2))
                .with_scale(Vec3::splat(2.0)),
        );
        let child = scene.add_child(parent, Node::group("child").with_position(Vec3::new(0.0, 0.0, -1.0)));
        compute_world_transforms(&mut scene);
        // -Z rotated +90° about Y is -X, then doubled
        assert!(approx_vec(scene.world_position(child).unwrap(), Vec3::new(-2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_reattached_node_follows_new_parent() {
        let mut scene = Scene::new();
        let a = scene.add(Node::group("a").with_position(Vec3::X));
        let b = scene.add(Node::group("b").with_position(Vec3::Y));
        let h = scene.add_child(a, Node::group("h"));
        compute_world_transforms(&mut scene);
        assert!(approx_vec(scene.world_position(h).unwrap(), Vec3::X));
        scene.attach(h, b);
        compute_world_transforms(&mut scene);
        assert!(approx_vec(scene.world_position(h).unwrap(), Vec3::Y));
        assert!(!scene.get(h).unwrap().transform.dirty);
    }
}
