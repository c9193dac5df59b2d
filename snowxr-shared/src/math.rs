use glam::{Mat4, Vec3};

/// A ray with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Forward ray of a tracked space: origin at the matrix translation, direction
    /// along the rotated -Z axis. Scale in the matrix does not affect the direction.
    pub fn from_transform(world: &Mat4) -> Self {
        let (_, rotation, translation) = world.to_scale_rotation_translation();
        Self::new(translation, rotation * Vec3::NEG_Z)
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Distance along `ray` to the first intersection with a sphere.
///
/// Only front faces count: a ray starting inside the sphere, or a sphere
/// entirely behind the origin, does not intersect.
pub fn ray_sphere_intersection(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    if radius <= 0.0 || ray.direction == Vec3::ZERO {
        return None;
    }

    let to_center = center - ray.origin;
    let t_closest = to_center.dot(ray.direction);
    let d2 = to_center.length_squared() - t_closest * t_closest;
    let r2 = radius * radius;
    if d2 > r2 {
        return None;
    }

    let half_chord = (r2 - d2).sqrt();
    let t0 = t_closest - half_chord;

    (t0 >= 0.0).then_some(t0)
}

/// Largest axis of a scale vector, used to size bounding spheres under
/// non-uniform scale.
pub fn max_scale_component(scale: Vec3) -> f32 {
    scale.x.abs().max(scale.y.abs()).max(scale.z.abs())
}
