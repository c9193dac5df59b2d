use glam::{Mat4, Quat, Vec3};
use snowxr_shared::spotlight::VolumetricSpotlight;

use crate::handle::{Handle, HandleStore};

pub type NodeId = Handle<Node>;

/// Local transform of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub dirty: bool,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            dirty: true,
        }
    }
}

impl TransformState {
    /// Move along the node's own Z axis.
    pub fn translate_local_z(&mut self, distance: f32) {
        self.position += self.rotation * Vec3::Z * distance;
        self.dirty = true;
    }

    pub fn rotate_y(&mut self, angle: f32) {
        self.rotation = (self.rotation * Quat::from_rotation_y(angle)).normalize();
        self.dirty = true;
    }

    /// Replace position/rotation/scale from a rigid pose matrix.
    pub fn set_from_matrix(&mut self, m: &Mat4) {
        let (scale, rotation, position) = m.to_scale_rotation_translation();
        self.position = position;
        self.rotation = rotation;
        self.scale = scale;
        self.dirty = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    Box { width: f32, height: f32, depth: f32 },
    Sphere { radius: f32, width_segments: u32 },
    Plane { width: f32, height: f32, width_segments: u32, height_segments: u32 },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    },
    /// Unit pointer line along -Z; stretched by node scale.
    Line,
}

impl Geometry {
    /// Radius of a sphere enclosing the geometry in local space.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Geometry::Box { width, height, depth } => Vec3::new(width, height, depth).length() * 0.5,
            Geometry::Sphere { radius, .. } => radius,
            Geometry::Plane { width, height, .. } => (width * width + height * height).sqrt() * 0.5,
            Geometry::Cylinder { radius_top, radius_bottom, height, .. } => {
                let r = radius_top.max(radius_bottom);
                (r * r + height * height * 0.25).sqrt()
            }
            Geometry::Line => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    /// Unlit color.
    Basic { color: u32, side: Side },
    /// Material embedded in a loaded model asset, looked up by name.
    FromAsset { asset: String, name: String },
    VolumetricSpotlight(VolumetricSpotlight),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Hemisphere { sky: u32, ground: u32, intensity: f32 },
    /// Shines from the node position toward the origin.
    Directional { color: u32, intensity: f32 },
    Spot {
        color: u32,
        intensity: f32,
        distance: f32,
        angle: f32,
        penumbra: f32,
        target: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Camera(Camera),
    Mesh(Mesh),
    Light(Light),
    /// Root of a loaded model asset, keyed by manifest filename.
    Model { asset: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Color(u32),
    /// Equirectangular HDR image used for background and environment lighting.
    Equirectangular(String),
}

pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transform: TransformState,
    pub world_transform: Mat4,
    pub visible: bool,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: TransformState::default(),
            world_transform: Mat4::IDENTITY,
            visible: true,
            kind,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh(Mesh { geometry, material }))
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Node hierarchy for one scene.
pub struct Scene {
    nodes: HandleStore<Node>,
    roots: Vec<NodeId>,
    pub background: Background,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: HandleStore::new(),
            roots: Vec::new(),
            background: Background::Color(0x000000),
        }
    }

    /// Add a node at the top level.
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = self.nodes.insert(node);
        self.roots.push(id);
        id
    }

    /// Add a node under `parent`. Falls back to the top level if `parent`
    /// no longer exists.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.nodes.insert(node);
        if self.nodes.contains(parent) {
            self.link(parent, id);
        } else {
            self.roots.push(id);
        }
        id
    }

    /// Move an existing node under `parent`, keeping its local transform.
    pub fn attach(&mut self, child: NodeId, parent: NodeId) {
        if child == parent || !self.nodes.contains(child) || !self.nodes.contains(parent) {
            return;
        }
        if self.parent(child) == Some(parent) {
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("refusing to attach {child:?} under its own descendant {parent:?}");
            return;
        }
        self.detach(child);
        self.link(parent, child);
    }

    /// Unlink a node from its parent (or the top level) without destroying it.
    pub fn detach(&mut self, id: NodeId) {
        let parent = match self.nodes.get_mut(id) {
            Some(node) => node.parent.take(),
            None => return,
        };
        match parent {
            Some(p) => {
                if let Some(parent_node) = self.nodes.get_mut(p) {
                    parent_node.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.transform.dirty = true;
        }
    }

    /// Destroy a node and its whole subtree.
    pub fn despawn(&mut self, id: NodeId) {
        self.detach(id);
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(next) {
                stack.extend(node.children);
            }
        }
    }

    /// Destroy every child of `id`, leaving `id` itself in place.
    pub fn remove_children(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        for child in children {
            self.despawn(child);
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
            node.transform.dirty = true;
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(child);
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// First direct child of `parent` with the given name.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|c| self.nodes.get(*c).is_some_and(|n| n.name == name))
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = visible;
        }
    }

    /// Own visibility flag, ignoring ancestors.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.visible)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut TransformState> {
        self.nodes.get_mut(id).map(|n| {
            n.transform.dirty = true;
            &mut n.transform
        })
    }

    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        self.nodes.get(id).map(|n| n.world_transform)
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_transform(id).map(|m| m.w_axis.truncate())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
