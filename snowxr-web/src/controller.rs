//! XR controller interaction.
//!
//! Host callbacks (connect, disconnect, select start/end) are queued as
//! [`ControllerEvent`]s and drained once per frame. Each controller slot owns
//! a small state machine:
//!
//! ```text
//! Idle --SelectStart--> Selecting --SelectEnd--> Idle
//! ```
//!
//! While the pointer-hand controller is `Selecting`, its forward ray is tested
//! against the registered targets and the highlight is attached to the nearest
//! hit.

use std::collections::VecDeque;

use glam::{Mat4, Vec3};
use serde::Deserialize;
use snowxr_shared::math::{max_scale_component, ray_sphere_intersection, Ray};

use crate::scene::{Geometry, Material, Node, NodeId, Scene, Side};
use crate::torch;

/// Length the pointer line is stretched to while select is held.
const LINE_SELECT_LENGTH: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
    None,
}

impl Handedness {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRayMode {
    Gaze,
    TrackedPointer,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    Connected {
        handedness: Handedness,
        target_ray_mode: TargetRayMode,
    },
    Disconnected,
    SelectStart,
    SelectEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectState {
    #[default]
    Idle,
    Selecting,
}

/// Per-controller interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerState {
    /// Known only after the connect event; cleared on disconnect.
    pub handedness: Option<Handedness>,
    pub target_ray_mode: Option<TargetRayMode>,
    pub select: SelectState,
}

impl ControllerState {
    pub fn apply(self, event: ControllerEvent) -> Self {
        match event {
            ControllerEvent::Connected {
                handedness,
                target_ray_mode,
            } => Self {
                handedness: Some(handedness),
                target_ray_mode: Some(target_ray_mode),
                select: SelectState::Idle,
            },
            ControllerEvent::Disconnected => Self::default(),
            ControllerEvent::SelectStart => Self {
                select: SelectState::Selecting,
                ..self
            },
            ControllerEvent::SelectEnd => Self {
                select: SelectState::Idle,
                ..self
            },
        }
    }

    pub fn is_selecting(&self) -> bool {
        self.select == SelectState::Selecting
    }
}

/// One physical controller: target-ray space node and grip space node.
#[derive(Debug, Clone, Copy)]
pub struct ControllerSlot {
    pub controller: NodeId,
    pub grip: NodeId,
    pub state: ControllerState,
}

/// Object the pointer ray can highlight, bounded by a sphere of `radius`
/// in the node's local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayTarget {
    pub node: NodeId,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub node: NodeId,
    pub distance: f32,
    pub point: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RigConfig {
    pub pointer_hand: Handedness,
    pub torch_hand: Handedness,
    /// Manifest key of the torch model, if it was loaded.
    pub torch_asset: Option<String>,
}

pub struct ControllerRig {
    slots: Vec<ControllerSlot>,
    events: VecDeque<(usize, ControllerEvent)>,
    targets: Vec<RayTarget>,
    highlight: NodeId,
    config: RigConfig,
}

impl ControllerRig {
    /// Create `slot_count` controller and grip nodes under `parent`.
    pub fn new(scene: &mut Scene, parent: NodeId, slot_count: usize, highlight: NodeId, config: RigConfig) -> Self {
        let slots = (0..slot_count)
            .map(|i| ControllerSlot {
                controller: scene.add_child(parent, Node::group(format!("controller{i}"))),
                grip: scene.add_child(parent, Node::group(format!("grip{i}"))),
                state: ControllerState::default(),
            })
            .collect();
        scene.set_visible(highlight, false);

        Self {
            slots,
            events: VecDeque::new(),
            targets: Vec::new(),
            highlight,
            config,
        }
    }

    pub fn add_target(&mut self, target: RayTarget) {
        self.targets.push(target);
    }

    pub fn slots(&self) -> &[ControllerSlot] {
        &self.slots
    }

    pub fn highlight(&self) -> NodeId {
        self.highlight
    }

    /// Queue a host event for the next [`process_events`](Self::process_events).
    pub fn push_event(&mut self, slot: usize, event: ControllerEvent) {
        if slot < self.slots.len() {
            self.events.push_back((slot, event));
        } else {
            log::warn!("dropping {event:?} for unknown controller slot {slot}");
        }
    }

    /// Set a controller's target-ray pose (relative to its parent).
    pub fn set_pose(&self, scene: &mut Scene, slot: usize, pose: &Mat4) {
        if let Some(s) = self.slots.get(slot) {
            if let Some(t) = scene.transform_mut(s.controller) {
                t.set_from_matrix(pose);
            }
        }
    }

    /// Slot currently driving the pointer ray: the first one whose connect
    /// event reported the configured pointer hand.
    pub fn pointer_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.state.handedness == Some(self.config.pointer_hand))
    }

    /// Apply all queued events in arrival order.
    pub fn process_events(&mut self, scene: &mut Scene) {
        while let Some((index, event)) = self.events.pop_front() {
            let slot = self.slots[index];
            let next = slot.state.apply(event);
            self.slots[index].state = next;

            match event {
                ControllerEvent::Connected {
                    handedness,
                    target_ray_mode,
                } => self.on_connected(scene, slot, handedness, target_ray_mode),
                ControllerEvent::Disconnected => {
                    log::info!("controller {index} disconnected");
                    scene.remove_children(slot.controller);
                    scene.remove_children(slot.grip);
                    if slot.state.handedness == Some(self.config.pointer_hand) {
                        scene.set_visible(self.highlight, false);
                    }
                }
                ControllerEvent::SelectStart => {
                    if let Some(line) = scene.find_child(slot.controller, "line") {
                        if let Some(t) = scene.transform_mut(line) {
                            t.scale.z = LINE_SELECT_LENGTH;
                        }
                    }
                    if let Some(spot) = scene.find_child(slot.controller, torch::SPOTLIGHT_GROUP) {
                        scene.set_visible(spot, true);
                    }
                }
                ControllerEvent::SelectEnd => {
                    if let Some(line) = scene.find_child(slot.controller, "line") {
                        if let Some(t) = scene.transform_mut(line) {
                            t.scale.z = 0.0;
                        }
                    }
                    if let Some(spot) = scene.find_child(slot.controller, torch::SPOTLIGHT_GROUP) {
                        scene.set_visible(spot, false);
                    }
                    if next.handedness == Some(self.config.pointer_hand) {
                        scene.set_visible(self.highlight, false);
                    }
                }
            }
        }
    }

    fn on_connected(&self, scene: &mut Scene, slot: ControllerSlot, handedness: Handedness, mode: TargetRayMode) {
        log::info!("{} controller connected ({mode:?})", handedness.label());
        if let Some(node) = scene.get_mut(slot.controller) {
            node.name = format!("{}Controller", handedness.label());
        }
        scene.remove_children(slot.controller);
        scene.remove_children(slot.grip);

        if mode != TargetRayMode::TrackedPointer {
            return;
        }

        match &self.config.torch_asset {
            Some(asset) if handedness == self.config.torch_hand => {
                torch::equip(scene, slot.controller, asset);
            }
            _ => {
                scene.add_child(
                    slot.controller,
                    Node::mesh(
                        "line",
                        Geometry::Line,
                        Material::Basic {
                            color: 0xffffff,
                            side: Side::Front,
                        },
                    )
                    .with_scale(Vec3::new(1.0, 1.0, 0.0)),
                );
            }
        }
    }

    /// Run the pointer ray test. World transforms must be current.
    pub fn update(&mut self, scene: &mut Scene) -> Option<RayHit> {
        let pointer = self
            .pointer_slot()
            .map(|i| self.slots[i])
            .filter(|s| s.state.is_selecting());

        let Some(slot) = pointer else {
            scene.set_visible(self.highlight, false);
            return None;
        };

        let hit = scene
            .world_transform(slot.controller)
            .and_then(|world| self.nearest_hit(scene, &Ray::from_transform(&world)));

        match hit {
            Some(hit) => {
                scene.attach(self.highlight, hit.node);
                scene.set_visible(self.highlight, true);
            }
            None => scene.set_visible(self.highlight, false),
        }
        hit
    }

    fn nearest_hit(&self, scene: &Scene, ray: &Ray) -> Option<RayHit> {
        self.targets
            .iter()
            .filter_map(|target| {
                let world = scene.world_transform(target.node)?;
                let (scale, _, center) = world.to_scale_rotation_translation();
                let radius = target.radius * max_scale_component(scale);
                let distance = ray_sphere_intersection(ray, center, radius)?;
                Some(RayHit {
                    node: target.node,
                    distance,
                    point: ray.at(distance),
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    pub fn highlight_visible(&self, scene: &Scene) -> bool {
        scene.is_visible(self.highlight)
    }
}
