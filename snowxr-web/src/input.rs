use glam::Mat4;

use crate::controller::Handedness;

/// Gamepad state of one XR input source for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GamepadSnapshot {
    pub handedness: Handedness,
    pub axes: Vec<f32>,
}

/// Everything a scene's per-frame update reads from the host.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Seconds since the previous frame.
    pub dt: f32,
    pub session_active: bool,
    pub gamepads: Vec<GamepadSnapshot>,
    /// Target-ray pose per controller slot, relative to the reference space.
    pub controller_poses: Vec<(usize, Mat4)>,
}

impl FrameInput {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            ..Default::default()
        }
    }

    /// Reset per-frame data, keeping allocations.
    pub fn clear(&mut self) {
        self.dt = 0.0;
        self.gamepads.clear();
        self.controller_poses.clear();
    }

    pub fn gamepad(&self, handedness: Handedness) -> Option<&GamepadSnapshot> {
        self.gamepads.iter().find(|g| g.handedness == handedness)
    }
}

/// Frame timer fed by animation-frame timestamps in milliseconds.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_time: f64,
}

impl FrameClock {
    /// Seconds elapsed since the previous tick. The first tick assumes ~60fps.
    pub fn tick(&mut self, time_ms: f64) -> f32 {
        let dt = if self.last_time > 0.0 && time_ms >= self.last_time {
            (time_ms - self.last_time) / 1000.0
        } else {
            0.016
        };
        self.last_time = time_ms;
        dt as f32
    }
}
