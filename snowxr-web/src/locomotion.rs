use crate::input::GamepadSnapshot;
use crate::scene::TransformState;

/// xr-standard gamepad mapping: thumbstick X and Y.
const THUMBSTICK_X: usize = 2;
const THUMBSTICK_Y: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionConfig {
    pub dead_zone: f32,
    /// Metres per second along the dolly's local Z.
    pub move_speed: f32,
    /// Radians per second about Y.
    pub turn_speed: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            dead_zone: 0.2,
            move_speed: 2.0,
            turn_speed: 1.0,
        }
    }
}

/// Turn and move the dolly from one thumbstick. Pushing right turns right,
/// pushing forward (negative Y) moves toward -Z.
pub fn apply_thumbstick(dolly: &mut TransformState, gamepad: &GamepadSnapshot, dt: f32, config: &LocomotionConfig) {
    if let Some(&x) = gamepad.axes.get(THUMBSTICK_X) {
        if x.abs() > config.dead_zone {
            let turn = dt * config.turn_speed;
            dolly.rotate_y(if x > 0.0 { -turn } else { turn });
        }
    }

    if let Some(&y) = gamepad.axes.get(THUMBSTICK_Y) {
        if y.abs() > config.dead_zone {
            let step = dt * config.move_speed;
            dolly.translate_local_z(if y > 0.0 { step } else { -step });
        }
    }
}
