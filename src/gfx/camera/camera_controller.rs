use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

use super::orbit_camera::OrbitCamera;

/// Input accumulated since the last update, not yet applied to the camera
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitDelta {
    pub yaw: f32,
    pub pitch: f32,
    pub pan: (f32, f32),
    pub zoom: f32,
}

impl OrbitDelta {
    fn is_settled(&self) -> bool {
        const EPS: f32 = 1e-6;
        self.yaw.abs() < EPS
            && self.pitch.abs() < EPS
            && self.pan.0.abs() < EPS
            && self.pan.1.abs() < EPS
            && self.zoom.abs() < EPS
    }
}

/// Orbit controls: pointer input in, camera motion out
///
/// Input only accumulates into a pending delta. [`CameraController::update`]
/// applies it once per frame. With damping on, each update applies
/// `damping_factor` of the pending rotation and pan and keeps the rest, so
/// motion eases out over the following frames. Zoom is applied at once.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pending: OrbitDelta,
    is_shift_held: bool,
    is_mouse_pressed: bool,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            enable_damping: true,
            damping_factor: 0.05,
            pending: OrbitDelta::default(),
            is_shift_held: false,
            is_mouse_pressed: false,
        }
    }

    pub fn with_damping(mut self, damping_factor: Option<f32>) -> Self {
        match damping_factor {
            Some(factor) => {
                self.enable_damping = true;
                self.damping_factor = factor.clamp(f32::EPSILON, 1.0);
            }
            None => self.enable_damping = false,
        }
        self
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.is_mouse_pressed = state == ElementState::Pressed;
        }
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) {
        let scroll_amount = -match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                *scroll as f32 / 40.0
            }
        };
        self.pending.zoom += scroll_amount * self.zoom_speed;
    }

    /// Handles raw pointer motion; returns true when the camera will move
    pub fn process_events(&mut self, event: &DeviceEvent) -> bool {
        match event {
            DeviceEvent::MouseMotion { delta } if self.is_mouse_pressed => {
                if self.is_shift_held {
                    // SHIFT + DRAG = PAN (move focus point)
                    self.pending.pan.0 += -delta.0 as f32 * self.pan_speed;
                    self.pending.pan.1 += delta.1 as f32 * self.pan_speed;
                } else {
                    // NORMAL DRAG = ROTATE (orbit around focus)
                    self.pending.yaw += -delta.0 as f32 * self.rotate_speed;
                    self.pending.pitch += delta.1 as f32 * self.rotate_speed;
                }
                true
            }
            _ => false,
        }
    }

    pub fn process_keyed_events(&mut self, event: &KeyEvent) {
        if let KeyEvent {
            physical_key: PhysicalKey::Code(KeyCode::ShiftLeft | KeyCode::ShiftRight),
            state,
            ..
        } = event
        {
            self.is_shift_held = *state == ElementState::Pressed;
        }
    }

    /// Queues a rotation as if it came from pointer input
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        self.pending.yaw += yaw;
        self.pending.pitch += pitch;
    }

    pub fn pending(&self) -> OrbitDelta {
        self.pending
    }

    /// Applies pending input to the camera; returns true if the camera moved
    pub fn update(&mut self, camera: &mut OrbitCamera) -> bool {
        if self.pending.is_settled() {
            self.pending = OrbitDelta::default();
            return false;
        }

        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        if self.pending.yaw != 0.0 {
            camera.add_yaw(self.pending.yaw * factor);
        }
        if self.pending.pitch != 0.0 {
            camera.add_pitch(self.pending.pitch * factor);
        }
        if self.pending.pan != (0.0, 0.0) {
            camera.pan((self.pending.pan.0 * factor, self.pending.pan.1 * factor));
        }
        if self.pending.zoom != 0.0 {
            camera.add_distance(self.pending.zoom);
        }

        let keep = 1.0 - factor;
        self.pending = OrbitDelta {
            yaw: self.pending.yaw * keep,
            pitch: self.pending.pitch * keep,
            pan: (self.pending.pan.0 * keep, self.pending.pan.1 * keep),
            zoom: 0.0,
        };
        true
    }

    pub fn is_panning(&self) -> bool {
        self.is_mouse_pressed && self.is_shift_held
    }

    pub fn is_rotating(&self) -> bool {
        self.is_mouse_pressed && !self.is_shift_held
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(0.005, 0.5)
    }
}
