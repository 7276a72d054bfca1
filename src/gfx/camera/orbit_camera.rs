use super::camera_utils::{Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Vertical field of view of the viewer camera, in degrees
pub const DEFAULT_FOVY_DEGREES: f32 = 75.0;
pub const DEFAULT_ZNEAR: f32 = 1.0;
pub const DEFAULT_ZFAR: f32 = 100.0;

/// Perspective camera orbiting a target point, Y up.
///
/// The projection matrix is cached. Anything that changes `aspect`, `fovy`,
/// `znear` or `zfar` must go through a setter or call
/// [`OrbitCamera::update_projection_matrix`] afterwards.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    projection: Matrix4<f32>,
    pub uniform: CameraUniform,
}

impl Camera for OrbitCamera {
    fn build_view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        Matrix4::look_at_rh(eye, target, self.up)
    }

    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection * self.build_view_matrix()
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let fovy: Rad<f32> = Deg(DEFAULT_FOVY_DEGREES).into();
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculted in `update()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy,
            znear: DEFAULT_ZNEAR,
            zfar: DEFAULT_ZFAR,
            projection: build_projection(fovy, aspect, DEFAULT_ZNEAR, DEFAULT_ZFAR),
            uniform: CameraUniform::default(),
        };
        camera.update();
        camera
    }

    /// Creates a camera placed at `position` looking at `target`
    pub fn looking_at(position: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self::new(1.0, 0.0, 0.0, target, aspect);
        camera.set_position(position);
        camera
    }

    /// Moves the eye to `position`, keeping the current target
    ///
    /// Distance bounds are not applied here; they only limit user zoom.
    pub fn set_position(&mut self, position: Vector3<f32>) {
        let offset = position - self.target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return;
        }
        self.distance = distance;
        self.pitch = (offset.y / distance)
            .clamp(-1.0, 1.0)
            .asin()
            .clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.yaw = offset.x.atan2(offset.z);
        self.update();
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    pub fn add_distance(&mut self, delta: f32) {
        let corrected_zoom = f32::log10(self.distance.max(1.1)) * delta;
        self.set_distance(self.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Pans the orbit target relative to the current view direction
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // Scale by distance so panning feels the same at every zoom level
        let pan_scale = self.distance * 0.1;
        self.target += (right * delta.0 + up * delta.1) * pan_scale;
        self.update();
    }

    /// Updates the eye after changing `distance`, `pitch`, `yaw` or `target`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    /// Sets the aspect ratio and rebuilds the cached projection
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection = build_projection(self.fovy, self.aspect, self.znear, self.zfar);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = self.build_view_projection_matrix().into();
        self.uniform.view = self.build_view_matrix().into();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: Some(1.1),
            max_distance: Some(DEFAULT_ZFAR * 0.9),
            min_pitch: -std::f32::consts::FRAC_PI_2 + 0.001,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.001,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn build_projection(fovy: Rad<f32>, aspect: f32, znear: f32, zfar: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * perspective(fovy, aspect, znear, zfar)
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}
