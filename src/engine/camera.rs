use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use std::f32::consts::PI;

pub struct PerspectiveCamera {
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        PerspectiveCamera {
            fov_y: fov_degrees.to_radians(),
            aspect,
            near,
            far,
            eye: Point3::new(0.0, 0.0, 1.0),
            target: Point3::origin(),
            up: Vector3::y(),
        }
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.eye, &self.target, &self.up)
    }

    pub fn projection(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov_y, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection() * self.view()
    }

    /// Camera-space right and up axes expressed in world space.
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(&self.up).normalize();
        let up = right.cross(&forward);
        (right, up)
    }

    /// World point to normalized device coordinates.
    pub fn project(&self, point: &Point3<f32>) -> Vector3<f32> {
        let clip = self.view_projection() * Vector4::new(point.x, point.y, point.z, 1.0);
        Vector3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    /// Normalized device coordinates back to world space.
    pub fn unproject(&self, ndc: &Vector3<f32>) -> Option<Point3<f32>> {
        let inverse = self.view_projection().try_inverse()?;
        let world = inverse * Vector4::new(ndc.x, ndc.y, ndc.z, 1.0);
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        Some(Point3::new(world.x / world.w, world.y / world.w, world.z / world.w))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

#[derive(Clone, Copy, Debug)]
pub struct ControlSettings {
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub zoom_speed: f32,
    pub enable_zoom: bool,
    pub enable_pan: bool,
    pub enable_damping: bool,
}

impl Default for ControlSettings {
    fn default() -> Self {
        ControlSettings {
            damping_factor: 0.05,
            min_distance: 2.0,
            max_distance: 20.0,
            zoom_speed: 1.0,
            enable_zoom: true,
            enable_pan: true,
            enable_damping: true,
        }
    }
}

const POLE_EPSILON: f32 = 1e-6;
const REST_EPSILON: f32 = 1e-6;

/// Orbit/pan/zoom rig around a target point. Input accumulates into deltas
/// that `update` integrates a fraction at a time when damping is on.
pub struct OrbitControls {
    pub settings: ControlSettings,
    pub target: Point3<f32>,
    radius: f32,
    theta: f32,
    phi: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    pan_offset: Vector3<f32>,
    drag: Option<DragMode>,
    last_pointer: (f32, f32),
}

impl OrbitControls {
    pub fn new(camera: &PerspectiveCamera, settings: ControlSettings) -> Self {
        let offset = camera.eye - camera.target;
        let radius = offset.norm();
        let (theta, phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };

        OrbitControls {
            settings,
            target: camera.target,
            radius,
            theta,
            phi,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zeros(),
            drag: None,
            last_pointer: (0.0, 0.0),
        }
    }

    pub fn distance(&self) -> f32 {
        self.radius
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_at_rest(&self) -> bool {
        self.delta_theta.abs() < REST_EPSILON
            && self.delta_phi.abs() < REST_EPSILON
            && self.pan_offset.norm() < REST_EPSILON
            && self.scale == 1.0
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    pub fn begin_drag(&mut self, mode: DragMode, x: f32, y: f32) {
        if mode == DragMode::Pan && !self.settings.enable_pan {
            return;
        }
        self.drag = Some(mode);
        self.last_pointer = (x, y);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn drag_to(&mut self, x: f32, y: f32, camera: &PerspectiveCamera, viewport_height: f32) {
        let Some(mode) = self.drag else {
            return;
        };
        let height = viewport_height.max(1.0);
        let dx = x - self.last_pointer.0;
        let dy = y - self.last_pointer.1;
        self.last_pointer = (x, y);

        match mode {
            DragMode::Rotate => {
                self.rotate_left(2.0 * PI * dx / height);
                self.rotate_up(2.0 * PI * dy / height);
            }
            DragMode::Pan => self.pan(dx, dy, camera, height),
        }
    }

    fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera, height: f32) {
        let target_distance = (camera.eye - camera.target).norm() * (camera.fov_y / 2.0).tan();
        let (right, up) = camera.basis();
        self.pan_offset -= right * (2.0 * dx * target_distance / height);
        self.pan_offset += up * (2.0 * dy * target_distance / height);
    }

    /// Wheel input; negative deltas zoom in.
    pub fn zoom(&mut self, delta_y: f32) {
        if !self.settings.enable_zoom || delta_y == 0.0 {
            return;
        }
        let step = 0.95_f32.powf(self.settings.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    /// Integrates one step of accumulated input and writes the result to the camera.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let settings = self.settings;
        let factor = if settings.enable_damping { settings.damping_factor } else { 1.0 };

        self.theta += self.delta_theta * factor;
        self.phi = (self.phi + self.delta_phi * factor).clamp(POLE_EPSILON, PI - POLE_EPSILON);
        self.radius =
            (self.radius * self.scale).clamp(settings.min_distance, settings.max_distance);
        self.target += self.pan_offset * factor;

        let sin_phi = self.phi.sin();
        let offset = Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        );
        camera.target = self.target;
        camera.eye = self.target + offset;

        if settings.enable_damping {
            self.delta_theta *= 1.0 - factor;
            self.delta_phi *= 1.0 - factor;
            self.pan_offset *= 1.0 - factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zeros();
        }
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.eye = Point3::new(10.0, 5.0, 10.0);
        camera
    }

    #[test]
    fn project_then_unproject_returns_point() {
        let camera = camera();
        let point = Point3::new(5.0, 0.0, 0.0);
        let ndc = camera.project(&point);
        let back = camera.unproject(&ndc).unwrap();
        assert_relative_eq!(back, point, epsilon = 1e-2);
    }

    #[test]
    fn update_without_input_keeps_view() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(&camera, ControlSettings::default());
        for _ in 0..10 {
            controls.update(&mut camera);
        }
        assert_relative_eq!(camera.eye, Point3::new(10.0, 5.0, 10.0), epsilon = 1e-4);
        assert!(controls.is_at_rest());
    }

    #[test]
    fn drag_keeps_moving_after_release_then_settles() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(&camera, ControlSettings::default());
        controls.begin_drag(DragMode::Rotate, 100.0, 100.0);
        controls.drag_to(160.0, 100.0, &camera, 600.0);
        controls.end_drag();

        controls.update(&mut camera);
        let first = camera.eye;
        controls.update(&mut camera);
        assert!((camera.eye - first).norm() > 0.0);

        for _ in 0..1000 {
            controls.update(&mut camera);
        }
        assert!(controls.is_at_rest());
        // orbiting never changes the distance to the target
        assert_relative_eq!((camera.eye - camera.target).norm(), 15.0, epsilon = 1e-3);
    }

    #[test]
    fn zoom_is_clamped_to_distance_limits() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(&camera, ControlSettings::default());
        for _ in 0..200 {
            controls.zoom(-100.0);
            controls.update(&mut camera);
        }
        assert_relative_eq!(controls.distance(), 2.0);
        for _ in 0..200 {
            controls.zoom(100.0);
            controls.update(&mut camera);
        }
        assert_relative_eq!(controls.distance(), 20.0);
    }

    #[test]
    fn pan_moves_target() {
        let mut camera = camera();
        let mut controls = OrbitControls::new(&camera, ControlSettings::default());
        controls.begin_drag(DragMode::Pan, 0.0, 0.0);
        controls.drag_to(50.0, 0.0, &camera, 600.0);
        controls.end_drag();
        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!((camera.target - Point3::origin()).norm() > 0.1);
    }

    #[test]
    fn pan_ignored_when_disabled() {
        let camera = camera();
        let settings = ControlSettings { enable_pan: false, ..ControlSettings::default() };
        let mut controls = OrbitControls::new(&camera, settings);
        controls.begin_drag(DragMode::Pan, 0.0, 0.0);
        assert!(!controls.is_dragging());
    }
}
