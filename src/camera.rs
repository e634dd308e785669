//! Perspective camera and orbit controls around a fixed target.

use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::TAU;

use crate::params::{CameraRig, OrbitLimits};

/// Keeps the polar angle away from the poles
const POLAR_EPSILON: f32 = 1e-6;

/// Perspective camera looking at a target
#[derive(Debug, Clone)]
pub struct CameraSystem {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    near: f32,
    far: f32,
}

impl CameraSystem {
    pub fn new(rig: &CameraRig) -> Self {
        Self {
            position: Vec3::from_array(rig.start_position),
            target: Vec3::from_array(rig.target),
            fov_degrees: rig.fov_degrees,
            near: rig.near_plane,
            far: rig.far_plane,
        }
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn view_matrix(&self) -> Mat4 {
        // Always keep Y as up vector (camera never rolls)
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.clamp(1.0, 179.0).to_radians(),
            aspect,
            self.near,
            self.far,
        )
    }

    /// Create view-projection matrix for rendering
    ///
    /// # Returns
    /// Tuple of (view_proj_matrix, camera_position)
    pub fn create_view_proj_matrix(&self, aspect: f32) -> (Mat4, Vec3) {
        (self.projection_matrix(aspect) * self.view_matrix(), self.position)
    }

    /// World-space ray through a point in normalized device coordinates
    /// (x right, y up, both in [-1, 1]). Returns (origin, unit direction).
    pub fn ray_through(&self, ndc: Vec2, aspect: f32) -> (Vec3, Vec3) {
        let (view_proj, eye) = self.create_view_proj_matrix(aspect);
        let inverse = view_proj.inverse();
        let far_point = inverse.project_point3(ndc.extend(1.0));
        (eye, (far_point - eye).normalize_or_zero())
    }
}

/// Orbit controls: drag rotates, wheel dollies, `update` clamps the camera
/// onto the allowed spherical region around the target
#[derive(Debug, Clone)]
pub struct OrbitControls {
    limits: OrbitLimits,
    target: Vec3,
}

/// Spherical coordinates relative to the orbit target (three-style: theta
/// from +Z toward +X, phi from +Y)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

impl OrbitControls {
    pub fn new(rig: &CameraRig) -> Self {
        Self {
            limits: rig.orbit.clone(),
            target: Vec3::from_array(rig.target),
        }
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Drag by a pixel delta; a full viewport-height drag is one turn
    pub fn rotate(&self, camera: &mut CameraSystem, delta_px: Vec2, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        let mut spherical = Spherical::from_offset(camera.position - self.target);
        spherical.theta -= TAU * delta_px.x / height * self.limits.rotate_speed;
        spherical.phi -= TAU * delta_px.y / height * self.limits.rotate_speed;
        camera.position = self.target + spherical.to_offset();
        self.update(camera);
    }

    /// Dolly by wheel lines; positive moves closer
    pub fn zoom(&self, camera: &mut CameraSystem, lines: f32) {
        let mut spherical = Spherical::from_offset(camera.position - self.target);
        spherical.radius *= self.limits.zoom_step.powf(lines);
        camera.position = self.target + spherical.to_offset();
        self.update(camera);
    }

    /// Clamp the camera into the allowed region and aim it at the target
    pub fn update(&self, camera: &mut CameraSystem) {
        let l = &self.limits;
        let mut spherical = Spherical::from_offset(camera.position - self.target);

        spherical.theta = spherical.theta.clamp(l.min_azimuth, l.max_azimuth);
        spherical.phi = spherical
            .phi
            .clamp(l.min_polar, l.max_polar)
            .clamp(POLAR_EPSILON, std::f32::consts::PI - POLAR_EPSILON);
        spherical.radius = spherical.radius.clamp(l.min_distance, l.max_distance);

        camera.position = self.target + spherical.to_offset();
        camera.target = self.target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn rig() -> CameraRig {
        CameraRig::default()
    }

    #[test]
    fn test_view_proj_matrix_generation() {
        let camera = CameraSystem::new(&rig());
        let (view_proj, eye) = camera.create_view_proj_matrix(16.0 / 9.0);

        assert_eq!(eye, Vec3::new(1.0, 2.0, 6.0));
        assert_ne!(view_proj, Mat4::IDENTITY);

        // Target projects to the centre of the screen
        let ndc = view_proj.project_point3(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }

    #[test]
    fn test_ray_through_centre_hits_target() {
        let camera = CameraSystem::new(&rig());
        let (origin, dir) = camera.ray_through(Vec2::ZERO, 1.5);
        let to_target = (Vec3::ZERO - origin).normalize();
        assert!(dir.dot(to_target) > 0.9999);
    }

    #[test]
    fn test_spherical_round_trip() {
        let offset = Vec3::new(5.0, 4.0, 4.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-5);
    }

    #[test]
    fn test_update_clamps_distance_keeping_direction() {
        let controls = OrbitControls::new(&rig());
        let mut camera = CameraSystem::new(&rig());
        camera.position = Vec3::new(10.0, 5.0, 10.0);

        controls.update(&mut camera);

        assert!((camera.position.length() - 10.0).abs() < 1e-4);
        let dir = camera.position.normalize();
        assert!(dir.dot(Vec3::new(10.0, 5.0, 10.0).normalize()) > 0.9999);
    }

    #[test]
    fn test_update_clamps_angles() {
        let controls = OrbitControls::new(&rig());
        let mut camera = CameraSystem::new(&rig());

        // Straight overhead, behind the azimuth limit
        camera.position = Vec3::new(-7.0, 7.0, -0.5);
        controls.update(&mut camera);

        let s = Spherical::from_offset(camera.position);
        let limits = OrbitLimits::default();
        assert!(s.theta >= limits.min_azimuth - 1e-5 && s.theta <= limits.max_azimuth + 1e-5);
        assert!(s.phi <= PI / 2.5 + 1e-5);
    }

    #[test]
    fn test_rotate_and_zoom_stay_in_bounds() {
        let controls = OrbitControls::new(&rig());
        let mut camera = CameraSystem::new(&rig());

        controls.rotate(&mut camera, Vec2::new(5000.0, -5000.0), 720.0);
        let distance = camera.position.length();
        assert!((5.0 - 1e-4..=10.0 + 1e-4).contains(&distance));

        for _ in 0..100 {
            controls.zoom(&mut camera, 1.0);
        }
        assert!((camera.position.length() - 5.0).abs() < 1e-4);

        for _ in 0..100 {
            controls.zoom(&mut camera, -1.0);
        }
        assert!((camera.position.length() - 10.0).abs() < 1e-4);
    }
}
