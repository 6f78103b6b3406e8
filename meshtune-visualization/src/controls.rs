//! Orbit-style camera controls

use crate::camera::Camera;
use meshtune_core::{Point3f, Vector3f};

/// Keeps the camera aimed at a pivot it can rotate around and dolly toward
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Point3f,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Polar angle is kept this far away from the poles (radians)
    pub polar_margin: f32,
}

impl OrbitControls {
    pub fn new(target: Point3f) -> Self {
        Self {
            target,
            min_distance: 1e-3,
            max_distance: f32::INFINITY,
            polar_margin: 0.01,
        }
    }

    pub fn set_target(&mut self, target: Point3f) {
        self.target = target;
    }

    /// Rotate the camera about the pivot by `azimuth` around the up axis and
    /// `polar` toward it, both in radians
    pub fn rotate(&self, camera: &mut Camera, azimuth: f32, polar: f32) {
        let offset = camera.position - self.target;
        let radius = offset.norm();
        if radius == 0.0 {
            return;
        }

        // Spherical coordinates with y up.
        let mut theta = offset.x.atan2(offset.z) + azimuth;
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos() - polar;
        phi = phi.clamp(self.polar_margin, std::f32::consts::PI - self.polar_margin);
        theta %= std::f32::consts::TAU;

        let rotated = Vector3f::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target + rotated;
    }

    /// Scale the camera's distance to the pivot by `factor`
    pub fn dolly(&self, camera: &mut Camera, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        let offset = camera.position - self.target;
        let radius = offset.norm();
        if radius == 0.0 {
            return;
        }
        let distance = (radius * factor).clamp(self.min_distance, self.max_distance);
        camera.position = self.target + offset * (distance / radius);
    }

    /// Aim the camera at the pivot
    pub fn update(&self, camera: &mut Camera) {
        camera.target = self.target;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Point3f::origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotate_keeps_distance() {
        let controls = OrbitControls::default();
        let mut camera = Camera::default();
        let before = camera.distance();

        controls.rotate(&mut camera, 0.7, 0.2);
        controls.update(&mut camera);

        assert_relative_eq!(camera.distance(), before, epsilon = 1e-4);
        assert_eq!(camera.target, controls.target);
    }

    #[test]
    fn test_rotate_half_turn_mirrors_position() {
        let controls = OrbitControls::default();
        let mut camera = Camera::default();
        camera.position = Point3f::new(0.0, 0.0, 4.0);

        controls.rotate(&mut camera, std::f32::consts::PI, 0.0);
        assert_relative_eq!(camera.position.z, -4.0, epsilon = 1e-4);
        assert_relative_eq!(camera.position.x, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_polar_angle_is_clamped() {
        let controls = OrbitControls::default();
        let mut camera = Camera::default();

        controls.rotate(&mut camera, 0.0, 10.0);
        assert!(camera.position.y < camera.distance());
    }

    #[test]
    fn test_dolly_scales_and_clamps() {
        let mut controls = OrbitControls::new(Point3f::new(1.0, 0.0, 0.0));
        let mut camera = Camera::default();
        camera.position = Point3f::new(1.0, 0.0, 10.0);

        controls.dolly(&mut camera, 0.5);
        assert_relative_eq!(camera.position.z, 5.0, epsilon = 1e-5);

        controls.min_distance = 2.0;
        controls.dolly(&mut camera, 0.01);
        assert_relative_eq!(camera.position.z, 2.0, epsilon = 1e-5);

        controls.dolly(&mut camera, -1.0);
        assert_relative_eq!(camera.position.z, 2.0, epsilon = 1e-5);
    }
}
