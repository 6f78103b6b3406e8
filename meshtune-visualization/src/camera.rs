//! Camera utilities for the mesh preview

use meshtune_core::{BoundingBox, Point3f, Vector3f};
use nalgebra::{Matrix4, Perspective3, Point3, Vector3};

/// Margin applied to the fitted distance
pub const FIT_MARGIN: f32 = 1.5;

/// A perspective camera looking at a target point
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

/// Result of framing a bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFit {
    pub center: Point3f,
    pub distance: f32,
    pub position: Point3f,
}

impl Camera {
    /// Create a new camera
    pub fn new(
        position: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
        fov: f32,
        aspect_ratio: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            position,
            target,
            up,
            fov,
            aspect_ratio,
            near,
            far,
        }
    }

    pub fn fov_radians(&self) -> f32 {
        self.fov.to_radians()
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let perspective = Perspective3::new(self.aspect_ratio, self.fov_radians(), self.near, self.far);
        perspective.into_inner()
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Distance from the camera to its target
    pub fn distance(&self) -> f32 {
        (self.position - self.target).norm()
    }

    /// Recompute the aspect ratio for a surface size. A zero-sized surface
    /// leaves the camera unchanged.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    /// Frame `bounds` from the symmetric diagonal, looking at its center
    pub fn fit_to_bounds(&mut self, bounds: &BoundingBox) -> CameraFit {
        let center = bounds.center();
        let distance = fit_distance(bounds.max_dimension() / 2.0, self.fov_radians());
        let position = center + Vector3f::new(distance, distance, distance);

        self.target = center;
        self.position = position;
        // Keep the far plane behind the whole box.
        self.far = self.far.max(distance * 4.0);

        CameraFit {
            center,
            distance,
            position,
        }
    }
}

/// Camera distance that keeps an object of size `max_dimension` in view
pub fn fit_distance(max_dimension: f32, fov_radians: f32) -> f32 {
    (max_dimension / (fov_radians / 2.0).sin()).abs() * FIT_MARGIN
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::new(5.0, 5.0, 5.0),
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            45.0,
            1.0,
            0.1,
            1000.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_cube_at_45_degrees() {
        let mut camera = Camera::default();
        let bounds = BoundingBox::new(Point3f::new(-5.0, -5.0, -5.0), Point3f::new(5.0, 5.0, 5.0));

        let fit = camera.fit_to_bounds(&bounds);
        let expected = 5.0 / 22.5f32.to_radians().sin() * 1.5;

        assert_relative_eq!(fit.distance, expected, epsilon = 1e-4);
        assert_relative_eq!(fit.distance, 19.6, epsilon = 0.01);
        assert_relative_eq!(camera.position.x, expected, epsilon = 1e-4);
        assert_relative_eq!(camera.position.y, expected, epsilon = 1e-4);
        assert_relative_eq!(camera.position.z, expected, epsilon = 1e-4);
        assert_eq!(camera.target, Point3f::origin());
    }

    #[test]
    fn test_fit_follows_largest_extent() {
        let mut camera = Camera::default();
        let bounds = BoundingBox::new(Point3f::new(1.0, 0.0, 0.0), Point3f::new(3.0, 8.0, 1.0));

        let fit = camera.fit_to_bounds(&bounds);
        assert_eq!(fit.center, Point3f::new(2.0, 4.0, 0.5));
        assert_relative_eq!(fit.distance, fit_distance(4.0, camera.fov_radians()));
        assert_relative_eq!(camera.position.x - 2.0, fit.distance, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_size_surface_keeps_aspect() {
        let mut camera = Camera::default();
        camera.set_aspect(1920, 1080);
        assert_relative_eq!(camera.aspect_ratio, 16.0 / 9.0);

        camera.set_aspect(0, 1080);
        assert_relative_eq!(camera.aspect_ratio, 16.0 / 9.0);
    }

    #[test]
    fn test_view_matrix_maps_target_forward() {
        let camera = Camera::default();
        let target_in_view = camera.view_matrix().transform_point(&camera.target);
        assert_relative_eq!(target_in_view.z, -camera.distance(), epsilon = 1e-5);
    }
}
