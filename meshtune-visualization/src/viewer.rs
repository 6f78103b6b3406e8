//! Mesh viewer lifecycle
//!
//! A [`MeshViewer`] exists only while attached to a surface. Attaching builds
//! the scene, camera, controls and a backend; [`MeshViewer::detach`] releases
//! the backend and returns the surface. Dropping an attached viewer releases the
//! backend too, so an early return never leaks the graphics context.

use crate::backend::{RenderBackend, Surface};
use crate::camera::{Camera, CameraFit};
use crate::controls::OrbitControls;
use crate::scene::{Scene, SceneMesh, MODEL_TAG};
use meshtune_core::{Drawable, Error, Result, TriangleMesh};
use meshtune_io::MeshPayload;
use tracing::{debug, info, warn};

pub struct MeshViewer<S: Surface> {
    surface: Option<S>,
    backend: Option<S::Backend>,
    scene: Scene,
    camera: Camera,
    controls: OrbitControls,
    size: (u32, u32),
    frames: u64,
    last_fit: Option<CameraFit>,
}

impl<S: Surface> MeshViewer<S> {
    /// Attach to `surface` and start accepting animation frames
    pub fn attach(mut surface: S) -> Result<Self> {
        let mut backend = surface.create_backend()?;
        let size = surface.size();
        backend.resize(size.0, size.1);

        let mut camera = Camera::default();
        camera.set_aspect(size.0, size.1);
        let controls = OrbitControls::new(camera.target);

        info!(width = size.0, height = size.1, "viewer attached");
        Ok(Self {
            surface: Some(surface),
            backend: Some(backend),
            scene: Scene::new(),
            camera,
            controls,
            size,
            frames: 0,
            last_fit: None,
        })
    }

    /// Stop drawing, release the backend and hand the surface back
    pub fn detach(mut self) -> Option<S> {
        self.release();
        self.surface.take()
    }

    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// Camera framing computed by the last successful [`MeshViewer::show_mesh`]
    pub fn last_fit(&self) -> Option<CameraFit> {
        self.last_fit
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    /// Draw one frame; called at the host's animation-frame cadence
    pub fn on_animation_frame(&mut self) -> Result<()> {
        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| Error::Viewer("viewer is detached".into()))?;
        self.controls.update(&mut self.camera);
        backend.render(&self.scene, &self.camera)?;
        self.frames += 1;
        Ok(())
    }

    /// Replace the displayed mesh with the one in `payload`.
    ///
    /// On failure the previously displayed mesh stays in place.
    pub fn show_mesh(&mut self, payload: &MeshPayload) -> Result<CameraFit> {
        let mesh = payload.parse().inspect_err(|e| warn!("cannot display mesh: {e}"))?;
        self.show_geometry(mesh)
    }

    /// Replace the displayed mesh with `mesh`
    pub fn show_geometry(&mut self, mut mesh: TriangleMesh) -> Result<CameraFit> {
        if mesh.is_empty() || !mesh.has_valid_indices() {
            return Err(Error::MalformedMesh("mesh has no displayable faces".into()));
        }
        let extent = mesh.bounding_box().max_dimension();
        if !(extent.is_finite() && extent > 0.0) {
            return Err(Error::MalformedMesh(format!("mesh has degenerate extent {extent}")));
        }

        mesh.compute_vertex_normals();
        let offset = -mesh.center().coords;
        mesh.translate(&offset);

        let removed = self.scene.remove_tagged(MODEL_TAG);
        let bounds = mesh.bounding_box();
        debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            removed,
            "showing mesh"
        );
        self.scene.add_mesh(SceneMesh::new(MODEL_TAG, mesh));

        let fit = self.camera.fit_to_bounds(&bounds);
        self.controls.set_target(fit.center);
        self.last_fit = Some(fit);
        Ok(fit)
    }

    /// Follow a resize of the hosting surface
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        if (width, height) == self.size {
            return;
        }
        self.size = (width, height);
        self.camera.set_aspect(width, height);
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(width, height);
        }
    }

    fn release(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.release();
            info!(frames = self.frames, "viewer detached");
        }
    }
}

impl<S: Surface> Drop for MeshViewer<S> {
    fn drop(&mut self) {
        self.release();
    }
}
