//! Seam between the viewer and a graphics API

use crate::camera::Camera;
use crate::scene::Scene;
use meshtune_core::Result;

/// Drawable surface a viewer can be attached to
pub trait Surface {
    type Backend: RenderBackend;

    /// Current size in physical pixels
    fn size(&self) -> (u32, u32);

    /// Acquire a graphics context bound to this surface
    fn create_backend(&mut self) -> Result<Self::Backend>;
}

/// A renderer bound to one surface for one attach lifetime
pub trait RenderBackend {
    fn resize(&mut self, width: u32, height: u32);

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()>;

    /// Free every retained graphics resource
    fn release(&mut self);
}
