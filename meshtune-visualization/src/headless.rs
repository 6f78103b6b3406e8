//! Window-less backend that records what it was asked to draw

use crate::backend::{RenderBackend, Surface};
use crate::camera::Camera;
use crate::scene::Scene;
use meshtune_core::{Error, Point3f, Result};
use std::cell::RefCell;
use std::rc::Rc;

/// One recorded frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub triangles: usize,
    pub camera_position: Point3f,
    pub camera_target: Point3f,
}

/// Everything the backends created from one surface did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessLog {
    pub backends_created: usize,
    pub releases: usize,
    pub resizes: Vec<(u32, u32)>,
    pub frames: Vec<FrameRecord>,
}

impl HeadlessLog {
    /// Backends created and not yet released
    pub fn live_backends(&self) -> usize {
        self.backends_created - self.releases
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    width: u32,
    height: u32,
    log: Rc<RefCell<HeadlessLog>>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            log: Rc::new(RefCell::new(HeadlessLog::default())),
        }
    }

    /// Change the surface size as a host window would
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Snapshot of the activity recorded so far
    pub fn log(&self) -> HeadlessLog {
        self.log.borrow().clone()
    }
}

impl Surface for HeadlessSurface {
    type Backend = HeadlessBackend;

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_backend(&mut self) -> Result<HeadlessBackend> {
        self.log.borrow_mut().backends_created += 1;
        Ok(HeadlessBackend {
            log: Rc::clone(&self.log),
            released: false,
        })
    }
}

#[derive(Debug)]
pub struct HeadlessBackend {
    log: Rc<RefCell<HeadlessLog>>,
    released: bool,
}

impl RenderBackend for HeadlessBackend {
    fn resize(&mut self, width: u32, height: u32) {
        self.log.borrow_mut().resizes.push((width, height));
    }

    fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<()> {
        if self.released {
            return Err(Error::Viewer("render after release".into()));
        }
        self.log.borrow_mut().frames.push(FrameRecord {
            triangles: scene.triangle_count(),
            camera_position: camera.position,
            camera_target: camera.target,
        });
        Ok(())
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.log.borrow_mut().releases += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_records_and_refuses_after_release() {
        let mut surface = HeadlessSurface::new(640, 480);
        let mut backend = surface.create_backend().unwrap();
        let scene = Scene::new();
        let camera = Camera::default();

        backend.render(&scene, &camera).unwrap();
        backend.release();
        backend.release();

        assert!(matches!(backend.render(&scene, &camera), Err(Error::Viewer(_))));
        let log = surface.log();
        assert_eq!(log.frames.len(), 1);
        assert_eq!(log.releases, 1);
        assert_eq!(log.live_backends(), 0);
    }
}
