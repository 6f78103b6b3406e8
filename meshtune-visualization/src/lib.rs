//! Mesh preview for meshtune
//!
//! This crate keeps a rendered model on screen:
//! - a scene with lighting, a ground grid and one tagged model node
//! - a perspective camera re-fitted to every new mesh
//! - orbit controls around the model
//! - the viewer lifecycle over a pluggable render backend

pub mod backend;
pub mod camera;
pub mod controls;
pub mod headless;
pub mod scene;
pub mod viewer;

pub use backend::{RenderBackend, Surface};
pub use camera::{fit_distance, Camera, CameraFit};
pub use controls::OrbitControls;
pub use headless::{HeadlessBackend, HeadlessLog, HeadlessSurface};
pub use scene::{Grid, Light, MeshVertex, Scene, SceneMesh, MODEL_TAG};
pub use viewer::MeshViewer;
