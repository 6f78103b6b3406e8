//! Core data structures and traits for meshtune
//!
//! This crate provides the fundamental types shared by every other meshtune
//! crate: the parameter schema model, parameter values and state, triangle
//! meshes with their bounding boxes, and the common error type.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod error;
pub mod value;
pub mod schema;
pub mod state;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;
pub use value::*;
pub use schema::*;
pub use state::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};

// Type aliases for easier imports
pub type Mesh = TriangleMesh;
