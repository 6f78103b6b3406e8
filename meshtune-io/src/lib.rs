//! I/O operations for meshtune
//!
//! This crate covers everything that turns values into text and bytes into
//! meshes:
//! - mesh payload parsing (STL binary/ASCII, OFF)
//! - source parameterization (parameter values prepended to a model template)
//! - shareable state links
//! - download artifacts for finished meshes

pub mod artifact;
pub mod format;
pub mod off;
pub mod share;
pub mod source;
pub mod stl;

pub use artifact::{DownloadArtifact, MeshPayload};
pub use format::MeshFormat;
pub use share::ShareSync;
pub use source::parameterize;

use meshtune_core::{Error, Result, TriangleMesh};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Auto-detect format and read mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match path
        .extension()
        .and_then(|s| s.to_str())
        .and_then(MeshFormat::from_extension)
    {
        Some(MeshFormat::Stl) => stl::StlReader::read_mesh(path),
        Some(MeshFormat::Off) => off::OffReader::read_mesh(path),
        None => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}
