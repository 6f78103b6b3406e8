//! Mesh payloads and their download artifact

use crate::MeshFormat;
use meshtune_core::{Result, TriangleMesh};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Binary mesh returned by the compute engine, shared without copying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshPayload {
    pub format: MeshFormat,
    pub data: Arc<[u8]>,
}

impl MeshPayload {
    pub fn new(format: MeshFormat, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            format,
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Parse the payload into a renderable mesh
    pub fn parse(&self) -> Result<TriangleMesh> {
        self.format.parse(&self.data)
    }

    /// The payload offered for download, untransformed
    pub fn artifact(&self) -> DownloadArtifact {
        DownloadArtifact {
            file_name: self.format.file_name(),
            payload: self.clone(),
        }
    }
}

/// A named file holding the last successful mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub payload: MeshPayload,
}

impl DownloadArtifact {
    pub fn bytes(&self) -> &[u8] {
        &self.payload.data
    }

    /// Write the artifact into `dir`, returning the written path
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.bytes())?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_is_named_after_format() {
        let payload = MeshPayload::new(MeshFormat::Stl, vec![1u8, 2, 3]);
        let artifact = payload.artifact();
        assert_eq!(artifact.file_name, "model.stl");
        assert_eq!(artifact.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_save_writes_bytes_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let payload = MeshPayload::new(MeshFormat::Off, b"OFF\n".to_vec());

        let path = payload.artifact().save_to(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "model.off");
        assert_eq!(std::fs::read(path).unwrap(), b"OFF\n");
    }
}
