//! Mesh formats the compute engine can be asked to produce

use crate::{off, stl};
use meshtune_core::{Error, Result, TriangleMesh};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output format of a render job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    #[default]
    Stl,
    Off,
}

impl MeshFormat {
    pub const ALL: [MeshFormat; 2] = [MeshFormat::Stl, MeshFormat::Off];

    /// File extension, also the wire name of the format
    pub fn extension(self) -> &'static str {
        match self {
            MeshFormat::Stl => "stl",
            MeshFormat::Off => "off",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }

    /// Name of the download artifact, `model.<ext>`
    pub fn file_name(self) -> String {
        format!("model.{}", self.extension())
    }

    /// Parse a payload of this format into a triangle mesh
    pub fn parse(self, data: &[u8]) -> Result<TriangleMesh> {
        match self {
            MeshFormat::Stl => stl::parse_stl(data),
            MeshFormat::Off => off::parse_off(data),
        }
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for MeshFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s.trim())
            .ok_or_else(|| Error::UnsupportedFormat(format!("unsupported mesh format: {s}")))
    }
}
