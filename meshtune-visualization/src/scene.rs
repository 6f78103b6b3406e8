//! Preview scene: lights, a ground grid and tagged mesh nodes

use bytemuck::{Pod, Zeroable};
use meshtune_core::{Drawable, BoundingBox, Point3f, TriangleMesh};

/// Tag of the node holding the rendered model
pub const MODEL_TAG: &str = "meshtune-model";

/// Per-vertex data uploaded to the GPU
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

/// Scene light
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Ambient {
        color: [f32; 3],
        intensity: f32,
    },
    Directional {
        color: [f32; 3],
        intensity: f32,
        direction: [f32; 3],
    },
}

/// Square reference grid on the ground plane (y = 0)
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub size: f32,
    pub divisions: u32,
}

impl Grid {
    pub fn new(size: f32, divisions: u32) -> Self {
        Self { size, divisions }
    }

    /// Line segments making up the grid
    pub fn lines(&self) -> Vec<[Point3f; 2]> {
        let half = self.size / 2.0;
        let divisions = self.divisions.max(1);
        let step = self.size / divisions as f32;

        let mut lines = Vec::with_capacity(2 * (divisions as usize + 1));
        for i in 0..=divisions {
            let offset = -half + step * i as f32;
            lines.push([Point3f::new(offset, 0.0, -half), Point3f::new(offset, 0.0, half)]);
            lines.push([Point3f::new(-half, 0.0, offset), Point3f::new(half, 0.0, offset)]);
        }
        lines
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(200.0, 20)
    }
}

/// A shaded mesh in the scene
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub tag: String,
    pub mesh: TriangleMesh,
    pub color: [f32; 3],
}

impl SceneMesh {
    pub fn new(tag: impl Into<String>, mesh: TriangleMesh) -> Self {
        Self {
            tag: tag.into(),
            mesh,
            color: [0.8, 0.8, 0.8],
        }
    }

    pub fn vertices(&self) -> Vec<MeshVertex> {
        let normals = self.mesh.normals.as_deref();
        self.mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(i, vertex)| {
                let normal = normals
                    .and_then(|n| n.get(i))
                    .map(|n| [n.x, n.y, n.z])
                    .unwrap_or([0.0, 0.0, 1.0]);
                MeshVertex {
                    position: [vertex.x, vertex.y, vertex.z],
                    normal,
                    color: self.color,
                }
            })
            .collect()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.mesh
            .faces
            .iter()
            .flat_map(|f| [f[0] as u32, f[1] as u32, f[2] as u32])
            .collect()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.mesh.bounding_box()
    }
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub lights: Vec<Light>,
    pub grid: Option<Grid>,
    meshes: Vec<SceneMesh>,
}

impl Scene {
    /// Scene with ambient and directional lighting and a ground grid
    pub fn new() -> Self {
        Self {
            lights: vec![
                Light::Ambient {
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.5,
                },
                Light::Directional {
                    color: [1.0, 1.0, 1.0],
                    intensity: 1.0,
                    direction: [-1.0, -1.0, -1.0],
                },
            ],
            grid: Some(Grid::default()),
            meshes: Vec::new(),
        }
    }

    pub fn add_mesh(&mut self, mesh: SceneMesh) {
        self.meshes.push(mesh);
    }

    /// Remove every node carrying `tag`, returning how many were removed
    pub fn remove_tagged(&mut self, tag: &str) -> usize {
        let before = self.meshes.len();
        self.meshes.retain(|m| m.tag != tag);
        before - self.meshes.len()
    }

    pub fn mesh(&self, tag: &str) -> Option<&SceneMesh> {
        self.meshes.iter().find(|m| m.tag == tag)
    }

    pub fn meshes(&self) -> &[SceneMesh] {
        &self.meshes
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.mesh.face_count()).sum()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
