//! OFF (Object File Format) support, ASCII variant

use crate::MeshReader;
use meshtune_core::{Error, Point3f, Result, TriangleMesh};
use std::path::Path;

pub struct OffReader;

impl MeshReader for OffReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let data = std::fs::read(path)?;
        parse_off(&data)
    }
}

/// Parse an ASCII OFF payload. Polygons are fan-triangulated; per-face colors
/// trailing the index list are ignored.
pub fn parse_off(data: &[u8]) -> Result<TriangleMesh> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::MalformedMesh(format!("OFF payload is not valid UTF-8: {e}")))?;

    let mut lines = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty());

    let header = lines
        .next()
        .ok_or_else(|| Error::MalformedMesh("empty OFF payload".into()))?;
    let counts_line = match header.strip_prefix("OFF") {
        Some(rest) if !rest.trim().is_empty() => rest.trim(),
        Some(_) => lines
            .next()
            .ok_or_else(|| Error::MalformedMesh("OFF payload missing element counts".into()))?,
        None => return Err(Error::MalformedMesh("missing OFF header".into())),
    };

    let counts = parse_numbers::<usize>(counts_line, "element counts")?;
    let (vertex_count, face_count) = match counts.as_slice() {
        [v, f, ..] => (*v, *f),
        _ => return Err(Error::MalformedMesh("OFF counts need vertex and face totals".into())),
    };

    let mut mesh = TriangleMesh::new();
    for _ in 0..vertex_count {
        let line = lines
            .next()
            .ok_or_else(|| Error::MalformedMesh("OFF payload ends before all vertices".into()))?;
        let coords = parse_numbers::<f32>(line, "vertex")?;
        match coords.as_slice() {
            [x, y, z, ..] if [x, y, z].iter().all(|c| c.is_finite()) => {
                mesh.add_vertex(Point3f::new(*x, *y, *z));
            }
            _ => return Err(Error::MalformedMesh(format!("bad OFF vertex line '{line}'"))),
        }
    }

    for _ in 0..face_count {
        let line = lines
            .next()
            .ok_or_else(|| Error::MalformedMesh("OFF payload ends before all faces".into()))?;
        let mut tokens = line.split_whitespace();
        let corners: usize = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(|| Error::MalformedMesh(format!("bad OFF face line '{line}'")))?;
        let indices: Vec<usize> = tokens
            .take(corners)
            .map(|t| t.parse::<usize>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::MalformedMesh(format!("bad OFF face index: {e}")))?;
        if corners < 3 || indices.len() != corners {
            return Err(Error::MalformedMesh(format!("bad OFF face line '{line}'")));
        }
        if let Some(bad) = indices.iter().find(|&&i| i >= vertex_count) {
            return Err(Error::MalformedMesh(format!("OFF face references vertex {bad}")));
        }
        for k in 1..corners - 1 {
            mesh.add_face([indices[0], indices[k], indices[k + 1]]);
        }
    }

    if mesh.face_count() == 0 {
        return Err(Error::MalformedMesh("OFF payload contains no faces".into()));
    }
    Ok(mesh)
}

fn parse_numbers<T: std::str::FromStr>(line: &str, what: &str) -> Result<Vec<T>> {
    line.split_whitespace()
        .map(|t| {
            t.parse::<T>()
                .map_err(|_| Error::MalformedMesh(format!("bad OFF {what} '{line}'")))
        })
        .collect()
}
