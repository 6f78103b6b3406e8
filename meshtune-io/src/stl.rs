//! STL format support (binary and ASCII)

use crate::MeshReader;
use meshtune_core::{Error, Point3f, Result, TriangleMesh};
use std::path::Path;

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

pub struct StlReader;

impl MeshReader for StlReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let data = std::fs::read(path)?;
        parse_stl(&data)
    }
}

/// Parse an STL payload, detecting binary vs ASCII encoding.
///
/// Every facet contributes three fresh vertices; the result is not indexed
/// across facets. A payload with no facets is rejected.
pub fn parse_stl(data: &[u8]) -> Result<TriangleMesh> {
    let mesh = if is_binary(data) {
        parse_binary(data)?
    } else if looks_ascii(data) {
        parse_ascii(data)?
    } else {
        parse_binary(data)?
    };

    if mesh.face_count() == 0 {
        return Err(Error::MalformedMesh("STL payload contains no facets".into()));
    }
    Ok(mesh)
}

/// Binary STL whose facet count agrees with the payload length
fn is_binary(data: &[u8]) -> bool {
    facet_count(data).is_some_and(|count| HEADER_LEN + 4 + count * FACET_LEN == data.len())
}

fn looks_ascii(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    data[start..].starts_with(b"solid")
}

fn facet_count(data: &[u8]) -> Option<usize> {
    let bytes: [u8; 4] = data.get(HEADER_LEN..HEADER_LEN + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes) as usize)
}

fn parse_binary(data: &[u8]) -> Result<TriangleMesh> {
    let count = facet_count(data)
        .ok_or_else(|| Error::MalformedMesh("STL payload shorter than its header".into()))?;
    let expected = count
        .checked_mul(FACET_LEN)
        .and_then(|n| n.checked_add(HEADER_LEN + 4))
        .ok_or_else(|| Error::MalformedMesh(format!("implausible facet count {count}")))?;
    if data.len() < expected {
        return Err(Error::MalformedMesh(format!(
            "binary STL declares {count} facets but holds {} bytes",
            data.len()
        )));
    }

    let mut mesh = TriangleMesh::new();
    mesh.vertices.reserve(count * 3);
    mesh.faces.reserve(count);

    for facet in data[HEADER_LEN + 4..expected].chunks_exact(FACET_LEN) {
        // 12 bytes of facet normal precede the corners; the viewer recomputes normals.
        let mut corners = [0usize; 3];
        for (corner, slot) in corners.iter_mut().enumerate() {
            let offset = 12 + corner * 12;
            let vertex = Point3f::new(
                read_f32(facet, offset),
                read_f32(facet, offset + 4),
                read_f32(facet, offset + 8),
            );
            *slot = push_vertex(&mut mesh, vertex)?;
        }
        mesh.add_face(corners);
    }

    Ok(mesh)
}

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    f32::from_le_bytes(word)
}

fn parse_ascii(data: &[u8]) -> Result<TriangleMesh> {
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::MalformedMesh(format!("ASCII STL is not valid UTF-8: {e}")))?;

    let mut mesh = TriangleMesh::new();
    let mut corners: Vec<usize> = Vec::with_capacity(3);
    let mut in_loop = false;

    for (line_no, line) in text.lines().enumerate() {
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("outer") => {
                if in_loop {
                    return Err(ascii_error(line_no, "nested 'outer loop'"));
                }
                in_loop = true;
                corners.clear();
            }
            Some("vertex") => {
                if !in_loop {
                    return Err(ascii_error(line_no, "'vertex' outside of a loop"));
                }
                let mut coords = [0f32; 3];
                for coord in &mut coords {
                    *coord = tokens
                        .next()
                        .and_then(|t| t.parse::<f32>().ok())
                        .ok_or_else(|| ascii_error(line_no, "bad vertex coordinate"))?;
                }
                let index = push_vertex(&mut mesh, Point3f::new(coords[0], coords[1], coords[2]))
                    .map_err(|_| ascii_error(line_no, "non-finite vertex coordinate"))?;
                corners.push(index);
            }
            Some("endloop") => {
                if !in_loop || corners.len() != 3 {
                    return Err(ascii_error(line_no, "facet loop does not hold three vertices"));
                }
                mesh.add_face([corners[0], corners[1], corners[2]]);
                in_loop = false;
            }
            Some("solid") | Some("facet") | Some("endfacet") | Some("endsolid") | None => {}
            Some(other) => {
                return Err(ascii_error(line_no, &format!("unexpected token '{other}'")));
            }
        }
    }

    if in_loop {
        return Err(Error::MalformedMesh("ASCII STL ends inside a facet loop".into()));
    }
    Ok(mesh)
}

fn push_vertex(mesh: &mut TriangleMesh, vertex: Point3f) -> Result<usize> {
    if vertex.iter().all(|c| c.is_finite()) {
        Ok(mesh.add_vertex(vertex))
    } else {
        Err(Error::MalformedMesh("non-finite vertex coordinate".into()))
    }
}

fn ascii_error(line_no: usize, message: &str) -> Error {
    Error::MalformedMesh(format!("ASCII STL line {}: {message}", line_no + 1))
}

/// Encode a mesh as binary STL, with per-facet normals
pub fn write_binary_stl(mesh: &TriangleMesh) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + 4 + mesh.face_count() * FACET_LEN);
    let mut header = [0u8; HEADER_LEN];
    let label = b"meshtune";
    header[..label.len()].copy_from_slice(label);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(mesh.face_count() as u32).to_le_bytes());

    for (face, normal) in mesh.faces.iter().zip(mesh.calculate_face_normals()) {
        for c in normal.iter() {
            out.extend_from_slice(&c.to_le_bytes());
        }
        for &index in face {
            for c in mesh.vertices[index].iter() {
                out.extend_from_slice(&c.to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
    }

    #[test]
    fn test_binary_stl() {
        let data = write_binary_stl(&tetrahedron());
        assert_eq!(data.len(), 84 + 4 * 50);

        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.vertices[11], Point3f::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_binary_header_starting_with_solid() {
        // Some exporters write "solid" into the binary header.
        let mut data = write_binary_stl(&tetrahedron());
        data[..5].copy_from_slice(b"solid");
        assert_eq!(parse_stl(&data).unwrap().face_count(), 4);
    }

    #[test]
    fn test_ascii_stl() {
        let text = "solid cube\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 1 0 0\n\
                vertex 0 1 0\n\
              endloop\n\
            endfacet\n\
            endsolid cube\n";

        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertices[1], Point3f::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_truncated_binary_is_malformed() {
        let data = write_binary_stl(&tetrahedron());
        let result = parse_stl(&data[..data.len() - 10]);
        assert!(matches!(result, Err(Error::MalformedMesh(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(parse_stl(b"not a mesh"), Err(Error::MalformedMesh(_))));
        assert!(matches!(parse_stl(b""), Err(Error::MalformedMesh(_))));
        assert!(matches!(
            parse_stl(b"solid x\nouter loop\nvertex 0 0\n"),
            Err(Error::MalformedMesh(_))
        ));
    }

    #[test]
    fn test_empty_solid_is_rejected() {
        let result = parse_stl(b"solid empty\nendsolid empty\n");
        assert!(matches!(result, Err(Error::MalformedMesh(_))));
    }
}
