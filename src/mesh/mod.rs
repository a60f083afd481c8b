//! Mesh output and analysis
//!
//! The extractor emits an indexed triangle mesh: positions plus triangles
//! wound counter-clockwise seen from outside the surface. Validation and
//! measurement helpers live alongside the container.
//!
//! Author: Moroya Sakamoto

mod level_set;
mod measure;
mod validate;

pub use level_set::{level_set, level_set_with, LevelSetConfig};
pub use measure::{surface_area, volume};
pub use validate::{validate_mesh, MeshValidation};

use glam::Vec3;

/// Indexed triangle mesh produced by the level-set extractor.
///
/// No normals, UVs, or attributes; positions and topology only. The
/// winding convention is counter-clockwise viewed from outside, i.e.
/// outward normals by the right-hand rule.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex positions
    pub vert_pos: Vec<Vec3>,
    /// Triangles as index triples into `vert_pos`
    pub tri_verts: Vec<[u32; 3]>,
}

impl Mesh {
    /// Create an empty mesh
    pub fn new() -> Self {
        Mesh::default()
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vert_pos.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.tri_verts.len()
    }

    /// Append another mesh, re-basing its triangle indices
    pub fn append(&mut self, other: Mesh) {
        let base = self.vert_pos.len() as u32;
        self.vert_pos.extend(other.vert_pos);
        self.tri_verts
            .extend(other.tri_verts.iter().map(|t| [t[0] + base, t[1] + base, t[2] + base]));
    }
}
