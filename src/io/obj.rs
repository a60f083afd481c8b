//! Wavefront OBJ export
//!
//! Positions and faces only; level-set meshes carry no normals or UVs.
//! Compatible with Blender, Maya, MeshLab, and every DCC tool that
//! reads plain OBJ.
//!
//! Author: Moroya Sakamoto

use crate::io::IoError;
use crate::mesh::Mesh;
use std::io::Write;
use std::path::Path;

/// Export a mesh to Wavefront OBJ format
pub fn export_obj(mesh: &Mesh, path: impl AsRef<Path>) -> Result<(), IoError> {
    let path = path.as_ref();
    let file = std::fs::File::create(path)?;
    let mut w = std::io::BufWriter::new(file);

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("mesh");

    writeln!(w, "# levelset OBJ export")?;
    writeln!(w, "# Vertices: {}", mesh.vertex_count())?;
    writeln!(w, "# Triangles: {}", mesh.triangle_count())?;
    writeln!(w, "o {}", stem)?;

    for p in &mesh.vert_pos {
        writeln!(w, "v {} {} {}", p.x, p.y, p.z)?;
    }

    // OBJ face indices are 1-based.
    for t in &mesh.tri_verts {
        writeln!(w, "f {} {} {}", t[0] + 1, t[1] + 1, t[2] + 1)?;
    }

    w.flush()?;
    Ok(())
}
