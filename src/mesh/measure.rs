//! Mesh volume and surface area
//!
//! Volume via the divergence theorem: the signed tetrahedron volumes
//! against the origin sum to the enclosed volume when the mesh is
//! closed and wound outward. A negative result means inverted winding.
//! Accumulation is in f64; large meshes lose too much in f32.
//!
//! Author: Moroya Sakamoto

use crate::mesh::Mesh;

/// Signed enclosed volume of a closed mesh.
///
/// Positive for counter-clockwise-from-outside winding; meaningless on
/// open meshes.
pub fn volume(mesh: &Mesh) -> f64 {
    let mut six_volume = 0.0f64;
    for t in &mesh.tri_verts {
        let a = mesh.vert_pos[t[0] as usize].as_dvec3();
        let b = mesh.vert_pos[t[1] as usize].as_dvec3();
        let c = mesh.vert_pos[t[2] as usize].as_dvec3();
        six_volume += a.dot(b.cross(c));
    }
    six_volume / 6.0
}

/// Total triangle area of a mesh.
pub fn surface_area(mesh: &Mesh) -> f64 {
    let mut double_area = 0.0f64;
    for t in &mesh.tri_verts {
        let a = mesh.vert_pos[t[0] as usize].as_dvec3();
        let b = mesh.vert_pos[t[1] as usize].as_dvec3();
        let c = mesh.vert_pos[t[2] as usize].as_dvec3();
        double_area += (b - a).cross(c - a).length();
    }
    double_area / 2.0
}
