//! Manifoldness and orientation validation
//!
//! The extractor guarantees a closed 2-manifold by construction; this is
//! the independent check. An undirected edge census catches non-manifold
//! and boundary edges, directed-edge counting catches inconsistent
//! winding, and a link walk catches pinched vertices (two fans glued at
//! a single point), which the edge census alone cannot see.
//!
//! Author: Moroya Sakamoto

use crate::mesh::Mesh;
use std::collections::HashMap;

/// Mesh validation result
#[derive(Debug, Clone)]
pub struct MeshValidation {
    /// Is every edge shared by exactly two triangles?
    pub is_manifold: bool,
    /// Edges shared by more than two triangles
    pub non_manifold_edges: usize,
    /// Edges shared by exactly one triangle
    pub boundary_edges: usize,
    /// Directed edges traversed more than once (winding conflicts)
    pub misoriented_edges: usize,
    /// Vertices whose incident triangles form more than one fan
    pub pinched_vertices: usize,
    /// Triangles with (near-)zero area
    pub degenerate_triangles: usize,
    /// Vertices no triangle references
    pub unreferenced_vertices: usize,
    /// Total vertex count
    pub vertex_count: usize,
    /// Total triangle count
    pub triangle_count: usize,
}

impl MeshValidation {
    /// True if the mesh is a closed, consistently oriented 2-manifold:
    /// every edge in exactly two triangles, traversed once in each
    /// direction, and every vertex link a single cycle.
    pub fn is_watertight(&self) -> bool {
        self.is_manifold && self.misoriented_edges == 0 && self.pinched_vertices == 0
    }
}

impl std::fmt::Display for MeshValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Mesh Validation Report")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(
            f,
            "  Manifold: {}",
            if self.is_manifold { "YES" } else { "NO" }
        )?;
        writeln!(f, "  Non-manifold edges: {}", self.non_manifold_edges)?;
        writeln!(f, "  Boundary edges: {}", self.boundary_edges)?;
        writeln!(f, "  Misoriented edges: {}", self.misoriented_edges)?;
        writeln!(f, "  Pinched vertices: {}", self.pinched_vertices)?;
        writeln!(f, "  Degenerate triangles: {}", self.degenerate_triangles)?;
        writeln!(f, "  Unreferenced vertices: {}", self.unreferenced_vertices)?;
        write!(
            f,
            "  Status: {}",
            if self.is_watertight() {
                "WATERTIGHT"
            } else {
                "NOT WATERTIGHT"
            }
        )
    }
}

/// Validate a mesh's topology and orientation.
pub fn validate_mesh(mesh: &Mesh) -> MeshValidation {
    let mut undirected: HashMap<(u32, u32), u32> = HashMap::new();
    let mut directed: HashMap<(u32, u32), u32> = HashMap::new();

    for t in &mesh.tri_verts {
        for k in 0..3 {
            let a = t[k];
            let b = t[(k + 1) % 3];
            let key = if a < b { (a, b) } else { (b, a) };
            *undirected.entry(key).or_insert(0) += 1;
            *directed.entry((a, b)).or_insert(0) += 1;
        }
    }

    let non_manifold_edges = undirected.values().filter(|&&c| c > 2).count();
    let boundary_edges = undirected.values().filter(|&&c| c == 1).count();
    let is_manifold = non_manifold_edges == 0 && boundary_edges == 0;
    let misoriented_edges = directed.values().filter(|&&c| c > 1).count();

    MeshValidation {
        is_manifold,
        non_manifold_edges,
        boundary_edges,
        misoriented_edges,
        pinched_vertices: count_pinched_vertices(mesh),
        degenerate_triangles: count_degenerate_triangles(mesh),
        unreferenced_vertices: count_unreferenced_vertices(mesh),
        vertex_count: mesh.vert_pos.len(),
        triangle_count: mesh.tri_verts.len(),
    }
}

/// A vertex is pinched if its link (the opposite edges of its incident
/// triangles) does not chain into a single closed cycle.
fn count_pinched_vertices(mesh: &Mesh) -> usize {
    let mut links: HashMap<u32, Vec<(u32, u32)>> = HashMap::new();
    for t in &mesh.tri_verts {
        links.entry(t[0]).or_default().push((t[1], t[2]));
        links.entry(t[1]).or_default().push((t[2], t[0]));
        links.entry(t[2]).or_default().push((t[0], t[1]));
    }

    let mut pinched = 0;
    'vertex: for edges in links.values() {
        let mut successor: HashMap<u32, u32> = HashMap::with_capacity(edges.len());
        for &(from, to) in edges {
            if successor.insert(from, to).is_some() {
                pinched += 1;
                continue 'vertex;
            }
        }
        // Walk the cycle; it must visit every link edge before closing.
        let start = edges[0].0;
        let mut current = start;
        for step in 1..=edges.len() {
            current = match successor.get(&current) {
                Some(&next) => next,
                None => {
                    pinched += 1;
                    continue 'vertex;
                }
            };
            if current == start && step < edges.len() {
                pinched += 1;
                continue 'vertex;
            }
        }
        if current != start {
            pinched += 1;
        }
    }
    pinched
}

fn count_degenerate_triangles(mesh: &Mesh) -> usize {
    mesh.tri_verts
        .iter()
        .filter(|t| {
            let v0 = mesh.vert_pos[t[0] as usize];
            let v1 = mesh.vert_pos[t[1] as usize];
            let v2 = mesh.vert_pos[t[2] as usize];
            (v1 - v0).cross(v2 - v0).length_squared() < 1e-12
        })
        .count()
}

fn count_unreferenced_vertices(mesh: &Mesh) -> usize {
    let mut referenced = vec![false; mesh.vert_pos.len()];
    for t in &mesh.tri_verts {
        for &i in t {
            referenced[i as usize] = true;
        }
    }
    referenced.iter().filter(|&&r| !r).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Regular-winding tetrahedron: four vertices, four outward faces.
    fn tetrahedron() -> Mesh {
        Mesh {
            vert_pos: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            tri_verts: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        }
    }

    #[test]
    fn closed_tetrahedron_is_watertight() {
        let validation = validate_mesh(&tetrahedron());
        assert!(validation.is_watertight(), "{validation}");
        assert_eq!(validation.boundary_edges, 0);
        assert_eq!(validation.unreferenced_vertices, 0);
        assert_eq!(validation.degenerate_triangles, 0);
    }

    #[test]
    fn missing_face_shows_boundary_edges() {
        let mut mesh = tetrahedron();
        mesh.tri_verts.pop();
        let validation = validate_mesh(&mesh);
        assert!(!validation.is_manifold);
        assert_eq!(validation.boundary_edges, 3);
    }

    #[test]
    fn flipped_face_shows_misoriented_edges() {
        let mut mesh = tetrahedron();
        mesh.tri_verts[3] = [2, 1, 3];
        let validation = validate_mesh(&mesh);
        // Edge counts still pass, winding does not.
        assert!(validation.is_manifold);
        assert_eq!(validation.misoriented_edges, 3);
        assert!(!validation.is_watertight());
    }

    #[test]
    fn doubled_face_is_non_manifold() {
        let mut mesh = tetrahedron();
        mesh.tri_verts.push([1, 2, 3]);
        let validation = validate_mesh(&mesh);
        assert!(validation.non_manifold_edges > 0);
        assert!(!validation.is_watertight());
    }

    #[test]
    fn two_fans_glued_at_a_vertex_are_pinched() {
        // Two tetrahedra sharing only vertex 0. Every edge is still in
        // exactly two triangles; only the link walk detects the pinch.
        let mut mesh = tetrahedron();
        let offset = mesh.vert_pos.len() as u32 - 1;
        mesh.vert_pos.extend([
            Vec3::splat(2.0) + Vec3::X,
            Vec3::splat(2.0) + Vec3::Y,
            Vec3::splat(2.0) + Vec3::Z,
        ]);
        for t in tetrahedron().tri_verts {
            mesh.tri_verts
                .push([map(t[0], offset), map(t[1], offset), map(t[2], offset)]);
        }
        fn map(i: u32, offset: u32) -> u32 {
            if i == 0 {
                0
            } else {
                i + offset
            }
        }

        let validation = validate_mesh(&mesh);
        assert!(validation.is_manifold);
        assert_eq!(validation.pinched_vertices, 1);
        assert!(!validation.is_watertight());
    }

    #[test]
    fn empty_mesh_is_vacuously_watertight() {
        let validation = validate_mesh(&Mesh::new());
        assert!(validation.is_watertight());
        assert_eq!(validation.triangle_count, 0);
    }

    #[test]
    fn unreferenced_vertices_are_counted_not_fatal() {
        let mut mesh = tetrahedron();
        mesh.vert_pos.push(Vec3::splat(9.0));
        let validation = validate_mesh(&mesh);
        assert_eq!(validation.unreferenced_vertices, 1);
        assert!(validation.is_watertight());
    }
}
