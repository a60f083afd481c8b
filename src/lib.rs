//! # levelset
//!
//! Watertight level-set meshing: a signed-distance function goes in, a
//! manifold triangle mesh comes out.
//!
//! The extractor is a form of Marching Tetrahedra over a body-centered
//! cubic (BCC) lattice: two interleaved cubic grids whose cells split
//! into six congruent tetrahedra around each body diagonal. A
//! tetrahedron has no ambiguous sign configuration, so the output is
//! manifold by construction (every edge shared by exactly two triangles,
//! every vertex neighborhood a topological disk) and wound consistently
//! outward.
//!
//! Sign convention: **positive distances are inside**. If the
//! function's interior reaches the bounding box, the surface closes
//! against the box faces with an egg-crate pattern at the grid scale.
//!
//! ## Features
//!
//! - **Extraction**: [`level_set`], the two-pass parallel extractor
//! - **Validation**: [`mesh::validate_mesh`] for manifoldness, winding,
//!   and vertex-link checks
//! - **Measurement**: [`mesh::volume`], [`mesh::surface_area`]
//! - **Export**: [`io::export_obj`]
//!
//! ## Example
//!
//! ```rust
//! use levelset::prelude::*;
//!
//! // Unit sphere, positive inside.
//! let mesh = level_set(
//!     |p: Vec3| 1.0 - p.length(),
//!     Aabb::new(Vec3::splat(-1.2), Vec3::splat(1.2)),
//!     0.15,
//!     0.0,
//! );
//!
//! assert!(validate_mesh(&mesh).is_watertight());
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

pub mod grid;
pub mod hash;
pub mod io;
pub mod mesh;
pub mod morton;
pub mod types;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::io::{export_obj, IoError};
    pub use crate::mesh::{
        level_set, level_set_with, surface_area, validate_mesh, volume, LevelSetConfig, Mesh,
        MeshValidation,
    };
    pub use crate::types::Aabb;
    pub use glam::Vec3;
}

// Re-exports for convenience
pub use mesh::{level_set, Mesh};
pub use types::Aabb;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_basic_workflow() {
        // Sphere of radius 1, meshed at a coarse edge length.
        let mesh = level_set(
            |p: Vec3| 1.0 - p.length(),
            Aabb::new(Vec3::splat(-1.3), Vec3::splat(1.3)),
            0.2,
            0.0,
        );

        assert!(mesh.vertex_count() > 100);
        assert!(mesh.triangle_count() > 100);
        assert!(validate_mesh(&mesh).is_watertight());

        // Enclosed volume close to 4/3 pi.
        let v = volume(&mesh);
        assert!((v - 4.19).abs() < 0.4, "volume {v}");
    }

    #[test]
    fn test_level_offset_shrinks_the_surface() {
        let bounds = Aabb::new(Vec3::splat(-1.3), Vec3::splat(1.3));
        let sdf = |p: Vec3| 1.0 - p.length();

        let full = level_set(sdf, bounds, 0.15, 0.0);
        let inset = level_set(sdf, bounds, 0.15, 0.4);
        assert!(volume(&inset) < volume(&full) * 0.5);
        assert!(validate_mesh(&inset).is_watertight());
    }

    #[test]
    fn test_mesh_container_append() {
        let bounds = Aabb::new(Vec3::splat(-1.3), Vec3::splat(1.3));
        let sdf = |p: Vec3| 1.0 - p.length();

        let mut combined = level_set(sdf, bounds, 0.25, 0.0);
        let first_tris = combined.triangle_count();
        combined.append(level_set(sdf, bounds, 0.25, 0.0));
        assert_eq!(combined.triangle_count(), first_tris * 2);
    }
}
