//! Common test helpers for levelset integration tests
//!
//! All shape functions follow the crate convention: positive distances
//! are inside.
//!
//! Author: Moroya Sakamoto

use levelset::prelude::*;

// ============================================================================
// Standard test fields
// ============================================================================

/// Sphere of the given radius centered at `center`
pub fn sphere_at(center: Vec3, radius: f32) -> impl Fn(Vec3) -> f32 + Sync {
    move |p| radius - (p - center).length()
}

/// Unit-style sphere at the origin
pub fn sphere(radius: f32) -> impl Fn(Vec3) -> f32 + Sync {
    sphere_at(Vec3::ZERO, radius)
}

/// Axis-aligned cube with the given half-extent (max-norm field)
pub fn cube(half: f32) -> impl Fn(Vec3) -> f32 + Sync {
    move |p| half - p.abs().max_element()
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert two f64 values are close within tolerance
#[allow(dead_code)]
pub fn assert_close(a: f64, b: f64, tol: f64, msg: &str) {
    assert!(
        (a - b).abs() < tol,
        "{}: {} vs {} (diff={}, tol={})",
        msg,
        a,
        b,
        (a - b).abs(),
        tol
    );
}

/// Assert a mesh is a closed, consistently oriented 2-manifold
#[allow(dead_code)]
pub fn assert_watertight(mesh: &Mesh, context: &str) {
    let validation = validate_mesh(mesh);
    assert!(validation.is_watertight(), "{}:\n{}", context, validation);
}

/// Vertex positions sorted lexicographically, for order-insensitive
/// comparison of meshes produced by different parallel schedules
#[allow(dead_code)]
pub fn sorted_positions(mesh: &Mesh) -> Vec<Vec3> {
    let mut positions = mesh.vert_pos.clone();
    positions.sort_by(|a, b| {
        (a.x, a.y, a.z)
            .partial_cmp(&(b.x, b.y, b.z))
            .expect("mesh positions are finite")
    });
    positions
}
