//! Body-centered cubic lattice tables
//!
//! The BCC grid is the union of a corner sublattice (w = 0) and a center
//! sublattice (w = 1) offset by half a cell. Each grid vertex owns seven
//! of its incident edges, and every cell decomposes into six congruent
//! tetrahedra sharing the body diagonal, which is what makes the
//! extracted surface manifold: a tetrahedron has no ambiguous sign
//! configuration.
//!
//! The two case tables below are load-bearing. Together with the edge
//! assembly in the triangle pass they guarantee that every internal edge
//! of the output is referenced by exactly the two tetrahedra sharing it.
//! Do not reorder or "simplify" them.
//!
//! Author: Moroya Sakamoto

use glam::IVec4;

/// Offsets of the seven edges owned by each grid vertex, as (x, y, z, w)
/// index deltas. Entry 0 is the body diagonal into this cell's center;
/// entries 1-3 are the positive axes; entries 4-6 are body diagonals into
/// the centers of the negatively adjacent cells.
pub const NEIGHBORS: [IVec4; 7] = [
    IVec4::new(0, 0, 0, 1),
    IVec4::new(1, 0, 0, 0),
    IVec4::new(0, 1, 0, 0),
    IVec4::new(0, 0, 1, 0),
    IVec4::new(-1, 0, 0, 1),
    IVec4::new(0, -1, 0, 1),
    IVec4::new(0, 0, -1, 1),
];

/// First triangle per 4-bit inside-mask, as indices into the 6-entry
/// tetrahedron edge array. `[-1, -1, -1]` means no triangle.
pub const TET_TRI0: [[i32; 3]; 16] = [
    [-1, -1, -1],
    [0, 3, 4],
    [0, 1, 5],
    [1, 5, 3],
    [1, 4, 2],
    [1, 0, 3],
    [2, 5, 0],
    [5, 3, 2],
    [2, 3, 5],
    [0, 5, 2],
    [3, 0, 1],
    [2, 4, 1],
    [3, 5, 1],
    [5, 1, 0],
    [4, 3, 0],
    [-1, -1, -1],
];

/// Second triangle per 4-bit inside-mask; only the two-corners-inside
/// cases produce a quad and need it.
pub const TET_TRI1: [[i32; 3]; 16] = [
    [-1, -1, -1],
    [-1, -1, -1],
    [-1, -1, -1],
    [3, 4, 1],
    [-1, -1, -1],
    [3, 2, 1],
    [0, 4, 2],
    [-1, -1, -1],
    [-1, -1, -1],
    [2, 4, 0],
    [1, 2, 3],
    [-1, -1, -1],
    [1, 4, 3],
    [-1, -1, -1],
    [-1, -1, -1],
    [-1, -1, -1],
];

/// Cyclic successor of an axis index: 0 -> 1 -> 2 -> 0.
#[inline(always)]
pub fn next3(i: usize) -> usize {
    const NEXT3: [usize; 3] = [1, 2, 0];
    NEXT3[i]
}

/// Cyclic predecessor of an axis index: 0 -> 2 -> 1 -> 0.
#[inline(always)]
pub fn prev3(i: usize) -> usize {
    const PREV3: [usize; 3] = [2, 0, 1];
    PREV3[i]
}

/// Canonicalize an index after offset arithmetic: adding two half-cell
/// steps yields w = 2, which names the corner vertex one cell up,
/// (x+1, y+1, z+1, 0).
#[inline(always)]
pub fn normalize_w(mut index: IVec4) -> IVec4 {
    if index.w == 2 {
        index += IVec4::ONE;
        index.w = 0;
    }
    index
}
