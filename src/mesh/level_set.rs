//! Level-set extraction: Marching Tetrahedra on a BCC lattice
//!
//! Two data-parallel passes over a uniform body-centered cubic grid.
//! The vertex pass walks every Morton code in the grid's key range,
//! finds the owned edges that cross the surface, emits an interpolated
//! vertex per crossing, and inserts the surviving grid-vertex records
//! into a lock-free hash table. The triangle pass walks the table's
//! slots and triangulates the six tetrahedra around each record's body
//! diagonal from the case tables. Each tetrahedron is owned by exactly
//! one record, so no triangle is emitted twice and no locking is needed.
//!
//! Hash-table overflow is a normal control path: the vertex pass
//! short-circuits once the table passes half load, and the driver grows
//! the table and retries. Output buffers are sized for the worst case
//! and truncated to the shared counters afterwards.
//!
//! Author: Moroya Sakamoto

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{IVec3, IVec4, Vec3};
use rayon::prelude::*;

use crate::grid::{next3, normalize_w, prev3, NEIGHBORS, TET_TRI0, TET_TRI1};
use crate::hash::{GridVert, HashTable};
use crate::mesh::Mesh;
use crate::morton::{decode_morton, morton_code, OPEN};
use crate::types::Aabb;

/// Configuration for level-set extraction
#[derive(Debug, Clone, Copy)]
pub struct LevelSetConfig {
    /// Approximate edge length of the output triangles, in world units.
    /// Sets the grid spacing, and with it cost and fidelity.
    pub edge_length: f32,
    /// Iso-level: positive insets the surface, negative outsets it
    pub level: f32,
    /// Initial hash-table size in slots; 0 picks a surface-area
    /// heuristic from the grid dimensions
    pub table_size: usize,
}

impl Default for LevelSetConfig {
    fn default() -> Self {
        LevelSetConfig {
            edge_length: 1.0,
            level: 0.0,
            table_size: 0,
        }
    }
}

/// Fixed-capacity buffer accepting scattered writes from parallel
/// workers. Writers obtain distinct indices from a shared atomic
/// counter, so every slot has at most one writer and is read only after
/// the pass joins.
struct ScatterBuffer<T> {
    slots: Vec<UnsafeCell<T>>,
}

// SAFETY: the unique-index discipline above; no slot is ever written
// twice or read while the writing pass is live.
unsafe impl<T: Send + Sync> Sync for ScatterBuffer<T> {}

impl<T: Copy> ScatterBuffer<T> {
    fn new(len: usize, fill: T) -> Self {
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || UnsafeCell::new(fill));
        ScatterBuffer { slots }
    }

    /// # Safety
    /// `idx` must be a ticket from the pass's shared counter, held by
    /// this writer alone.
    #[inline(always)]
    unsafe fn write(&self, idx: usize, value: T) {
        *self.slots[idx].get() = value;
    }

    /// # Safety
    /// No writer may be live.
    #[inline(always)]
    unsafe fn read(&self, idx: usize) -> T {
        *self.slots[idx].get()
    }

    fn into_vec(self, len: usize) -> Vec<T> {
        let mut out: Vec<T> = self.slots.into_iter().map(|c| c.into_inner()).collect();
        out.truncate(len);
        out
    }
}

/// The caller's SDF bound to the grid: evaluates at grid indices,
/// shifts by the iso-level, and clamps non-positive on the domain
/// frontier so the surface closes against the bounding box.
struct BoundedSdf<'a, F> {
    sdf: &'a F,
    origin: Vec3,
    spacing: Vec3,
    /// One past the caller-visible grid extent per axis; indices at or
    /// beyond it are frontier.
    bound: IVec3,
    level: f32,
}

impl<F: Fn(Vec3) -> f32> BoundedSdf<'_, F> {
    /// World position of a grid index. The corner sublattice (w = 0)
    /// sits half a cell below the center sublattice, so a corner/center
    /// pair spans one cell's body diagonal.
    #[inline(always)]
    fn position(&self, index: IVec4) -> Vec3 {
        let offset = if index.w == 1 { 0.0 } else { -0.5 };
        self.origin + self.spacing * (index.truncate().as_vec3() + Vec3::splat(offset))
    }

    #[inline(always)]
    fn value(&self, index: IVec4) -> f32 {
        let d = (self.sdf)(self.position(index)) - self.level;

        let xyz = index.truncate();
        let on_lower = xyz.cmple(IVec3::ZERO).any();
        let on_upper = xyz.cmpge(self.bound).any();
        let on_half = index.w == 1 && xyz.cmpge(self.bound - IVec3::ONE).any();
        if on_lower || on_upper || on_half {
            d.min(0.0)
        } else {
            d
        }
    }
}

/// Vertex pass: one invocation per Morton code in `[0, max_morton]`.
struct ComputeVerts<'a, F> {
    sdf: BoundedSdf<'a, F>,
    verts: &'a ScatterBuffer<Vec3>,
    vert_index: &'a AtomicUsize,
    grid_verts: &'a HashTable,
}

impl<F: Fn(Vec3) -> f32 + Sync> ComputeVerts<'_, F> {
    fn run(&self, code: u64) {
        if self.grid_verts.full() {
            return;
        }

        let grid_index = decode_morton(code);

        // The interleave covers codes beyond the grid extent; skip them.
        if grid_index.truncate().cmpgt(self.sdf.bound).any() {
            return;
        }

        let position = self.sdf.position(grid_index);

        let mut vert = GridVert {
            key: code,
            distance: self.sdf.value(grid_index),
            edge_verts: [-1; 7],
        };

        let mut keep = false;
        // Any of the seven uniquely-owned edges that crosses the surface
        // produces an interpolated vertex.
        for (i, &offset) in NEIGHBORS.iter().enumerate() {
            let neighbor = normalize_w(grid_index + offset);
            let val = self.sdf.value(neighbor);
            if (val > 0.0) == (vert.distance > 0.0) {
                continue;
            }
            keep = true;

            let idx = self.vert_index.fetch_add(1, Ordering::Relaxed);
            let crossing = (val * position - vert.distance * self.sdf.position(neighbor))
                / (val - vert.distance);
            // SAFETY: `idx` is this writer's ticket from the shared counter.
            unsafe { self.verts.write(idx, crossing) };
            vert.edge_verts[i] = idx as i32;
        }

        if keep {
            self.grid_verts.insert(vert);
        }
    }
}

/// Triangle pass: one invocation per hash-table slot.
struct BuildTris<'a> {
    grid_verts: &'a HashTable,
    tris: &'a ScatterBuffer<[u32; 3]>,
    tri_index: &'a AtomicUsize,
}

impl BuildTris<'_> {
    #[inline]
    fn create_tri(&self, tri: [i32; 3], edges: &[i32; 6]) {
        if tri[0] < 0 {
            return;
        }
        let idx = self.tri_index.fetch_add(1, Ordering::Relaxed);
        // SAFETY: `idx` is this writer's ticket from the shared counter.
        unsafe {
            self.tris.write(
                idx,
                [
                    edges[tri[0] as usize] as u32,
                    edges[tri[1] as usize] as u32,
                    edges[tri[2] as usize] as u32,
                ],
            );
        }
    }

    fn create_tris(&self, tet: [i32; 4], edges: &[i32; 6]) {
        let i = (tet[0] > 0) as usize
            + 2 * ((tet[1] > 0) as usize)
            + 4 * ((tet[2] > 0) as usize)
            + 8 * ((tet[3] > 0) as usize);
        self.create_tri(TET_TRI0[i], edges);
        self.create_tri(TET_TRI1[i], edges);
    }

    fn run(&self, slot: usize) {
        let base = self.grid_verts.at(slot);
        if base.key == OPEN {
            return;
        }

        let base_index = decode_morton(base.key);
        let lead_index = normalize_w(base_index + NEIGHBORS[0]);

        // This record owns the six tetrahedra surrounding its edge in
        // the (1,1,1) direction (owned edge 0).
        let mut tet = [base.neighbor_inside(0), base.inside(), -2, -2];
        let mut this_index = base_index;
        this_index.x += 1;

        let mut this_vert = self.grid_verts.get(morton_code(this_index));

        tet[2] = base.neighbor_inside(1);
        for i in 0..3 {
            let mut next_index = lead_index;
            next_index[prev3(i)] -= 1;
            // Morton codes take unsigned input, so check for negatives,
            // given the decrement.
            let next_vert = if next_index[prev3(i)] < 0 {
                GridVert::default()
            } else {
                self.grid_verts.get(morton_code(next_index))
            };
            tet[3] = base.neighbor_inside(prev3(i) + 4);

            let edges1 = [
                base.edge_verts[0],
                base.edge_verts[i + 1],
                next_vert.edge_verts[next3(i) + 4],
                next_vert.edge_verts[prev3(i) + 1],
                this_vert.edge_verts[i + 4],
                base.edge_verts[prev3(i) + 4],
            ];
            this_vert = next_vert;
            self.create_tris(tet, &edges1);

            let mut next_index = base_index;
            next_index[next3(i)] += 1;
            let next_vert = self.grid_verts.get(morton_code(next_index));
            tet[2] = tet[3];
            tet[3] = base.neighbor_inside(next3(i) + 1);

            let edges2 = [
                base.edge_verts[0],
                edges1[5],
                this_vert.edge_verts[i + 4],
                next_vert.edge_verts[next3(i) + 4],
                edges1[3],
                base.edge_verts[next3(i) + 1],
            ];
            this_vert = next_vert;
            self.create_tris(tet, &edges2);

            tet[2] = tet[3];
        }
    }
}

/// Extract the level set of a signed-distance function as a watertight
/// triangle mesh.
///
/// A form of Marching Tetrahedra over a body-centered cubic grid (two
/// shifted cubic lattices). Tetrahedra have no ambiguous sign cases, so
/// the result is always manifold and orientable and can feed any
/// downstream solid-modeling pipeline. If the function's interior
/// reaches the bounding box, the surface is closed against the box with
/// an egg-crate pattern at the grid scale.
///
/// # Arguments
/// * `sdf` - Signed distance at a point, **positive inside**. Must be
///   deterministic and side-effect-free; quality degrades if it is far
///   from Lipschitz-1 at the grid scale.
/// * `bounds` - Axis-aligned extent of the grid
/// * `edge_length` - Approximate output triangle edge length (> 0)
/// * `level` - Iso-level; positive insets the surface, negative outsets
///
/// # Returns
/// A manifold [`Mesh`] with counter-clockwise outward winding
pub fn level_set<F>(sdf: F, bounds: Aabb, edge_length: f32, level: f32) -> Mesh
where
    F: Fn(Vec3) -> f32 + Sync,
{
    level_set_with(
        sdf,
        bounds,
        &LevelSetConfig {
            edge_length,
            level,
            table_size: 0,
        },
    )
}

/// [`level_set`] with explicit configuration.
///
/// `config.table_size` seeds the hash-table capacity; undersizing is
/// safe (the driver grows the table and retries) and only costs extra
/// passes. The produced vertex and triangle sets are independent of the
/// initial size, up to index ordering.
pub fn level_set_with<F>(sdf: F, bounds: Aabb, config: &LevelSetConfig) -> Mesh
where
    F: Fn(Vec3) -> f32 + Sync,
{
    let dim = bounds.size();
    let grid_size = (dim / config.edge_length).as_ivec3();
    let spacing = dim / grid_size.as_vec3();
    let bound = grid_size + IVec3::ONE;

    let max_morton = morton_code(bound.extend(1));

    // Surface vertices scale with area, roughly max_morton^(2/3); keep a
    // hard cap of twice the key range for thin shells near the cap.
    let mut table_size = if config.table_size > 0 {
        config.table_size as u64
    } else {
        (2 * max_morton).min((10.0 * (max_morton as f64).powf(0.667)) as u64)
    };

    let mut grid_verts = HashTable::new(table_size as usize);
    loop {
        let vert_index = AtomicUsize::new(0);
        let verts = ScatterBuffer::new(grid_verts.capacity() * 7, Vec3::ZERO);
        let pass = ComputeVerts {
            sdf: BoundedSdf {
                sdf: &sdf,
                origin: bounds.min,
                spacing,
                bound,
                level: config.level,
            },
            verts: &verts,
            vert_index: &vert_index,
            grid_verts: &grid_verts,
        };
        (0..max_morton + 1).into_par_iter().for_each(|code| pass.run(code));

        let vert_count = vert_index.load(Ordering::Relaxed);
        if grid_verts.full() {
            // Grow by the fraction of the key range actually reached,
            // sampled from the most recently written vertex. The sample
            // is racy; only the retry count depends on it.
            // SAFETY: the pass has joined; no writer is live.
            let last_vert = unsafe { verts.read(vert_count - 1) };
            let last_index = ((last_vert - bounds.min) / spacing).as_ivec3();
            let last_morton = morton_code(last_index.extend(1));
            let ratio = max_morton as f32 / last_morton as f32;
            // Do not trust the ratio when it is huge, and never grow by
            // less than 2x: under parallel scheduling the sample can sit
            // anywhere in the key range, and a ratio near 1 would stall
            // the loop.
            table_size = if ratio > 1000.0 {
                table_size * 2
            } else {
                ((table_size as f32 * ratio) as u64).max(table_size * 2)
            };
            grid_verts = HashTable::new(table_size as usize);
            continue;
        }

        let vert_pos = verts.into_vec(vert_count);

        let tri_index = AtomicUsize::new(0);
        let tris = ScatterBuffer::new(grid_verts.entries() * 12, [0u32; 3]);
        let pass = BuildTris {
            grid_verts: &grid_verts,
            tris: &tris,
            tri_index: &tri_index,
        };
        (0..grid_verts.capacity())
            .into_par_iter()
            .for_each(|slot| pass.run(slot));

        let tri_verts = tris.into_vec(tri_index.load(Ordering::Relaxed));
        let mut out = Mesh::new();
        out.append(Mesh { vert_pos, tri_verts });
        return out;
    }
}
