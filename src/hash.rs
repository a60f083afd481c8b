//! Lock-free vertex table keyed by Morton codes
//!
//! Open addressing over a power-of-two slot array with a fixed odd probe
//! stride. A slot is claimed with a single compare-exchange on its key;
//! keys are never erased or rewritten, which keeps lookups wait-free.
//! Only grid vertices whose owned edges cross the surface are inserted,
//! so the table stays small relative to the grid.
//!
//! The table is write-only during the vertex pass and read-only during
//! the triangle pass; the join between the passes is the barrier that
//! publishes every payload to every reader.
//!
//! Author: Moroya Sakamoto

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::morton::OPEN;

/// Default probe stride. Odd, hence coprime with the power-of-two
/// capacity, so the probe sequence visits every slot.
pub const DEFAULT_STEP: u64 = 127;

/// Per-grid-vertex record stored in the hash table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridVert {
    /// Morton key of the grid vertex; [`OPEN`] marks a default record.
    pub key: u64,
    /// Bounded signed distance at the grid vertex (NaN until computed).
    pub distance: f32,
    /// Global index of the interpolated crossing on each owned edge,
    /// or -1 if that edge does not cross the surface.
    pub edge_verts: [i32; 7],
}

impl Default for GridVert {
    fn default() -> Self {
        GridVert {
            key: OPEN,
            distance: f32::NAN,
            edge_verts: [-1; 7],
        }
    }
}

impl GridVert {
    /// +1 if this grid vertex is inside the surface, -1 otherwise.
    #[inline(always)]
    pub fn inside(&self) -> i32 {
        if self.distance > 0.0 {
            1
        } else {
            -1
        }
    }

    /// Inside sign of the neighbor across owned edge `i`, inferred from
    /// whether that edge carries a crossing vertex.
    #[inline(always)]
    pub fn neighbor_inside(&self, i: usize) -> i32 {
        self.inside() * if self.edge_verts[i] < 0 { 1 } else { -1 }
    }
}

#[derive(Clone, Copy)]
struct Payload {
    distance: f32,
    edge_verts: [i32; 7],
}

struct Slot {
    key: AtomicU64,
    payload: UnsafeCell<Payload>,
}

/// Concurrent open-addressed table of [`GridVert`] records.
///
/// Invariants: capacity is a power of two; an inserted key occupies
/// exactly one slot; a slot whose key is [`OPEN`] is empty; payloads are
/// written once, by the thread whose compare-exchange claimed the key,
/// and read only after all writers have joined.
pub struct HashTable {
    slots: Vec<Slot>,
    used: AtomicUsize,
    step: u64,
}

// SAFETY: each payload cell is written exactly once, by the unique CAS
// winner of its slot, while no thread reads payloads; reads happen only
// after the writing pass has joined.
unsafe impl Sync for HashTable {}

impl HashTable {
    /// Allocate a table with at least `size` slots, rounded up to a
    /// power of two.
    pub fn new(size: usize) -> Self {
        let capacity = size.max(1).next_power_of_two();
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot {
            key: AtomicU64::new(OPEN),
            payload: UnsafeCell::new(Payload {
                distance: f32::NAN,
                edge_verts: [-1; 7],
            }),
        });
        HashTable {
            slots,
            used: AtomicUsize::new(0),
            step: DEFAULT_STEP,
        }
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    #[inline]
    pub fn entries(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    /// True once the load factor passes one half. Producers must stop
    /// inserting when this trips; the driver reallocates and retries.
    #[inline]
    pub fn full(&self) -> bool {
        self.entries() * 2 > self.capacity()
    }

    /// Insert `vert`, claiming the first open slot on its probe chain.
    /// Inserting a key that is already present is a no-op.
    pub fn insert(&self, vert: GridVert) {
        let mask = self.capacity() as u64 - 1;
        let mut idx = (vert.key & mask) as usize;
        loop {
            let slot = &self.slots[idx];
            match slot
                .key
                .compare_exchange(OPEN, vert.key, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    self.used.fetch_add(1, Ordering::Relaxed);
                    // Sole writer of this cell: the CAS above won the slot.
                    unsafe {
                        *slot.payload.get() = Payload {
                            distance: vert.distance,
                            edge_verts: vert.edge_verts,
                        };
                    }
                    return;
                }
                Err(found) if found == vert.key => return,
                Err(_) => idx = ((idx as u64 + self.step) & mask) as usize,
            }
        }
    }

    /// Look up `key`. Returns a default record if the key was never
    /// inserted. Wait-free: keys never move or disappear, so the probe
    /// chain terminates at the key or at an open slot.
    pub fn get(&self, key: u64) -> GridVert {
        let mask = self.capacity() as u64 - 1;
        let mut idx = (key & mask) as usize;
        loop {
            let found = self.slots[idx].key.load(Ordering::Acquire);
            if found == key {
                return self.read(idx, found);
            }
            if found == OPEN {
                return GridVert::default();
            }
            idx = ((idx as u64 + self.step) & mask) as usize;
        }
    }

    /// Read slot `idx` directly; the returned key is [`OPEN`] for empty
    /// slots. Used to iterate the occupied slots in the triangle pass.
    pub fn at(&self, idx: usize) -> GridVert {
        let key = self.slots[idx].key.load(Ordering::Acquire);
        if key == OPEN {
            return GridVert::default();
        }
        self.read(idx, key)
    }

    #[inline]
    fn read(&self, idx: usize, key: u64) -> GridVert {
        // SAFETY: the payload was fully written before any reader ran;
        // readers exist only after the writing pass joined.
        let payload = unsafe { *self.slots[idx].payload.get() };
        GridVert {
            key,
            distance: payload.distance,
            edge_verts: payload.edge_verts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morton::morton_code;
    use glam::IVec4;
    use rayon::prelude::*;

    fn vert(key: u64, distance: f32) -> GridVert {
        GridVert {
            key,
            distance,
            edge_verts: [key as i32, -1, -1, -1, -1, -1, -1],
        }
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(HashTable::new(1).capacity(), 1);
        assert_eq!(HashTable::new(5).capacity(), 8);
        assert_eq!(HashTable::new(64).capacity(), 64);
        assert_eq!(HashTable::new(65).capacity(), 128);
    }

    #[test]
    fn insert_then_get() {
        let table = HashTable::new(64);
        table.insert(vert(42, 1.5));
        let found = table.get(42);
        assert_eq!(found.key, 42);
        assert_eq!(found.distance, 1.5);
        assert_eq!(found.edge_verts[0], 42);
    }

    #[test]
    fn missing_key_yields_default() {
        let table = HashTable::new(64);
        table.insert(vert(7, 1.0));
        let found = table.get(9);
        assert_eq!(found.key, OPEN);
        assert!(found.distance.is_nan());
        assert_eq!(found.edge_verts, [-1; 7]);
    }

    #[test]
    fn duplicate_insert_is_a_noop() {
        let table = HashTable::new(64);
        table.insert(vert(11, 1.0));
        table.insert(vert(11, -5.0));
        assert_eq!(table.entries(), 1);
        assert_eq!(table.get(11).distance, 1.0);
    }

    #[test]
    fn colliding_keys_probe_to_distinct_slots() {
        let table = HashTable::new(16);
        // Same slot mod 16, all distinct keys.
        for k in [3u64, 19, 35] {
            table.insert(vert(k, k as f32));
        }
        assert_eq!(table.entries(), 3);
        for k in [3u64, 19, 35] {
            assert_eq!(table.get(k).distance, k as f32);
        }
    }

    #[test]
    fn full_trips_past_half_load() {
        let table = HashTable::new(8);
        for k in 0..4u64 {
            table.insert(vert(k, 0.0));
            assert!(!table.full());
        }
        table.insert(vert(100, 0.0));
        assert!(table.full());
    }

    #[test]
    fn slot_iteration_finds_every_entry() {
        let table = HashTable::new(128);
        for k in 0..20u64 {
            table.insert(vert(k * 13 + 1, 0.0));
        }
        let occupied = (0..table.capacity())
            .filter(|&i| table.at(i).key != OPEN)
            .count();
        assert_eq!(occupied, table.entries());
        assert_eq!(occupied, 20);
    }

    #[test]
    fn concurrent_inserts_are_all_retrievable() {
        let table = HashTable::new(4096);
        let keys: Vec<u64> = (0..1000)
            .map(|i| morton_code(IVec4::new(i % 32, (i / 32) % 32, i / 1024, i % 2)))
            .collect();

        keys.par_iter().for_each(|&k| {
            table.insert(vert(k, k as f32));
        });

        assert_eq!(table.entries(), keys.len());
        for &k in &keys {
            let found = table.get(k);
            assert_eq!(found.key, k);
            assert_eq!(found.distance, k as f32);
        }
    }
}
