use crate::error::MapError;
use smallvec::SmallVec;
use std::sync::OnceLock;

/// Number of points a voxel stores inline before spilling to the heap.
pub const SSO_LENGTH: usize = 16;

/// Stable handle of a voxel inside the map's cell arena.
///
/// Voxels are only ever appended to the arena and the arena is only emptied
/// as a whole, so a handle stays valid for as long as the map is not cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) u32);

impl CellId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Points deposited in one voxel of the decimation grid.
#[derive(Clone, Debug, Default)]
pub struct VoxelCell {
    points: SmallVec<[[f64; 3]; SSO_LENGTH]>,
    mean: OnceLock<[f64; 3]>,
    /// Linked neighbors as `(ring slot, handle)`, sorted by slot.
    neighbors: Vec<(u32, CellId)>,
}

impl VoxelCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points in insertion order.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Appends `p`, unless `max_points` is nonzero and already reached.
    ///
    /// Returns whether the point was stored. A stored point invalidates the
    /// cached mean.
    pub fn insert_point(&mut self, p: [f64; 3], max_points: u32) -> bool {
        if max_points != 0 && self.points.len() >= max_points as usize {
            return false;
        }
        self.points.push(p);
        self.mean.take();
        true
    }

    /// Arithmetic mean of the stored points, cached until the next insertion.
    pub fn mean(&self) -> Result<[f64; 3], MapError> {
        if self.points.is_empty() {
            return Err(MapError::EmptyCell);
        }
        Ok(*self.mean.get_or_init(|| {
            let mut sum = [0.0; 3];
            for p in &self.points {
                sum[0] += p[0];
                sum[1] += p[1];
                sum[2] += p[2];
            }
            let n = self.points.len() as f64;
            [sum[0] / n, sum[1] / n, sum[2] / n]
        }))
    }

    pub fn has_cached_mean(&self) -> bool {
        self.mean.get().is_some()
    }

    /// Neighbors that exist in the map, as `(ring slot, handle)` in ring order.
    ///
    /// Ring slots without an entry are voxels that have not been created yet.
    pub fn linked_neighbors(&self) -> &[(u32, CellId)] {
        &self.neighbors
    }

    pub(crate) fn link(&mut self, slot: u32, cell: CellId) {
        match self.neighbors.binary_search_by_key(&slot, |&(s, _)| s) {
            Ok(pos) => self.neighbors[pos].1 = cell,
            Err(pos) => self.neighbors.insert(pos, (slot, cell)),
        }
    }

    pub(crate) fn neighbor_at(&self, slot: u32) -> Option<CellId> {
        self.neighbors
            .binary_search_by_key(&slot, |&(s, _)| s)
            .ok()
            .map(|pos| self.neighbors[pos].1)
    }
}
