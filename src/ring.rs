use crate::index::VoxelIndex;
use hashbrown::HashMap;

/// Largest supported `ceil(radius / cell_size)`. The ring grows with the
/// cube of this ratio.
pub const MAX_RING_RATIO: i32 = 32;

/// One neighbor offset of the search ring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingOffset {
    /// Offset from the center voxel, in voxels.
    pub offset: VoxelIndex,
    /// Squared minimum distance between the center voxel and the offset voxel.
    pub min_dist_sq: f64,
}

/// Precomputed search order for visiting the voxels around a center voxel.
///
/// Holds every offset whose voxel can contain a point closer than the search
/// radius to some point of the center voxel, i.e. whose box-to-box gap is at
/// most the radius. The center itself is not part of the ring. Offsets are
/// sorted by increasing gap (ties by offset), so a query may stop as soon as
/// the gap exceeds the best distance found so far.
#[derive(Clone, Debug)]
pub struct NeighborRing {
    offsets: Vec<RingOffset>,
    opposite: Vec<usize>,
    extent: i32,
}

impl NeighborRing {
    /// Builds the ring for voxels of edge `cell_size` and radius `radius`.
    ///
    /// `ratio` is `ceil(radius / cell_size)`; the ring spans one voxel more
    /// than that along each axis because the query point may sit anywhere
    /// inside the center voxel. Ratios above [`MAX_RING_RATIO`] are clamped.
    pub fn new(cell_size: f64, radius: f64, ratio: i32) -> Self {
        let extent = ratio.clamp(0, MAX_RING_RATIO) + 1;
        let radius_cells_sq = (radius / cell_size).powi(2);

        let mut offsets = Vec::new();
        for z in -extent..=extent {
            for y in -extent..=extent {
                for x in -extent..=extent {
                    if x == 0 && y == 0 && z == 0 {
                        continue;
                    }
                    let gap_cells_sq = get_min_gap_sq(x, y, z);
                    // Slack keeps voxels exactly at the radius despite rounding.
                    if gap_cells_sq as f64 <= radius_cells_sq * (1.0 + 1e-9) {
                        offsets.push(RingOffset {
                            offset: VoxelIndex::new(x, y, z),
                            min_dist_sq: gap_cells_sq as f64 * cell_size * cell_size,
                        });
                    }
                }
            }
        }
        offsets.sort_by(|a, b| {
            a.min_dist_sq
                .total_cmp(&b.min_dist_sq)
                .then_with(|| a.offset.cmp(&b.offset))
        });

        let slot_of: HashMap<VoxelIndex, usize> = offsets
            .iter()
            .enumerate()
            .map(|(slot, o)| (o.offset, slot))
            .collect();
        // The ring is symmetric, so every offset has its negation.
        let opposite = offsets
            .iter()
            .map(|o| slot_of.get(&-o.offset).copied().unwrap_or(usize::MAX))
            .collect();

        NeighborRing { offsets, opposite, extent }
    }

    pub fn offsets(&self) -> &[RingOffset] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Slot holding the negated offset of `slot`.
    pub fn opposite(&self, slot: usize) -> usize {
        self.opposite[slot]
    }

    /// Largest per-axis offset covered by the ring.
    pub fn extent(&self) -> i32 {
        self.extent
    }
}

/// Squared box-to-box gap, in voxels, between the center voxel and the voxel
/// at offset `(dx, dy, dz)`.
fn get_min_gap_sq(dx: i32, dy: i32, dz: i32) -> i64 {
    let gx = i64::from((dx.abs() - 1).max(0));
    let gy = i64::from((dy.abs() - 1).max(0));
    let gz = i64::from((dz.abs() - 1).max(0));
    gx * gx + gy * gy + gz * gz
}
