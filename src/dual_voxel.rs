use crate::bounds::BoundingBox;
use crate::cell::{CellId, VoxelCell};
use crate::error::MapError;
use crate::index::{GridScale, VoxelIndex};
use crate::options::{LikelihoodOptions, RenderOptions};
use crate::ring::{MAX_RING_RATIO, NeighborRing};
use hashbrown::HashMap;
use rayon::prelude::*;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, error, trace, warn};

/// Result of a nearest-neighbor query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest {
    pub point: [f64; 3],
    pub distance_sq: f64,
}

/// A point cloud stored in a hashed voxel grid that serves two purposes:
/// decimating incoming points, and answering nearest-neighbor queries within
/// a fixed radius.
///
/// Every voxel keeps back-references to the existing voxels of its search
/// ring, which are set up once when the voxel is created. Inserting into an
/// existing voxel is O(1); creating a voxel costs one hash lookup per ring
/// offset.
///
/// The map is not internally synchronized: queries take `&self` and may run
/// concurrently, mutation takes `&mut self`.
#[derive(Clone, Debug)]
pub struct DualVoxelPointCloud {
    decimation_size: f64,
    max_nn_radius: f64,
    max_points_per_voxel: u32,

    // Derived from the above in `set_voxel_properties`.
    scale: GridScale,
    max_nn_radius_sqr: f64,
    nn_to_decim_ratio: i32,
    ring: NeighborRing,

    /// Cell arena, in creation order. Never compacted, only cleared.
    cells: Vec<VoxelCell>,
    keys: Vec<VoxelIndex>,
    lookup: HashMap<VoxelIndex, CellId>,

    cached_bbox: OnceLock<BoundingBox<3>>,

    pub likelihood_options: LikelihoodOptions,
    pub render_options: RenderOptions,
}

impl Default for DualVoxelPointCloud {
    fn default() -> Self {
        Self::with_checked_params(0.20, 0.60, 0, 3)
    }
}

impl DualVoxelPointCloud {
    /// Creates an empty map.
    ///
    /// # Arguments
    /// * `decimation_size` - Voxel edge length [m] used for decimation.
    /// * `max_nn_radius` - Maximum radius [m] of nearest-neighbor searches.
    /// * `max_points_per_voxel` - Cap on stored points per voxel, 0 for no cap.
    pub fn new(decimation_size: f64, max_nn_radius: f64, max_points_per_voxel: u32) -> Result<Self, MapError> {
        let nn_to_decim_ratio = validate(decimation_size, max_nn_radius)?;
        Ok(Self::with_checked_params(
            decimation_size,
            max_nn_radius,
            max_points_per_voxel,
            nn_to_decim_ratio,
        ))
    }

    fn with_checked_params(
        decimation_size: f64,
        max_nn_radius: f64,
        max_points_per_voxel: u32,
        nn_to_decim_ratio: i32,
    ) -> Self {
        DualVoxelPointCloud {
            decimation_size,
            max_nn_radius,
            max_points_per_voxel,
            scale: GridScale::new(decimation_size),
            max_nn_radius_sqr: max_nn_radius * max_nn_radius,
            nn_to_decim_ratio,
            ring: NeighborRing::new(decimation_size, max_nn_radius, nn_to_decim_ratio),
            cells: Vec::new(),
            keys: Vec::new(),
            lookup: HashMap::new(),
            cached_bbox: OnceLock::new(),
            likelihood_options: LikelihoodOptions::default(),
            render_options: RenderOptions::default(),
        }
    }

    /// Resets the voxel parameters. All map contents are discarded, since
    /// existing voxel keys are meaningless under a different grid.
    pub fn set_voxel_properties(
        &mut self,
        decimation_size: f64,
        max_nn_radius: f64,
        max_points_per_voxel: u32,
    ) -> Result<(), MapError> {
        let nn_to_decim_ratio = validate(decimation_size, max_nn_radius)?;

        self.decimation_size = decimation_size;
        self.max_nn_radius = max_nn_radius;
        self.max_points_per_voxel = max_points_per_voxel;

        self.scale = GridScale::new(decimation_size);
        self.max_nn_radius_sqr = max_nn_radius * max_nn_radius;
        self.nn_to_decim_ratio = nn_to_decim_ratio;
        self.ring = NeighborRing::new(decimation_size, max_nn_radius, self.nn_to_decim_ratio);

        debug!(
            decimation_size,
            max_nn_radius,
            max_points_per_voxel,
            ring_len = self.ring.len(),
            "voxel properties changed"
        );
        self.clear();
        Ok(())
    }

    pub fn decimation_size(&self) -> f64 {
        self.decimation_size
    }

    pub fn max_nn_radius(&self) -> f64 {
        self.max_nn_radius
    }

    pub fn max_points_per_voxel(&self) -> u32 {
        self.max_points_per_voxel
    }

    /// `ceil(max_nn_radius / decimation_size)`.
    pub fn nn_to_decim_ratio(&self) -> i32 {
        self.nn_to_decim_ratio
    }

    pub fn grid(&self) -> &GridScale {
        &self.scale
    }

    pub fn ring(&self) -> &NeighborRing {
        &self.ring
    }

    /// Removes every voxel.
    pub fn clear(&mut self) {
        if !self.cells.is_empty() {
            debug!(voxels = self.cells.len(), "clearing voxel map");
        }
        self.cells.clear();
        self.keys.clear();
        self.lookup.clear();
        self.cached_bbox.take();
    }

    /// True if the map holds no points. Voxels are only created together with
    /// their first point, so this is the same as having no voxels.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of voxels.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn point_count(&self) -> usize {
        self.cells.iter().map(VoxelCell::len).sum()
    }

    /// Inserts one point.
    ///
    /// Returns `Ok(false)` if the point was dropped because its voxel already
    /// holds `max_points_per_voxel` points. Non-finite points are rejected and
    /// leave the map untouched.
    pub fn insert_point(&mut self, p: [f64; 3]) -> Result<bool, MapError> {
        if !p.iter().all(|v| v.is_finite()) {
            warn!(?p, "rejecting point with non-finite coordinates");
            return Err(MapError::NonFiniteCoordinate(p));
        }

        let key = self.scale.point_to_index(&p);
        let id = match self.lookup.get(&key) {
            Some(&id) => id,
            None => self.create_voxel(key),
        };

        let stored = self.cells[id.index()].insert_point(p, self.max_points_per_voxel);
        if stored {
            self.cached_bbox.take();
        }
        Ok(stored)
    }

    /// Inserts points one by one, stopping at the first invalid one.
    ///
    /// Points inserted before the failure stay in the map. Returns the number
    /// of points stored.
    pub fn insert_points(&mut self, points: &[[f64; 3]]) -> Result<usize, MapError> {
        let mut stored = 0;
        for p in points {
            if self.insert_point(*p)? {
                stored += 1;
            }
        }
        Ok(stored)
    }

    /// Creates the voxel `key` and links it with the existing voxels of its ring.
    fn create_voxel(&mut self, key: VoxelIndex) -> CellId {
        let id = CellId(self.cells.len() as u32);
        let mut cell = VoxelCell::new();

        for (slot, o) in self.ring.offsets().iter().enumerate() {
            if let Some(&other) = self.lookup.get(&(key + o.offset)) {
                cell.link(slot as u32, other);
                let back = self.ring.opposite(slot) as u32;
                self.cells[other.index()].link(back, id);
            }
        }

        trace!(%key, linked = cell.linked_neighbors().len(), "created voxel");
        self.cells.push(cell);
        self.keys.push(key);
        self.lookup.insert(key, id);
        id
    }

    /// Finds the stored point closest to `query` within `max_nn_radius`.
    ///
    /// The boundary is inclusive: a point at exactly `max_nn_radius` is found.
    /// Among equidistant points the first one visited wins. Voxels are visited
    /// center first, then in ring order; points in insertion order.
    pub fn find_nearest(&self, query: &[f64; 3]) -> Option<Nearest> {
        let r2 = self.max_nn_radius_sqr;
        self.search(query, |cell, best| {
            for p in cell.points() {
                let d = dist_sq(p, query);
                if d <= r2 && best.is_none_or(|b| d < b.distance_sq) {
                    *best = Some(Nearest { point: *p, distance_sq: d });
                }
            }
        })
    }

    /// Like [`find_nearest`](Self::find_nearest), but compares `query` against
    /// the mean point of each voxel only.
    pub fn find_nearest_mean(&self, query: &[f64; 3]) -> Option<Nearest> {
        let r2 = self.max_nn_radius_sqr;
        self.search(query, |cell, best| {
            if let Ok(m) = cell.mean() {
                let d = dist_sq(&m, query);
                if d <= r2 && best.is_none_or(|b| d < b.distance_sq) {
                    *best = Some(Nearest { point: m, distance_sq: d });
                }
            }
        })
    }

    /// Visits the voxel of `query` and the existing voxels of its ring.
    ///
    /// If the center voxel exists its back-references are followed, otherwise
    /// every ring offset is probed by key. Both visit the same voxels in the
    /// same order, so queries in gaps of the map still see nearby data.
    fn search<V>(&self, query: &[f64; 3], mut visit: V) -> Option<Nearest>
    where
        V: FnMut(&VoxelCell, &mut Option<Nearest>),
    {
        if self.cells.is_empty() {
            return None;
        }

        let key = self.scale.point_to_index(query);
        let offsets = self.ring.offsets();
        let mut best: Option<Nearest> = None;

        // A voxel whose gap to the center voxel exceeds the best distance
        // cannot improve on it; offsets are sorted by gap.
        let bound = |best: &Option<Nearest>| {
            best.map_or(self.max_nn_radius_sqr, |b| b.distance_sq) * (1.0 + 1e-9)
        };

        match self.lookup.get(&key) {
            Some(&center) => {
                let cell = &self.cells[center.index()];
                visit(cell, &mut best);
                for &(slot, neighbor) in cell.linked_neighbors() {
                    if offsets[slot as usize].min_dist_sq > bound(&best) {
                        break;
                    }
                    visit(&self.cells[neighbor.index()], &mut best);
                }
            }
            None => {
                for o in offsets {
                    if o.min_dist_sq > bound(&best) {
                        break;
                    }
                    if let Some(&neighbor) = self.lookup.get(&(key + o.offset)) {
                        visit(&self.cells[neighbor.index()], &mut best);
                    }
                }
            }
        }
        best
    }

    pub fn voxel(&self, key: &VoxelIndex) -> Option<&VoxelCell> {
        self.lookup.get(key).map(|id| &self.cells[id.index()])
    }

    /// The ring of voxel `key` as `(neighbor key, voxel)` pairs, where `None`
    /// marks a neighbor that has not been created yet. Returns `None` if `key`
    /// itself does not exist.
    pub fn neighbors(&self, key: &VoxelIndex) -> Option<Vec<(VoxelIndex, Option<&VoxelCell>)>> {
        let cell = self.voxel(key)?;
        let pairs = self
            .ring
            .offsets()
            .iter()
            .enumerate()
            .map(|(slot, o)| {
                let neighbor = cell.neighbor_at(slot as u32).map(|id| &self.cells[id.index()]);
                (*key + o.offset, neighbor)
            })
            .collect();
        Some(pairs)
    }

    /// Bounding box of all points, or the all-zero box for an empty map.
    ///
    /// Computed on first use and cached until the map is modified.
    pub fn bounding_box(&self) -> BoundingBox<3> {
        *self.cached_bbox.get_or_init(|| {
            self.cells
                .par_iter()
                .filter_map(|cell| {
                    let (first, rest) = cell.points().split_first()?;
                    let mut bbox = BoundingBox::from_point(first);
                    for p in rest {
                        bbox.expand(p);
                    }
                    Some(bbox)
                })
                .reduce_with(|a, b| a.union(&b))
                .unwrap_or_else(BoundingBox::zero)
        })
    }

    pub fn bounding_box_is_cached(&self) -> bool {
        self.cached_bbox.get().is_some()
    }

    /// Calls `f` for every point, voxels in creation order.
    pub fn visit_all_points<F>(&self, mut f: F)
    where
        F: FnMut(&[f64; 3]),
    {
        for cell in &self.cells {
            cell.points().iter().for_each(&mut f);
        }
    }

    /// Calls `f` for every voxel, in creation order.
    pub fn visit_all_voxels<F>(&self, mut f: F)
    where
        F: FnMut(&VoxelIndex, &VoxelCell),
    {
        for (key, cell) in self.keys.iter().zip(&self.cells) {
            f(key, cell);
        }
    }

    /// Writes one `X Y Z` line per point.
    pub fn write_text<W: Write>(&self, mut out: W) -> io::Result<()> {
        for cell in &self.cells {
            for p in cell.points() {
                writeln!(out, "{} {} {}", p[0], p[1], p[2])?;
            }
        }
        out.flush()
    }

    /// Saves all points to a text file, one `X Y Z` line per point.
    ///
    /// Returns false if the file could not be written.
    pub fn save_to_text_file<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        let result = File::create(path).and_then(|file| self.write_text(BufWriter::new(file)));
        match result {
            Ok(()) => true,
            Err(err) => {
                error!(path = %path.display(), %err, "failed to save voxel map");
                false
            }
        }
    }
}

impl fmt::Display for DualVoxelPointCloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DualVoxelPointCloud, decimation_size={} max_nn_radius={} max_points_per_voxel={}: {} voxels, {} points",
            self.decimation_size,
            self.max_nn_radius,
            self.max_points_per_voxel,
            self.len(),
            self.point_count()
        )?;
        if !self.is_empty() {
            let bbox = self.bounding_box();
            write!(f, ", bbox={:?}-{:?}", bbox.min, bbox.max)?;
        }
        Ok(())
    }
}

/// Checks the voxel parameters and returns `ceil(max_nn_radius / decimation_size)`.
fn validate(decimation_size: f64, max_nn_radius: f64) -> Result<i32, MapError> {
    if !(decimation_size.is_finite() && decimation_size > 0.0) {
        return Err(MapError::InvalidDecimationSize(decimation_size));
    }
    if !(max_nn_radius.is_finite() && max_nn_radius > 0.0) {
        return Err(MapError::InvalidRadius(max_nn_radius));
    }
    let ratio = (max_nn_radius / decimation_size).ceil();
    // Also false for an infinite ratio from a subnormal decimation size.
    if !(ratio <= f64::from(MAX_RING_RATIO)) {
        return Err(MapError::RingTooLarge { ratio, max: MAX_RING_RATIO });
    }
    Ok(ratio as i32)
}

pub(crate) fn dist_sq(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_constants() {
        let map = DualVoxelPointCloud::new(0.2, 0.6, 0).unwrap();
        assert_eq!(map.nn_to_decim_ratio(), 3);
        assert!((map.grid().size_inv() - 5.0).abs() < 1e-12);

        let map = DualVoxelPointCloud::new(1.0, 2.5, 0).unwrap();
        assert_eq!(map.nn_to_decim_ratio(), 3);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            DualVoxelPointCloud::new(0.0, 1.0, 0),
            Err(MapError::InvalidDecimationSize(_))
        ));
        assert!(matches!(
            DualVoxelPointCloud::new(0.1, -1.0, 0),
            Err(MapError::InvalidRadius(_))
        ));
        assert!(matches!(
            DualVoxelPointCloud::new(f64::NAN, 1.0, 0),
            Err(MapError::InvalidDecimationSize(_))
        ));

        let mut map = DualVoxelPointCloud::default();
        map.insert_point([0.0, 0.0, 0.0]).unwrap();
        assert!(map.set_voxel_properties(0.1, f64::INFINITY, 0).is_err());
        // A rejected reconfiguration leaves the map as it was.
        assert_eq!(map.point_count(), 1);
        assert_eq!(map.decimation_size(), 0.2);
    }

    #[test]
    fn test_ring_too_large_rejected() {
        assert!(matches!(
            DualVoxelPointCloud::new(1e-10, 1.0, 0),
            Err(MapError::RingTooLarge { .. })
        ));
        assert!(matches!(
            DualVoxelPointCloud::new(0.01, 2.0, 0),
            Err(MapError::RingTooLarge { max: MAX_RING_RATIO, .. })
        ));
        assert!(matches!(
            DualVoxelPointCloud::new(f64::MIN_POSITIVE / 4.0, 1.0, 0),
            Err(MapError::RingTooLarge { .. })
        ));

        // The largest supported ratio still builds.
        let map = DualVoxelPointCloud::new(0.1, 0.1 * f64::from(MAX_RING_RATIO) * 0.999, 0).unwrap();
        assert_eq!(map.nn_to_decim_ratio(), MAX_RING_RATIO);

        let mut map = DualVoxelPointCloud::default();
        map.insert_point([0.0, 0.0, 0.0]).unwrap();
        assert!(matches!(
            map.set_voxel_properties(1e-10, 1.0, 0),
            Err(MapError::RingTooLarge { .. })
        ));
        assert_eq!(map.point_count(), 1);
        assert_eq!(map.nn_to_decim_ratio(), 3);
    }

    #[test]
    fn test_non_finite_point_rejected() {
        let mut map = DualVoxelPointCloud::default();
        assert!(matches!(
            map.insert_point([f64::NAN, 0.0, 0.0]),
            Err(MapError::NonFiniteCoordinate(_))
        ));
        assert!(map.insert_point([0.0, f64::INFINITY, 0.0]).is_err());
        assert!(map.is_empty());
        assert!(map.find_nearest(&[f64::NAN, 0.0, 0.0]).is_none());
    }

    #[test]
    fn test_links_are_mutual() {
        let mut map = DualVoxelPointCloud::new(1.0, 1.0, 0).unwrap();
        map.insert_point([0.0, 0.0, 0.0]).unwrap();
        map.insert_point([1.0, 0.0, 0.0]).unwrap();
        map.insert_point([5.0, 0.0, 0.0]).unwrap();

        let a = map.voxel(&VoxelIndex::new(0, 0, 0)).unwrap();
        let b = map.voxel(&VoxelIndex::new(1, 0, 0)).unwrap();
        let c = map.voxel(&VoxelIndex::new(5, 0, 0)).unwrap();
        assert_eq!(a.linked_neighbors().len(), 1);
        assert_eq!(b.linked_neighbors().len(), 1);
        assert!(c.linked_neighbors().is_empty());

        let ring = map.neighbors(&VoxelIndex::new(0, 0, 0)).unwrap();
        assert_eq!(ring.len(), map.ring().len());
        let present: Vec<VoxelIndex> = ring.iter().filter(|(_, v)| v.is_some()).map(|(k, _)| *k).collect();
        assert_eq!(present, vec![VoxelIndex::new(1, 0, 0)]);
        assert!(map.neighbors(&VoxelIndex::new(9, 9, 9)).is_none());
    }

    #[test]
    fn test_mean_fast_path() {
        let mut map = DualVoxelPointCloud::new(1.0, 2.0, 0).unwrap();
        map.insert_point([0.1, 0.0, 0.0]).unwrap();
        map.insert_point([-0.1, 0.0, 0.0]).unwrap();

        let n = map.find_nearest_mean(&[0.0, 0.0, 0.3]).unwrap();
        assert!(n.point[0].abs() < 1e-12);
        assert!((n.distance_sq - 0.09).abs() < 1e-12);

        let n = map.find_nearest(&[0.0, 0.0, 0.3]).unwrap();
        // Equidistant: the first inserted point wins.
        assert_eq!(n.point, [0.1, 0.0, 0.0]);
    }

    #[test]
    fn test_display() {
        let mut map = DualVoxelPointCloud::default();
        assert!(map.to_string().contains("0 voxels, 0 points"));
        map.insert_point([1.0, 2.0, 3.0]).unwrap();
        assert!(map.to_string().contains("1 voxels, 1 points"));
    }
}
