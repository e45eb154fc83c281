use std::ops::{Add, Neg, Sub};

/// Integer key of a cubic voxel of the decimation grid.
///
/// Equality and hashing are derived from the three components, so two keys
/// collide only if they are the same cell. The derived ordering is
/// lexicographic on `(x, y, z)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelIndex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelIndex {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub const fn as_array(self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Add for VoxelIndex {
    type Output = VoxelIndex;

    fn add(self, rhs: VoxelIndex) -> VoxelIndex {
        VoxelIndex::new(
            self.x.wrapping_add(rhs.x),
            self.y.wrapping_add(rhs.y),
            self.z.wrapping_add(rhs.z),
        )
    }
}

impl Sub for VoxelIndex {
    type Output = VoxelIndex;

    fn sub(self, rhs: VoxelIndex) -> VoxelIndex {
        VoxelIndex::new(
            self.x.wrapping_sub(rhs.x),
            self.y.wrapping_sub(rhs.y),
            self.z.wrapping_sub(rhs.z),
        )
    }
}

impl Neg for VoxelIndex {
    type Output = VoxelIndex;

    fn neg(self) -> VoxelIndex {
        VoxelIndex::new(self.x.wrapping_neg(), self.y.wrapping_neg(), self.z.wrapping_neg())
    }
}

impl std::fmt::Display for VoxelIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Conversion between world coordinates and voxel keys for a fixed cell size.
///
/// Coordinates are mapped with `round(x / size)`, rounding half away from
/// zero, so the voxel `i` spans `[(i - 0.5) * size, (i + 0.5) * size]` and is
/// centered at `i * size`. The same mapping is used for insertion and queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridScale {
    size: f64,
    size_inv: f64,
}

impl GridScale {
    pub fn new(size: f64) -> Self {
        Self { size, size_inv: 1.0 / size }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn size_inv(&self) -> f64 {
        self.size_inv
    }

    /// Grid index along one axis. Saturates outside the `i32` range.
    pub fn coord_to_index(&self, v: f64) -> i32 {
        (v * self.size_inv).round() as i32
    }

    /// World coordinate of the voxel center along one axis.
    pub fn index_to_coord(&self, i: i32) -> f64 {
        f64::from(i) * self.size
    }

    pub fn point_to_index(&self, p: &[f64; 3]) -> VoxelIndex {
        VoxelIndex::new(
            self.coord_to_index(p[0]),
            self.coord_to_index(p[1]),
            self.coord_to_index(p[2]),
        )
    }

    pub fn voxel_center(&self, idx: VoxelIndex) -> [f64; 3] {
        [
            self.index_to_coord(idx.x),
            self.index_to_coord(idx.y),
            self.index_to_coord(idx.z),
        ]
    }
}
