/// Generic axis-aligned bounding box for N-dimensional space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// The degenerate all-zero box, reported for maps without points.
    pub fn zero() -> Self {
        Self { min: [0.0; D], max: [0.0; D] }
    }

    /// A box containing a single point.
    pub fn from_point(p: &[f64; D]) -> Self {
        Self { min: *p, max: *p }
    }

    /// Grows the box so that it contains `p`.
    pub fn expand(&mut self, p: &[f64; D]) {
        for i in 0..D {
            if p[i] < self.min[i] { self.min[i] = p[i]; }
            if p[i] > self.max[i] { self.max[i] = p[i]; }
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.expand(&other.min);
        out.expand(&other.max);
        out
    }

    pub fn contains(&self, p: &[f64; D]) -> bool {
        (0..D).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn extent(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }

    pub fn is_zero(&self) -> bool {
        self.min.iter().chain(self.max.iter()).all(|&v| v == 0.0)
    }
}
