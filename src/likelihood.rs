//! Point-cloud insertion and scan-to-map likelihood for [`DualVoxelPointCloud`].

use crate::dual_voxel::DualVoxelPointCloud;
use nalgebra::{Isometry3, Point3};
use rayon::prelude::*;
use tracing::debug;

fn transform(pose: &Isometry3<f64>, p: &[f64; 3]) -> [f64; 3] {
    let g = pose * Point3::new(p[0], p[1], p[2]);
    [g.x, g.y, g.z]
}

impl DualVoxelPointCloud {
    /// Inserts points given in a sensor frame located at `pose` in the map.
    ///
    /// Non-finite points (e.g. missing lidar returns) are skipped. Returns the
    /// number of points stored.
    pub fn insert_point_cloud(&mut self, pose: &Isometry3<f64>, points: &[[f64; 3]]) -> usize {
        let mut stored = 0;
        let mut skipped = 0;
        for p in points {
            match self.insert_point(transform(pose, p)) {
                Ok(true) => stored += 1,
                Ok(false) => {}
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            debug!(skipped, total = points.len(), "skipped non-finite points");
        }
        stored
    }

    /// Log-likelihood of observing `points` (sensor frame) from `pose`.
    ///
    /// One out of every `likelihood_options.decimation` points is transformed
    /// into the map and matched to its nearest neighbor. Squared distances are
    /// clamped at `max_corr_distance²`, a point without neighbor counting as
    /// the clamp value. The result is `-mean(d²) / sigma_dist²`, or 0 when no
    /// point could be evaluated.
    ///
    /// Neighbors are only searched within `max_nn_radius`, so the effective
    /// correspondence distance is `min(max_nn_radius, max_corr_distance)`: a
    /// point farther than `max_nn_radius` from the map scores the clamp value.
    pub fn compute_likelihood(&self, pose: &Isometry3<f64>, points: &[[f64; 3]]) -> f64 {
        let opts = &self.likelihood_options;
        let step = opts.decimation.max(1) as usize;
        let max_sqr_err = opts.max_corr_distance * opts.max_corr_distance;

        let (sum_sqr_dist, count) = points
            .par_chunks(step)
            .map(|chunk| &chunk[0])
            .filter(|p| p.iter().all(|v| v.is_finite()))
            .map(|p| {
                let g = transform(pose, p);
                let d2 = self
                    .find_nearest(&g)
                    .map_or(max_sqr_err, |n| n.distance_sq.min(max_sqr_err));
                (d2, 1usize)
            })
            .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        if count == 0 {
            return 0.0;
        }
        -(sum_sqr_dist / count as f64) / (opts.sigma_dist * opts.sigma_dist)
    }
}
