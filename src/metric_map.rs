use crate::dual_voxel::DualVoxelPointCloud;
use nalgebra::Isometry3;
use std::any::Any;
use std::fmt;
use tracing::debug;

/// A point cloud as sensed, together with the sensor pose on the robot.
#[derive(Clone, Debug)]
pub struct PointCloudObservation {
    /// Pose of the sensor in the robot frame.
    pub sensor_pose: Isometry3<f64>,
    /// Points in the sensor frame.
    pub points: Vec<[f64; 3]>,
}

impl PointCloudObservation {
    pub fn new(sensor_pose: Isometry3<f64>, points: Vec<[f64; 3]>) -> Self {
        Self { sensor_pose, points }
    }

    /// Pose of the sensor in the map frame, for a robot at `robot_pose`.
    fn sensor_in_map(&self, robot_pose: Option<&Isometry3<f64>>) -> Isometry3<f64> {
        match robot_pose {
            Some(robot) => robot * self.sensor_pose,
            None => self.sensor_pose,
        }
    }
}

/// Capabilities shared by every map that can live in a [`MultiMetricMap`].
/// This allows mixing different map representations behind one interface.
pub trait MetricMap: Send + Sync + fmt::Display {
    /// Name under which the map class is registered.
    fn class_name(&self) -> &'static str;

    fn is_empty(&self) -> bool;

    fn clear(&mut self);

    /// Inserts an observation taken from `robot_pose` (identity if `None`).
    /// Returns true if the map was modified.
    fn insert_observation(&mut self, obs: &PointCloudObservation, robot_pose: Option<&Isometry3<f64>>) -> bool;

    fn can_compute_likelihood(&self, obs: &PointCloudObservation) -> bool;

    /// Log-likelihood of `obs` for a robot at `taken_from`.
    fn compute_observation_likelihood(&self, obs: &PointCloudObservation, taken_from: &Isometry3<f64>) -> f64;

    /// Saves a representation of the map to `<prefix>` plus a file extension.
    /// Returns false on failure.
    fn save_metric_map_representation(&self, prefix: &str) -> bool;

    fn as_any(&self) -> &dyn Any;
}

impl MetricMap for DualVoxelPointCloud {
    fn class_name(&self) -> &'static str {
        "DualVoxelPointCloud"
    }

    fn is_empty(&self) -> bool {
        DualVoxelPointCloud::is_empty(self)
    }

    fn clear(&mut self) {
        DualVoxelPointCloud::clear(self);
    }

    fn insert_observation(&mut self, obs: &PointCloudObservation, robot_pose: Option<&Isometry3<f64>>) -> bool {
        let pose = obs.sensor_in_map(robot_pose);
        self.insert_point_cloud(&pose, &obs.points) > 0
    }

    fn can_compute_likelihood(&self, obs: &PointCloudObservation) -> bool {
        !obs.points.is_empty()
    }

    fn compute_observation_likelihood(&self, obs: &PointCloudObservation, taken_from: &Isometry3<f64>) -> f64 {
        let pose = obs.sensor_in_map(Some(taken_from));
        self.compute_likelihood(&pose, &obs.points)
    }

    fn save_metric_map_representation(&self, prefix: &str) -> bool {
        self.save_to_text_file(format!("{prefix}.txt"))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A set of maps updated and evaluated together.
#[derive(Default)]
pub struct MultiMetricMap {
    maps: Vec<Box<dyn MetricMap>>,
}

impl MultiMetricMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: Box<dyn MetricMap>) {
        self.maps.push(map);
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn get(&self, index: usize) -> Option<&dyn MetricMap> {
        self.maps.get(index).map(|m| m.as_ref())
    }

    /// First map of concrete type `T`.
    pub fn find<T: 'static>(&self) -> Option<&T> {
        self.maps.iter().find_map(|m| m.as_any().downcast_ref::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.maps.iter().all(|m| m.is_empty())
    }

    pub fn clear(&mut self) {
        self.maps.iter_mut().for_each(|m| m.clear());
    }

    /// Inserts into every map. Returns true if any map was modified.
    pub fn insert_observation(&mut self, obs: &PointCloudObservation, robot_pose: Option<&Isometry3<f64>>) -> bool {
        let mut any = false;
        for map in &mut self.maps {
            any |= map.insert_observation(obs, robot_pose);
        }
        any
    }

    /// Sum of the log-likelihoods of the maps able to evaluate `obs`.
    pub fn compute_observation_likelihood(&self, obs: &PointCloudObservation, taken_from: &Isometry3<f64>) -> f64 {
        self.maps
            .iter()
            .filter(|m| m.can_compute_likelihood(obs))
            .map(|m| m.compute_observation_likelihood(obs, taken_from))
            .sum()
    }

    /// Saves every map as `<prefix>_<index>_<class>`. Returns false if any failed.
    pub fn save_metric_map_representation(&self, prefix: &str) -> bool {
        let mut ok = true;
        for (i, map) in self.maps.iter().enumerate() {
            let name = format!("{prefix}_{i}_{}", map.class_name());
            debug!(%name, "saving map representation");
            ok &= map.save_metric_map_representation(&name);
        }
        ok
    }
}

impl fmt::Display for MultiMetricMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MultiMetricMap with {} maps", self.maps.len())?;
        for (i, map) in self.maps.iter().enumerate() {
            writeln!(f, "  [{i}] {map}")?;
        }
        Ok(())
    }
}
