//! JSON map definitions.
//!
//! A configuration lists the maps to build, each tagged with its registered
//! class name:
//!
//! ```json
//! { "maps": [ { "class": "DualVoxelPointCloud", "decimation_size": 0.1 } ] }
//! ```

use crate::dual_voxel::DualVoxelPointCloud;
use crate::error::MapError;
use crate::metric_map::MultiMetricMap;
use crate::options::{LikelihoodOptions, RenderOptions};
use crate::registry::MapRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// One entry of a [`MapConfig`]: a class name plus its class-specific fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapDefinition {
    pub class: String,
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// A list of map definitions, built into a [`MultiMetricMap`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default)]
    pub maps: Vec<MapDefinition>,
}

impl MapConfig {
    pub fn from_json_str(text: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        debug!(path = %path.as_ref().display(), maps = config.maps.len(), "loaded map configuration");
        Ok(config)
    }

    /// Builds every defined map with the factories of `registry`.
    pub fn build(&self, registry: &MapRegistry) -> Result<MultiMetricMap, MapError> {
        let mut multi = MultiMetricMap::new();
        for def in &self.maps {
            multi.push(registry.create(def)?);
        }
        Ok(multi)
    }
}

/// Construction parameters of a [`DualVoxelPointCloud`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DualVoxelDefinition {
    pub decimation_size: f64,
    pub max_nn_radius: f64,
    pub max_points_per_voxel: u32,
    pub likelihood_opts: LikelihoodOptions,
    pub render_opts: RenderOptions,
}

impl Default for DualVoxelDefinition {
    fn default() -> Self {
        Self {
            decimation_size: 0.20,
            max_nn_radius: 0.60,
            max_points_per_voxel: 0,
            likelihood_opts: LikelihoodOptions::default(),
            render_opts: RenderOptions::default(),
        }
    }
}

impl DualVoxelDefinition {
    pub fn from_params(params: &serde_json::Map<String, serde_json::Value>) -> Result<Self, MapError> {
        Ok(serde_json::from_value(serde_json::Value::Object(params.clone()))?)
    }

    pub fn build(&self) -> Result<DualVoxelPointCloud, MapError> {
        let mut map = DualVoxelPointCloud::new(self.decimation_size, self.max_nn_radius, self.max_points_per_voxel)?;
        if self.likelihood_opts.max_corr_distance > self.max_nn_radius {
            warn!(
                max_corr_distance = self.likelihood_opts.max_corr_distance,
                max_nn_radius = self.max_nn_radius,
                "correspondences are limited to max_nn_radius"
            );
        }
        map.likelihood_options = self.likelihood_opts;
        map.render_options = self.render_opts;
        Ok(map)
    }
}
