//! Option structs consumed by the map-matching and visualization collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters of the Gaussian observation model used to score a sensed
/// point cloud against the map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LikelihoodOptions {
    /// Standard deviation, in meters, of the Gaussian observation model.
    pub sigma_dist: f64,
    /// Squared errors are clamped at this distance, in meters, so that every
    /// point keeps a small but nonzero likelihood.
    pub max_corr_distance: f64,
    /// Only one out of `decimation` sensed points is evaluated.
    pub decimation: u32,
}

impl Default for LikelihoodOptions {
    fn default() -> Self {
        Self {
            sigma_dist: 0.5,
            max_corr_distance: 1.0,
            decimation: 10,
        }
    }
}

impl fmt::Display for LikelihoodOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------- [LikelihoodOptions] ------------")?;
        writeln!(f, "sigma_dist                              = {}", self.sigma_dist)?;
        writeln!(f, "max_corr_distance                       = {}", self.max_corr_distance)?;
        writeln!(f, "decimation                              = {}", self.decimation)
    }
}

/// Colormaps available for coloring rendered points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// Use the flat `color` of the render options.
    None,
    Grayscale,
    Jet,
    #[default]
    Hot,
}

impl Colormap {
    /// Maps `t` in `[0, 1]` to an RGB triplet in `[0, 1]`.
    ///
    /// Returns `None` for [`Colormap::None`].
    pub fn color(self, t: f32) -> Option<[f32; 3]> {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            Colormap::None => None,
            Colormap::Grayscale => Some([t, t, t]),
            Colormap::Hot => {
                let r = (t / 0.4).min(1.0);
                let g = ((t - 0.4) / 0.4).clamp(0.0, 1.0);
                let b = ((t - 0.8) / 0.2).clamp(0.0, 1.0);
                Some([r, g, b])
            }
            Colormap::Jet => {
                let ramp = |c: f32| (1.5 - (4.0 * t - c).abs()).clamp(0.0, 1.0);
                Some([ramp(3.0), ramp(2.0), ramp(1.0)])
            }
        }
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Colormap::None => "none",
            Colormap::Grayscale => "grayscale",
            Colormap::Jet => "jet",
            Colormap::Hot => "hot",
        };
        f.write_str(name)
    }
}

/// Options read by renderers of the voxel map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub point_size: f32,
    /// Render only the mean point of each voxel instead of all its points.
    pub show_mean_only: bool,
    /// Flat RGB color, superseded by `colormap` unless that is `None`.
    pub color: [f32; 3],
    pub colormap: Colormap,
    /// Coordinate used as colormap index: 0 = x, 1 = y, 2 = z.
    pub recolorize_by_coordinate_index: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            point_size: 1.0,
            show_mean_only: true,
            color: [0.0, 0.0, 1.0],
            colormap: Colormap::Hot,
            recolorize_by_coordinate_index: 2,
        }
    }
}

impl fmt::Display for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------- [RenderOptions] ------------")?;
        writeln!(f, "point_size                              = {}", self.point_size)?;
        writeln!(f, "show_mean_only                          = {}", self.show_mean_only)?;
        writeln!(f, "color                                   = {:?}", self.color)?;
        writeln!(f, "colormap                                = {}", self.colormap)?;
        writeln!(f, "recolorize_by_coordinate_index          = {}", self.recolorize_by_coordinate_index)
    }
}
