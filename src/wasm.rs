use crate::dual_voxel::DualVoxelPointCloud;
use crate::error::MapError;
use crate::options::{Colormap, RenderOptions};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_rayon::init_thread_pool;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn init_threads(n: usize) -> js_sys::Promise {
    init_thread_pool(n)
}

/// Splits `[x, y, z, x, y, z, ...]` into points.
fn unflatten(points: &[f64]) -> Result<Vec<[f64; 3]>, MapError> {
    if points.len() % 3 != 0 {
        return Err(MapError::PartialPoint(points.len()));
    }
    Ok(points.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect())
}

/// WASM wrapper around [`DualVoxelPointCloud`].
///
/// Points cross the boundary as flat arrays `[x, y, z, x, y, z, ...]`.
#[wasm_bindgen]
pub struct VoxelMap3D {
    inner: DualVoxelPointCloud,
}

#[wasm_bindgen]
impl VoxelMap3D {
    /// Creates an empty map.
    ///
    /// # Arguments
    ///
    /// * `decimation_size` - Voxel edge length used for decimation.
    /// * `max_nn_radius` - Maximum nearest-neighbor search radius.
    /// * `max_points_per_voxel` - Points kept per voxel, 0 for no limit.
    #[wasm_bindgen(constructor)]
    pub fn new(decimation_size: f64, max_nn_radius: f64, max_points_per_voxel: u32) -> Result<VoxelMap3D, JsError> {
        let inner = DualVoxelPointCloud::new(decimation_size, max_nn_radius, max_points_per_voxel)?;
        Ok(VoxelMap3D { inner })
    }

    pub fn set_voxel_properties(
        &mut self,
        decimation_size: f64,
        max_nn_radius: f64,
        max_points_per_voxel: u32,
    ) -> Result<(), JsError> {
        Ok(self.inner.set_voxel_properties(decimation_size, max_nn_radius, max_points_per_voxel)?)
    }

    /// Inserts a flat array of points. Returns how many were stored.
    pub fn insert_points(&mut self, points: &[f64]) -> Result<usize, JsError> {
        Ok(self.inner.insert_points(&unflatten(points)?)?)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[wasm_bindgen(getter)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[wasm_bindgen(getter)]
    pub fn count_voxels(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(getter)]
    pub fn count_points(&self) -> usize {
        self.inner.point_count()
    }

    /// Nearest stored point as `[x, y, z, distance_sq]`, or `undefined`.
    pub fn find_nearest(&self, x: f64, y: f64, z: f64) -> Option<Vec<f64>> {
        self.inner
            .find_nearest(&[x, y, z])
            .map(|n| vec![n.point[0], n.point[1], n.point[2], n.distance_sq])
    }

    /// Nearest voxel mean as `[x, y, z, distance_sq]`, or `undefined`.
    pub fn find_nearest_mean(&self, x: f64, y: f64, z: f64) -> Option<Vec<f64>> {
        self.inner
            .find_nearest_mean(&[x, y, z])
            .map(|n| vec![n.point[0], n.point[1], n.point[2], n.distance_sq])
    }

    /// Bounding box as `[min_x, min_y, min_z, max_x, max_y, max_z]`.
    pub fn bounding_box(&self) -> Vec<f64> {
        let b = self.inner.bounding_box();
        vec![b.min[0], b.min[1], b.min[2], b.max[0], b.max[1], b.max[2]]
    }

    /// All points as a flat array.
    pub fn points(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.inner.point_count() * 3);
        self.inner.visit_all_points(|p| out.extend_from_slice(p));
        out
    }

    /// Vertex positions for rendering, using the current render options.
    pub fn render_positions(&self) -> Vec<f32> {
        self.inner.render().positions
    }

    /// Vertex colors for rendering, using the current render options.
    pub fn render_colors(&self) -> Vec<f32> {
        self.inner.render().colors
    }

    /// Selects the colormap by name: `none`, `grayscale`, `jet` or `hot`.
    pub fn set_colormap(&mut self, name: &str) -> Result<(), JsError> {
        let colormap = match name {
            "none" => Colormap::None,
            "grayscale" => Colormap::Grayscale,
            "jet" => Colormap::Jet,
            "hot" => Colormap::Hot,
            _ => return Err(JsError::new(&format!("unknown colormap {name:?}"))),
        };
        self.inner.render_options.colormap = colormap;
        Ok(())
    }

    pub fn set_show_mean_only(&mut self, show_mean_only: bool) {
        self.inner.render_options.show_mean_only = show_mean_only;
    }

    pub fn reset_render_options(&mut self) {
        self.inner.render_options = RenderOptions::default();
    }

    #[wasm_bindgen(js_name = toString)]
    pub fn to_js_string(&self) -> String {
        self.inner.to_string()
    }
}
