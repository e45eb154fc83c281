use crate::dual_voxel::DualVoxelPointCloud;
use crate::options::RenderOptions;

/// Flat vertex buffers describing a map, ready for upload to a renderer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderBuffers {
    /// `[x, y, z, x, y, z, ...]`
    pub positions: Vec<f32>,
    /// `[r, g, b, r, g, b, ...]` in `[0, 1]`, one triplet per position.
    pub colors: Vec<f32>,
    pub point_size: f32,
}

impl RenderBuffers {
    pub fn len(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl DualVoxelPointCloud {
    /// Builds vertex buffers using the map's own `render_options`.
    pub fn render(&self) -> RenderBuffers {
        self.render_buffers(&self.render_options)
    }

    /// Builds vertex buffers for all points, or one mean point per voxel if
    /// `show_mean_only` is set.
    ///
    /// Points are colored by the colormap over the bounding-box extent of the
    /// selected coordinate, or with the flat color when no colormap is set.
    pub fn render_buffers(&self, opts: &RenderOptions) -> RenderBuffers {
        let mut points = Vec::new();
        if opts.show_mean_only {
            self.visit_all_voxels(|_, cell| {
                if let Ok(m) = cell.mean() {
                    points.push(m);
                }
            });
        } else {
            self.visit_all_points(|p| points.push(*p));
        }

        let axis = usize::from(opts.recolorize_by_coordinate_index.min(2));
        let bbox = self.bounding_box();
        let min = bbox.min[axis];
        let extent = bbox.extent(axis);

        let mut buffers = RenderBuffers {
            positions: Vec::with_capacity(points.len() * 3),
            colors: Vec::with_capacity(points.len() * 3),
            point_size: opts.point_size,
        };
        for p in &points {
            buffers.positions.extend(p.iter().map(|&v| v as f32));
            let t = if extent > 0.0 { ((p[axis] - min) / extent) as f32 } else { 0.0 };
            let rgb = opts.colormap.color(t).unwrap_or(opts.color);
            buffers.colors.extend_from_slice(&rgb);
        }
        buffers
    }
}
