//! # dualvox
//!
//! `dualvox` is a Rust library for point-cloud maps stored as a dual-resolution voxel hash,
//! designed for the inner loop of a SLAM system and ready to be compiled to WebAssembly (WASM).
//! Incoming scans are decimated into voxels, and every voxel keeps back-references to the
//! voxels within the nearest-neighbor search radius, so that scan-to-map queries only touch a
//! precomputed ring of cells.
//!
//! ## Features
//!
//! - **Decimation**: a fixed voxel size with an optional cap on points per voxel.
//! - **Nearest neighbors**: exact radius-bounded search over raw points, plus a fast path over voxel means.
//! - **Incremental**: neighbor links are updated only when a new voxel appears; inserting into an existing voxel is O(1).
//! - **Map matching**: Gaussian log-likelihood of a sensed point cloud at a candidate pose.
//! - **Composable**: maps implement [`MetricMap`] and are built from JSON through a [`MapRegistry`].
//!
//! ## Main Interface
//!
//! The primary entry point is the [`DualVoxelPointCloud`] struct.
//!
//! ```
//! use dualvox::DualVoxelPointCloud;
//!
//! let mut map = DualVoxelPointCloud::new(0.2, 0.6, 0).unwrap();
//! map.insert_point([0.0, 0.0, 0.0]).unwrap();
//! map.insert_point([1.0, 1.0, 1.0]).unwrap();
//!
//! let nearest = map.find_nearest(&[0.05, 0.0, 0.0]).unwrap();
//! assert_eq!(nearest.point, [0.0, 0.0, 0.0]);
//! assert!(map.find_nearest(&[5.0, 5.0, 5.0]).is_none());
//! ```

mod bounds;
mod cell;
mod config;
mod dual_voxel;
mod error;
mod index;
mod likelihood;
mod metric_map;
mod options;
mod registry;
mod render;
mod ring;
mod wasm;

pub use bounds::BoundingBox;
pub use cell::CellId;
pub use cell::VoxelCell;
pub use cell::SSO_LENGTH;
pub use config::DualVoxelDefinition;
pub use config::MapConfig;
pub use config::MapDefinition;
pub use dual_voxel::DualVoxelPointCloud;
pub use dual_voxel::Nearest;
pub use error::MapError;
pub use index::GridScale;
pub use index::VoxelIndex;
pub use metric_map::MetricMap;
pub use metric_map::MultiMetricMap;
pub use metric_map::PointCloudObservation;
pub use options::Colormap;
pub use options::LikelihoodOptions;
pub use options::RenderOptions;
pub use registry::MapFactory;
pub use registry::MapRegistry;
pub use render::RenderBuffers;
pub use ring::MAX_RING_RATIO;
pub use ring::NeighborRing;
pub use ring::RingOffset;
pub use wasm::VoxelMap3D;

// Re-export the pose type used by the point-cloud API
pub use nalgebra::Isometry3;
