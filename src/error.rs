//! Error types for voxel map operations.

/// Errors that can occur while building, querying or persisting a voxel map.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MapError {
    /// The decimation voxel size must be positive and finite.
    #[error("decimation size must be positive and finite, got {0}")]
    InvalidDecimationSize(f64),

    /// The nearest-neighbor search radius must be positive and finite.
    #[error("nearest-neighbor radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    /// The search radius spans too many voxels for the neighbor ring.
    #[error("nearest-neighbor radius spans {ratio} voxels, at most {max} are supported")]
    RingTooLarge { ratio: f64, max: i32 },

    /// A flat coordinate array whose length is not a multiple of 3.
    #[error("flat point array has {0} values, expected a multiple of 3")]
    PartialPoint(usize),

    /// A point with a NaN or infinite coordinate was given.
    #[error("point {0:?} has a non-finite coordinate")]
    NonFiniteCoordinate([f64; 3]),

    /// The mean of a voxel without points was requested.
    #[error("voxel has no points")]
    EmptyCell,

    /// A map definition names a class missing from the registry.
    #[error("no map class registered as {0:?}")]
    UnknownMapClass(String),

    /// Reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A configuration document could not be parsed.
    #[error("invalid map configuration: {0}")]
    Config(#[from] serde_json::Error),
}
