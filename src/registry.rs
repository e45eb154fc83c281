use crate::config::{DualVoxelDefinition, MapDefinition};
use crate::error::MapError;
use crate::metric_map::MetricMap;
use hashbrown::HashMap;
use tracing::debug;

/// Builds a map from the class-specific fields of a [`MapDefinition`].
pub type MapFactory = fn(&MapDefinition) -> Result<Box<dyn MetricMap>, MapError>;

/// Table of map classes that can be instantiated from configuration.
///
/// Populated explicitly at startup; there is no global registration.
#[derive(Clone, Default)]
pub struct MapRegistry {
    factories: HashMap<String, MapFactory>,
}

impl MapRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every map class of this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("DualVoxelPointCloud", create_dual_voxel);
        registry
    }

    /// Registers `factory` under `class`, replacing any previous entry.
    pub fn register(&mut self, class: &str, factory: MapFactory) {
        debug!(class, "registering map class");
        self.factories.insert(class.to_owned(), factory);
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Registered class names, sorted.
    pub fn classes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn create(&self, def: &MapDefinition) -> Result<Box<dyn MetricMap>, MapError> {
        let factory = self
            .factories
            .get(&def.class)
            .ok_or_else(|| MapError::UnknownMapClass(def.class.clone()))?;
        factory(def)
    }
}

fn create_dual_voxel(def: &MapDefinition) -> Result<Box<dyn MetricMap>, MapError> {
    let map = DualVoxelDefinition::from_params(&def.params)?.build()?;
    Ok(Box::new(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual_voxel::DualVoxelPointCloud;

    fn def(class: &str) -> MapDefinition {
        MapDefinition { class: class.to_owned(), params: serde_json::Map::new() }
    }

    #[test]
    fn test_builtin_classes() {
        let registry = MapRegistry::with_builtin();
        assert_eq!(registry.classes(), vec!["DualVoxelPointCloud"]);

        let map = registry.create(&def("DualVoxelPointCloud")).unwrap();
        assert_eq!(map.class_name(), "DualVoxelPointCloud");
        let concrete = map.as_any().downcast_ref::<DualVoxelPointCloud>().unwrap();
        assert_eq!(concrete.max_nn_radius(), 0.6);
    }

    #[test]
    fn test_unknown_class() {
        let registry = MapRegistry::new();
        assert!(!registry.contains("DualVoxelPointCloud"));
        assert!(matches!(
            registry.create(&def("DualVoxelPointCloud")),
            Err(MapError::UnknownMapClass(name)) if name == "DualVoxelPointCloud"
        ));
    }

    #[test]
    fn test_custom_factory() {
        fn coarse(_: &MapDefinition) -> Result<Box<dyn MetricMap>, MapError> {
            Ok(Box::new(DualVoxelPointCloud::new(1.0, 2.0, 0)?))
        }
        let mut registry = MapRegistry::with_builtin();
        registry.register("Coarse", coarse);
        assert_eq!(registry.classes(), vec!["Coarse", "DualVoxelPointCloud"]);

        let map = registry.create(&def("Coarse")).unwrap();
        let concrete = map.as_any().downcast_ref::<DualVoxelPointCloud>().unwrap();
        assert_eq!(concrete.decimation_size(), 1.0);
    }
}
