use dualvox::{BoundingBox, DualVoxelPointCloud, NeighborRing, VoxelIndex};

#[test]
fn test_end_to_end_scenario() {
    let mut map = DualVoxelPointCloud::new(0.2, 0.6, 0).unwrap();
    map.insert_point([0.0, 0.0, 0.0]).unwrap();
    map.insert_point([0.05, 0.0, 0.0]).unwrap();
    map.insert_point([1.0, 1.0, 1.0]).unwrap();

    // Both near-origin points share voxel (0, 0, 0).
    assert_eq!(map.len(), 2);
    assert_eq!(map.voxel(&VoxelIndex::new(0, 0, 0)).unwrap().len(), 2);

    let n = map.find_nearest(&[0.02, 0.0, 0.0]).expect("should find a neighbor");
    assert!(n.point == [0.0, 0.0, 0.0] || n.point == [0.05, 0.0, 0.0]);
    assert!(n.distance_sq <= 0.0025, "distance_sq {}", n.distance_sq);
    assert_eq!(n.point, [0.0, 0.0, 0.0]);

    assert!(map.find_nearest(&[5.0, 5.0, 5.0]).is_none());
}

#[test]
fn test_inserted_points_find_themselves() {
    let mut map = DualVoxelPointCloud::new(0.25, 0.5, 0).unwrap();
    let mut points = Vec::new();
    for i in 0..10 {
        for j in 0..10 {
            points.push([i as f64 * 0.13 - 0.6, j as f64 * 0.07, (i * j) as f64 * 0.011]);
        }
    }
    assert_eq!(map.insert_points(&points).unwrap(), points.len());

    for p in &points {
        let n = map.find_nearest(p).unwrap();
        assert_eq!(n.distance_sq, 0.0, "point {:?} found {:?}", p, n.point);
        assert_eq!(n.point, *p);
    }
}

#[test]
fn test_radius_boundary_is_inclusive() {
    let mut map = DualVoxelPointCloud::new(0.25, 1.0, 0).unwrap();
    map.insert_point([1.0, 0.0, 0.0]).unwrap();

    let n = map.find_nearest(&[0.0, 0.0, 0.0]).expect("point at exactly the radius is included");
    assert_eq!(n.distance_sq, 1.0);

    assert!(map.find_nearest(&[-1e-6, 0.0, 0.0]).is_none());
    assert!(map.find_nearest(&[2.0 + 1e-6, 0.0, 0.0]).is_none());
}

#[test]
fn test_decimation_cap() {
    let mut map = DualVoxelPointCloud::new(1.0, 1.0, 2).unwrap();
    let stored: Vec<bool> = (0..5)
        .map(|i| map.insert_point([0.1 * i as f64, 0.0, 0.0]).unwrap())
        .collect();
    assert_eq!(stored, vec![true, true, false, false, false]);

    let cell = map.voxel(&VoxelIndex::new(0, 0, 0)).unwrap();
    assert_eq!(cell.len(), 2);
    assert_eq!(map.point_count(), 2);
}

#[test]
fn test_clear() {
    let mut map = DualVoxelPointCloud::default();
    map.insert_points(&[[0.0, 0.0, 0.0], [3.0, -1.0, 2.0]]).unwrap();
    assert!(!map.is_empty());

    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert!(map.bounding_box().is_zero());
    assert!(map.find_nearest(&[0.0, 0.0, 0.0]).is_none());
    assert!(map.find_nearest_mean(&[3.0, -1.0, 2.0]).is_none());

    // The map is usable again after clearing.
    map.insert_point([3.0, -1.0, 2.0]).unwrap();
    assert_eq!(map.find_nearest(&[3.0, -1.0, 2.0]).unwrap().distance_sq, 0.0);
}

#[test]
fn test_parameter_change_wipes_map() {
    let mut map = DualVoxelPointCloud::default();
    for i in 0..20 {
        map.insert_point([i as f64 * 0.3, 0.0, 0.0]).unwrap();
    }
    assert_eq!(map.point_count(), 20);

    map.set_voxel_properties(0.5, 1.5, 3).unwrap();
    assert!(map.is_empty());
    assert_eq!(map.decimation_size(), 0.5);
    assert_eq!(map.max_nn_radius(), 1.5);
    assert_eq!(map.max_points_per_voxel(), 3);
    assert_eq!(map.nn_to_decim_ratio(), 3);
    assert!(map.bounding_box().is_zero());
    assert_eq!(map.ring().len(), NeighborRing::new(0.5, 1.5, 3).len());
    assert_eq!(map.ring().extent(), 4);

    // Queries use the new radius: 1.4 is found, 1.6 is not.
    map.insert_points(&[[0.0, 0.0, 0.0], [1.2, 0.0, 0.0]]).unwrap();
    let n = map.find_nearest(&[2.6, 0.0, 0.0]).expect("within the new radius");
    assert_eq!(n.point, [1.2, 0.0, 0.0]);
    assert!((n.distance_sq - 1.96).abs() < 1e-9);
    let n = map.find_nearest(&[-1.4, 0.0, 0.0]).expect("within the new radius");
    assert_eq!(n.point, [0.0, 0.0, 0.0]);
    assert!(map.find_nearest(&[2.8, 0.0, 0.0]).is_none());
    assert!(map.find_nearest(&[-1.6, 0.0, 0.0]).is_none());

    // Voxels 1.2 apart are linked under the new ring.
    let linked = map.neighbors(&VoxelIndex::new(0, 0, 0)).unwrap();
    assert!(linked.iter().any(|(k, c)| *k == VoxelIndex::new(2, 0, 0) && c.is_some()));
}

#[test]
fn test_bounding_box_cache() {
    let mut map = DualVoxelPointCloud::default();
    assert_eq!(map.bounding_box(), BoundingBox::zero());

    map.insert_points(&[[1.0, -2.0, 0.5], [-3.0, 4.0, 0.25], [0.0, 0.0, 7.0]]).unwrap();
    assert!(!map.bounding_box_is_cached());

    let first = map.bounding_box();
    assert!(map.bounding_box_is_cached());
    let second = map.bounding_box();
    assert_eq!(first, second);
    assert_eq!(first.min, [-3.0, -2.0, 0.25]);
    assert_eq!(first.max, [1.0, 4.0, 7.0]);

    map.insert_point([10.0, 0.0, 0.0]).unwrap();
    assert!(!map.bounding_box_is_cached(), "insert must invalidate the cached box");
    assert_eq!(map.bounding_box().max[0], 10.0);
}

#[test]
fn test_dropped_point_keeps_cached_box() {
    let mut map = DualVoxelPointCloud::new(1.0, 1.0, 1).unwrap();
    map.insert_point([0.0, 0.0, 0.0]).unwrap();
    let _ = map.bounding_box();
    assert!(!map.insert_point([0.4, 0.0, 0.0]).unwrap());
    assert!(map.bounding_box_is_cached());
    assert_eq!(map.bounding_box().max, [0.0, 0.0, 0.0]);
}

#[test]
fn test_visit_order_is_creation_order() {
    let mut map = DualVoxelPointCloud::new(1.0, 1.0, 0).unwrap();
    let points = [[5.0, 0.0, 0.0], [0.0, 0.0, 0.0], [5.2, 0.0, 0.0], [-3.0, 0.0, 0.0]];
    map.insert_points(&points).unwrap();

    let mut keys = Vec::new();
    map.visit_all_voxels(|k, _| keys.push(*k));
    assert_eq!(
        keys,
        vec![VoxelIndex::new(5, 0, 0), VoxelIndex::new(0, 0, 0), VoxelIndex::new(-3, 0, 0)]
    );

    let mut visited = Vec::new();
    map.visit_all_points(|p| visited.push(*p));
    assert_eq!(
        visited,
        vec![[5.0, 0.0, 0.0], [5.2, 0.0, 0.0], [0.0, 0.0, 0.0], [-3.0, 0.0, 0.0]]
    );
}

#[test]
fn test_query_in_gap_of_coverage() {
    let mut map = DualVoxelPointCloud::new(0.2, 0.6, 0).unwrap();
    map.insert_point([0.5, 0.0, 0.0]).unwrap();

    // The query voxel (0, 0, 0) does not exist; its ring is probed directly.
    assert!(map.voxel(&VoxelIndex::new(0, 0, 0)).is_none());
    let n = map.find_nearest(&[0.0, 0.0, 0.0]).unwrap();
    assert_eq!(n.point, [0.5, 0.0, 0.0]);
    assert!((n.distance_sq - 0.25).abs() < 1e-12);
}
