mod tests {
    use core::f32::consts::{PI, TAU};

    use sphere_light_composer::transform::{Quaternion, SphereCoordinateTransform};

    /// Direct spherical mapping with standard math, the reference for the
    /// approximated transform.
    fn reference_uv(x: f32, y: f32, z: f32) -> (f32, f32) {
        let planar = libm::sqrtf(x * x + z * z);
        let u = (libm::atan2f(planar, y) + PI) / TAU;
        let v = (libm::atan2f(x, z) + PI) / TAU;
        (u, v)
    }

    fn assert_uv_close(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() <= 0.005,
            "u: got {}, expected {}",
            actual.0,
            expected.0
        );
        assert!(
            (actual.1 - expected.1).abs() <= 0.005,
            "v: got {}, expected {}",
            actual.1,
            expected.1
        );
    }

    #[test]
    fn test_identity_matches_direct_mapping() {
        let transform = SphereCoordinateTransform::new();
        let samples = [
            (1.0f32, 0.0f32, 0.0f32),
            (0.0, 0.0, 1.0),
            (0.707, 0.707, 0.0),
            (0.577, 0.577, 0.577),
            (-0.707, 0.0, 0.707),
        ];
        for &(x, y, z) in &samples {
            assert_uv_close(transform.transform(x, y, z), reference_uv(x, y, z));
        }
    }

    #[test]
    fn test_identity_on_x_axis() {
        // (1,0,0): u = (atan2(1,0)+pi)/2pi = 0.75, v likewise 0.75.
        let transform = SphereCoordinateTransform::new();
        assert_uv_close(transform.transform(1.0, 0.0, 0.0), (0.75, 0.75));
    }

    #[test]
    fn test_half_turn_around_y() {
        // 180 degrees around Y maps +X to -X.
        let mut transform = SphereCoordinateTransform::new();
        transform.set_orientation(Quaternion::new(0.0, 0.0, 1.0, 0.0));
        let (u, v) = transform.transform(1.0, 0.0, 0.0);
        assert_uv_close((u, v), (0.75, 0.25));
    }

    #[test]
    fn test_near_zero_quaternion_is_identity() {
        let mut transform = SphereCoordinateTransform::new();
        transform.set_orientation(Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert_uv_close(transform.transform(1.0, 0.0, 0.0), (0.75, 0.75));
    }

    #[test]
    fn test_offset_shifts_longitude() {
        let mut transform = SphereCoordinateTransform::new();
        transform.set_offset(0.0, 90.0);
        let (_, v) = transform.transform(0.0, 0.0, 1.0);
        // v for +Z is 0.5; a 90 degree longitude offset adds 0.25.
        assert!((v - 0.75).abs() <= 0.005, "v: got {v}");
    }

    #[test]
    fn test_uv_stays_in_unit_range() {
        let mut transform = SphereCoordinateTransform::new();
        transform.set_offset(400.0, -400.0);
        let (u, v) = transform.transform(0.3, -0.5, 0.8);
        assert!((0.0..1.0).contains(&u));
        assert!((0.0..1.0).contains(&v));
    }

    #[test]
    fn test_dirty_flag_epsilon() {
        let mut transform = SphereCoordinateTransform::new();
        transform.clear_dirty();
        assert!(!transform.is_dirty());

        // Sub-epsilon wobble must not mark the transform dirty.
        transform.set_orientation(Quaternion::new(1.0, 0.0005, 0.0, 0.0));
        assert!(!transform.is_dirty());

        transform.set_orientation(Quaternion::new(0.9, 0.1, 0.0, 0.0));
        assert!(transform.is_dirty());

        transform.clear_dirty();
        transform.set_offset(0.05, 0.0);
        assert!(!transform.is_dirty());
        transform.set_offset(5.0, 0.0);
        assert!(transform.is_dirty());
    }

    #[test]
    fn test_new_transform_starts_dirty() {
        let transform = SphereCoordinateTransform::new();
        assert!(transform.is_dirty());
    }

    #[test]
    fn test_uv_cache_skips_unchanged_orientation() {
        use sphere_light_composer::layout::LedLayout;
        use sphere_light_composer::transform::UvCache;

        let layout = LedLayout::from_csv("0,0,0,1,0,0\n1,0,1,0,1,0\n2,0,2,0,0,1\n")
            .expect("layout parses");
        let mut transform = SphereCoordinateTransform::new();
        let mut cache = UvCache::new();

        // First refresh computes, the second is skipped.
        assert!(cache.refresh(&mut transform, layout.positions()));
        assert_eq!(cache.len(), 3);
        assert!(!cache.refresh(&mut transform, layout.positions()));

        let before = cache.get(0).expect("cached uv");
        assert!((before.0 - 0.75).abs() <= 0.005);

        // A real orientation change forces a recompute.
        transform.set_orientation(Quaternion::new(0.0, 0.0, 1.0, 0.0));
        assert!(cache.refresh(&mut transform, layout.positions()));
        let after = cache.get(0).expect("cached uv");
        assert!((after.1 - 0.25).abs() <= 0.005);
    }
}
