mod tests {
    use std::fmt::Write as _;

    use sphere_light_composer::layout::{
        LayoutSource, LedLayout, lat_lon_to_uv, uv_to_lat_lon, wrapped_uv_distance,
    };

    /// Build a CSV table from (latitude, longitude) pairs in degrees.
    fn csv_from_angles(angles: &[(f32, f32)]) -> String {
        let mut text = String::from("id,strip,index,x,y,z\n");
        for (id, &(lat, lon)) in angles.iter().enumerate() {
            let (lat_rad, lon_rad) = (lat.to_radians(), lon.to_radians());
            let x = libm::cosf(lat_rad) * libm::sinf(lon_rad);
            let y = libm::sinf(lat_rad);
            let z = libm::cosf(lat_rad) * libm::cosf(lon_rad);
            let _ = writeln!(text, "{id},0,{id},{x:.6},{y:.6},{z:.6}");
        }
        text
    }

    fn small_layout() -> LedLayout {
        // Poles plus four equatorial points.
        let angles = [
            (80.0, 0.0),
            (0.0, 0.0),
            (0.0, 90.0),
            (0.0, 180.0),
            (0.0, -90.0),
            (-80.0, 0.0),
        ];
        LedLayout::from_csv(&csv_from_angles(&angles)).expect("layout parses")
    }

    #[test]
    fn test_parse_and_cached_angles() {
        let layout = small_layout();
        assert_eq!(layout.len(), 6);

        let equator = layout.get(1).expect("led 1 exists");
        assert!(equator.latitude.abs() < 0.01);
        assert!(equator.longitude.abs() < 0.01);

        let north = layout.get(0).expect("led 0 exists");
        assert!((north.latitude - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_malformed_table_is_rejected() {
        assert!(LedLayout::from_csv("").is_none());
        assert!(LedLayout::from_csv("id,strip,index,x,y,z\n").is_none());
        assert!(LedLayout::from_csv("0,0,0,not_a_number,0,1\n").is_none());
        assert!(LedLayout::from_csv("0,0,0,0.0,0.0\n").is_none());
        // Duplicate id.
        assert!(LedLayout::from_csv("0,0,0,0,0,1\n0,0,1,0,1,0\n").is_none());
        // Gap in the id range.
        assert!(LedLayout::from_csv("0,0,0,0,0,1\n2,0,1,0,1,0\n").is_none());
    }

    #[test]
    fn test_find_closest_returns_own_id() {
        let layout = small_layout();
        for led in layout.positions() {
            let (u, v) = lat_lon_to_uv(led.latitude, led.longitude);
            assert_eq!(
                layout.find_closest(u, v),
                Some(led.id),
                "led {} not found at its own UV",
                led.id
            );
        }
    }

    #[test]
    fn test_find_in_radius() {
        let layout = small_layout();
        let (u, v) = lat_lon_to_uv(0.0, 0.0);
        let hits = layout.find_in_radius(u, v, 0.05);
        assert!(hits.contains(&1));
        assert!(!hits.contains(&3), "antipodal led inside radius");
    }

    #[test]
    fn test_latitude_band_ordered_by_longitude() {
        let layout = small_layout();
        let band = layout.latitude_band(0.0, 2.0);
        // The four equatorial leds, sorted by longitude: -180, -90, 0, 90.
        assert_eq!(band, vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_longitude_band_ordered_by_latitude() {
        let layout = small_layout();
        let band = layout.longitude_band(0.0, 2.0);
        assert_eq!(band, vec![5, 1, 0]);
    }

    #[test]
    fn test_longitude_band_wraps_at_seam() {
        let layout = small_layout();
        // 190 degrees is 10 degrees past the seam from led 3 at 180.
        let band = layout.longitude_band(190.0, 15.0);
        assert_eq!(band, vec![3]);
    }

    #[test]
    fn test_axis_leds_ranked_by_alignment() {
        let layout = small_layout();

        let up = layout.axis_leds([0.0, 1.0, 0.0], 15.0, 3);
        assert_eq!(up.first(), Some(&0));

        let forward = layout.axis_leds([0.0, 0.0, 1.0], 5.0, 3);
        assert_eq!(forward, vec![1]);

        assert!(layout.axis_leds([0.0, 0.0, 0.0], 5.0, 3).is_empty());
        assert!(layout.axis_leds([0.0, 0.0, 1.0], 5.0, 0).is_empty());
    }

    #[test]
    fn test_uv_round_trip() {
        for &(lat, lon) in &[(0.0f32, 0.0f32), (45.0, 90.0), (-45.0, -120.0), (80.0, 179.0)] {
            let (u, v) = lat_lon_to_uv(lat, lon);
            let (lat_back, lon_back) = uv_to_lat_lon(u, v);
            assert!((lat - lat_back).abs() < 0.01);
            assert!((lon - lon_back).abs() < 0.01);
        }
    }

    #[test]
    fn test_wrapped_uv_distance_crosses_seam() {
        let near = wrapped_uv_distance((0.75, 0.99), (0.75, 0.01));
        assert!((near - 0.02).abs() < 0.001, "got {near}");

        let plain = wrapped_uv_distance((0.6, 0.2), (0.8, 0.2));
        assert!((plain - 0.2).abs() < 0.001, "got {plain}");
    }

    #[test]
    fn test_layout_source_counts() {
        let loaded = LayoutSource::Loaded(small_layout());
        assert_eq!(loaded.led_count(), 6);
        let approximate = LayoutSource::Approximate { count: 800 };
        assert_eq!(approximate.led_count(), 800);
    }
}
