mod tests {
    use std::fmt::Write as _;

    use sphere_light_composer::layout::{LayoutSource, LedLayout};
    use sphere_light_composer::pattern::{
        PatternId, PatternParams, PatternSlot, RingDescentPattern, create_pattern,
    };
    use sphere_light_composer::sphere::{LedSphereManager, StripOutput};
    use sphere_light_composer::{OutputDriver, Pattern, Rgb};

    const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    struct NullDriver;

    impl OutputDriver for NullDriver {
        fn write(&mut self, _colors: &[Rgb]) {}
    }

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

    fn test_manager() -> LedSphereManager {
        let layout = LedLayout::from_csv(&csv_from_angles(&[
            (80.0, 0.0),
            (0.0, 0.0),
            (0.0, 180.0),
            (-80.0, 0.0),
        ]))
        .expect("layout parses");

        let mut sphere = LedSphereManager::new();
        assert!(sphere.initialize_hardware(vec![StripOutput::new(4, NullDriver)]));
        sphere.attach_layout(LayoutSource::Loaded(layout));
        sphere
    }

    #[test]
    fn test_factory_known_names() {
        let pattern = create_pattern("ring_descent").expect("known pattern");
        assert_eq!(pattern.name(), "Ring Descent");
        assert!(!pattern.description().is_empty());
        assert!(pattern.duration() > 0.0);
    }

    #[test]
    fn test_factory_unknown_name_is_none() {
        assert!(create_pattern("disco_floor").is_none());
        assert!(create_pattern("").is_none());
    }

    #[test]
    fn test_id_round_trip() {
        for id in PatternId::all() {
            assert_eq!(PatternId::parse_from_str(id.as_str()), Some(id));
            assert_eq!(id.to_slot().id(), id);
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        let params = PatternParams {
            progress: 0.37,
            time: 1.25,
            ..PatternParams::default()
        };

        for id in PatternId::all() {
            let mut first = test_manager();
            let mut second = test_manager();

            id.to_slot().render(&mut first, &params);
            id.to_slot().render(&mut second, &params);
            assert_eq!(
                first.pixels(),
                second.pixels(),
                "{} is not deterministic",
                id.as_str()
            );
        }
    }

    #[test]
    fn test_ring_descent_crosses_equator() {
        let mut sphere = test_manager();
        let mut pattern = RingDescentPattern::new();

        // Lead ring sits on the equator at half progress; flicker off keeps
        // the position exact.
        let params = PatternParams {
            progress: 0.5,
            flicker: false,
            ..PatternParams::default()
        };
        pattern.render(&mut sphere, &params);

        assert_ne!(sphere.pixels()[1], BLACK);
        assert_ne!(sphere.pixels()[2], BLACK);
        assert_eq!(sphere.pixels()[0], BLACK);
    }

    #[test]
    fn test_ring_descent_idle_before_start() {
        let mut sphere = test_manager();
        let mut pattern = RingDescentPattern::new();

        let params = PatternParams {
            progress: 0.0,
            flicker: false,
            ..PatternParams::default()
        };
        pattern.render(&mut sphere, &params);
        assert_eq!(sphere.pixels(), [BLACK; 4]);
    }

    #[test]
    fn test_longitude_wave_lights_meridians() {
        let mut sphere = test_manager();
        let mut pattern = create_pattern("longitude_wave").expect("known pattern");

        let params = PatternParams {
            progress: 0.25,
            time: 0.5,
            flicker: false,
            ..PatternParams::default()
        };
        pattern.render(&mut sphere, &params);

        let lit = sphere.pixels().iter().filter(|&&p| p != BLACK).count();
        assert!(lit > 0, "no meridian lit");
    }

    #[test]
    fn test_axis_indicator_marks_poles() {
        let mut sphere = test_manager();
        let mut pattern = match create_pattern("axis_indicator").expect("known pattern") {
            PatternSlot::AxisIndicator(pattern) => pattern.with_grid(false),
            other => panic!("unexpected slot {:?}", other.id()),
        };

        let params = PatternParams {
            progress: 0.0,
            flicker: false,
            ..PatternParams::default()
        };
        pattern.render(&mut sphere, &params);

        // +Y marker lands on the highest LED, green dominant.
        let north = sphere.pixels()[0];
        assert!(north.g > 0);
        assert_eq!(north.r, 0);
    }

    #[test]
    fn test_spiral_starts_at_south_pole() {
        // Approximate geometry: the pole maps to the end of the buffer.
        let mut sphere = LedSphereManager::new();
        assert!(sphere.initialize_hardware(vec![StripOutput::new(10, NullDriver)]));
        let mut pattern = create_pattern("spiral_trajectory").expect("known pattern");

        let params = PatternParams {
            progress: 0.0,
            flicker: false,
            ..PatternParams::default()
        };
        pattern.render(&mut sphere, &params);

        assert_ne!(sphere.pixels()[9], BLACK);
        assert_eq!(sphere.pixels()[0], BLACK);
    }

    #[test]
    fn test_spherical_wave_lights_rings() {
        let mut sphere = test_manager();
        let mut pattern = create_pattern("spherical_wave").expect("known pattern");

        let params = PatternParams {
            progress: 0.5,
            time: 0.2,
            ..PatternParams::default()
        };
        pattern.render(&mut sphere, &params);

        let lit = sphere.pixels().iter().filter(|&&p| p != BLACK).count();
        assert!(lit > 0, "no ring lit");
    }
}
