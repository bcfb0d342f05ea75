mod tests {
    use std::fmt::Write as _;
    use std::sync::{Arc, Mutex};

    use sphere_light_composer::layout::{LayoutSource, LedLayout};
    use sphere_light_composer::sphere::{LedSphereManager, StripOutput};
    use sphere_light_composer::{OutputDriver, Rgb};

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    struct NullDriver;

    impl OutputDriver for NullDriver {
        fn write(&mut self, _colors: &[Rgb]) {}
    }

    /// Records every flushed segment for assertions.
    struct CaptureDriver {
        frames: Arc<Mutex<Vec<Vec<Rgb>>>>,
    }

    impl OutputDriver for CaptureDriver {
        fn write(&mut self, colors: &[Rgb]) {
            self.frames.lock().unwrap().push(colors.to_vec());
        }
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

    /// Four LEDs: high north, two on the equator, high south.
    fn four_led_manager() -> LedSphereManager {
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
    fn test_initialize_hardware_rejects_empty() {
        let mut sphere = LedSphereManager::new();
        assert!(!sphere.initialize_hardware(Vec::new()));
        assert!(!sphere.is_initialized());
    }

    #[test]
    fn test_latitude_line_colors_exact_band() {
        let mut sphere = four_led_manager();
        sphere.draw_latitude_line(0.0, RED, 1);

        // Exactly the two equatorial LEDs turn red, the poles stay black.
        assert_eq!(sphere.pixels(), [BLACK, RED, RED, BLACK]);
    }

    #[test]
    fn test_longitude_line_colors_exact_band() {
        let mut sphere = four_led_manager();
        sphere.draw_longitude_line(0.0, RED, 1);

        // LEDs 0, 1 and 3 sit on the zero meridian; led 2 is antipodal.
        assert_eq!(sphere.pixels(), [RED, RED, BLACK, RED]);
    }

    #[test]
    fn test_later_draw_wins() {
        let mut sphere = four_led_manager();
        let blue = Rgb { r: 0, g: 0, b: 255 };
        sphere.draw_latitude_line(0.0, RED, 1);
        sphere.draw_latitude_line(0.0, blue, 1);
        assert_eq!(sphere.pixels()[1], blue);
    }

    #[test]
    fn test_clear_turns_everything_off() {
        let mut sphere = four_led_manager();
        sphere.draw_latitude_line(0.0, RED, 1);
        sphere.clear();
        assert_eq!(sphere.pixels(), [BLACK; 4]);
    }

    #[test]
    fn test_invalid_id_is_silent_noop() {
        let mut sphere = four_led_manager();
        sphere.set_pixel(4, RED);
        sphere.set_pixel(u16::MAX, RED);
        assert_eq!(sphere.pixels(), [BLACK; 4]);
    }

    #[test]
    fn test_uninitialized_draws_are_noops() {
        let mut sphere = LedSphereManager::new();
        sphere.draw_latitude_line(0.0, RED, 1);
        sphere.draw_longitude_line(0.0, RED, 1);
        sphere.set_pixel_by_uv(0.75, 0.5, RED, 0.02);
        sphere.draw_axis_markers(10.0, 4);
        sphere.show();
        assert!(sphere.pixels().is_empty());
    }

    #[test]
    fn test_set_pixel_by_uv_hits_closest() {
        let mut sphere = four_led_manager();
        // UV of the equator/prime-meridian point, dead on led 1.
        sphere.set_pixel_by_uv(0.75, 0.5, RED, 0.02);
        assert_eq!(sphere.pixels()[1], RED);
        assert_eq!(sphere.pixels()[0], BLACK);
    }

    #[test]
    fn test_show_flushes_segments_at_offsets() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let first = CaptureDriver {
            frames: Arc::clone(&frames),
        };
        let second = CaptureDriver {
            frames: Arc::clone(&frames),
        };

        let mut sphere = LedSphereManager::new();
        assert!(sphere.initialize_hardware(vec![
            StripOutput::new(2, first),
            StripOutput::new(2, second),
        ]));
        assert_eq!(sphere.led_count(), 4);

        sphere.set_pixel(0, RED);
        sphere.set_pixel(3, RED);
        sphere.show();

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], vec![RED, BLACK]);
        assert_eq!(frames[1], vec![BLACK, RED]);
    }

    #[test]
    fn test_proportional_fallback_without_layout() {
        let mut sphere = LedSphereManager::new();
        assert!(sphere.initialize_hardware(vec![StripOutput::new(10, NullDriver)]));

        // North pole maps to the start of the buffer, south pole to the end.
        sphere.draw_latitude_line(90.0, RED, 1);
        assert_eq!(sphere.pixels()[0], RED);
        assert_eq!(sphere.pixels()[9], BLACK);

        sphere.clear();
        sphere.draw_latitude_line(-90.0, RED, 1);
        assert_eq!(sphere.pixels()[9], RED);
        assert_eq!(sphere.pixels()[0], BLACK);
    }

    #[test]
    fn test_mismatched_layout_degrades_to_approximate() {
        let layout = LedLayout::from_csv(&csv_from_angles(&[(0.0, 0.0), (0.0, 90.0)]))
            .expect("layout parses");

        let mut sphere = LedSphereManager::new();
        assert!(sphere.initialize_hardware(vec![StripOutput::new(8, NullDriver)]));
        sphere.attach_layout(LayoutSource::Loaded(layout));

        assert!(matches!(
            sphere.layout(),
            LayoutSource::Approximate { count: 8 }
        ));
    }

    #[test]
    fn test_axis_markers() {
        let layout = LedLayout::from_csv(&csv_from_angles(&[
            (0.0, 0.0),   // +Z
            (0.0, 90.0),  // +X
            (90.0, 0.0),  // +Y
            (0.0, 180.0), // -Z
        ]))
        .expect("layout parses");

        let mut sphere = LedSphereManager::new();
        assert!(sphere.initialize_hardware(vec![StripOutput::new(4, NullDriver)]));
        sphere.attach_layout(LayoutSource::Loaded(layout));

        sphere.draw_axis_markers(5.0, 1);
        let pixels = sphere.pixels();
        assert_eq!(pixels[1], Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(pixels[2], Rgb { r: 0, g: 255, b: 0 });
        assert_eq!(pixels[0], Rgb { r: 0, g: 0, b: 255 });
        assert_eq!(pixels[3], BLACK);
    }
}
