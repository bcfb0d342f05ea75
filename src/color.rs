//! Pixel color types and small blending helpers.

use smart_leds::{RGB8, hsv::Hsv as HSV};

pub use smart_leds::hsv::hsv2rgb;

use crate::math8::{blend8, scale8};

pub type Rgb = RGB8;
pub type Hsv = HSV;

/// Blend two RGB colors
///
/// # Arguments
/// * `a` - First color
/// * `b` - Second color
/// * `amount_of_b` - Blend factor (0 = all a, 255 = all b)
#[inline]
pub fn blend_colors(a: Rgb, b: Rgb, amount_of_b: u8) -> Rgb {
    Rgb {
        r: blend8(a.r, b.r, amount_of_b),
        g: blend8(a.g, b.g, amount_of_b),
        b: blend8(a.b, b.b, amount_of_b),
    }
}

/// Scale all channels of a color (0-255 = 0.0-1.0)
#[inline]
pub const fn scale_color(color: Rgb, scale: u8) -> Rgb {
    Rgb {
        r: scale8(color.r, scale),
        g: scale8(color.g, scale),
        b: scale8(color.b, scale),
    }
}

/// Scale a color by a float intensity clamped to [0.0, 1.0]
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_color_f(color: Rgb, intensity: f32) -> Rgb {
    scale_color(color, (intensity.clamp(0.0, 1.0) * 255.0) as u8)
}

/// Fade a color towards black by the given amount (255 = fully black)
#[inline]
pub const fn fade_to_black(color: Rgb, amount: u8) -> Rgb {
    scale_color(color, 255 - amount)
}

/// Create an RGB color from a u32 value (0xRRGGBB format)
pub const fn rgb_from_u32(color: u32) -> Rgb {
    Rgb {
        r: ((color >> 16) & 0xFF) as u8,
        g: ((color >> 8) & 0xFF) as u8,
        b: (color & 0xFF) as u8,
    }
}
