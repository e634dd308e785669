//! HSL color mapping for track visuals.

use glam::Vec3;

/// Convert HSL (hue wrapped into [0, 1), saturation and lightness clamped)
/// to linear RGB, interpreting the components directly in linear space.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Vec3::splat(l);
    }

    let high = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let low = 2.0 * l - high;

    Vec3::new(
        hue_channel(low, high, h + 1.0 / 3.0),
        hue_channel(low, high, h),
        hue_channel(low, high, h - 1.0 / 3.0),
    )
}

fn hue_channel(low: f32, high: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        low + (high - low) * 6.0 * t
    } else if t < 0.5 {
        high
    } else if t < 2.0 / 3.0 {
        low + (high - low) * 6.0 * (2.0 / 3.0 - t)
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_primary_hues() {
        assert!(approx(hsl_to_rgb(0.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 0.0)));
        assert!(approx(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 1.0, 0.0)));
        assert!(approx(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_track_palette_at_silence() {
        // Average 0 -> hue 0 at s = l = 0.75: a light red
        let c = hsl_to_rgb(0.0, 0.75, 0.75);
        assert!(approx(c, Vec3::new(0.9375, 0.5625, 0.5625)));
    }

    #[test]
    fn test_hue_wraps_and_grey() {
        assert!(approx(hsl_to_rgb(1.25, 0.5, 0.5), hsl_to_rgb(0.25, 0.5, 0.5)));
        assert!(approx(hsl_to_rgb(0.3, 0.0, 0.4), Vec3::splat(0.4)));
    }
}
