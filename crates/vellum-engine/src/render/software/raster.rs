//! Per-pixel formulas of the software backend.
//!
//! These mirror the fragment programs in `shaders/compositor.wgsl`; keep the two
//! in sync.

use crate::coords::Color;
use crate::render::BlendMode;

pub(super) type Rgba = [f32; 4];

const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

#[inline]
pub(super) fn load(px: [u8; 4]) -> Rgba {
    px.map(|v| v as f32 / 255.0)
}

#[inline]
pub(super) fn store(c: Rgba) -> [u8; 4] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[inline]
pub(super) fn from_color(c: Color) -> Rgba {
    c.to_array()
}

#[inline]
pub(super) fn luminance(c: Rgba) -> f32 {
    c[0] * LUMA[0] + c[1] * LUMA[1] + c[2] * LUMA[2]
}

#[inline]
pub(super) fn mix(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

pub(super) fn blend(src: Rgba, dst: Rgba, mode: BlendMode) -> Rgba {
    let a = src[3];
    match mode {
        BlendMode::Normal => [
            src[0] * a + dst[0] * (1.0 - a),
            src[1] * a + dst[1] * (1.0 - a),
            src[2] * a + dst[2] * (1.0 - a),
            a + dst[3] * (1.0 - a),
        ],
        BlendMode::Add => [
            dst[0] + src[0] * a,
            dst[1] + src[1] * a,
            dst[2] + src[2] * a,
            dst[3],
        ],
        BlendMode::ReverseSubtract => [
            dst[0] - src[0] * a,
            dst[1] - src[1] * a,
            dst[2] - src[2] * a,
            dst[3],
        ],
        BlendMode::Replace => src,
    }
}

pub(super) fn gray(c: Rgba, strength: f32) -> Rgba {
    let l = luminance(c);
    let t = strength.clamp(0.0, 1.0);
    [
        c[0] + (l - c[0]) * t,
        c[1] + (l - c[1]) * t,
        c[2] + (l - c[2]) * t,
        c[3],
    ]
}

pub(super) fn sepia(c: Rgba) -> Rgba {
    let [r, g, b, a] = c;
    [
        (r * 0.393 + g * 0.769 + b * 0.189).min(1.0),
        (r * 0.349 + g * 0.686 + b * 0.168).min(1.0),
        (r * 0.272 + g * 0.534 + b * 0.131).min(1.0),
        a,
    ]
}

pub(super) fn tint(c: Rgba, color: Color) -> Rgba {
    let l = luminance(c);
    [l * color.r, l * color.g, l * color.b, c[3]]
}

/// Weight of the frozen frame at a pixel whose map value is `map`.
pub(super) fn map_weight(map: f32, progress: f32, vague: f32) -> f32 {
    let vague = vague.max(f32::EPSILON);
    (map.clamp(progress, progress + vague) - progress) / vague
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Rgba, b: Rgba) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    // ── blending ──────────────────────────────────────────────────────────

    #[test]
    fn normal_blend_half_black_over_white() {
        let out = blend([0.0, 0.0, 0.0, 0.5], [1.0; 4], BlendMode::Normal);
        assert!(approx(out, [0.5, 0.5, 0.5, 1.0]));
    }

    #[test]
    fn add_and_subtract_keep_target_alpha() {
        let dst = [0.5, 0.5, 0.5, 0.25];
        let add = blend([0.25, 0.0, 0.0, 1.0], dst, BlendMode::Add);
        let sub = blend([0.25, 0.0, 0.0, 1.0], dst, BlendMode::ReverseSubtract);
        assert!(approx(add, [0.75, 0.5, 0.5, 0.25]));
        assert!(approx(sub, [0.25, 0.5, 0.5, 0.25]));
    }

    // ── effects ───────────────────────────────────────────────────────────

    #[test]
    fn full_gray_equalizes_channels() {
        let out = gray([1.0, 0.0, 0.0, 1.0], 1.0);
        assert!(approx(out, [0.299, 0.299, 0.299, 1.0]));
    }

    #[test]
    fn zero_gray_is_identity() {
        let c = [0.2, 0.4, 0.6, 0.8];
        assert!(approx(gray(c, 0.0), c));
    }

    #[test]
    fn sepia_of_white_saturates() {
        let out = sepia([1.0; 4]);
        assert!(approx(out, [1.0, 1.0, 0.937, 1.0]));
    }

    #[test]
    fn tint_uses_luminance() {
        let out = tint([1.0, 1.0, 1.0, 1.0], Color::new(0.85, 0.85, 0.0, 1.0));
        assert!(approx(out, [0.85, 0.85, 0.0, 1.0]));
    }

    #[test]
    fn map_weight_ramps_across_vague_band() {
        assert_eq!(map_weight(0.1, 0.5, 0.25), 0.0);
        assert_eq!(map_weight(0.9, 0.5, 0.25), 1.0);
        assert!((map_weight(0.625, 0.5, 0.25) - 0.5).abs() < 1e-6);
    }
}
