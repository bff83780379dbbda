//! Host-side statement of the per-pixel kernel semantics.
//!
//! The WGSL in [`crate::shaders`] is what actually runs; this module pins
//! down the same arithmetic in plain Rust so the contract can be tested
//! without a GPU, and supplies the constants that get baked into the kernel
//! source. Both sides must stay in lockstep: a change here without the
//! matching template change (or vice versa) is a bug.

use crate::types::{Palette, Tuning};

/// Center of the time-varying affine transform mapping pixels onto the
/// complex plane.
pub const PLANE_CENTER: (f32, f32) = (-0.745, 0.186);
/// Zoom oscillation: `scale = SCALE_BASE + SCALE_AMPLITUDE * cos(TIME_FREQUENCY * t)`.
pub const SCALE_BASE: f32 = 2.0;
pub const SCALE_AMPLITUDE: f32 = 1.7;
pub const TIME_FREQUENCY: f32 = 1.8;
/// Orbit is considered escaped once `|z|²` exceeds this.
pub const ESCAPE_THRESHOLD: f32 = 2.0;

/// Canonical enumeration of the canvas: linear invocation index `k` maps to
/// pixel `(k mod width, k div width)`. The GPU dispatch is a 2D grid, but
/// this mapping stays the documented order of the index space and must be a
/// bijection over `[0, width*height)`.
pub fn pixel_for_index(index: u32, width: u32) -> (u32, u32) {
    (index % width, index / width)
}

/// Inverse of [`pixel_for_index`].
pub fn index_for_pixel(x: u32, y: u32, width: u32) -> u32 {
    y * width + x
}

/// Maps a pixel to its complex-plane sample point at animation time `time`.
pub fn sample_point(x: u32, y: u32, width: u32, height: u32, time: f32) -> (f32, f32) {
    let u = x as f32 / width as f32;
    let v = y as f32 / height as f32;
    let scale = SCALE_BASE + SCALE_AMPLITUDE * (TIME_FREQUENCY * time).cos();
    (
        PLANE_CENTER.0 + (u - 0.5) * scale,
        PLANE_CENTER.1 + (v - 0.5) * scale,
    )
}

/// Escape-time iteration: `z ← z² + c` from `z = 0`, stopping at the first
/// iteration where `|z|²` exceeds the threshold. Returns the number of
/// completed (non-escaped) iterations, `0..=max_iterations`.
pub fn escape_iterations(cx: f32, cy: f32, max_iterations: u32) -> u32 {
    let mut zx = 0.0f32;
    let mut zy = 0.0f32;
    let mut count = 0u32;
    for _ in 0..max_iterations {
        let next_x = zx * zx - zy * zy + cx;
        let next_y = 2.0 * zx * zy + cy;
        zx = next_x;
        zy = next_y;
        if zx * zx + zy * zy > ESCAPE_THRESHOLD {
            break;
        }
        count += 1;
    }
    count
}

fn mix3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Two-segment color ramp over the escape count. Both segments evaluate to
/// `palette.mid` where they meet, so the ramp is continuous at `M/2`.
pub fn color_for_count(count: u32, max_iterations: u32, palette: &Palette) -> [f32; 4] {
    debug_assert!(
        max_iterations >= 4 && max_iterations % 2 == 0,
        "iteration cap must be even and at least 4"
    );
    let half = max_iterations / 2;
    let rgb = if count <= half - 1 {
        mix3(palette.outer, palette.mid, count as f32 / (half - 1) as f32)
    } else {
        mix3(palette.mid, palette.core, (count - half) as f32 / half as f32)
    };
    [rgb[0], rgb[1], rgb[2], 1.0]
}

/// Packs a normalized color into one canvas texel, matching WGSL
/// `pack4x8unorm`: each channel is `floor(0.5 + 255 * clamp(c, 0, 1))`,
/// little-endian r..a.
pub fn pack_texel(color: [f32; 4]) -> u32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0 + 0.5).floor() as u32;
    channel(color[0])
        | (channel(color[1]) << 8)
        | (channel(color[2]) << 16)
        | (channel(color[3]) << 24)
}

/// Inverse of [`pack_texel`] (WGSL `unpack4x8unorm`): each byte divided by
/// 255.
pub fn unpack_texel(texel: u32) -> [f32; 4] {
    [
        (texel & 0xff) as f32 / 255.0,
        ((texel >> 8) & 0xff) as f32 / 255.0,
        ((texel >> 16) & 0xff) as f32 / 255.0,
        ((texel >> 24) & 0xff) as f32 / 255.0,
    ]
}

/// Generator stage, evaluated on the host: a full canvas of packed texels
/// for the given size and time. Pure overwrite with no dependency on prior
/// canvas contents.
pub fn generate(width: u32, height: u32, time: f32, tuning: &Tuning) -> Vec<u32> {
    let mut canvas = Vec::with_capacity((width * height) as usize);
    for index in 0..width * height {
        let (x, y) = pixel_for_index(index, width);
        let (cx, cy) = sample_point(x, y, width, height, time);
        let count = escape_iterations(cx, cy, tuning.max_iterations);
        canvas.push(pack_texel(color_for_count(
            count,
            tuning.max_iterations,
            &tuning.palette,
        )));
    }
    canvas
}

/// Filter stage, evaluated on the host: uniform-weight box blur of radius
/// `radius` with edge-clamped neighbor coordinates.
///
/// The weight is `1 / (2R+1)²` for every pixel; edge pixels are not
/// renormalized, so clamping makes border samples count multiple times and
/// biases edge blur toward the edge's own color. That is the defined
/// boundary policy, observable in the golden output.
pub fn blur(canvas: &[u32], width: u32, height: u32, radius: u32) -> Vec<u32> {
    let r = radius as i32;
    let weight = 1.0 / (((2 * r + 1) * (2 * r + 1)) as f32);
    let mut output = Vec::with_capacity(canvas.len());
    for index in 0..width * height {
        let (x, y) = pixel_for_index(index, width);
        let mut sum = [0.0f32; 4];
        for dy in -r..=r {
            for dx in -r..=r {
                let nx = (x as i32 + dx).clamp(0, width as i32 - 1) as u32;
                let ny = (y as i32 + dy).clamp(0, height as i32 - 1) as u32;
                let sample = unpack_texel(canvas[index_for_pixel(nx, ny, width) as usize]);
                for (acc, value) in sum.iter_mut().zip(sample) {
                    *acc += weight * value;
                }
            }
        }
        output.push(pack_texel(sum));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn index_mapping_is_a_bijection() {
        let (width, height) = (7u32, 5u32);
        let mut seen = HashSet::new();
        for index in 0..width * height {
            let (x, y) = pixel_for_index(index, width);
            assert!(x < width && y < height);
            assert!(seen.insert((x, y)), "coordinate visited twice");
            assert_eq!(index_for_pixel(x, y, width), index);
        }
        assert_eq!(seen.len(), (width * height) as usize);
    }

    #[test]
    fn escape_count_stays_within_bounds() {
        for cx in -4..=4 {
            for cy in -4..=4 {
                let count = escape_iterations(cx as f32 * 0.5, cy as f32 * 0.5, 128);
                assert!(count <= 128);
            }
        }
        // The origin never escapes and a far point escapes immediately.
        assert_eq!(escape_iterations(0.0, 0.0, 128), 128);
        assert_eq!(escape_iterations(2.0, 2.0, 128), 0);
    }

    #[test]
    fn palette_segments_meet_at_the_midpoint() {
        let palette = Palette::default();
        let end_of_first = color_for_count(63, 128, &palette);
        let start_of_second = color_for_count(64, 128, &palette);
        let mid = [palette.mid[0], palette.mid[1], palette.mid[2], 1.0];
        assert_eq!(end_of_first, mid);
        assert_eq!(start_of_second, mid);
    }

    #[test]
    #[should_panic(expected = "iteration cap")]
    fn palette_rejects_a_degenerate_iteration_cap() {
        color_for_count(0, 1, &Palette::default());
    }

    #[test]
    fn never_escaping_points_take_the_core_color() {
        let palette = Palette::default();
        let color = color_for_count(128, 128, &palette);
        assert_eq!(color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn texel_packing_matches_pack4x8unorm() {
        assert_eq!(
            pack_texel([0.2, 0.1, 0.4, 1.0]),
            51 | (26 << 8) | (102 << 16) | (255 << 24)
        );
        assert_eq!(pack_texel([0.0, 0.0, 0.0, 0.0]), 0);
        assert_eq!(pack_texel([2.0, -1.0, 1.0, 1.0]), 255 | (255 << 16) | (255 << 24));
    }

    #[test]
    fn texel_unpack_inverts_pack_on_byte_values() {
        let texel = pack_texel([0.2, 0.1, 0.4, 1.0]);
        let color = unpack_texel(texel);
        assert_eq!(pack_texel(color), texel);
        assert_eq!(color[3], 1.0);
    }

    #[test]
    fn generator_matches_the_golden_four_by_four_grid() {
        // Full 4x4 grid at t = 0 (scale 3.7), row-major `y * width + x`,
        // worked out once from the escape-time formula. The border ring
        // escapes immediately (count 0, exactly `outer`), the pixels at
        // (2,1), (3,1), (2,3) and (3,3) escape after 3, 4, 1 and 1
        // iterations, and (2,2)/(3,2) never escape and land on `core`.
        const GOLDEN: [u32; 16] = [
            0xFF66_1A33,
            0xFF66_1A33,
            0xFF66_1A33,
            0xFF66_1A33,
            0xFF66_1A33,
            0xFF66_1A33,
            0xFF6B_1831,
            0xFF6C_1830,
            0xFF66_1A33,
            0xFF66_1A33,
            0xFF00_0000,
            0xFF00_0000,
            0xFF66_1A33,
            0xFF66_1A33,
            0xFF68_1932,
            0xFF68_1932,
        ];
        let tuning = Tuning::default();
        assert_eq!(generate(4, 4, 0.0, &tuning), GOLDEN);
        assert_eq!(GOLDEN[0], pack_texel([0.2, 0.1, 0.4, 1.0]));
        for texel in GOLDEN {
            assert_eq!(texel >> 24, 255, "alpha channel must be opaque");
        }
    }

    #[test]
    fn blur_of_a_constant_canvas_is_identity() {
        // With edge clamping the weights always total 1, so a flat canvas
        // must come back unchanged even in the corners.
        let texel = pack_texel([0.5, 0.25, 0.75, 1.0]);
        let canvas = vec![texel; 6 * 4];
        assert_eq!(blur(&canvas, 6, 4, 2), canvas);
    }

    #[test]
    fn corner_pixels_resample_the_border() {
        // Single white pixel at (0,0) on black, radius 1: four of the nine
        // clamped neighbor offsets land on (0,0), so the corner keeps 4/9
        // of the white value. This pins the no-renormalization policy.
        let mut canvas = vec![pack_texel([0.0, 0.0, 0.0, 0.0]); 9];
        canvas[0] = pack_texel([1.0, 0.0, 0.0, 0.0]);
        let blurred = blur(&canvas, 3, 3, 1);
        let expected = ((4.0_f32 / 9.0) * 255.0 + 0.5).floor() as u32;
        assert_eq!(blurred[0] & 0xff, expected);
    }

    #[test]
    fn interior_blur_averages_the_neighborhood() {
        // 3x3 canvas with distinct red values; the center pixel must be the
        // plain mean of all nine generator-stage samples.
        let values = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
        let canvas: Vec<u32> = values
            .iter()
            .map(|&v| pack_texel([v, 0.0, 0.0, 0.0]))
            .collect();
        let blurred = blur(&canvas, 3, 3, 1);
        let mean: f32 = canvas
            .iter()
            .map(|&texel| unpack_texel(texel)[0] / 9.0)
            .sum();
        assert_eq!(blurred[4] & 0xff, (mean * 255.0 + 0.5).floor() as u32);
    }

    #[test]
    fn filter_output_depends_only_on_the_source_neighborhood() {
        let (width, height, radius) = (9u32, 9u32, 2u32);
        let base = vec![pack_texel([0.0, 0.0, 0.0, 1.0]); 81];
        let target = index_for_pixel(4, 4, width) as usize;
        let reference = blur(&base, width, height, radius)[target];

        // A source pixel outside the (2R+1)² window around the target must
        // not influence it.
        let mut far = base.clone();
        far[index_for_pixel(8, 8, width) as usize] = pack_texel([1.0, 1.0, 1.0, 1.0]);
        assert_eq!(blur(&far, width, height, radius)[target], reference);

        // One inside the window must.
        let mut near = base.clone();
        near[index_for_pixel(5, 5, width) as usize] = pack_texel([1.0, 1.0, 1.0, 1.0]);
        assert_ne!(blur(&near, width, height, radius)[target], reference);
    }

    #[test]
    fn one_by_one_canvas_survives_both_stages() {
        let tuning = Tuning::default();
        let source = generate(1, 1, 0.0, &tuning);
        let blurred = blur(&source, 1, 1, tuning.blur_radius);
        // Every clamped neighbor is the pixel itself.
        assert_eq!(blurred, source);
    }
}
