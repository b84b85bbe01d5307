//! Filter kernels mirroring the bloom WGSL shaders.
//!
//! Each function is the software equivalent of one fullscreen draw: it
//! evaluates the fragment shader at every destination texel centre. Tap
//! offsets, weights and the Karis/grading behaviour match the shader sources
//! exactly.

use glam::{Mat4, Vec3, Vec4};

use super::image::CpuImage;

/// Luminance weights of the Karis average.
pub const KARIS_WEIGHTS: Vec3 = Vec3::new(0.2627, 0.6780, 0.0593);

/// Luminance with a floor of 1, so dim texels never get boosted weights.
#[must_use]
pub fn luminance(c: Vec4) -> f32 {
    c.truncate().dot(KARIS_WEIGHTS).max(1.0)
}

/// Inverse-luminance weighted average of four samples.
///
/// Bright outliers get proportionally small weights, which suppresses the
/// single-pixel fireflies a plain box average would smear into flicker.
#[must_use]
pub fn karis_average(s1: Vec4, s2: Vec4, s3: Vec4, s4: Vec4) -> Vec4 {
    let w1 = 1.0 / luminance(s1);
    let w2 = 1.0 / luminance(s2);
    let w3 = 1.0 / luminance(s3);
    let w4 = 1.0 / luminance(s4);
    (s1 * w1 + s2 * w2 + s3 * w3 + s4 * w4) * (1.0 / (w1 + w2 + w3 + w4))
}

/// Evaluates the 13-tap downsample at one destination coordinate.
#[must_use]
pub fn downsample_texel(
    src: &CpuImage,
    uv: (f32, f32),
    radius: f32,
    karis: bool,
    colour_matrix: Mat4,
) -> [f32; 4] {
    let tx = radius / src.width() as f32;
    let ty = radius / src.height() as f32;
    let tap = |ox: f32, oy: f32| Vec4::from_array(src.sample(uv.0 + tx * ox, uv.1 + ty * oy));

    // Outer ring at +-1, inner ring at +-0.5, centre at G.
    let a = tap(-1.0, -1.0);
    let b = tap(0.0, -1.0);
    let c = tap(1.0, -1.0);
    let d = tap(-0.5, -0.5);
    let e = tap(0.5, -0.5);
    let f = tap(-1.0, 0.0);
    let g = tap(0.0, 0.0);
    let h = tap(1.0, 0.0);
    let i = tap(-0.5, 0.5);
    let j = tap(0.5, 0.5);
    let k = tap(-1.0, 1.0);
    let l = tap(0.0, 1.0);
    let m = tap(1.0, 1.0);

    if karis {
        let mut colour = karis_average(d, e, i, j) * 0.5;
        colour += karis_average(a, b, g, f) * 0.125;
        colour += karis_average(b, c, h, g) * 0.125;
        colour += karis_average(f, g, l, k) * 0.125;
        colour += karis_average(g, h, m, l) * 0.125;

        // Grading applies to rgb only; alpha carries through.
        let graded = colour_matrix * Vec4::new(colour.x, colour.y, colour.z, 1.0);
        Vec4::new(graded.x, graded.y, graded.z, colour.w).to_array()
    } else {
        let mut colour = (d + e + i + j) * 0.125;
        colour += (a + b + g + f) * 0.031_25;
        colour += (b + c + h + g) * 0.031_25;
        colour += (f + g + l + k) * 0.031_25;
        colour += (g + h + m + l) * 0.031_25;
        colour.to_array()
    }
}

/// One 13-tap downsample pass: `src` into a fresh image of the given extent.
#[must_use]
pub fn downsample(
    src: &CpuImage,
    dest_width: u32,
    dest_height: u32,
    radius: f32,
    karis: bool,
    colour_matrix: Mat4,
) -> CpuImage {
    CpuImage::from_fn(dest_width, dest_height, |x, y| {
        let uv = texel_centre(x, y, dest_width, dest_height);
        downsample_texel(src, uv, radius, karis, colour_matrix)
    })
}

/// Evaluates the tent upsample at one destination coordinate.
///
/// The coarser accumulation (`src`) is tent-filtered and the matching
/// downsample level (`mip`) is added directly, so each upsample step folds
/// one chain level back in.
#[must_use]
pub fn upsample_texel(src: &CpuImage, mip: &CpuImage, uv: (f32, f32), radius: f32) -> [f32; 4] {
    let x = radius / src.width() as f32;
    let y = radius / src.height() as f32;
    let tap = |ox: f32, oy: f32| Vec4::from_array(src.sample(uv.0 + ox, uv.1 + oy));

    let a = tap(-x, y);
    let b = tap(0.0, y);
    let c = tap(x, y);
    let d = tap(-x, 0.0);
    let e = tap(0.0, 0.0);
    let f = tap(x, 0.0);
    let g = tap(-x, -y);
    let h = tap(0.0, -y);
    let i = tap(x, -y);

    // 3x3 tent: centre 4, edges 2, corners 1, over 16.
    let mut colour = e * 4.0;
    colour += (b + d + f + h) * 2.0;
    colour += a + c + g + i;
    colour *= 1.0 / 16.0;
    colour += Vec4::from_array(mip.sample(uv.0, uv.1));
    colour.to_array()
}

/// One tent upsample pass into a fresh image of the given extent.
#[must_use]
pub fn upsample(
    src: &CpuImage,
    mip: &CpuImage,
    dest_width: u32,
    dest_height: u32,
    radius: f32,
) -> CpuImage {
    CpuImage::from_fn(dest_width, dest_height, |x, y| {
        let uv = texel_centre(x, y, dest_width, dest_height);
        upsample_texel(src, mip, uv, radius)
    })
}

/// Final blend: `mix(frame, strength * bloom, mix_factor)` at frame extent.
#[must_use]
pub fn composite(frame: &CpuImage, bloom: &CpuImage, strength: f32, mix_factor: f32) -> CpuImage {
    CpuImage::from_fn(frame.width(), frame.height(), |x, y| {
        let uv = texel_centre(x, y, frame.width(), frame.height());
        let frame_sample = Vec4::from_array(frame.sample(uv.0, uv.1));
        let bloom_sample = Vec4::from_array(bloom.sample(uv.0, uv.1));
        frame_sample.lerp(bloom_sample * strength, mix_factor).to_array()
    })
}

/// Straight textured copy into a fresh image of the given extent.
#[must_use]
pub fn blit(src: &CpuImage, dest_width: u32, dest_height: u32) -> CpuImage {
    CpuImage::from_fn(dest_width, dest_height, |x, y| {
        let uv = texel_centre(x, y, dest_width, dest_height);
        src.sample(uv.0, uv.1)
    })
}

#[inline]
fn texel_centre(x: u32, y: u32, width: u32, height: u32) -> (f32, f32) {
    (
        (x as f32 + 0.5) / width as f32,
        (y as f32 + 0.5) / height as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn karis_average_of_equal_samples_is_that_sample() {
        let s = Vec4::new(0.3, 0.5, 0.7, 1.0);
        let avg = karis_average(s, s, s, s);
        assert!(avg.abs_diff_eq(s, EPSILON));
    }

    #[test]
    fn karis_average_discounts_a_firefly() {
        let dim = Vec4::new(0.1, 0.1, 0.1, 1.0);
        let firefly = Vec4::new(100.0, 100.0, 100.0, 1.0);
        let avg = karis_average(dim, dim, dim, firefly);
        let plain = (dim * 3.0 + firefly) * 0.25;
        assert!(
            avg.x < plain.x * 0.1,
            "weighted average {} should sit far below the box average {}",
            avg.x,
            plain.x
        );
    }

    #[test]
    fn luminance_never_drops_below_one() {
        assert!(approx(luminance(Vec4::ZERO), 1.0));
        assert!(luminance(Vec4::splat(10.0)) > 1.0);
    }

    #[test]
    fn downsample_of_uniform_input_is_that_value() {
        let src = CpuImage::from_fill(8, 8, [0.5, 0.5, 0.5, 1.0]);
        for karis in [false, true] {
            let out = downsample(&src, 4, 4, 1.0, karis, Mat4::IDENTITY);
            for texel in out.texels() {
                assert!(
                    approx(texel[0], 0.5),
                    "karis={karis}: expected 0.5, got {}",
                    texel[0]
                );
            }
        }
    }

    #[test]
    fn upsample_adds_the_mip_level_on_top_of_the_tent() {
        let src = CpuImage::from_fill(2, 2, [0.25, 0.25, 0.25, 1.0]);
        let mip = CpuImage::from_fill(4, 4, [0.5, 0.5, 0.5, 1.0]);
        let out = upsample(&src, &mip, 4, 4, 1.0);
        for texel in out.texels() {
            assert!(approx(texel[0], 0.75), "expected 0.75, got {}", texel[0]);
        }
    }

    #[test]
    fn composite_is_a_plain_mix() {
        let frame = CpuImage::from_fill(2, 2, [1.0, 0.0, 0.0, 1.0]);
        let bloom = CpuImage::from_fill(2, 2, [0.0, 1.0, 0.0, 1.0]);
        let out = composite(&frame, &bloom, 2.0, 0.25);
        let texel = out.texel(0, 0);
        assert!(approx(texel[0], 0.75));
        assert!(approx(texel[1], 0.5));
    }
}
