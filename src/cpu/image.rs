//! Owned RGBA float image with GPU-matching sampling.

/// A CPU-resident RGBA image, one `[f32; 4]` per texel.
///
/// Sampling matches a `Linear` filter with `ClampToEdge` addressing: texel
/// centres sit at `(x + 0.5) / width`, coordinates outside `0..=1` clamp to
/// the border texel. Row 0 is `v = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuImage {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl CpuImage {
    /// Creates a transparent-black image. Zero dimensions clamp to 1.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_fill(width, height, [0.0; 4])
    }

    /// Creates an image with every texel set to `texel`.
    #[must_use]
    pub fn from_fill(width: u32, height: u32, texel: [f32; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            texels: vec![texel; (width * height) as usize],
        }
    }

    /// Creates an image by evaluating `f(x, y)` per texel.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [f32; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut texels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                texels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            texels,
        }
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    /// Fetches a texel, clamping coordinates to the image bounds.
    #[must_use]
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }

    pub fn set_texel(&mut self, x: u32, y: u32, texel: [f32; 4]) {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize] = texel;
    }

    /// Bilinear sample at normalized coordinates.
    #[must_use]
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        let x = u * self.width as f32 - 0.5;
        let y = v * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let x0 = x0 as i64;
        let y0 = y0 as i64;

        let c00 = self.fetch_clamped(x0, y0);
        let c10 = self.fetch_clamped(x0 + 1, y0);
        let c01 = self.fetch_clamped(x0, y0 + 1);
        let c11 = self.fetch_clamped(x0 + 1, y0 + 1);

        let mut out = [0.0; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            let top = c00[i] + (c10[i] - c00[i]) * fx;
            let bottom = c01[i] + (c11[i] - c01[i]) * fx;
            *slot = top + (bottom - top) * fy;
        }
        out
    }

    fn fetch_clamped(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, i64::from(self.width) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.texels[(y * self.width + x) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_at_a_texel_centre_returns_that_texel() {
        let mut img = CpuImage::new(4, 4);
        img.set_texel(2, 1, [1.0, 2.0, 3.0, 4.0]);
        let sampled = img.sample(2.5 / 4.0, 1.5 / 4.0);
        assert_eq!(sampled, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn sampling_between_centres_interpolates() {
        let mut img = CpuImage::new(2, 1);
        img.set_texel(0, 0, [0.0, 0.0, 0.0, 1.0]);
        img.set_texel(1, 0, [1.0, 1.0, 1.0, 1.0]);
        let mid = img.sample(0.5, 0.5);
        assert!((mid[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn sampling_outside_clamps_to_the_border() {
        let mut img = CpuImage::new(2, 2);
        img.set_texel(0, 0, [0.25, 0.0, 0.0, 1.0]);
        let outside = img.sample(-3.0, -3.0);
        assert_eq!(outside, [0.25, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn zero_dimensions_clamp_to_one() {
        let img = CpuImage::new(0, 0);
        assert_eq!(img.extent(), (1, 1));
    }
}
