use super::Vec2;

/// Drawable size in physical pixels.
///
/// Every primitive reads this from the controller once per draw and uses it as
/// the basis for the pixel → NDC conversion.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// `[width, height]`, clamped to at least one pixel for uniform upload.
    #[inline]
    pub fn resolution(self) -> [f32; 2] {
        [self.width.max(1.0), self.height.max(1.0)]
    }

    /// Maps a top-left-origin pixel position to normalized device coordinates.
    ///
    /// `ndc = (pixel / size) * 2 - 1`, with Y negated because wgpu's NDC is +Y up.
    #[inline]
    pub fn pixel_to_ndc(self, p: Vec2) -> [f32; 2] {
        let [w, h] = self.resolution();
        let x = (p.x / w) * 2.0 - 1.0;
        let y = (p.y / h) * 2.0 - 1.0;
        [x, -y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_window_maps_to_full_ndc_range() {
        let vp = Viewport::new(800.0, 600.0);
        assert_eq!(vp.pixel_to_ndc(Vec2::new(0.0, 0.0)), [-1.0, 1.0]);
        assert_eq!(vp.pixel_to_ndc(Vec2::new(800.0, 600.0)), [1.0, -1.0]);
        assert_eq!(vp.pixel_to_ndc(Vec2::new(800.0, 0.0)), [1.0, 1.0]);
        assert_eq!(vp.pixel_to_ndc(Vec2::new(0.0, 600.0)), [-1.0, -1.0]);
    }

    #[test]
    fn center_maps_to_origin() {
        let vp = Viewport::new(640.0, 480.0);
        assert_eq!(vp.pixel_to_ndc(Vec2::new(320.0, 240.0)), [0.0, 0.0]);
    }

    #[test]
    fn zero_sized_viewport_does_not_divide_by_zero() {
        let vp = Viewport::new(0.0, 0.0);
        assert!(!vp.is_valid());
        let ndc = vp.pixel_to_ndc(Vec2::new(0.5, 0.5));
        assert!(ndc[0].is_finite() && ndc[1].is_finite());
    }
}
