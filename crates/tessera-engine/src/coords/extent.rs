use crate::error::ConfigurationError;

/// Drawable size in physical pixels.
///
/// Render-target attachments are always sized in physical pixels, never in the
/// logical window size.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PhysicalExtent {
    pub width: u32,
    pub height: u32,
}

impl PhysicalExtent {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scales a logical size by the device pixel ratio, truncating toward zero.
    ///
    /// `floor(width * scale_x) x floor(height * scale_y)`. The result must be at
    /// least one pixel on each axis.
    pub fn from_logical(
        width: f64,
        height: f64,
        scale_x: f64,
        scale_y: f64,
    ) -> Result<Self, ConfigurationError> {
        let invalid = || ConfigurationError::InvalidDimensions {
            width,
            height,
            scale_x,
            scale_y,
        };

        let w = (width * scale_x).floor();
        let h = (height * scale_y).floor();
        if !w.is_finite() || !h.is_finite() || w < 1.0 || h < 1.0 {
            return Err(invalid());
        }
        if w > u32::MAX as f64 || h > u32::MAX as f64 {
            return Err(invalid());
        }

        Ok(Self::new(w as u32, h as u32))
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; 1.0 for an empty extent.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for PhysicalExtent {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}
