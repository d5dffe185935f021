/// Straight-alpha RGBA color, one byte per channel.
///
/// This is the per-vertex color format of the quad batch: the GPU reads it as
/// `Unorm8x4`, so `255` maps to `1.0` in the shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    pub const RED: Self = Self::new(255, 0, 0, 255);
    pub const BLUE: Self = Self::new(0, 0, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Opaque color from a hue in turns (`0.0..1.0`), full saturation and value.
    ///
    /// Used for per-frame recoloring; values outside the range wrap.
    pub fn from_hue(turns: f32) -> Self {
        let h = turns.rem_euclid(1.0) * 6.0;
        let x = 1.0 - ((h % 2.0) - 1.0).abs();
        let (r, g, b) = match h as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        let to_u8 = |v: f32| (v * 255.0).round() as u8;
        Self::new(to_u8(r), to_u8(g), to_u8(b), 255)
    }
}

/// Clear color for a render target, linear `f32` components.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Mid gray with zero alpha: offscreen background that blends away at edges.
    pub const OFFSCREEN: Self = Self::new(0.5, 0.5, 0.5, 0.0);

    /// Black with zero alpha: screen background under the composited image.
    pub const SCREEN: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Same color with alpha forced to zero.
    #[inline]
    pub const fn transparent(self) -> Self {
        Self::new(self.r, self.g, self.b, 0.0)
    }

    #[inline]
    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}
