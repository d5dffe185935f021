use crate::coords::PhysicalExtent;
use crate::error::FramebufferError;
use crate::paint::ClearColor;

/// Which kind of surface a render target draws into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// The window's default surface.
    Screen,
    /// Single-sample texture that a later pass can sample.
    Offscreen,
    /// Multisampled texture; must be resolved before it can be sampled.
    OffscreenMultisample,
}

/// Depth comparison used while a target is bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DepthCompare {
    /// Later fragments at equal depth still pass.
    LessEqual,
}

impl DepthCompare {
    pub fn to_wgpu(self) -> wgpu::CompareFunction {
        match self {
            DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
        }
    }
}

/// Fixed-function state configured when a target is bound.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PassState {
    /// `None` disables the depth test.
    pub depth_test: Option<DepthCompare>,
    pub sample_count: u32,
}

impl PassState {
    /// Depth test on (less-or-equal) exactly when the target has depth, so the
    /// screen's full-surface quad draws unordered.
    pub fn for_target(desc: &TargetDesc) -> Self {
        Self {
            depth_test: desc.depth.then_some(DepthCompare::LessEqual),
            sample_count: desc.sample_count,
        }
    }

    #[inline]
    pub fn multisample(&self) -> bool {
        self.sample_count > 1
    }
}

/// What a bound target is cleared to at the start of its pass.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearOp {
    pub color: ClearColor,
    /// Depth clear value, `None` when the target has no depth attachment.
    pub depth: Option<f32>,
}

/// Device limits relevant to target completeness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetCaps {
    pub max_dimension: u32,
    /// Sample counts supported by both the color and depth formats, ascending.
    pub sample_counts: Vec<u32>,
}

impl Default for TargetCaps {
    /// WebGPU baseline guarantees.
    fn default() -> Self {
        Self {
            max_dimension: 8192,
            sample_counts: vec![1, 4],
        }
    }
}

/// Everything needed to allocate a render target's attachments.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TargetDesc {
    pub label: &'static str,
    pub kind: TargetKind,
    pub extent: PhysicalExtent,
    pub sample_count: u32,
    /// Combined depth+stencil attachment.
    pub depth: bool,
}

impl TargetDesc {
    /// The window surface. `depth` is only needed when the scene draws straight to it.
    pub fn screen(extent: PhysicalExtent, depth: bool) -> Self {
        Self {
            label: "screen",
            kind: TargetKind::Screen,
            extent,
            sample_count: 1,
            depth,
        }
    }

    /// Offscreen color + depth/stencil target. `samples` of 0 or 1 means single-sample.
    pub fn offscreen(label: &'static str, extent: PhysicalExtent, samples: u32) -> Self {
        let (kind, sample_count) = if samples >= 2 {
            (TargetKind::OffscreenMultisample, samples)
        } else {
            (TargetKind::Offscreen, 1)
        };
        Self {
            label,
            kind,
            extent,
            sample_count,
            depth: true,
        }
    }

    /// Single-sample color-only target receiving a resolve.
    pub fn resolve_destination(label: &'static str, extent: PhysicalExtent) -> Self {
        Self {
            label,
            kind: TargetKind::Offscreen,
            extent,
            sample_count: 1,
            depth: false,
        }
    }

    #[inline]
    pub fn is_multisample(&self) -> bool {
        self.kind == TargetKind::OffscreenMultisample
    }

    /// Whether a later pass may sample this target's color directly.
    #[inline]
    pub fn is_sampleable(&self) -> bool {
        self.kind == TargetKind::Offscreen
    }

    #[inline]
    pub fn pass_state(&self) -> PassState {
        PassState::for_target(self)
    }

    /// Clear for this target. Alpha is always cleared to zero.
    pub fn clear_op(&self, color: ClearColor) -> ClearOp {
        ClearOp {
            color: color.transparent(),
            depth: self.depth.then_some(1.0),
        }
    }

    /// Rejects attachment sets the device cannot complete.
    pub fn check_complete(&self, caps: &TargetCaps) -> Result<(), FramebufferError> {
        let PhysicalExtent { width, height } = self.extent;

        if self.extent.is_empty() {
            return Err(FramebufferError::new(format!(
                "`{}` has a zero-sized attachment ({width}x{height})",
                self.label
            )));
        }
        if width > caps.max_dimension || height > caps.max_dimension {
            return Err(FramebufferError::new(format!(
                "`{}` is {width}x{height}, above the device limit of {}",
                self.label, caps.max_dimension
            )));
        }

        let kind_ok = match self.kind {
            TargetKind::Screen | TargetKind::Offscreen => self.sample_count == 1,
            TargetKind::OffscreenMultisample => self.sample_count >= 2,
        };
        if !kind_ok {
            return Err(FramebufferError::new(format!(
                "`{}` is {:?} but has {} samples",
                self.label, self.kind, self.sample_count
            )));
        }

        if !self.sample_count.is_power_of_two() || !caps.sample_counts.contains(&self.sample_count) {
            return Err(FramebufferError::new(format!(
                "`{}` requests {} samples; supported: {:?}",
                self.label, self.sample_count, caps.sample_counts
            )));
        }

        Ok(())
    }
}
