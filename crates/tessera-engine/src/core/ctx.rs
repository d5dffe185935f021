use winit::window::{Window, WindowId};

use crate::coords::PhysicalExtent;
use crate::device::{Gpu, GpuFrame, SurfaceErrorAction};
use crate::window::RuntimeCtx;

pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    /// Drawable size as reported by the windowing system.
    pub fn physical_extent(&self) -> PhysicalExtent {
        self.window.inner_size().into()
    }
}

/// Per-frame context handed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` spans the callback; `'w` is the window borrow carried by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    /// Redraws delivered to this window so far, including this one.
    pub redraw: u64,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Next surface image, or `None` when this redraw should draw nothing.
    ///
    /// Recoverable surface errors reconfigure and skip the frame; running out
    /// of memory stops the runtime with an error.
    pub fn acquire_frame(&mut self) -> Option<GpuFrame> {
        match self.gpu.begin_frame() {
            Ok(frame) => {
                self.window.window.pre_present_notify();
                Some(frame)
            }
            Err(err) => {
                let reason = err.to_string();
                if self.gpu.handle_surface_error(err) == SurfaceErrorAction::Fatal {
                    self.runtime
                        .fail(anyhow::anyhow!("surface could not provide a frame: {reason}"));
                }
                None
            }
        }
    }
}
