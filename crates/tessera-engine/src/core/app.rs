use winit::event::WindowEvent;

use crate::coords::PhysicalExtent;

use super::ctx::FrameCtx;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

pub trait App {
    /// Raw window events, before the runtime handles resize and redraw.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// The surface was reconfigured to `extent` physical pixels.
    ///
    /// Also called for scale-factor changes, which alter the physical size
    /// without a logical resize.
    fn on_resize(&mut self, extent: PhysicalExtent, scale_factor: f64) {
        let _ = (extent, scale_factor);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
