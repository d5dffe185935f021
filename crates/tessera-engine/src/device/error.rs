/// What the caller should do after the surface failed to hand out a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface reconfigured; try again on the next redraw.
    Reconfigured,
    /// Drop this frame only.
    SkipFrame,
    /// Out of memory; stop the event loop.
    Fatal,
}
