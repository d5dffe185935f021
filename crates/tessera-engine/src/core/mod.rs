//! Contract between the window runtime and the application.
//!
//! The runtime owns the event loop, window and GPU; the application sees them
//! only through [`FrameCtx`] and the [`App`] callbacks.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
