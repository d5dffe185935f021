//! Window surface and device ownership.
//!
//! `Gpu` creates the wgpu instance, adapter, device and queue for one window,
//! keeps its surface configured across resizes, and hands out one `GpuFrame`
//! per redraw.

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
