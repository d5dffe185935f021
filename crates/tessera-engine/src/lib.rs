//! Tessera engine crate.
//!
//! Builds indexed quad batches on the CPU and renders them through a
//! configurable target chain: straight to the screen, through an offscreen
//! texture, or through a multisampled target that is resolved before being
//! drawn to the screen.
//!
//! The [`pipeline`] drives everything through the [`backend::GraphicsBackend`]
//! seam; [`backend::wgpu_backend`] is the GPU implementation and
//! [`backend::recording`] a headless one.

pub mod backend;
pub mod batch;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod paint;
pub mod pipeline;
pub mod target;
pub mod window;
