//! Color types shared by the quad batch and render targets.
//!
//! `Rgba8` is vertex data; `ClearColor` is render-target state.

pub mod color;

pub use color::{ClearColor, Rgba8};
