//! CPU-side geometry batching.
//!
//! `QuadBatch` accumulates rectangles as parallel attribute streams and packs
//! them into a single vertex buffer using `layout::compute_layout`. Nothing in
//! this module touches the GPU.

mod index;
pub mod layout;
mod quad;

pub use index::{IndexBuffer, IndexFormat};
pub use layout::{compute_layout, ElementType, PackedLayout, StreamDesc, StreamSpan};
pub use quad::{
    PackedMesh, QuadBatch, COLOR, COLOR_COMPONENTS, INDICES_PER_QUAD, POSITION, POSITION_COMPONENTS,
    TEXCOORD, TEXCOORD_COMPONENTS, VERTICES_PER_QUAD,
};
