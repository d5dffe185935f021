//! Surface size types.
//!
//! The window reports logical sizes and a device scale; every GPU attachment is
//! sized in physical pixels derived from the two.

mod extent;

pub use extent::PhysicalExtent;
