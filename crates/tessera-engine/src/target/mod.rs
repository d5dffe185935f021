//! Render target descriptions and the resolve step.
//!
//! A `TargetDesc` is plain data: the backend turns it into attachments, the
//! pipeline asks it how to bind and clear.

mod desc;
mod resolve;

pub use desc::{ClearOp, DepthCompare, PassState, TargetCaps, TargetDesc, TargetKind};
pub use resolve::ResolveStep;
