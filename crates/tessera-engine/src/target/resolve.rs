use crate::backend::GraphicsBackend;
use crate::coords::PhysicalExtent;
use crate::error::FramebufferError;

use super::{TargetDesc, TargetKind};

/// Collapses a multisampled target into a single-sample one so it can be sampled.
///
/// The region is fixed at construction: the full extent shared by both targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResolveStep {
    region: PhysicalExtent,
}

impl ResolveStep {
    pub fn new(source: &TargetDesc, destination: &TargetDesc) -> Result<Self, FramebufferError> {
        if !source.is_multisample() {
            return Err(FramebufferError::new(format!(
                "resolve source `{}` is not multisampled",
                source.label
            )));
        }
        if destination.kind == TargetKind::OffscreenMultisample {
            return Err(FramebufferError::new(format!(
                "resolve destination `{}` is multisampled",
                destination.label
            )));
        }
        if source.extent != destination.extent {
            return Err(FramebufferError::new(format!(
                "resolve `{}` -> `{}` has mismatched extents ({:?} vs {:?})",
                source.label, destination.label, source.extent, destination.extent
            )));
        }
        Ok(Self {
            region: source.extent,
        })
    }

    #[inline]
    pub fn region(&self) -> PhysicalExtent {
        self.region
    }

    pub fn resolve<B: GraphicsBackend>(&self, backend: &mut B, source: &B::Target, destination: &B::Target) {
        backend.resolve(source, destination, self.region);
    }
}
