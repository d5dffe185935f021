use crate::backend::GraphicsBackend;
use crate::coords::PhysicalExtent;
use crate::error::FramebufferError;
use crate::target::{ResolveStep, TargetDesc};

use super::PipelineMode;

/// A target handle together with the description it was created from.
pub(super) struct Slot<T> {
    pub(super) desc: TargetDesc,
    pub(super) handle: T,
}

/// Descriptions of every target a mode needs at one extent.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) struct TargetDescs {
    pub(super) screen: TargetDesc,
    pub(super) scene: Option<TargetDesc>,
    pub(super) resolved: Option<TargetDesc>,
}

impl TargetDescs {
    pub(super) fn for_mode(mode: PipelineMode, extent: PhysicalExtent) -> Self {
        match mode {
            PipelineMode::Direct => Self {
                screen: TargetDesc::screen(extent, true),
                scene: None,
                resolved: None,
            },
            PipelineMode::Offscreen => Self {
                screen: TargetDesc::screen(extent, false),
                scene: Some(TargetDesc::offscreen("scene", extent, 1)),
                resolved: None,
            },
            PipelineMode::Multisample { samples } => Self {
                screen: TargetDesc::screen(extent, false),
                scene: Some(TargetDesc::offscreen("scene", extent, samples)),
                resolved: Some(TargetDesc::resolve_destination("resolved", extent)),
            },
        }
    }

    /// The target the scene batch is drawn into.
    pub(super) fn scene_target(&self) -> &TargetDesc {
        self.scene.as_ref().unwrap_or(&self.screen)
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &TargetDesc> {
        std::iter::once(&self.screen)
            .chain(self.scene.as_ref())
            .chain(self.resolved.as_ref())
    }
}

/// Every target of one extent. Replaced whole on resize, never patched.
pub(super) struct TargetSet<T> {
    pub(super) extent: PhysicalExtent,
    pub(super) screen: Slot<T>,
    pub(super) scene: Option<Slot<T>>,
    pub(super) resolved: Option<Slot<T>>,
    pub(super) resolve: Option<ResolveStep>,
}

impl<T> TargetSet<T> {
    /// Checks every description for completeness, then allocates them in order.
    /// On failure, targets already allocated are released before returning.
    pub(super) fn build<B>(
        backend: &mut B,
        mode: PipelineMode,
        extent: PhysicalExtent,
    ) -> Result<Self, FramebufferError>
    where
        B: GraphicsBackend<Target = T>,
    {
        let descs = TargetDescs::for_mode(mode, extent);

        let caps = backend.target_caps();
        for desc in descs.iter() {
            desc.check_complete(&caps)?;
        }
        let resolve = match (&descs.scene, &descs.resolved) {
            (Some(src), Some(dst)) => Some(ResolveStep::new(src, dst)?),
            _ => None,
        };

        let mut created: Vec<Slot<T>> = Vec::with_capacity(3);
        for desc in descs.iter() {
            match backend.create_target(desc) {
                Ok(handle) => created.push(Slot { desc: *desc, handle }),
                Err(err) => {
                    for slot in created {
                        backend.release_target(slot.handle);
                    }
                    return Err(err);
                }
            }
        }

        // Same order as `TargetDescs::iter`.
        let mut created = created.into_iter();
        let (Some(screen), scene, resolved) = (created.next(), created.next(), created.next()) else {
            return Err(FramebufferError::new("screen target was not created"));
        };

        Ok(Self {
            extent,
            screen,
            scene,
            resolved,
            resolve,
        })
    }

    /// Target the screen pass samples: the resolved image if any, else the scene.
    pub(super) fn sampled(&self) -> Option<&Slot<T>> {
        self.resolved.as_ref().or(self.scene.as_ref())
    }

    pub(super) fn descs(&self) -> Vec<TargetDesc> {
        std::iter::once(&self.screen)
            .chain(self.scene.as_ref())
            .chain(self.resolved.as_ref())
            .map(|slot| slot.desc)
            .collect()
    }

    pub(super) fn release<B>(self, backend: &mut B)
    where
        B: GraphicsBackend<Target = T>,
    {
        let slots = std::iter::once(self.screen)
            .chain(self.scene)
            .chain(self.resolved);
        for slot in slots {
            backend.release_target(slot.handle);
        }
    }
}
