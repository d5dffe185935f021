use super::PipelineMode;

/// One step of a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Bind the screen (with depth), clear, draw the scene batch.
    Direct,
    /// Bind the offscreen scene target, clear, draw the scene batch.
    Offscreen,
    /// Resolve the multisampled scene target into the intermediate target.
    Resolve,
    /// Bind the screen, clear, draw the full-surface quad sampling the scene.
    Screen,
}

/// The stage sequence replayed unchanged every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    stages: Vec<Stage>,
}

impl FramePlan {
    pub fn for_mode(mode: PipelineMode) -> Self {
        let stages = match mode {
            PipelineMode::Direct => vec![Stage::Direct],
            PipelineMode::Offscreen => vec![Stage::Offscreen, Stage::Screen],
            PipelineMode::Multisample { .. } => vec![Stage::Offscreen, Stage::Resolve, Stage::Screen],
        };
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn has_stage(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }
}
