//! Multi-pass orchestration.
//!
//! A [`Pipeline`] is built once for a [`PipelineMode`]: it packs the scene,
//! compiles its programs, creates the targets the mode needs and fixes a
//! [`FramePlan`]. Every frame then replays that plan unchanged:
//!
//! - `Direct`: screen (with depth) ← scene
//! - `Offscreen`: scene target ← scene; screen ← sampled scene target
//! - `Multisample`: msaa target ← scene; resolve; screen ← sampled resolve target

mod config;
mod orchestrator;
mod plan;
mod targets;
mod transform;

pub use config::{PipelineConfig, PipelineMode, DEFAULT_SAMPLES};
pub use orchestrator::Pipeline;
pub use plan::{FramePlan, Stage};
pub use transform::{IdentityTransform, TransformProvider};
