//! Error taxonomy for the batch builder and the render-target pipeline.
//!
//! Setup errors (`ConfigurationError`, `FramebufferError`, `CompileError`) are
//! fatal: they abort pipeline construction before the frame loop starts.
//! `RuntimeGraphicsError` is produced at most once per frame.

use std::fmt;

/// Invalid geometry or buffer description, detected before any GPU resource exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("stream `{name}` has {count} elements, not a multiple of {components} components")]
    PartialVertex {
        name: &'static str,
        count: usize,
        components: u32,
    },

    #[error("stream `{name}` is empty while other per-vertex streams hold {expected} vertices")]
    EmptyStream { name: &'static str, expected: usize },

    #[error("stream `{name}` holds {actual} vertices, expected {expected}")]
    VertexCountMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("stream `{0}` declared twice")]
    DuplicateStream(&'static str),

    #[error("batch has no `{0}` stream")]
    MissingStream(&'static str),

    #[error("quad size must be finite and positive (got {width}x{height}, depth {depth})")]
    InvalidQuad { width: f32, height: f32, depth: f32 },

    #[error("batch of {vertices} vertices cannot be addressed by 32-bit indices")]
    TooManyVertices { vertices: usize },

    #[error("quad index {index} out of range ({count} quads)")]
    QuadOutOfRange { index: usize, count: usize },

    #[error("invalid surface dimensions {width}x{height} at scale {scale_x}x{scale_y}")]
    InvalidDimensions {
        width: f64,
        height: f64,
        scale_x: f64,
        scale_y: f64,
    },
}

/// A render target whose attachment set is not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("framebuffer incomplete: {reason}")]
pub struct FramebufferError {
    pub reason: String,
}

impl FramebufferError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Program stage that failed to compile or link.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Link => "link",
        })
    }
}

/// Shader compile/link failure carrying the compiler's raw log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to compile {stage} stage of `{program}`:\n{log}")]
pub struct CompileError {
    pub program: String,
    pub stage: ShaderStage,
    pub log: String,
}

/// Errors reported by the graphics API while a frame was recorded and submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} graphics fault(s) in frame {frame}: {}", faults.len(), faults.join("; "))]
pub struct RuntimeGraphicsError {
    pub frame: u64,
    pub faults: Vec<String>,
}

/// Everything the pipeline can fail with.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Framebuffer(#[from] FramebufferError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Graphics(#[from] RuntimeGraphicsError),

    /// Surface could not provide a frame and cannot recover.
    #[error("surface lost: {0}")]
    Surface(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_keeps_raw_log() {
        let err = CompileError {
            program: "scene".into(),
            stage: ShaderStage::Fragment,
            log: "error: unknown identifier `colr`".into(),
        };
        let text = err.to_string();
        assert!(text.contains("fragment"));
        assert!(text.ends_with("error: unknown identifier `colr`"));
    }

    #[test]
    fn graphics_error_lists_every_fault() {
        let err = RuntimeGraphicsError {
            frame: 7,
            faults: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "2 graphics fault(s) in frame 7: a; b");
    }

    #[test]
    fn pipeline_error_wraps_framebuffer() {
        let err: PipelineError = FramebufferError::new("zero extent").into();
        assert!(matches!(err, PipelineError::Framebuffer(_)));
        assert_eq!(err.to_string(), "framebuffer incomplete: zero extent");
    }
}
