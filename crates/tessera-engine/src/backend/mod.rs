//! The graphics API seam.
//!
//! The pipeline drives rendering through [`GraphicsBackend`] with GL-style
//! calls: bind a target, clear it, draw, resolve. `wgpu_backend` maps those onto
//! render passes; `recording` logs them for headless tests.

pub mod recording;
pub mod wgpu_backend;

use crate::batch::{ElementType, IndexFormat, PackedMesh};
use crate::coords::PhysicalExtent;
use crate::error::{CompileError, FramebufferError};
use crate::target::{ClearOp, PassState, TargetCaps, TargetDesc};

/// One vertex attribute a program consumes, fed from a named packed stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VertexInput {
    pub stream: &'static str,
    pub location: u32,
    pub element: ElementType,
    pub components: u32,
    /// Integer data is mapped to [0, 1] in the shader.
    pub normalized: bool,
}

/// Vertex and fragment source text for one program.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSource<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// The two programs the pipeline needs.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSet<'a> {
    /// Draws the quad scene with a camera transform.
    pub scene: ShaderSource<'a>,
    /// Samples the offscreen image onto the surface.
    pub screen: ShaderSource<'a>,
}

/// Everything needed to compile and link a program for one kind of target.
#[derive(Debug, Clone)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub source: ShaderSource<'a>,
    pub inputs: Vec<VertexInput>,
    /// State of the target the program will draw into.
    pub state: PassState,
    /// Target has a depth attachment.
    pub depth: bool,
    /// Binds a view-projection uniform at group 0.
    pub uses_transform: bool,
    /// Binds a sampled color texture at group 0.
    pub samples_texture: bool,
}

/// Parameters of one indexed draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub index_count: u32,
    pub index_format: IndexFormat,
    pub index_byte_offset: u64,
}

impl DrawCall {
    /// Draws every index of a packed mesh.
    pub fn whole(mesh: &PackedMesh) -> Self {
        Self {
            index_count: mesh.index_count,
            index_format: mesh.index_format,
            index_byte_offset: 0,
        }
    }
}

/// Outcome of acquiring the next frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    Ready,
    /// No surface frame this time round (occluded, reconfiguring); skip drawing.
    Skip,
}

pub trait GraphicsBackend {
    type Target;
    type Mesh;
    type Program;

    fn target_caps(&self) -> TargetCaps;

    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<Self::Program, CompileError>;

    /// Allocates every attachment of `desc`. Callers check completeness first;
    /// the backend still reports allocation failures here.
    fn create_target(&mut self, desc: &TargetDesc) -> Result<Self::Target, FramebufferError>;

    fn upload_mesh(&mut self, mesh: &PackedMesh) -> Self::Mesh;

    /// Overwrites part of an uploaded mesh's vertex buffer.
    fn write_vertex_bytes(&mut self, mesh: &Self::Mesh, offset: usize, bytes: &[u8]);

    fn set_transform(&mut self, program: &Self::Program, view_projection: [[f32; 4]; 4]);

    fn begin_frame(&mut self) -> FrameStatus;

    /// Makes `target` current and applies `state`.
    fn bind_target(&mut self, target: &Self::Target, state: &PassState);

    /// Clears the bound target.
    fn clear(&mut self, op: &ClearOp);

    /// Indexed draw into the bound target, optionally sampling `texture`.
    fn draw(
        &mut self,
        program: &Self::Program,
        mesh: &Self::Mesh,
        call: &DrawCall,
        texture: Option<&Self::Target>,
    );

    /// Copies `region` of the multisampled `source` into single-sample `destination`.
    fn resolve(&mut self, source: &Self::Target, destination: &Self::Target, region: PhysicalExtent);

    /// Submits the frame and returns every error the API raised while it was recorded.
    fn end_frame(&mut self) -> Vec<String>;

    fn release_target(&mut self, target: Self::Target);
    fn release_mesh(&mut self, mesh: Self::Mesh);
    fn release_program(&mut self, program: Self::Program);
}
