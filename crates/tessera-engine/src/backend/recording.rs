//! Headless backend that records every call instead of talking to a GPU.
//!
//! Handles are plain ids. Faults can be queued to exercise the error paths of
//! the pipeline without a device.

use crate::batch::PackedMesh;
use crate::coords::PhysicalExtent;
use crate::error::{CompileError, FramebufferError, ShaderStage};
use crate::target::{ClearOp, PassState, TargetCaps, TargetDesc};

use super::{DrawCall, FrameStatus, GraphicsBackend, ProgramDesc};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CompileProgram { id: u32, label: String },
    CreateTarget { id: u32, desc: TargetDesc },
    UploadMesh { id: u32, vertex_bytes: usize, index_count: u32 },
    WriteVertexBytes { mesh: u32, offset: usize, len: usize },
    SetTransform { program: u32, view_projection: [[f32; 4]; 4] },
    BeginFrame,
    Bind { target: u32, state: PassState },
    Clear(ClearOp),
    Draw {
        program: u32,
        mesh: u32,
        call: DrawCall,
        texture: Option<u32>,
    },
    Resolve {
        source: u32,
        destination: u32,
        region: PhysicalExtent,
    },
    EndFrame,
    ReleaseTarget { id: u32 },
    ReleaseMesh { id: u32 },
    ReleaseProgram { id: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordedTarget {
    pub id: u32,
    pub desc: TargetDesc,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordedMesh {
    pub id: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordedProgram {
    pub id: u32,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub caps: TargetCaps,
    pub commands: Vec<Command>,
    next_id: u32,

    // injected failures
    fail_compile: Option<(String, ShaderStage)>,
    fail_target: Option<&'static str>,
    pending_faults: Vec<String>,
    skip_frames: u32,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caps(caps: TargetCaps) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    /// Next compile of a program labelled `label` fails at `stage`.
    pub fn fail_compile(&mut self, label: &str, stage: ShaderStage) {
        self.fail_compile = Some((label.to_owned(), stage));
    }

    /// Every allocation of a target labelled `label` fails.
    pub fn fail_target(&mut self, label: &'static str) {
        self.fail_target = Some(label);
    }

    /// Reported by the next `end_frame`.
    pub fn inject_fault(&mut self, fault: impl Into<String>) {
        self.pending_faults.push(fault.into());
    }

    /// The next `n` frames report `FrameStatus::Skip`.
    pub fn skip_frames(&mut self, n: u32) {
        self.skip_frames = n;
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// Commands from the last `BeginFrame` onwards.
    pub fn last_frame(&self) -> &[Command] {
        let start = self
            .commands
            .iter()
            .rposition(|c| *c == Command::BeginFrame)
            .unwrap_or(0);
        &self.commands[start..]
    }

    /// Ids allocated but not yet released, by kind: (targets, meshes, programs).
    pub fn live(&self) -> (usize, usize, usize) {
        let mut live = (0isize, 0isize, 0isize);
        for c in &self.commands {
            match c {
                Command::CreateTarget { .. } => live.0 += 1,
                Command::ReleaseTarget { .. } => live.0 -= 1,
                Command::UploadMesh { .. } => live.1 += 1,
                Command::ReleaseMesh { .. } => live.1 -= 1,
                Command::CompileProgram { .. } => live.2 += 1,
                Command::ReleaseProgram { .. } => live.2 -= 1,
                _ => {}
            }
        }
        (live.0 as usize, live.1 as usize, live.2 as usize)
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsBackend for RecordingBackend {
    type Target = RecordedTarget;
    type Mesh = RecordedMesh;
    type Program = RecordedProgram;

    fn target_caps(&self) -> TargetCaps {
        self.caps.clone()
    }

    fn compile_program(&mut self, desc: &ProgramDesc<'_>) -> Result<RecordedProgram, CompileError> {
        if let Some((label, stage)) = self.fail_compile.take_if(|(l, _)| l.as_str() == desc.label) {
            return Err(CompileError {
                program: label,
                stage,
                log: "injected compile failure".to_owned(),
            });
        }
        let id = self.next_id();
        self.commands.push(Command::CompileProgram {
            id,
            label: desc.label.to_owned(),
        });
        Ok(RecordedProgram { id })
    }

    fn create_target(&mut self, desc: &TargetDesc) -> Result<RecordedTarget, FramebufferError> {
        if self.fail_target == Some(desc.label) {
            return Err(FramebufferError::new(format!(
                "injected allocation failure for `{}`",
                desc.label
            )));
        }
        let id = self.next_id();
        self.commands.push(Command::CreateTarget { id, desc: *desc });
        Ok(RecordedTarget { id, desc: *desc })
    }

    fn upload_mesh(&mut self, mesh: &PackedMesh) -> RecordedMesh {
        let id = self.next_id();
        self.commands.push(Command::UploadMesh {
            id,
            vertex_bytes: mesh.vertex_bytes.len(),
            index_count: mesh.index_count,
        });
        RecordedMesh { id }
    }

    fn write_vertex_bytes(&mut self, mesh: &RecordedMesh, offset: usize, bytes: &[u8]) {
        self.commands.push(Command::WriteVertexBytes {
            mesh: mesh.id,
            offset,
            len: bytes.len(),
        });
    }

    fn set_transform(&mut self, program: &RecordedProgram, view_projection: [[f32; 4]; 4]) {
        self.commands.push(Command::SetTransform {
            program: program.id,
            view_projection,
        });
    }

    fn begin_frame(&mut self) -> FrameStatus {
        if self.skip_frames > 0 {
            self.skip_frames -= 1;
            return FrameStatus::Skip;
        }
        self.commands.push(Command::BeginFrame);
        FrameStatus::Ready
    }

    fn bind_target(&mut self, target: &RecordedTarget, state: &PassState) {
        self.commands.push(Command::Bind {
            target: target.id,
            state: *state,
        });
    }

    fn clear(&mut self, op: &ClearOp) {
        self.commands.push(Command::Clear(*op));
    }

    fn draw(
        &mut self,
        program: &RecordedProgram,
        mesh: &RecordedMesh,
        call: &DrawCall,
        texture: Option<&RecordedTarget>,
    ) {
        self.commands.push(Command::Draw {
            program: program.id,
            mesh: mesh.id,
            call: *call,
            texture: texture.map(|t| t.id),
        });
    }

    fn resolve(&mut self, source: &RecordedTarget, destination: &RecordedTarget, region: PhysicalExtent) {
        self.commands.push(Command::Resolve {
            source: source.id,
            destination: destination.id,
            region,
        });
    }

    fn end_frame(&mut self) -> Vec<String> {
        self.commands.push(Command::EndFrame);
        std::mem::take(&mut self.pending_faults)
    }

    fn release_target(&mut self, target: RecordedTarget) {
        self.commands.push(Command::ReleaseTarget { id: target.id });
    }

    fn release_mesh(&mut self, mesh: RecordedMesh) {
        self.commands.push(Command::ReleaseMesh { id: mesh.id });
    }

    fn release_program(&mut self, program: RecordedProgram) {
        self.commands.push(Command::ReleaseProgram { id: program.id });
    }
}
