use crate::backend::{DrawCall, FrameStatus, GraphicsBackend, ProgramDesc, ShaderSet, ShaderSource, VertexInput};
use crate::batch::{
    ElementType, PackedMesh, QuadBatch, COLOR, COLOR_COMPONENTS, POSITION, POSITION_COMPONENTS, TEXCOORD,
    TEXCOORD_COMPONENTS,
};
use crate::coords::PhysicalExtent;
use crate::error::{ConfigurationError, PipelineError, RuntimeGraphicsError};
use crate::paint::{ClearColor, Rgba8};
use crate::target::TargetDesc;

use super::plan::{FramePlan, Stage};
use super::targets::{Slot, TargetDescs, TargetSet};
use super::{PipelineConfig, PipelineMode, TransformProvider};

/// Frames for one full trip around the hue wheel when animating colors.
const HUE_PERIOD_FRAMES: f32 = 240.0;

const POSITION_INPUT: VertexInput = VertexInput {
    stream: POSITION,
    location: 0,
    element: ElementType::F32,
    components: POSITION_COMPONENTS,
    normalized: false,
};

const TEXCOORD_INPUT: VertexInput = VertexInput {
    stream: TEXCOORD,
    location: 1,
    element: ElementType::U16,
    components: TEXCOORD_COMPONENTS,
    normalized: false,
};

const COLOR_INPUT: VertexInput = VertexInput {
    stream: COLOR,
    location: 2,
    element: ElementType::U8,
    components: COLOR_COMPONENTS,
    normalized: true,
};

/// Uploaded batch: CPU-side packing plus the backend's buffers.
struct MeshSlot<M> {
    packed: PackedMesh,
    gpu: M,
}

/// Full-surface quad that samples the scene onto the screen.
struct ScreenPass<M, P> {
    mesh: MeshSlot<M>,
    program: P,
}

/// Owns every GPU resource of the demo scene and replays the frame plan.
pub struct Pipeline<B: GraphicsBackend> {
    config: PipelineConfig,
    plan: FramePlan,
    targets: TargetSet<B::Target>,

    scene: QuadBatch,
    scene_mesh: MeshSlot<B::Mesh>,
    scene_program: B::Program,
    screen: Option<ScreenPass<B::Mesh, B::Program>>,

    transform: Box<dyn TransformProvider>,
    pending_resize: Option<PhysicalExtent>,
    frame: u64,
}

fn program_desc<'a>(
    label: &'a str,
    source: ShaderSource<'a>,
    target: &TargetDesc,
    inputs: Vec<VertexInput>,
) -> ProgramDesc<'a> {
    ProgramDesc {
        label,
        source,
        inputs,
        state: target.pass_state(),
        depth: target.depth,
        uses_transform: false,
        samples_texture: false,
    }
}

/// One quad covering clip space, positions and texcoords only.
fn screen_quad() -> Result<QuadBatch, ConfigurationError> {
    let mut quad = QuadBatch::new();
    quad.append_quad(2.0, 2.0, 0.0, None)?;
    Ok(quad)
}

impl<B: GraphicsBackend> Pipeline<B> {
    /// Validates and packs all geometry, compiles both programs, then builds
    /// the targets for `extent`. Any failure releases what was created so far.
    pub fn new(
        backend: &mut B,
        mut config: PipelineConfig,
        scene: QuadBatch,
        shaders: &ShaderSet<'_>,
        transform: Box<dyn TransformProvider>,
        extent: PhysicalExtent,
    ) -> Result<Self, PipelineError> {
        let requested = config.mode;
        config.mode = requested.normalized();
        if config.mode != requested {
            log::warn!("{requested:?} has fewer than two samples; rendering as {:?}", config.mode);
        }

        // Geometry first: nothing reaches the backend until it is valid.
        if !scene.tracks_colors() {
            return Err(ConfigurationError::MissingStream(COLOR).into());
        }
        if extent.is_empty() {
            return Err(ConfigurationError::InvalidDimensions {
                width: f64::from(extent.width),
                height: f64::from(extent.height),
                scale_x: 1.0,
                scale_y: 1.0,
            }
            .into());
        }
        let scene_packed = scene.pack()?;
        let screen_packed = match config.mode {
            PipelineMode::Direct => None,
            PipelineMode::Offscreen | PipelineMode::Multisample { .. } => Some(screen_quad()?.pack()?),
        };

        let plan = FramePlan::for_mode(config.mode);
        let descs = TargetDescs::for_mode(config.mode, extent);
        log::info!(
            "pipeline setup: {:?}, {}x{}, stages {:?}",
            config.mode,
            extent.width,
            extent.height,
            plan.stages()
        );

        let scene_program = backend.compile_program(&ProgramDesc {
            uses_transform: true,
            ..program_desc(
                "scene",
                shaders.scene,
                descs.scene_target(),
                vec![POSITION_INPUT, TEXCOORD_INPUT, COLOR_INPUT],
            )
        })?;

        let screen_program = match &screen_packed {
            None => None,
            Some(_) => {
                let desc = ProgramDesc {
                    samples_texture: true,
                    ..program_desc(
                        "screen",
                        shaders.screen,
                        &descs.screen,
                        vec![POSITION_INPUT, TEXCOORD_INPUT],
                    )
                };
                match backend.compile_program(&desc) {
                    Ok(program) => Some(program),
                    Err(err) => {
                        backend.release_program(scene_program);
                        return Err(err.into());
                    }
                }
            }
        };

        let targets = match TargetSet::build(backend, config.mode, extent) {
            Ok(targets) => targets,
            Err(err) => {
                backend.release_program(scene_program);
                if let Some(program) = screen_program {
                    backend.release_program(program);
                }
                return Err(err.into());
            }
        };

        let scene_gpu = backend.upload_mesh(&scene_packed);
        let screen = match (screen_packed, screen_program) {
            (Some(packed), Some(program)) => {
                let gpu = backend.upload_mesh(&packed);
                Some(ScreenPass {
                    mesh: MeshSlot { packed, gpu },
                    program,
                })
            }
            _ => None,
        };

        backend.set_transform(&scene_program, transform.view_projection(extent.aspect()));

        log::info!("scene uploaded:\n{}", scene.summarize());

        Ok(Self {
            config,
            plan,
            targets,
            scene,
            scene_mesh: MeshSlot {
                packed: scene_packed,
                gpu: scene_gpu,
            },
            scene_program,
            screen,
            transform,
            pending_resize: None,
            frame: 0,
        })
    }

    pub fn mode(&self) -> PipelineMode {
        self.config.mode
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    pub fn extent(&self) -> PhysicalExtent {
        self.targets.extent
    }

    /// Frames rendered so far (skipped frames excluded).
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn scene(&self) -> &QuadBatch {
        &self.scene
    }

    /// Descriptions of the live targets: screen first, then scene and resolve destination.
    pub fn target_descs(&self) -> Vec<TargetDesc> {
        self.targets.descs()
    }

    /// Rebuilds every target at `extent` before the next frame. Zero-sized
    /// extents (minimized windows) are ignored.
    pub fn request_resize(&mut self, extent: PhysicalExtent) {
        if extent.is_empty() {
            log::debug!("ignoring resize to {}x{}", extent.width, extent.height);
            return;
        }
        self.pending_resize = Some(extent);
    }

    /// Replays the frame plan once, then polls the backend for faults.
    pub fn render_frame(&mut self, backend: &mut B) -> Result<(), PipelineError> {
        if let Some(extent) = self.pending_resize.take() {
            self.rebuild_targets(backend, extent)?;
        }

        if backend.begin_frame() == FrameStatus::Skip {
            log::trace!("frame {} skipped", self.frame);
            return Ok(());
        }

        if self.config.animate_colors {
            self.recolor(backend)?;
        }

        for &stage in self.plan.stages() {
            self.run_stage(backend, stage);
        }

        let faults = backend.end_frame();
        let frame = self.frame;
        self.frame += 1;

        if faults.is_empty() {
            return Ok(());
        }
        let err = RuntimeGraphicsError { frame, faults };
        log::error!("{err}");
        if self.config.fatal_graphics_errors {
            Err(err.into())
        } else {
            Ok(())
        }
    }

    /// Releases every GPU resource the pipeline owns.
    pub fn release(self, backend: &mut B) {
        self.targets.release(backend);
        backend.release_mesh(self.scene_mesh.gpu);
        backend.release_program(self.scene_program);
        if let Some(screen) = self.screen {
            backend.release_mesh(screen.mesh.gpu);
            backend.release_program(screen.program);
        }
        log::debug!("pipeline released after {} frames", self.frame);
    }

    fn rebuild_targets(&mut self, backend: &mut B, extent: PhysicalExtent) -> Result<(), PipelineError> {
        if extent == self.targets.extent {
            return Ok(());
        }
        let fresh = TargetSet::build(backend, self.config.mode, extent)?;
        let stale = std::mem::replace(&mut self.targets, fresh);
        stale.release(backend);

        backend.set_transform(&self.scene_program, self.transform.view_projection(extent.aspect()));
        log::info!("targets rebuilt at {}x{}", extent.width, extent.height);
        Ok(())
    }

    /// Rewrites every quad's color and uploads just the color range.
    fn recolor(&mut self, backend: &mut B) -> Result<(), ConfigurationError> {
        let count = self.scene.quad_count();
        let phase = self.frame as f32 / HUE_PERIOD_FRAMES;
        for quad in 0..count {
            let offset = quad as f32 / count as f32;
            self.scene.set_quad_color(quad, Rgba8::from_hue(phase + offset))?;
        }

        debug_assert!(self.scene_mesh.packed.is_current(&self.scene));
        if let (Some(span), Some(colors)) = (self.scene_mesh.packed.layout.get(COLOR), self.scene.colors()) {
            backend.write_vertex_bytes(&self.scene_mesh.gpu, span.offset, colors);
        }
        Ok(())
    }

    fn draw_scene(&self, backend: &mut B, target: &Slot<B::Target>, clear: ClearColor) {
        backend.bind_target(&target.handle, &target.desc.pass_state());
        backend.clear(&target.desc.clear_op(clear));
        backend.draw(
            &self.scene_program,
            &self.scene_mesh.gpu,
            &DrawCall::whole(&self.scene_mesh.packed),
            None,
        );
    }

    fn run_stage(&self, backend: &mut B, stage: Stage) {
        let targets = &self.targets;
        match stage {
            Stage::Direct => self.draw_scene(backend, &targets.screen, self.config.screen_clear),
            Stage::Offscreen => {
                if let Some(scene) = &targets.scene {
                    self.draw_scene(backend, scene, self.config.offscreen_clear);
                }
            }
            Stage::Resolve => {
                if let (Some(step), Some(src), Some(dst)) = (&targets.resolve, &targets.scene, &targets.resolved) {
                    step.resolve(backend, &src.handle, &dst.handle);
                }
            }
            Stage::Screen => {
                let (Some(screen), Some(sampled)) = (&self.screen, targets.sampled()) else {
                    return;
                };
                let target = &targets.screen;
                backend.bind_target(&target.handle, &target.desc.pass_state());
                backend.clear(&target.desc.clear_op(self.config.screen_clear));
                backend.draw(
                    &screen.program,
                    &screen.mesh.gpu,
                    &DrawCall::whole(&screen.mesh.packed),
                    Some(&sampled.handle),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::recording::{Command, RecordingBackend};
    use crate::batch::IndexFormat;
    use crate::error::ShaderStage;
    use crate::pipeline::IdentityTransform;
    use crate::target::DepthCompare;

    fn shaders() -> ShaderSet<'static> {
        let src = ShaderSource {
            vertex: "vs",
            fragment: "fs",
        };
        ShaderSet {
            scene: src,
            screen: src,
        }
    }

    fn two_quads() -> QuadBatch {
        let mut b = QuadBatch::with_colors();
        b.append_quad(2.0, 2.0, -1.2, Some(Rgba8::RED)).unwrap();
        b.append_quad(1.0, 1.0, -1.1, Some(Rgba8::BLUE)).unwrap();
        b
    }

    fn config(mode: PipelineMode) -> PipelineConfig {
        PipelineConfig {
            mode,
            fatal_graphics_errors: true,
            ..PipelineConfig::default()
        }
    }

    fn extent() -> PhysicalExtent {
        PhysicalExtent::new(1200, 800)
    }

    fn build(
        backend: &mut RecordingBackend,
        config: PipelineConfig,
        scene: QuadBatch,
    ) -> Result<Pipeline<RecordingBackend>, PipelineError> {
        Pipeline::new(backend, config, scene, &shaders(), Box::new(IdentityTransform), extent())
    }

    fn setup(backend: &mut RecordingBackend, mode: PipelineMode) -> Pipeline<RecordingBackend> {
        build(backend, config(mode), two_quads()).unwrap()
    }

    /// Id of the most recently created target with `label`.
    fn target_id(backend: &RecordingBackend, label: &str) -> u32 {
        backend
            .commands
            .iter()
            .rev()
            .find_map(|c| match c {
                Command::CreateTarget { id, desc } if desc.label == label => Some(*id),
                _ => None,
            })
            .unwrap()
    }

    fn kinds(commands: &[Command]) -> Vec<&'static str> {
        commands
            .iter()
            .map(|c| match c {
                Command::BeginFrame => "begin",
                Command::Bind { .. } => "bind",
                Command::Clear(_) => "clear",
                Command::Draw { .. } => "draw",
                Command::Resolve { .. } => "resolve",
                Command::EndFrame => "end",
                Command::WriteVertexBytes { .. } => "write",
                _ => "other",
            })
            .collect()
    }

    fn draws(commands: &[Command]) -> Vec<(DrawCall, Option<u32>)> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw { call, texture, .. } => Some((*call, *texture)),
                _ => None,
            })
            .collect()
    }

    fn is_resolve(c: &Command) -> bool {
        matches!(c, Command::Resolve { .. })
    }

    // ── frame order ───────────────────────────────────────────────────────

    #[test]
    fn direct_draws_straight_to_screen_with_depth() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Direct);
        p.render_frame(&mut backend).unwrap();

        let frame = backend.last_frame();
        assert_eq!(kinds(frame), ["begin", "bind", "clear", "draw", "end"]);

        let screen = target_id(&backend, "screen");
        match &frame[1] {
            Command::Bind { target, state } => {
                assert_eq!(*target, screen);
                assert_eq!(state.depth_test, Some(DepthCompare::LessEqual));
            }
            other => panic!("expected bind, got {other:?}"),
        }
        assert_eq!(p.target_descs().len(), 1);
    }

    #[test]
    fn offscreen_mode_never_resolves() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Offscreen);
        for _ in 0..3 {
            p.render_frame(&mut backend).unwrap();
        }

        assert_eq!(backend.count(is_resolve), 0);
        let frame = backend.last_frame();
        assert_eq!(
            kinds(frame),
            ["begin", "bind", "clear", "draw", "bind", "clear", "draw", "end"]
        );

        let scene = target_id(&backend, "scene");
        let d = draws(frame);
        assert_eq!(d[0].1, None);
        assert_eq!(d[1].1, Some(scene));
    }

    #[test]
    fn multisample_resolves_once_per_frame_before_screen_bind() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Multisample { samples: 4 });
        for _ in 0..3 {
            p.render_frame(&mut backend).unwrap();
        }

        assert_eq!(backend.count(is_resolve), 3);
        let frame = backend.last_frame();
        assert_eq!(
            kinds(frame),
            ["begin", "bind", "clear", "draw", "resolve", "bind", "clear", "draw", "end"]
        );

        let scene = target_id(&backend, "scene");
        let resolved = target_id(&backend, "resolved");
        assert_eq!(
            frame[4],
            Command::Resolve {
                source: scene,
                destination: resolved,
                region: extent(),
            }
        );
        assert_eq!(draws(frame)[1].1, Some(resolved));
    }

    #[test]
    fn scene_bind_enables_multisample_and_depth() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Multisample { samples: 4 });
        p.render_frame(&mut backend).unwrap();

        let states: Vec<_> = backend
            .last_frame()
            .iter()
            .filter_map(|c| match c {
                Command::Bind { state, .. } => Some(*state),
                _ => None,
            })
            .collect();
        assert!(states[0].multisample());
        assert_eq!(states[0].depth_test, Some(DepthCompare::LessEqual));
        assert!(!states[1].multisample());
        assert_eq!(states[1].depth_test, None);
    }

    #[test]
    fn clears_zero_alpha_and_only_clear_depth_where_present() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Offscreen);
        p.render_frame(&mut backend).unwrap();

        let clears: Vec<_> = backend
            .last_frame()
            .iter()
            .filter_map(|c| match c {
                Command::Clear(op) => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(clears.len(), 2);
        assert_eq!(clears[0].color, ClearColor::OFFSCREEN);
        assert_eq!(clears[0].depth, Some(1.0));
        assert_eq!(clears[1].color.a, 0.0);
        assert_eq!(clears[1].depth, None);
    }

    #[test]
    fn scene_draw_covers_every_index() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Direct);
        p.render_frame(&mut backend).unwrap();

        let (call, _) = draws(backend.last_frame())[0];
        assert_eq!(call.index_count, 12);
        assert_eq!(call.index_format, IndexFormat::U16);
        assert_eq!(call.index_byte_offset, 0);
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_rebuilds_every_target_before_the_next_frame() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Multisample { samples: 4 });
        p.render_frame(&mut backend).unwrap();

        let small = PhysicalExtent::new(640, 480);
        p.request_resize(small);
        assert_eq!(p.extent(), extent(), "resize is deferred");
        p.render_frame(&mut backend).unwrap();

        assert_eq!(p.extent(), small);
        assert!(p.target_descs().iter().all(|d| d.extent == small));
        assert_eq!(backend.count(|c| matches!(c, Command::CreateTarget { .. })), 6);
        assert_eq!(backend.count(|c| matches!(c, Command::ReleaseTarget { .. })), 3);
        assert_eq!(backend.live().0, 3);

        let last_create = backend
            .commands
            .iter()
            .rposition(|c| matches!(c, Command::CreateTarget { .. }))
            .unwrap();
        let last_begin = backend.commands.iter().rposition(|c| *c == Command::BeginFrame).unwrap();
        assert!(last_create < last_begin);

        let resolved = target_id(&backend, "resolved");
        assert!(backend.last_frame().contains(&Command::Resolve {
            source: target_id(&backend, "scene"),
            destination: resolved,
            region: small,
        }));
    }

    #[test]
    fn zero_sized_resize_is_ignored() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Offscreen);
        p.request_resize(PhysicalExtent::new(0, 0));
        p.render_frame(&mut backend).unwrap();
        assert_eq!(p.extent(), extent());
        assert_eq!(backend.count(|c| matches!(c, Command::ReleaseTarget { .. })), 0);
    }

    #[test]
    fn transform_follows_aspect() {
        let mut backend = RecordingBackend::new();
        let stretch = |aspect: f32| {
            let mut m = IdentityTransform.view_projection(aspect);
            m[0][0] = aspect;
            m
        };
        let mut p = Pipeline::new(
            &mut backend,
            config(PipelineMode::Direct),
            two_quads(),
            &shaders(),
            Box::new(stretch),
            extent(),
        )
        .unwrap();
        p.request_resize(PhysicalExtent::new(800, 800));
        p.render_frame(&mut backend).unwrap();

        let aspects: Vec<f32> = backend
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::SetTransform { view_projection, .. } => Some(view_projection[0][0]),
                _ => None,
            })
            .collect();
        assert_eq!(aspects, [1.5, 1.0]);
    }

    // ── setup failures ────────────────────────────────────────────────────

    #[test]
    fn unsupported_sample_count_aborts_setup() {
        let mut backend = RecordingBackend::new();
        let err = build(&mut backend, config(PipelineMode::Multisample { samples: 8 }), two_quads())
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Framebuffer(_)), "{err}");
        assert_eq!(backend.count(|c| matches!(c, Command::CreateTarget { .. })), 0);
        assert_eq!(backend.live(), (0, 0, 0));
    }

    #[test]
    fn single_sample_msaa_renders_as_offscreen() {
        for samples in [0, 1] {
            let mut backend = RecordingBackend::new();
            let mut p = setup(&mut backend, PipelineMode::Multisample { samples });
            assert_eq!(p.mode(), PipelineMode::Offscreen);
            assert!(!p.plan().has_stage(Stage::Resolve));
            assert_eq!(p.target_descs().len(), 2);

            p.render_frame(&mut backend).unwrap();
            assert_eq!(backend.count(|c| matches!(c, Command::Resolve { .. })), 0);
        }
    }

    #[test]
    fn allocation_failure_releases_the_partial_set() {
        let mut backend = RecordingBackend::new();
        backend.fail_target("resolved");
        let err = build(&mut backend, config(PipelineMode::Multisample { samples: 4 }), two_quads())
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Framebuffer(_)));
        assert_eq!(backend.count(|c| matches!(c, Command::CreateTarget { .. })), 2);
        assert_eq!(backend.live(), (0, 0, 0));
    }

    #[test]
    fn compile_failure_keeps_stage_and_releases_programs() {
        let mut backend = RecordingBackend::new();
        backend.fail_compile("screen", ShaderStage::Fragment);
        let err = build(&mut backend, config(PipelineMode::Offscreen), two_quads())
            .err()
            .unwrap();
        match err {
            PipelineError::Compile(e) => {
                assert_eq!(e.stage, ShaderStage::Fragment);
                assert_eq!(e.program, "screen");
            }
            other => panic!("expected compile error, got {other}"),
        }
        assert_eq!(backend.live(), (0, 0, 0));
    }

    #[test]
    fn invalid_setup_never_reaches_the_backend() {
        let mut backend = RecordingBackend::new();

        let mut untracked = QuadBatch::new();
        untracked.append_quad(1.0, 1.0, -1.0, None).unwrap();
        let err = build(&mut backend, config(PipelineMode::Direct), untracked).err().unwrap();
        assert!(matches!(
            err,
            PipelineError::Configuration(ConfigurationError::MissingStream(COLOR))
        ));

        let err = Pipeline::new(
            &mut backend,
            config(PipelineMode::Direct),
            two_quads(),
            &shaders(),
            Box::new(IdentityTransform),
            PhysicalExtent::new(0, 600),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            PipelineError::Configuration(ConfigurationError::InvalidDimensions { .. })
        ));

        assert!(backend.commands.is_empty());
    }

    // ── per-frame behavior ────────────────────────────────────────────────

    #[test]
    fn graphics_faults_are_fatal_when_configured() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Offscreen);
        backend.inject_fault("invalid bind group");

        match p.render_frame(&mut backend) {
            Err(PipelineError::Graphics(e)) => {
                assert_eq!(e.frame, 0);
                assert_eq!(e.faults, ["invalid bind group"]);
            }
            other => panic!("expected graphics error, got {other:?}"),
        }
    }

    #[test]
    fn graphics_faults_are_logged_otherwise() {
        let mut backend = RecordingBackend::new();
        let config = PipelineConfig {
            fatal_graphics_errors: false,
            ..config(PipelineMode::Offscreen)
        };
        let mut p = build(&mut backend, config, two_quads()).unwrap();
        backend.inject_fault("invalid bind group");

        p.render_frame(&mut backend).unwrap();
        p.render_frame(&mut backend).unwrap();
        assert_eq!(p.frame_count(), 2);
    }

    #[test]
    fn skipped_frames_record_nothing() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Offscreen);
        backend.skip_frames(2);

        p.render_frame(&mut backend).unwrap();
        p.render_frame(&mut backend).unwrap();
        assert_eq!(p.frame_count(), 0);
        assert_eq!(backend.count(|c| *c == Command::BeginFrame), 0);

        p.render_frame(&mut backend).unwrap();
        assert_eq!(p.frame_count(), 1);
    }

    #[test]
    fn animation_uploads_only_the_color_range() {
        let mut backend = RecordingBackend::new();
        let config = PipelineConfig {
            animate_colors: true,
            ..config(PipelineMode::Multisample { samples: 4 })
        };
        let mut p = build(&mut backend, config, two_quads()).unwrap();
        p.render_frame(&mut backend).unwrap();

        let span = *p.scene().layout().unwrap().get(COLOR).unwrap();
        let writes: Vec<_> = backend
            .last_frame()
            .iter()
            .filter_map(|c| match c {
                Command::WriteVertexBytes { offset, len, .. } => Some((*offset, *len)),
                _ => None,
            })
            .collect();
        assert_eq!(writes, [(span.offset, span.length)]);
        assert_eq!(span.offset, 24 * 4 + 16 * 2);
        assert_eq!(kinds(backend.last_frame())[1], "write");

        // Quad 1 sits half way round the hue wheel from quad 0.
        let second = &p.scene().colors().unwrap()[16..20];
        assert_ne!(second, Rgba8::BLUE.to_array());
        assert_eq!(second, Rgba8::from_hue(0.5).to_array());
    }

    #[test]
    fn release_frees_every_resource() {
        let mut backend = RecordingBackend::new();
        let mut p = setup(&mut backend, PipelineMode::Multisample { samples: 4 });
        p.render_frame(&mut backend).unwrap();
        assert_eq!(backend.live(), (3, 2, 2));

        p.release(&mut backend);
        assert_eq!(backend.live(), (0, 0, 0));
    }
}
