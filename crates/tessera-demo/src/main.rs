use anyhow::Result;
use glam::{Mat4, Vec3};

use tessera_engine::backend::wgpu_backend::{builtin_shaders, WgpuBackend};
use tessera_engine::batch::QuadBatch;
use tessera_engine::coords::PhysicalExtent;
use tessera_engine::core::{App, AppControl, FrameCtx};
use tessera_engine::device::GpuInit;
use tessera_engine::logging::{init_logging, LoggingConfig};
use tessera_engine::paint::Rgba8;
use tessera_engine::pipeline::{Pipeline, PipelineConfig, TransformProvider};
use tessera_engine::window::{Runtime, RuntimeConfig};

use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// Fixed perspective camera looking slightly up and right into the scene.
struct Camera {
    eye: Vec3,
    target: Vec3,
    fov_y: f32,
    near: f32,
    far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 0.5),
            target: Vec3::new(0.1, 0.1, -1.0),
            fov_y: 90f32.to_radians(),
            near: 0.1,
            far: 10.0,
        }
    }
}

impl TransformProvider for Camera {
    fn view_projection(&self, aspect: f32) -> [[f32; 4]; 4] {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far);
        (proj * view).to_cols_array_2d()
    }
}

fn build_scene() -> Result<QuadBatch> {
    let mut scene = QuadBatch::with_colors();
    scene.append_quad(2.0, 2.0, -1.2, Some(Rgba8::RED))?;
    scene.append_quad(1.0, 1.0, -1.1, Some(Rgba8::BLUE))?;
    Ok(scene)
}

struct Demo {
    config: PipelineConfig,
    scene: Option<QuadBatch>,
    renderer: Option<(WgpuBackend, Pipeline<WgpuBackend>)>,
}

impl Demo {
    fn new(config: PipelineConfig, scene: QuadBatch) -> Self {
        Self {
            config,
            scene: Some(scene),
            renderer: None,
        }
    }

    fn frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> Result<()> {
        if self.renderer.is_none() {
            let Some(scene) = self.scene.take() else {
                return Ok(());
            };
            let mut backend = WgpuBackend::new(ctx.gpu);
            let pipeline = Pipeline::new(
                &mut backend,
                self.config.clone(),
                scene,
                &builtin_shaders(),
                Box::new(Camera::default()),
                ctx.gpu.extent(),
            )?;
            self.renderer = Some((backend, pipeline));
        }

        let Some(frame) = ctx.acquire_frame() else {
            return Ok(());
        };
        if let Some((backend, pipeline)) = self.renderer.as_mut() {
            backend.attach_frame(frame);
            pipeline.render_frame(backend)?;
        }
        Ok(())
    }
}

impl App for Demo {
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => AppControl::Exit,
            WindowEvent::CloseRequested => {
                if let Some((mut backend, pipeline)) = self.renderer.take() {
                    pipeline.release(&mut backend);
                }
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_resize(&mut self, extent: PhysicalExtent, _scale_factor: f64) {
        if let Some((_, pipeline)) = self.renderer.as_mut() {
            pipeline.request_resize(extent);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if let Err(err) = self.frame(ctx) {
            ctx.runtime.fail(err);
            return AppControl::Exit;
        }
        AppControl::Continue
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = PipelineConfig::from_env();
    let scene = build_scene()?;
    log::info!("scene: {}", scene.summarize());
    log::info!("pipeline mode: {:?}", config.mode);

    Runtime::run(
        RuntimeConfig {
            title: "Quad 3D".to_string(),
            initial_size: LogicalSize::new(600.0, 400.0),
        },
        GpuInit::default(),
        Demo::new(config, scene),
    )
}
