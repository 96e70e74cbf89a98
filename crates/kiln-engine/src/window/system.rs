use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::Window;

use crate::coords::{ColorRgba, Rect, Vec2, Viewport};
use crate::device::{Acquire, Gpu, GpuContext, SurfaceErrorAction, SurfaceFrame};
use crate::render::{PrimitiveKind, Primitives, RenderCtx, RenderTarget, ShaderLibrary};
use crate::texture::Texture;

use super::events::WindowEvents;
use super::RenderSettings;

/// Pumps allowed while waiting for the platform to hand out the window.
const WINDOW_CREATE_PUMPS: u32 = 200;
const WINDOW_CREATE_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

struct WindowState {
    gpu: Gpu,
    window: Arc<Window>,
}

/// Owns the window, its surface and the GPU context, and brackets frames.
///
/// Frame protocol (main thread):
///
/// ```no_run
/// # use kiln_engine::{RenderSystem, RenderSettings, ColorRgba, Vec2};
/// # fn main() -> anyhow::Result<()> {
/// let mut system = RenderSystem::new(RenderSettings::default());
/// system.initialize(800, 600, "kiln")?;
/// while system.should_continue() {
///     system.begin_frame();
///     system.circle(Vec2::new(400.0, 300.0), 50.0, ColorRgba::white())?;
///     system.end_frame();
/// }
/// system.shutdown();
/// # Ok(())
/// # }
/// ```
///
/// `begin_frame` takes ownership of the graphics context (waiting if another
/// thread holds it) and `end_frame` gives it back, so worker threads holding a
/// [`GpuContext`] clone can upload textures between frames.
pub struct RenderSystem {
    settings: RenderSettings,
    shaders: ShaderLibrary,
    clear_color: ColorRgba,

    /// Created on first `initialize` and kept: some platforms allow only one per process.
    event_loop: Option<EventLoop<()>>,
    events: WindowEvents,

    /// `Some` while initialized.
    state: Option<WindowState>,
    primitives: Primitives,

    /// Between `begin_frame` and `end_frame`.
    in_frame: bool,
    /// Acquired surface image; `None` inside a frame means the frame is skipped.
    frame: Option<SurfaceFrame>,
}

impl RenderSystem {
    pub fn new(settings: RenderSettings) -> Self {
        let shaders = match &settings.shader_dir {
            Some(dir) => ShaderLibrary::from_dir(dir),
            None => ShaderLibrary::embedded(),
        };

        Self {
            clear_color: settings.clear_color,
            settings,
            shaders,
            event_loop: None,
            events: WindowEvents::default(),
            state: None,
            primitives: Primitives::new(),
            in_frame: false,
            frame: None,
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Opens the window and creates the GPU context.
    ///
    /// Returns `Ok` without doing anything when already initialized.
    pub fn initialize(&mut self, width: u32, height: u32, title: &str) -> Result<()> {
        if self.state.is_some() {
            return Ok(());
        }

        match self.open(width, height, title) {
            Ok(state) => {
                let size = state.gpu.size();
                log::info!(
                    "render system initialized: {}x{} {:?}",
                    size.width,
                    size.height,
                    state.gpu.surface_format()
                );
                self.state = Some(state);
                Ok(())
            }
            Err(e) => {
                log::error!("failed to initialize render system: {e:#}");
                self.events.clear();
                Err(e)
            }
        }
    }

    fn open(&mut self, width: u32, height: u32, title: &str) -> Result<WindowState> {
        ensure!(
            width > 0 && height > 0,
            "window size must be non-zero (got {width}x{height})"
        );

        if self.event_loop.is_none() {
            self.event_loop = Some(create_event_loop()?);
        }
        let event_loop = self.event_loop.as_mut().context("event loop missing")?;

        self.events.request_window(
            Window::default_attributes()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width, height))
                .with_resizable(true),
        );

        let mut window = None;
        for _ in 0..WINDOW_CREATE_PUMPS {
            let status = event_loop.pump_app_events(Some(WINDOW_CREATE_PUMP_TIMEOUT), &mut self.events);
            if let Some(err) = self.events.take_error() {
                return Err(err);
            }
            if let Some(w) = self.events.window() {
                window = Some(w);
                break;
            }
            if let PumpStatus::Exit(code) = status {
                bail!("event loop exited with code {code} before the window was created");
            }
        }
        let window = window.context("timed out waiting for the window to be created")?;

        let gpu = pollster::block_on(Gpu::new(Arc::clone(&window), self.settings.gpu.clone()))
            .context("failed to create the GPU context")?;

        Ok(WindowState { gpu, window })
    }

    /// Tears down primitives, surface, GPU context and window. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(state) = self.state.take() else { return };

        self.frame = None;
        self.in_frame = false;
        self.primitives.destroy_all();

        let ctx = state.gpu.context().clone();
        if ctx.is_current() {
            ctx.release_context();
        }

        drop(state);
        self.events.clear();

        // Let the platform process the window destruction.
        if let Some(event_loop) = self.event_loop.as_mut() {
            let _ = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.events);
        }

        log::info!("render system shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// False once the window was asked to close, or when not initialized.
    pub fn should_continue(&self) -> bool {
        self.state.is_some() && !self.events.close_requested
    }

    // ── frames ────────────────────────────────────────────────────────────

    /// Takes the context, processes window events, tracks framebuffer size
    /// and clears the next surface image. No-op when not initialized.
    pub fn begin_frame(&mut self) {
        let Some(state) = self.state.as_mut() else { return };

        if self.in_frame {
            log::warn!("begin_frame called twice without end_frame");
            return;
        }

        match state.gpu.context().acquire_blocking() {
            Acquire::Acquired => {}
            Acquire::AlreadyOwned => {
                log::warn!("begin_frame: the calling thread already owns the graphics context");
            }
            Acquire::Contended => {
                log::warn!("begin_frame: could not acquire the graphics context");
            }
        }
        self.in_frame = true;

        if let Some(event_loop) = self.event_loop.as_mut() {
            if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.events) {
                log::info!("event loop exited with code {code}");
                self.events.close_requested = true;
            }
        }

        let size = self.events.resized.take().unwrap_or_else(|| state.window.inner_size());
        if size != state.gpu.size() {
            state.gpu.resize(size);
        }
        if size.width == 0 || size.height == 0 {
            // Minimized: nothing to draw into.
            return;
        }

        match state.gpu.acquire() {
            Ok(frame) => {
                clear(state.gpu.context(), &frame, self.clear_color);
                self.frame = Some(frame);
            }
            Err(err) => match state.gpu.handle_surface_error(err) {
                SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                    log::debug!("surface unavailable; skipping frame");
                }
                SurfaceErrorAction::Fatal => {
                    log::error!("fatal surface error; closing");
                    self.events.close_requested = true;
                }
            },
        }
    }

    /// Presents the frame and releases the context. No-op when not initialized.
    pub fn end_frame(&mut self) {
        let Some(state) = self.state.as_ref() else { return };

        if !self.in_frame {
            log::warn!("end_frame called without begin_frame");
            return;
        }
        self.in_frame = false;

        if let Some(frame) = self.frame.take() {
            state.window.pre_present_notify();
            frame.present();
        }

        let ctx = state.gpu.context();
        if ctx.is_current() {
            ctx.release_context();
        }
    }

    // ── context ownership ─────────────────────────────────────────────────

    /// See [`GpuContext::take_context`]. False when not initialized.
    pub fn take_context(&self, non_blocking: bool) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.gpu.context().take_context(non_blocking))
    }

    /// See [`GpuContext::release_context`]. False when not initialized.
    pub fn release_context(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| s.gpu.context().release_context())
    }

    /// Shareable handle for worker threads.
    pub fn context(&self) -> Option<GpuContext> {
        self.state.as_ref().map(|s| s.gpu.context().clone())
    }

    // ── properties ────────────────────────────────────────────────────────

    pub fn set_clear_color(&mut self, color: ColorRgba) {
        self.clear_color = color;
    }

    pub fn clear_color(&self) -> ColorRgba {
        self.clear_color
    }

    /// Framebuffer width in physical pixels; 0 when not initialized.
    pub fn window_width(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.gpu.size().width)
    }

    /// Framebuffer height in physical pixels; 0 when not initialized.
    pub fn window_height(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.gpu.size().height)
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    // ── primitives ────────────────────────────────────────────────────────

    pub fn line(&mut self, a: Vec2, b: Vec2, color: ColorRgba) -> Result<()> {
        self.draw("line", |p, ctx, target| p.line(ctx, target, a, b, color))
    }

    pub fn lines(&mut self, points: &[Vec2], color: ColorRgba) -> Result<()> {
        self.draw("lines", |p, ctx, target| p.lines(ctx, target, points, color))
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: ColorRgba) -> Result<()> {
        self.draw("circle", |p, ctx, target| p.circle(ctx, target, center, radius, color))
    }

    pub fn circle_filled(&mut self, center: Vec2, radius: f32, color: ColorRgba) -> Result<()> {
        self.draw("circle_filled", |p, ctx, target| {
            p.circle_filled(ctx, target, center, radius, color)
        })
    }

    pub fn polygon(&mut self, points: &[Vec2], color: ColorRgba) -> Result<()> {
        self.draw("polygon", |p, ctx, target| p.polygon(ctx, target, points, color))
    }

    pub fn polygon_filled(&mut self, points: &[Vec2], color: ColorRgba) -> Result<()> {
        self.draw("polygon_filled", |p, ctx, target| {
            p.polygon_filled(ctx, target, points, color)
        })
    }

    /// Draws `sub` (normalized) of `texture` into `dst` (pixels), multiplied by `tint`.
    pub fn texture_quad(
        &mut self,
        texture: &Texture,
        dst: Rect,
        sub: Rect,
        tint: ColorRgba,
    ) -> Result<()> {
        self.draw("texture_quad", |p, ctx, target| {
            p.texture_quad(ctx, target, texture, dst, sub, tint)
        })
    }

    pub fn destroy_primitive(&mut self, kind: PrimitiveKind) {
        self.primitives.destroy(kind);
    }

    pub fn destroy_primitives(&mut self) {
        self.primitives.destroy_all();
    }

    pub fn is_primitive_initialized(&self, kind: PrimitiveKind) -> bool {
        self.primitives.is_initialized(kind)
    }

    fn draw(
        &mut self,
        what: &str,
        f: impl FnOnce(&mut Primitives, &RenderCtx<'_>, RenderTarget<'_>) -> Result<()>,
    ) -> Result<()> {
        let state = self
            .state
            .as_ref()
            .with_context(|| format!("{what}: render system is not initialized"))?;
        ensure!(self.in_frame, "{what}: called outside begin_frame/end_frame");
        state.gpu.context().ensure_current()?;

        let Some(frame) = self.frame.as_ref() else {
            // Frame skipped (minimized or surface lost).
            return Ok(());
        };

        let size = state.gpu.size();
        let ctx = RenderCtx::new(
            state.gpu.context(),
            &self.shaders,
            state.gpu.surface_format(),
            Viewport::from_pixels(size.width, size.height),
        );
        f(&mut self.primitives, &ctx, RenderTarget::new(&frame.view))
    }
}

impl Drop for RenderSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn create_event_loop() -> Result<EventLoop<()>> {
    let mut builder = EventLoop::builder();

    // The test harness runs tests off the main thread.
    #[cfg(all(test, target_os = "linux"))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        builder.with_any_thread(true);
    }

    builder.build().context("failed to create winit EventLoop")
}

fn clear(ctx: &GpuContext, frame: &SurfaceFrame, color: ColorRgba) {
    let mut encoder = ctx
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kiln clear encoder"),
        });

    {
        let _rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    ctx.queue().submit(Some(encoder.finish()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninitialized_system_is_inert() {
        let mut system = RenderSystem::new(RenderSettings::default());

        assert!(!system.is_initialized());
        assert!(!system.should_continue());
        assert!(!system.take_context(true));
        assert!(!system.release_context());
        assert!(system.context().is_none());
        assert_eq!((system.window_width(), system.window_height()), (0, 0));

        system.begin_frame();
        system.end_frame();
        system.shutdown();

        assert!(system.circle(Vec2::new(1.0, 1.0), 1.0, ColorRgba::white()).is_err());
    }

    #[test]
    fn settings_seed_clear_color() {
        let color = ColorRgba::new(0.2, 0.3, 0.4, 1.0);
        let mut system = RenderSystem::new(RenderSettings::default().with_clear_color(color));
        assert_eq!(system.clear_color(), color);

        system.set_clear_color(ColorRgba::black());
        assert_eq!(system.clear_color(), ColorRgba::black());
    }

    #[test]
    fn default_clear_color() {
        let settings = RenderSettings::default();
        assert_eq!(settings.clear_color, ColorRgba::new(0.05, 0.05, 0.08, 1.0));
        assert!(settings.shader_dir.is_none());
    }

    #[test]
    fn zero_size_window_is_rejected() {
        let mut system = RenderSystem::new(RenderSettings::default());
        assert!(system.initialize(0, 600, "kiln").is_err());
        assert!(!system.is_initialized());
    }

    // ── needs a display ───────────────────────────────────────────────────

    #[test]
    #[ignore = "opens a window"]
    fn initialize_draw_shutdown() {
        let mut system = RenderSystem::new(RenderSettings::default());
        system.initialize(320, 240, "kiln test").unwrap();
        assert!(system.should_continue());
        assert_eq!((system.window_width(), system.window_height()), (320, 240));

        // Idempotent.
        system.initialize(640, 480, "ignored").unwrap();
        assert_eq!(system.window_width(), 320);

        system.begin_frame();
        system.circle(Vec2::new(160.0, 120.0), 40.0, ColorRgba::white()).unwrap();
        assert!(system.is_primitive_initialized(PrimitiveKind::Circle));
        system.end_frame();

        // Draws outside a frame are rejected.
        assert!(system.circle(Vec2::new(1.0, 1.0), 1.0, ColorRgba::white()).is_err());

        system.shutdown();
        assert!(!system.should_continue());
        assert!(!system.is_primitive_initialized(PrimitiveKind::Circle));
        system.shutdown();
    }

    #[test]
    #[ignore = "opens a window"]
    fn worker_thread_uploads_between_frames() {
        let mut system = RenderSystem::new(RenderSettings::default());
        system.initialize(64, 64, "kiln worker").unwrap();
        let ctx = system.context().unwrap();

        let texture = std::thread::spawn(move || {
            assert!(ctx.take_context(false));
            let mut t = Texture::new();
            t.load_from_data(&ctx, &[255; 16], 2, 2, crate::texture::PixelFormat::Rgba)
                .unwrap();
            assert!(ctx.release_context());
            t
        })
        .join()
        .unwrap();

        system.begin_frame();
        system
            .texture_quad(&texture, Rect::new(0.0, 0.0, 32.0, 32.0), Rect::unit(), ColorRgba::white())
            .unwrap();
        system.end_frame();
    }
}
