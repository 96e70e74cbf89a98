use std::sync::Arc;

use anyhow::anyhow;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes, WindowId};

/// Event sink pumped once per frame by the render system.
///
/// Creates the window when the event loop allows it and records the window
/// events the controller cares about.
#[derive(Default)]
pub(super) struct WindowEvents {
    pending: Option<WindowAttributes>,
    window: Option<Arc<Window>>,
    create_error: Option<anyhow::Error>,

    pub close_requested: bool,
    pub resized: Option<PhysicalSize<u32>>,
}

impl WindowEvents {
    /// Queues window creation for the next pump.
    pub fn request_window(&mut self, attrs: WindowAttributes) {
        self.pending = Some(attrs);
        self.window = None;
        self.create_error = None;
        self.close_requested = false;
        self.resized = None;
    }

    pub fn window(&self) -> Option<Arc<Window>> {
        self.window.clone()
    }

    pub fn take_error(&mut self) -> Option<anyhow::Error> {
        self.create_error.take()
    }

    /// Forgets the window; its last `Arc` is dropped by the caller.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        let Some(attrs) = self.pending.take() else { return };

        match event_loop.create_window(attrs) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.create_error = Some(anyhow!("failed to create window: {e}")),
        }
    }
}

impl ApplicationHandler for WindowEvents {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.as_ref() else { return };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => self.close_requested = true,
            WindowEvent::Resized(size) => self.resized = Some(size),
            WindowEvent::ScaleFactorChanged { .. } => self.resized = Some(window.inner_size()),
            _ => {}
        }
    }
}
