use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};

use crate::texture::{MipGenerator, SamplerState, TextureUnits};

use super::error;
use super::ownership::{Acquire, ContextLock};
use super::GpuInit;

/// Cloneable handle to the GPU device context.
///
/// Holds the wgpu device/queue together with the ownership lock that decides
/// which thread may issue GPU work. Clones share everything, so a background
/// thread can hold one, `take_context`, upload textures and `release_context`
/// between frames of the render thread.
#[derive(Clone)]
pub struct GpuContext {
    shared: Arc<Shared>,
}

struct Shared {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    ownership: ContextLock,

    /// Texture-unit table consulted by textured primitives.
    units: TextureUnits,

    /// Samplers are immutable in wgpu; one per distinct sampling state.
    samplers: Mutex<HashMap<SamplerState, wgpu::Sampler>>,

    /// Built on the first `Texture::generate_mipmaps`.
    mipmaps: Mutex<Option<MipGenerator>>,
}

impl GpuContext {
    /// Creates a context without a surface (offscreen work, tools, tests).
    pub async fn new_headless(init: GpuInit) -> Result<Self> {
        let instance = create_instance();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        Self::from_adapter(adapter, &init).await
    }

    /// Blocking wrapper around [`GpuContext::new_headless`].
    pub fn headless(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new_headless(init))
    }

    pub(crate) async fn from_adapter(adapter: wgpu::Adapter, init: &GpuInit) -> Result<Self> {
        let features = init.required_features | (adapter.features() & init.optional_features);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("kiln device"),
                required_features: features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!("using GPU adapter {} ({:?})", info.name, info.backend);

        Ok(Self {
            shared: Arc::new(Shared {
                adapter,
                device,
                queue,
                ownership: ContextLock::new(),
                units: TextureUnits::default(),
                samplers: Mutex::new(HashMap::new()),
                mipmaps: Mutex::new(None),
            }),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.shared.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.shared.queue
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.shared.adapter.get_info()
    }

    /// Whether `other` is a handle to the same device context.
    pub fn same(&self, other: &GpuContext) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    // ── ownership ─────────────────────────────────────────────────────────

    /// Makes the calling thread the owner of the context.
    ///
    /// With `non_blocking` the call returns `false` immediately when another
    /// thread owns the context; otherwise it waits. Re-taking a context the
    /// calling thread already owns returns `false` with a warning.
    pub fn take_context(&self, non_blocking: bool) -> bool {
        let outcome = if non_blocking {
            self.shared.ownership.try_acquire()
        } else {
            self.shared.ownership.acquire()
        };

        match outcome {
            Acquire::Acquired => true,
            Acquire::Contended => false,
            Acquire::AlreadyOwned => {
                log::warn!("take_context: the calling thread already owns the graphics context");
                false
            }
        }
    }

    /// Gives up ownership. Returns `false` if the calling thread is not the owner.
    pub fn release_context(&self) -> bool {
        if self.shared.ownership.release() {
            return true;
        }
        log::warn!("release_context: the calling thread does not own the graphics context");
        false
    }

    /// Whether the calling thread currently owns the context.
    pub fn is_current(&self) -> bool {
        self.shared.ownership.is_owned_by_current_thread()
    }

    /// Fails unless the calling thread owns the context.
    pub fn ensure_current(&self) -> Result<()> {
        anyhow::ensure!(
            self.is_current(),
            "the graphics context is not held by the calling thread (call take_context first)"
        );
        Ok(())
    }

    pub(crate) fn acquire_blocking(&self) -> Acquire {
        self.shared.ownership.acquire()
    }

    // ── shared GPU state ──────────────────────────────────────────────────

    /// Runs `f` inside error scopes; see [`error::scoped`].
    pub(crate) fn scoped<T>(&self, what: &str, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T> {
        let device = &self.shared.device;
        error::scoped(device, what, || f(device))
    }

    pub(crate) fn units(&self) -> &TextureUnits {
        &self.shared.units
    }

    /// Returns the sampler for `state`, creating it on first use.
    pub(crate) fn sampler(&self, state: SamplerState) -> wgpu::Sampler {
        let mut samplers = self
            .shared
            .samplers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        samplers
            .entry(state)
            .or_insert_with(|| {
                let border = self
                    .device()
                    .features()
                    .contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);
                self.device().create_sampler(&state.descriptor(border))
            })
            .clone()
    }

    /// Runs `f` with the mipmap generator, building it on first use.
    pub(crate) fn with_mip_generator<T>(&self, f: impl FnOnce(&MipGenerator) -> T) -> T {
        let mut slot = self
            .shared
            .mipmaps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let generator = slot.get_or_insert_with(|| MipGenerator::new(self.device()));
        f(generator)
    }
}

pub(crate) fn create_instance() -> wgpu::Instance {
    // Use all backends to allow wgpu to select the optimal platform backend.
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Headless context for GPU-backed unit tests, or `None` when the machine has
/// no usable adapter. The context is already owned by the calling thread.
#[cfg(test)]
pub(crate) fn test_context() -> Option<GpuContext> {
    match GpuContext::headless(GpuInit::default()) {
        Ok(ctx) => {
            assert!(ctx.take_context(false));
            Some(ctx)
        }
        Err(e) => {
            eprintln!("skipping GPU test: {e:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn clones_are_the_same_context() {
        let Some(a) = test_context() else { return };
        let Some(b) = test_context() else { return };
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b));
    }

    #[test]
    fn ownership_is_shared_between_clones() {
        let Some(ctx) = test_context() else { return };
        let other = ctx.clone();

        let taken = thread::spawn(move || other.take_context(true)).join().unwrap();
        assert!(!taken);

        assert!(ctx.release_context());
        assert!(!ctx.is_current());
        assert!(ctx.ensure_current().is_err());
    }

    #[test]
    fn retaking_an_owned_context_returns_false() {
        let Some(ctx) = test_context() else { return };
        assert!(!ctx.take_context(true));
        assert!(ctx.is_current());
    }

    #[test]
    fn sampler_cache_returns_same_sampler_for_same_state() {
        let Some(ctx) = test_context() else { return };
        let state = SamplerState::default();
        let a = ctx.sampler(state);
        let b = ctx.sampler(state);
        assert_eq!(a, b);
    }
}
