use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;

use anyhow::{anyhow, bail, ensure, Context, Result};

use crate::device::GpuContext;

use super::io::{self, ImageFileFormat};
use super::mipmap::mip_level_count;
use super::units::{BoundTexture, MAX_TEXTURE_UNITS};
use super::{pixels, Filter, PixelFormat, SamplerState, TextureKind, Wrap};

/// Handle of a GPU texture. `0` is the empty texture.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    pub const EMPTY: Self = Self(0);

    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    mip_levels: u32,
    /// Kept so destroy/drop can clear unit bindings without a context argument.
    ctx: GpuContext,
}

impl GpuTexture {
    /// Fails when `ctx` is not the context this storage was allocated on.
    fn check_context(&self, ctx: &GpuContext, op: &str) -> Result<()> {
        ensure!(
            self.ctx.same(ctx),
            "{op}: texture belongs to a different graphics context"
        );
        Ok(())
    }
}

/// A GPU-resident image plus its format, size and sampling state.
///
/// Exclusively owned: not `Clone`. Moving is free; [`Texture::take`] moves the
/// resource out and leaves an empty texture behind. Dropping a valid texture
/// releases its GPU object.
///
/// Invariant: `id() == TextureId::EMPTY` exactly when `width() == 0 && height() == 0`.
pub struct Texture {
    id: TextureId,
    gpu: Option<GpuTexture>,
    kind: TextureKind,
    format: PixelFormat,
    width: u32,
    height: u32,
    sampling: SamplerState,
}

impl Default for Texture {
    fn default() -> Self {
        Self {
            id: TextureId::EMPTY,
            gpu: None,
            kind: TextureKind::Texture2d,
            format: PixelFormat::Rgba,
            width: 0,
            height: 0,
            sampling: SamplerState::clamped(),
        }
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mip_levels", &self.mip_level_count())
            .finish()
    }
}

impl Texture {
    /// An empty texture.
    pub fn new() -> Self {
        Self::default()
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn sampling(&self) -> SamplerState {
        self.sampling
    }

    /// Whether the texture's storage lives on `ctx`. Empty textures belong to no context.
    pub fn belongs_to(&self, ctx: &GpuContext) -> bool {
        self.gpu.as_ref().is_some_and(|gpu| gpu.ctx.same(ctx))
    }

    pub fn is_valid(&self) -> bool {
        self.gpu.is_some()
    }

    /// Bytes per pixel of the texture's own format.
    pub fn channel_count(&self) -> u32 {
        self.format.channel_count()
    }

    /// Allocated mip levels; 0 when empty.
    pub fn mip_level_count(&self) -> u32 {
        self.gpu.as_ref().map_or(0, |g| g.mip_levels)
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    /// Allocates uninitialized storage, replacing any previous GPU object.
    ///
    /// Sampling is reset to linear filtering with clamp-to-edge wrapping.
    pub fn create(
        &mut self,
        ctx: &GpuContext,
        width: u32,
        height: u32,
        format: PixelFormat,
        kind: TextureKind,
    ) -> Result<()> {
        ctx.ensure_current()?;
        check_dimensions(ctx, width, height, kind)?;

        self.destroy();

        let gpu = allocate(ctx, "texture create", width, height, format, kind, 1)?;
        self.install(gpu, width, height, format, kind, SamplerState::clamped());

        log::debug!("created {kind:?} texture {} ({width}x{height} {format:?})", self.id.get());
        Ok(())
    }

    /// Decodes an image file and uploads it; see [`Texture::load_from_data`].
    ///
    /// Gray images are expanded to RGB.
    pub fn load_from_file(
        &mut self,
        ctx: &GpuContext,
        path: impl AsRef<Path>,
        flip_vertically: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        ctx.ensure_current()?;

        let image = io::decode_file(path, flip_vertically)?;
        self.load_from_data(ctx, &image.pixels, image.width, image.height, image.format)
            .with_context(|| format!("failed to upload {}", path.display()))
    }

    /// Uploads tightly packed rows (top row first) into a new 2D texture.
    ///
    /// `data` must be exactly `width × height × channel_count(format)` bytes.
    /// Sampling is reset to linear filtering with repeat wrapping.
    pub fn load_from_data(
        &mut self,
        ctx: &GpuContext,
        data: &[u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<()> {
        ctx.ensure_current()?;
        ensure!(!data.is_empty(), "no pixel data");
        ensure!(
            !format.is_depth(),
            "cannot upload pixel data to a {format:?} texture"
        );
        check_dimensions(ctx, width, height, TextureKind::Texture2d)?;

        let expected = byte_len(width, height, format)?;
        ensure!(
            data.len() == expected,
            "pixel data is {} bytes for {width}x{height} {format:?} (expected {expected})",
            data.len()
        );

        self.destroy();

        let rgba: Cow<'_, [u8]> = match format {
            PixelFormat::Rgb => Cow::Owned(pixels::rgb_to_rgba(data)),
            _ => Cow::Borrowed(data),
        };

        let gpu = allocate(ctx, "texture upload", width, height, format, TextureKind::Texture2d, 1)?;

        ctx.scoped("texture upload", |_| {
            ctx.queue().write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &gpu.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        })?;

        self.install(gpu, width, height, format, TextureKind::Texture2d, SamplerState::repeating());
        Ok(())
    }

    /// Releases the GPU object and returns to the empty state.
    ///
    /// Any texture unit still pointing at this texture is unbound. Safe to call
    /// on an empty texture.
    pub fn destroy(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            gpu.ctx.units().unbind_id(self.id);
            gpu.texture.destroy();
        }

        self.id = TextureId::EMPTY;
        self.width = 0;
        self.height = 0;
    }

    /// Moves the resource out, leaving `self` empty.
    pub fn take(&mut self) -> Texture {
        std::mem::take(self)
    }

    // ── binding ───────────────────────────────────────────────────────────

    /// Makes this texture the current texture of `unit`.
    pub fn bind(&self, ctx: &GpuContext, unit: u32) -> Result<()> {
        ctx.ensure_current()?;

        if unit >= MAX_TEXTURE_UNITS {
            log::warn!("bind: texture unit {unit} out of range (max {})", MAX_TEXTURE_UNITS - 1);
            return Ok(());
        }
        let Some(gpu) = self.gpu.as_ref() else {
            log::warn!("bind: texture is empty");
            return Ok(());
        };
        gpu.check_context(ctx, "bind")?;

        ctx.units().bind(
            unit,
            BoundTexture {
                id: self.id,
                view: gpu.view.clone(),
                sampler: ctx.sampler(self.sampling),
            },
        );
        Ok(())
    }

    /// Clears whatever texture is bound to `unit`.
    pub fn unbind(ctx: &GpuContext, unit: u32) -> Result<()> {
        ctx.ensure_current()?;

        if unit >= MAX_TEXTURE_UNITS {
            log::warn!("unbind: texture unit {unit} out of range (max {})", MAX_TEXTURE_UNITS - 1);
            return Ok(());
        }
        ctx.units().unbind(unit);
        Ok(())
    }

    // ── sampling ──────────────────────────────────────────────────────────

    /// Sets minification and magnification filters.
    ///
    /// Magnification never uses mip levels; a mipmap variant is reduced to its
    /// in-level filter.
    pub fn set_filter(&mut self, min: Filter, mag: Filter) {
        if self.gpu.is_none() {
            log::warn!("set_filter: texture is empty");
            return;
        }

        let mag = match mag.texel() {
            wgpu::FilterMode::Nearest => Filter::Nearest,
            wgpu::FilterMode::Linear => Filter::Linear,
        };
        if min.uses_mipmaps() && self.mip_level_count() <= 1 {
            log::debug!("set_filter: {min:?} on texture {} without mipmaps", self.id.get());
        }

        self.sampling.min_filter = min;
        self.sampling.mag_filter = mag;
        self.refresh_sampler();
    }

    /// Sets the S (horizontal) and T (vertical) wrap modes.
    pub fn set_wrap(&mut self, s: Wrap, t: Wrap) {
        let Some(gpu) = self.gpu.as_ref() else {
            log::warn!("set_wrap: texture is empty");
            return;
        };

        let border = gpu
            .ctx
            .device()
            .features()
            .contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);
        let resolve = |w: Wrap| {
            if w == Wrap::ClampToBorder && !border {
                log::warn!("set_wrap: ClampToBorder unsupported by this device; using ClampToEdge");
                Wrap::ClampToEdge
            } else {
                w
            }
        };

        self.sampling.wrap_s = resolve(s);
        self.sampling.wrap_t = resolve(t);
        self.refresh_sampler();
    }

    fn refresh_sampler(&self) {
        if let Some(gpu) = self.gpu.as_ref() {
            let sampler = gpu.ctx.sampler(self.sampling);
            gpu.ctx.units().replace_sampler(self.id, &sampler);
        }
    }

    // ── mipmaps ───────────────────────────────────────────────────────────

    /// Fills a full mip chain from level 0.
    ///
    /// Storage allocated without mip levels is reallocated (level 0 is
    /// copied over); the texture keeps its id and bindings.
    pub fn generate_mipmaps(&mut self, ctx: &GpuContext) -> Result<()> {
        ctx.ensure_current()?;

        let Some(gpu) = self.gpu.as_mut() else {
            log::warn!("generate_mipmaps: texture is empty");
            return Ok(());
        };
        gpu.check_context(ctx, "generate_mipmaps")?;
        if self.format.is_depth() {
            log::warn!("generate_mipmaps: {:?} textures have no mipmaps", self.format);
            return Ok(());
        }

        let levels = mip_level_count(self.width, self.height);
        if levels <= 1 {
            return Ok(());
        }

        let layers = self.kind.layer_count();

        if gpu.mip_levels < levels {
            let grown = allocate(
                ctx,
                "mipmap allocation",
                self.width,
                self.height,
                self.format,
                self.kind,
                levels,
            )?;

            ctx.scoped("mipmap level 0 copy", |device| {
                let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("kiln mip copy encoder"),
                });
                encoder.copy_texture_to_texture(
                    gpu.texture.as_image_copy(),
                    grown.texture.as_image_copy(),
                    wgpu::Extent3d {
                        width: self.width,
                        height: self.height,
                        depth_or_array_layers: layers,
                    },
                );
                ctx.queue().submit(Some(encoder.finish()));
            })?;

            let old = std::mem::replace(gpu, grown);
            old.texture.destroy();
            ctx.units().replace_view(self.id, &gpu.view);
        }

        let texture = &gpu.texture;
        ctx.scoped("mipmap generation", |device| {
            ctx.with_mip_generator(|generator| {
                generator.generate(device, ctx.queue(), texture, levels, layers)
            })
        })?;

        log::debug!("generated {levels} mip levels for texture {}", self.id.get());
        Ok(())
    }

    // ── readback ──────────────────────────────────────────────────────────

    /// Copies level 0 into `buffer` as tightly packed rows, top row first.
    ///
    /// `format` defaults to the texture's own. Color textures read as RGB or
    /// RGBA; depth textures read as `Depth` (one unorm byte per pixel).
    /// `buffer` must be exactly `width × height × channel_count(format)` bytes.
    pub fn read_pixels(
        &self,
        ctx: &GpuContext,
        buffer: &mut [u8],
        format: Option<PixelFormat>,
    ) -> Result<()> {
        ctx.ensure_current()?;

        let gpu = self.gpu.as_ref().context("read_pixels: texture is empty")?;
        gpu.check_context(ctx, "read_pixels")?;
        ensure!(
            self.kind == TextureKind::Texture2d,
            "read_pixels: cube map readback is not supported"
        );

        let target = format.unwrap_or(self.format);
        match (self.format, target) {
            (PixelFormat::Rgb | PixelFormat::Rgba, PixelFormat::Rgb | PixelFormat::Rgba) => {}
            (PixelFormat::Depth, PixelFormat::Depth) => {}
            (PixelFormat::DepthStencil, _) => {
                bail!("read_pixels: depth-stencil readback is not supported")
            }
            (src, dst) => bail!("read_pixels: cannot read a {src:?} texture as {dst:?}"),
        }

        let expected = byte_len(self.width, self.height, target)?;
        ensure!(
            buffer.len() == expected,
            "read_pixels: buffer is {} bytes, expected {expected}",
            buffer.len()
        );

        let raw = read_level0(ctx, gpu, self.width, self.height, self.format)?;
        let converted = match target {
            PixelFormat::Rgba => raw,
            PixelFormat::Rgb => pixels::rgba_to_rgb(&raw),
            _ => pixels::depth_to_unorm8(&raw),
        };

        buffer.copy_from_slice(&converted);
        Ok(())
    }

    /// Reads level 0 back and encodes it; the extension picks the container
    /// (png, bmp, tga, jpg/jpeg). `quality` applies to JPEG only.
    pub fn save_to_file(
        &self,
        ctx: &GpuContext,
        path: impl AsRef<Path>,
        flip_vertically: bool,
        quality: u8,
    ) -> Result<()> {
        let path = path.as_ref();
        let file_format = ImageFileFormat::from_path(path)?;
        ctx.ensure_current()?;

        ensure!(self.is_valid(), "save_to_file: texture is empty");

        let read_as = match (self.format, file_format) {
            (PixelFormat::DepthStencil, _) => {
                bail!("save_to_file: depth-stencil textures cannot be saved")
            }
            (PixelFormat::Rgba, ImageFileFormat::Jpeg) => PixelFormat::Rgb,
            (format, _) => format,
        };

        let mut data = vec![0u8; byte_len(self.width, self.height, read_as)?];
        self.read_pixels(ctx, &mut data, Some(read_as))?;

        let channels = read_as.channel_count();
        if flip_vertically {
            pixels::flip_rows(&mut data, (self.width * channels) as usize);
        }

        io::encode_file(path, &data, self.width, self.height, channels, file_format, quality)?;
        log::debug!("saved texture {} to {}", self.id.get(), path.display());
        Ok(())
    }

    // ── crate-internal ────────────────────────────────────────────────────

    /// Render-attachment view for drawing into a color 2D texture.
    pub(crate) fn target_view(&self) -> Option<&wgpu::TextureView> {
        match (&self.gpu, self.kind, self.format.is_depth()) {
            (Some(gpu), TextureKind::Texture2d, false) => Some(&gpu.view),
            _ => None,
        }
    }

    fn install(
        &mut self,
        gpu: GpuTexture,
        width: u32,
        height: u32,
        format: PixelFormat,
        kind: TextureKind,
        sampling: SamplerState,
    ) {
        self.id = TextureId::next();
        self.gpu = Some(gpu);
        self.width = width;
        self.height = height;
        self.format = format;
        self.kind = kind;
        self.sampling = sampling;
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if self.gpu.is_some() {
            #[cfg(debug_assertions)]
            log::debug!(
                "texture {} ({}x{}) dropped while valid; releasing GPU object",
                self.id.get(),
                self.width,
                self.height
            );
            self.destroy();
        }
    }
}

fn check_dimensions(ctx: &GpuContext, width: u32, height: u32, kind: TextureKind) -> Result<()> {
    ensure!(
        width > 0 && height > 0,
        "texture dimensions must be non-zero (got {width}x{height})"
    );
    if kind == TextureKind::CubeMap {
        ensure!(width == height, "cube map faces must be square (got {width}x{height})");
    }

    let max = ctx.device().limits().max_texture_dimension_2d;
    ensure!(
        width <= max && height <= max,
        "texture {width}x{height} exceeds the device limit of {max}"
    );
    Ok(())
}

fn byte_len(width: u32, height: u32, format: PixelFormat) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(format.channel_count() as usize))
        .context("texture byte size overflows")
}

fn allocate(
    ctx: &GpuContext,
    what: &str,
    width: u32,
    height: u32,
    format: PixelFormat,
    kind: TextureKind,
    mip_levels: u32,
) -> Result<GpuTexture> {
    let (texture, view) = ctx.scoped(what, |device| {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("kiln texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: kind.layer_count(),
            },
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: format.storage_format(),
            usage: format.usage(),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("kiln texture view"),
            dimension: Some(kind.view_dimension()),
            ..Default::default()
        });
        (texture, view)
    })?;

    Ok(GpuTexture {
        texture,
        view,
        mip_levels,
        ctx: ctx.clone(),
    })
}

/// Reads mip level 0 in storage layout (4 bytes per texel), padding removed.
fn read_level0(
    ctx: &GpuContext,
    gpu: &GpuTexture,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    let unpadded = 4 * width;
    let padded = pixels::padded_bytes_per_row(unpadded);

    let staging = ctx.scoped("texture readback", |device| {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kiln readback buffer"),
            size: u64::from(padded) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kiln readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: format.copy_aspect(),
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        ctx.queue().submit(Some(encoder.finish()));
        staging
    })?;

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    ctx.device()
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| anyhow!("device poll failed: {e:?}"))?;

    rx.recv()
        .context("readback map callback was dropped")?
        .map_err(|e| anyhow!("failed to map readback buffer: {e}"))?;

    let mapped = slice.get_mapped_range();
    let out = pixels::unpad_rows(&mapped, unpadded, padded, height);
    drop(mapped);
    staging.unmap();

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::test_context;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("kiln-texture-{}-{name}", std::process::id()))
    }

    fn checker(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                data.extend_from_slice(&[v, (x * 16) as u8, (y * 16) as u8, 255]);
            }
        }
        data
    }

    // ── without a device ──────────────────────────────────────────────────

    #[test]
    fn default_texture_is_empty() {
        let t = Texture::new();
        assert_eq!(t.id(), TextureId::EMPTY);
        assert_eq!((t.width(), t.height()), (0, 0));
        assert!(!t.is_valid());
        assert_eq!(t.mip_level_count(), 0);
    }

    #[test]
    fn destroy_on_empty_is_safe() {
        let mut t = Texture::new();
        t.destroy();
        t.destroy();
        assert!(!t.is_valid());
    }

    #[test]
    fn setters_on_empty_texture_are_ignored() {
        let mut t = Texture::new();
        t.set_filter(Filter::Nearest, Filter::Nearest);
        t.set_wrap(Wrap::Repeat, Wrap::Repeat);
        assert_eq!(t.sampling(), SamplerState::clamped());
    }

    // ── create / destroy ──────────────────────────────────────────────────

    #[test]
    fn create_sets_dimensions_and_destroy_clears_them() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();

        t.create(&ctx, 64, 32, PixelFormat::Rgba, TextureKind::Texture2d).unwrap();
        assert!(t.is_valid());
        assert!(!t.id().is_empty());
        assert_eq!((t.width(), t.height()), (64, 32));
        assert_eq!(t.sampling(), SamplerState::clamped());

        t.destroy();
        assert!(!t.is_valid());
        assert_eq!((t.width(), t.height()), (0, 0));
        t.destroy();
    }

    #[test]
    fn create_rejects_zero_size() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        assert!(t.create(&ctx, 0, 100, PixelFormat::Rgba, TextureKind::Texture2d).is_err());
        assert!(!t.is_valid());
        assert_eq!(t.id(), TextureId::EMPTY);
    }

    #[test]
    fn cube_maps_must_be_square() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        assert!(t.create(&ctx, 16, 8, PixelFormat::Rgba, TextureKind::CubeMap).is_err());
        t.create(&ctx, 16, 16, PixelFormat::Rgba, TextureKind::CubeMap).unwrap();
        assert_eq!(t.kind(), TextureKind::CubeMap);
    }

    #[test]
    fn recreate_replaces_previous_object() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        t.create(&ctx, 8, 8, PixelFormat::Rgba, TextureKind::Texture2d).unwrap();
        let first = t.id();
        t.create(&ctx, 4, 4, PixelFormat::Rgb, TextureKind::Texture2d).unwrap();
        assert_ne!(t.id(), first);
        assert_eq!(t.format(), PixelFormat::Rgb);
    }

    #[test]
    fn gpu_calls_fail_without_context_ownership() {
        let Some(ctx) = test_context() else { return };
        assert!(ctx.release_context());

        let mut t = Texture::new();
        assert!(t.create(&ctx, 4, 4, PixelFormat::Rgba, TextureKind::Texture2d).is_err());
    }

    // ── load_from_data ────────────────────────────────────────────────────

    #[test]
    fn load_rejects_empty_and_mis_sized_data() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        assert!(t.load_from_data(&ctx, &[], 10, 10, PixelFormat::Rgba).is_err());
        assert!(t.load_from_data(&ctx, &[0; 12], 2, 2, PixelFormat::Rgba).is_err());
        assert!(t.load_from_data(&ctx, &[0; 20], 2, 2, PixelFormat::Rgba).is_err());
        assert!(t.load_from_data(&ctx, &[0; 16], 2, 2, PixelFormat::Rgb).is_err());
        assert!(t.load_from_data(&ctx, &[0; 16], 2, 2, PixelFormat::Depth).is_err());
        assert!(!t.is_valid());
    }

    #[test]
    fn load_then_read_back_rgba() {
        let Some(ctx) = test_context() else { return };
        let data = checker(5, 3);
        let mut t = Texture::new();
        t.load_from_data(&ctx, &data, 5, 3, PixelFormat::Rgba).unwrap();
        assert_eq!(t.sampling(), SamplerState::repeating());

        let mut out = vec![0u8; data.len()];
        t.read_pixels(&ctx, &mut out, None).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn rgb_upload_reads_back_as_rgb() {
        let Some(ctx) = test_context() else { return };
        let rgb = [10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 110, 120];
        let mut t = Texture::new();
        t.load_from_data(&ctx, &rgb, 2, 2, PixelFormat::Rgb).unwrap();

        let mut out = [0u8; 12];
        t.read_pixels(&ctx, &mut out, None).unwrap();
        assert_eq!(out, rgb);

        let mut rgba = [0u8; 16];
        t.read_pixels(&ctx, &mut rgba, Some(PixelFormat::Rgba)).unwrap();
        assert_eq!(&rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn read_pixels_checks_buffer_size_and_format() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        t.load_from_data(&ctx, &checker(4, 4), 4, 4, PixelFormat::Rgba).unwrap();

        let mut short = vec![0u8; 10];
        assert!(t.read_pixels(&ctx, &mut short, None).is_err());

        let mut depth = vec![0u8; 16];
        assert!(t.read_pixels(&ctx, &mut depth, Some(PixelFormat::Depth)).is_err());
    }

    #[test]
    fn depth_stencil_readback_fails() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        t.create(&ctx, 4, 4, PixelFormat::DepthStencil, TextureKind::Texture2d).unwrap();
        let mut out = vec![0u8; 32];
        assert!(t.read_pixels(&ctx, &mut out, None).is_err());
    }

    // ── ownership ─────────────────────────────────────────────────────────

    #[test]
    fn take_moves_resource_and_empties_source() {
        let Some(ctx) = test_context() else { return };
        let mut b = Texture::new();
        b.create(&ctx, 16, 8, PixelFormat::Rgba, TextureKind::Texture2d).unwrap();
        let id = b.id();

        let a = b.take();
        assert_eq!(a.id(), id);
        assert_eq!((a.width(), a.height()), (16, 8));
        assert!(!b.is_valid());
        assert_eq!(b.id(), TextureId::EMPTY);
    }

    #[test]
    fn assignment_frees_previous_and_bindings() {
        let Some(ctx) = test_context() else { return };
        let mut a = Texture::new();
        a.create(&ctx, 4, 4, PixelFormat::Rgba, TextureKind::Texture2d).unwrap();
        a.bind(&ctx, 3).unwrap();
        assert!(ctx.units().get(3).is_some());

        let mut b = Texture::new();
        b.create(&ctx, 2, 2, PixelFormat::Rgba, TextureKind::Texture2d).unwrap();
        let b_id = b.id();

        a = b.take();
        assert_eq!(a.id(), b_id);
        assert!(ctx.units().get(3).is_none());
    }

    // ── binding ───────────────────────────────────────────────────────────

    #[test]
    fn bind_and_unbind_units() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        t.create(&ctx, 4, 4, PixelFormat::Rgba, TextureKind::Texture2d).unwrap();

        t.bind(&ctx, 0).unwrap();
        assert_eq!(ctx.units().get(0).map(|b| b.id), Some(t.id()));

        // Out-of-range unit warns and is ignored.
        t.bind(&ctx, MAX_TEXTURE_UNITS).unwrap();
        assert!(ctx.units().get(MAX_TEXTURE_UNITS).is_none());

        Texture::unbind(&ctx, 0).unwrap();
        assert!(ctx.units().get(0).is_none());
    }

    #[test]
    fn operations_reject_a_foreign_context() {
        let Some(ctx) = test_context() else { return };
        let Some(other) = test_context() else { return };
        let mut t = Texture::new();
        t.load_from_data(&ctx, &checker(4, 4), 4, 4, PixelFormat::Rgba).unwrap();
        assert!(t.belongs_to(&ctx));
        assert!(!t.belongs_to(&other));

        assert!(t.bind(&other, 0).is_err());
        assert!(other.units().get(0).is_none());

        let mut out = vec![0u8; 4 * 4 * 4];
        assert!(t.read_pixels(&other, &mut out, None).is_err());
        assert!(t.generate_mipmaps(&other).is_err());
        assert_eq!(t.mip_level_count(), 1);

        // Still usable on its own context.
        t.read_pixels(&ctx, &mut out, None).unwrap();
        assert_eq!(out, checker(4, 4));
    }

    #[test]
    fn destroy_unbinds_texture() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        t.create(&ctx, 4, 4, PixelFormat::Rgba, TextureKind::Texture2d).unwrap();
        t.bind(&ctx, 1).unwrap();
        t.destroy();
        assert!(ctx.units().get(1).is_none());
    }

    #[test]
    fn filter_and_wrap_update_sampling() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        t.create(&ctx, 4, 4, PixelFormat::Rgba, TextureKind::Texture2d).unwrap();

        t.set_filter(Filter::LinearMipmapLinear, Filter::NearestMipmapNearest);
        assert_eq!(t.sampling().min_filter, Filter::LinearMipmapLinear);
        assert_eq!(t.sampling().mag_filter, Filter::Nearest);

        t.set_wrap(Wrap::MirroredRepeat, Wrap::Repeat);
        assert_eq!(t.sampling().wrap_s, Wrap::MirroredRepeat);
        assert_eq!(t.sampling().wrap_t, Wrap::Repeat);
    }

    // ── mipmaps ───────────────────────────────────────────────────────────

    #[test]
    fn generate_mipmaps_keeps_identity_and_level_zero() {
        let Some(ctx) = test_context() else { return };
        let data = checker(16, 8);
        let mut t = Texture::new();
        t.load_from_data(&ctx, &data, 16, 8, PixelFormat::Rgba).unwrap();
        let id = t.id();

        t.generate_mipmaps(&ctx).unwrap();
        assert_eq!(t.mip_level_count(), 5);
        assert_eq!(t.id(), id);

        let mut out = vec![0u8; data.len()];
        t.read_pixels(&ctx, &mut out, None).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn generate_mipmaps_skips_depth() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        t.create(&ctx, 8, 8, PixelFormat::Depth, TextureKind::Texture2d).unwrap();
        t.generate_mipmaps(&ctx).unwrap();
        assert_eq!(t.mip_level_count(), 1);
    }

    // ── files ─────────────────────────────────────────────────────────────

    #[test]
    fn png_round_trip_preserves_pixels() {
        let Some(ctx) = test_context() else { return };
        let data = checker(7, 5);
        let mut t = Texture::new();
        t.load_from_data(&ctx, &data, 7, 5, PixelFormat::Rgba).unwrap();

        let path = temp_path("roundtrip.png");
        t.save_to_file(&ctx, &path, false, 90).unwrap();

        let mut loaded = Texture::new();
        loaded.load_from_file(&ctx, &path, false).unwrap();
        assert_eq!(loaded.format(), PixelFormat::Rgba);
        assert_eq!((loaded.width(), loaded.height()), (7, 5));

        let mut out = vec![0u8; data.len()];
        loaded.read_pixels(&ctx, &mut out, None).unwrap();
        assert_eq!(out, data);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn flipped_save_reverses_rows() {
        let Some(ctx) = test_context() else { return };
        let data = checker(3, 4);
        let mut t = Texture::new();
        t.load_from_data(&ctx, &data, 3, 4, PixelFormat::Rgba).unwrap();

        let path = temp_path("flipped.png");
        t.save_to_file(&ctx, &path, true, 90).unwrap();

        let mut loaded = Texture::new();
        loaded.load_from_file(&ctx, &path, true).unwrap();
        let mut out = vec![0u8; data.len()];
        loaded.read_pixels(&ctx, &mut out, None).unwrap();
        assert_eq!(out, data);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn jpeg_save_drops_alpha() {
        let Some(ctx) = test_context() else { return };
        let mut t = Texture::new();
        t.load_from_data(&ctx, &checker(8, 8), 8, 8, PixelFormat::Rgba).unwrap();

        let path = temp_path("shot.JPG");
        t.save_to_file(&ctx, &path, false, 0).unwrap();

        let mut loaded = Texture::new();
        loaded.load_from_file(&ctx, &path, false).unwrap();
        assert_eq!(loaded.format(), PixelFormat::Rgb);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unsupported_extension_fails_before_gpu_work() {
        let Some(ctx) = test_context() else { return };
        let t = Texture::new();
        let err = t.save_to_file(&ctx, temp_path("x.gif"), false, 90).unwrap_err();
        assert!(format!("{err:#}").contains("unsupported image extension"));
    }
}
