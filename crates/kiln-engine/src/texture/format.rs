/// Pixel layout of a texture as seen by callers.
///
/// Storage on the GPU may differ: RGB is kept as RGBA8 because wgpu has no
/// three-channel 8-bit format, and is expanded on upload / packed on readback.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    Rgb,
    #[default]
    Rgba,
    Depth,
    DepthStencil,
}

impl PixelFormat {
    /// Bytes per pixel in caller-facing buffers.
    #[inline]
    pub const fn channel_count(self) -> u32 {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Rgb => 3,
            PixelFormat::Depth => 1,
            PixelFormat::DepthStencil => 2,
        }
    }

    #[inline]
    pub const fn is_depth(self) -> bool {
        matches!(self, PixelFormat::Depth | PixelFormat::DepthStencil)
    }

    pub(crate) const fn storage_format(self) -> wgpu::TextureFormat {
        match self {
            PixelFormat::Rgb | PixelFormat::Rgba => wgpu::TextureFormat::Rgba8Unorm,
            PixelFormat::Depth => wgpu::TextureFormat::Depth32Float,
            PixelFormat::DepthStencil => wgpu::TextureFormat::Depth24PlusStencil8,
        }
    }

    pub(crate) fn usage(self) -> wgpu::TextureUsages {
        use wgpu::TextureUsages as U;
        match self {
            PixelFormat::Rgb | PixelFormat::Rgba => {
                U::TEXTURE_BINDING | U::COPY_DST | U::COPY_SRC | U::RENDER_ATTACHMENT
            }
            // Depth32Float cannot be a copy destination.
            PixelFormat::Depth => U::TEXTURE_BINDING | U::COPY_SRC | U::RENDER_ATTACHMENT,
            PixelFormat::DepthStencil => U::TEXTURE_BINDING | U::RENDER_ATTACHMENT,
        }
    }

    /// Aspect copied by readback.
    pub(crate) const fn copy_aspect(self) -> wgpu::TextureAspect {
        match self {
            PixelFormat::Depth => wgpu::TextureAspect::DepthOnly,
            _ => wgpu::TextureAspect::All,
        }
    }
}

/// Dimensionality of a texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    #[default]
    Texture2d,
    /// Six square faces stored as array layers.
    CubeMap,
}

impl TextureKind {
    #[inline]
    pub const fn layer_count(self) -> u32 {
        match self {
            TextureKind::Texture2d => 1,
            TextureKind::CubeMap => 6,
        }
    }

    pub(crate) const fn view_dimension(self) -> wgpu::TextureViewDimension {
        match self {
            TextureKind::Texture2d => wgpu::TextureViewDimension::D2,
            TextureKind::CubeMap => wgpu::TextureViewDimension::Cube,
        }
    }
}

/// Texture filtering. The mipmap variants only make sense as a minification filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl Filter {
    /// Filter used within a mip level.
    pub(crate) const fn texel(self) -> wgpu::FilterMode {
        match self {
            Filter::Nearest | Filter::NearestMipmapNearest | Filter::NearestMipmapLinear => {
                wgpu::FilterMode::Nearest
            }
            Filter::Linear | Filter::LinearMipmapNearest | Filter::LinearMipmapLinear => {
                wgpu::FilterMode::Linear
            }
        }
    }

    /// Filter between mip levels, or `None` when only level 0 is sampled.
    pub(crate) const fn mipmap(self) -> Option<wgpu::MipmapFilterMode> {
        match self {
            Filter::Nearest | Filter::Linear => None,
            Filter::NearestMipmapNearest | Filter::LinearMipmapNearest => {
                Some(wgpu::MipmapFilterMode::Nearest)
            }
            Filter::NearestMipmapLinear | Filter::LinearMipmapLinear => {
                Some(wgpu::MipmapFilterMode::Linear)
            }
        }
    }

    #[inline]
    pub const fn uses_mipmaps(self) -> bool {
        self.mipmap().is_some()
    }
}

/// Texture coordinate wrapping.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Wrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    /// Needs `Features::ADDRESS_MODE_CLAMP_TO_BORDER`; otherwise clamps to edge.
    ClampToBorder,
}

impl Wrap {
    const fn address_mode(self, border_supported: bool) -> wgpu::AddressMode {
        match self {
            Wrap::Repeat => wgpu::AddressMode::Repeat,
            Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
            Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            Wrap::ClampToBorder if border_supported => wgpu::AddressMode::ClampToBorder,
            Wrap::ClampToBorder => wgpu::AddressMode::ClampToEdge,
        }
    }
}

/// Complete sampling state of a texture; the sampler cache key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SamplerState {
    pub min_filter: Filter,
    pub mag_filter: Filter,
    pub wrap_s: Wrap,
    pub wrap_t: Wrap,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self::clamped()
    }
}

impl SamplerState {
    /// Linear filtering, clamp-to-edge. Used for freshly created storage.
    pub const fn clamped() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            wrap_s: Wrap::ClampToEdge,
            wrap_t: Wrap::ClampToEdge,
        }
    }

    /// Linear filtering, repeat. Used for textures loaded from pixel data.
    pub const fn repeating() -> Self {
        Self {
            min_filter: Filter::Linear,
            mag_filter: Filter::Linear,
            wrap_s: Wrap::Repeat,
            wrap_t: Wrap::Repeat,
        }
    }

    pub(crate) fn descriptor(self, border_supported: bool) -> wgpu::SamplerDescriptor<'static> {
        let (mipmap_filter, lod_max_clamp) = match self.min_filter.mipmap() {
            Some(mode) => (mode, 32.0),
            None => (wgpu::MipmapFilterMode::Nearest, 0.0),
        };
        let uses_border = border_supported
            && (self.wrap_s == Wrap::ClampToBorder || self.wrap_t == Wrap::ClampToBorder);

        wgpu::SamplerDescriptor {
            label: Some("kiln texture sampler"),
            address_mode_u: self.wrap_s.address_mode(border_supported),
            address_mode_v: self.wrap_t.address_mode(border_supported),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: self.mag_filter.texel(),
            min_filter: self.min_filter.texel(),
            mipmap_filter,
            lod_min_clamp: 0.0,
            lod_max_clamp,
            compare: None,
            anisotropy_clamp: 1,
            border_color: uses_border.then_some(wgpu::SamplerBorderColor::TransparentBlack),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_counts() {
        assert_eq!(PixelFormat::Rgba.channel_count(), 4);
        assert_eq!(PixelFormat::Rgb.channel_count(), 3);
        assert_eq!(PixelFormat::Depth.channel_count(), 1);
        assert_eq!(PixelFormat::DepthStencil.channel_count(), 2);
    }

    #[test]
    fn rgb_is_stored_as_rgba8() {
        assert_eq!(PixelFormat::Rgb.storage_format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(PixelFormat::Rgba.storage_format(), wgpu::TextureFormat::Rgba8Unorm);
    }

    // ── sampler descriptors ───────────────────────────────────────────────

    #[test]
    fn non_mipmap_min_filter_samples_level_zero_only() {
        let desc = SamplerState::clamped().descriptor(true);
        assert_eq!(desc.lod_max_clamp, 0.0);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Linear);
    }

    #[test]
    fn mipmap_min_filter_enables_lod() {
        let state = SamplerState {
            min_filter: Filter::NearestMipmapLinear,
            ..SamplerState::repeating()
        };
        let desc = state.descriptor(true);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(desc.mipmap_filter, wgpu::MipmapFilterMode::Linear);
        assert!(desc.lod_max_clamp > 0.0);
        assert_eq!(desc.address_mode_u, wgpu::AddressMode::Repeat);
    }

    #[test]
    fn clamp_to_border_falls_back_without_feature() {
        let state = SamplerState {
            wrap_s: Wrap::ClampToBorder,
            ..SamplerState::clamped()
        };

        let supported = state.descriptor(true);
        assert_eq!(supported.address_mode_u, wgpu::AddressMode::ClampToBorder);
        assert!(supported.border_color.is_some());

        let fallback = state.descriptor(false);
        assert_eq!(fallback.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert!(fallback.border_color.is_none());
    }
}
