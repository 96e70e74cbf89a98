//! GPU textures: storage, sampling state, texture units, file I/O and mipmaps.

mod format;
mod io;
mod mipmap;
mod pixels;
mod texture;
mod units;

pub use format::{Filter, PixelFormat, SamplerState, TextureKind, Wrap};
pub use mipmap::mip_level_count;
pub use texture::{Texture, TextureId};
pub use units::MAX_TEXTURE_UNITS;

pub(crate) use mipmap::MipGenerator;
pub(crate) use units::TextureUnits;
