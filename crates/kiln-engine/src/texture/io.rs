use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageFormat};

use super::PixelFormat;

/// Decoded image ready for upload: tightly packed rows, top row first.
pub(crate) struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// Decodes an image file.
///
/// One- and three-channel images become RGB, four-channel images RGBA. Other
/// layouts (e.g. gray + alpha) are rejected.
pub(crate) fn decode_file(path: &Path, flip_vertically: bool) -> Result<DecodedImage> {
    let mut image = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?;

    if flip_vertically {
        image = image.flipv();
    }

    let (width, height) = (image.width(), image.height());
    let channels = image.color().channel_count();

    let (pixels, format) = match channels {
        1 | 3 => (image.to_rgb8().into_raw(), PixelFormat::Rgb),
        4 => (image.to_rgba8().into_raw(), PixelFormat::Rgba),
        n => bail!(
            "unsupported channel count {n} in {} (expected 1, 3 or 4)",
            path.display()
        ),
    };

    Ok(DecodedImage {
        pixels,
        width,
        height,
        format,
    })
}

/// Output container, chosen from the file extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ImageFileFormat {
    Png,
    Bmp,
    Tga,
    Jpeg,
}

impl ImageFileFormat {
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .with_context(|| format!("{} has no file extension", path.display()))?;

        Ok(match ext.as_str() {
            "png" => Self::Png,
            "bmp" => Self::Bmp,
            "tga" => Self::Tga,
            "jpg" | "jpeg" => Self::Jpeg,
            other => bail!("unsupported image extension '.{other}' (use png, bmp, tga or jpg)"),
        })
    }
}

fn color_type(channels: u32) -> Result<ExtendedColorType> {
    Ok(match channels {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        4 => ExtendedColorType::Rgba8,
        n => bail!("cannot encode {n}-channel pixels"),
    })
}

/// Encodes tightly packed pixels to `path`.
///
/// JPEG has no alpha: callers pass RGB for it. `quality` only affects JPEG and
/// is clamped to `1..=100`.
pub(crate) fn encode_file(
    path: &Path,
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: u32,
    format: ImageFileFormat,
    quality: u8,
) -> Result<()> {
    let color = color_type(channels)?;

    match format {
        ImageFileFormat::Jpeg => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality.clamp(1, 100));
            encoder.encode(pixels, width, height, color)
        }
        ImageFileFormat::Png => image::save_buffer_with_format(path, pixels, width, height, color, ImageFormat::Png),
        ImageFileFormat::Bmp => image::save_buffer_with_format(path, pixels, width, height, color, ImageFormat::Bmp),
        ImageFileFormat::Tga => image::save_buffer_with_format(path, pixels, width, height, color, ImageFormat::Tga),
    }
    .with_context(|| format!("failed to encode {}", path.display()))
}
