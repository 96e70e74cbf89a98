//! CPU-side pixel conversions between caller buffers and GPU storage.
//!
//! Caller buffers are tightly packed rows, top row first. GPU readback rows
//! are padded to `wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`.

/// Expands packed RGB to RGBA with opaque alpha.
pub(crate) fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    out
}

/// Drops the alpha channel of packed RGBA.
pub(crate) fn rgba_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    out
}

/// Converts little-endian `f32` depth samples to unorm bytes.
pub(crate) fn depth_to_unorm8(depth: &[u8]) -> Vec<u8> {
    depth
        .chunks_exact(4)
        .map(|b| {
            let d = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
            (d.clamp(0.0, 1.0) * 255.0).round() as u8
        })
        .collect()
}

/// Row pitch for a buffer ↔ texture copy.
#[inline]
pub(crate) fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strips row padding from a readback buffer.
pub(crate) fn unpad_rows(data: &[u8], unpadded: u32, padded: u32, rows: u32) -> Vec<u8> {
    let (unpadded, padded) = (unpadded as usize, padded as usize);
    let mut out = Vec::with_capacity(unpadded * rows as usize);
    for row in data.chunks(padded).take(rows as usize) {
        out.extend_from_slice(&row[..unpadded]);
    }
    out
}

/// Reverses row order in place.
pub(crate) fn flip_rows(data: &mut [u8], row_bytes: usize) {
    if row_bytes == 0 {
        return;
    }
    let rows = data.len() / row_bytes;
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (head, tail) = data.split_at_mut(bottom * row_bytes);
        head[top * row_bytes..(top + 1) * row_bytes].swap_with_slice(&mut tail[..row_bytes]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_expands_with_opaque_alpha() {
        assert_eq!(rgb_to_rgba(&[1, 2, 3, 4, 5, 6]), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn rgba_packs_to_rgb() {
        assert_eq!(rgba_to_rgb(&[1, 2, 3, 9, 4, 5, 6, 9]), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn depth_maps_to_unorm_bytes() {
        let mut raw = Vec::new();
        for d in [0.0f32, 1.0, 0.5, 2.0] {
            raw.extend_from_slice(&d.to_le_bytes());
        }
        assert_eq!(depth_to_unorm8(&raw), vec![0, 255, 128, 255]);
    }

    // ── row padding ───────────────────────────────────────────────────────

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(4), 256);
        assert_eq!(padded_bytes_per_row(256), 256);
        assert_eq!(padded_bytes_per_row(260), 512);
    }

    #[test]
    fn unpad_keeps_leading_bytes_of_each_row() {
        let mut padded = vec![0u8; 512];
        padded[..3].copy_from_slice(&[1, 2, 3]);
        padded[256..259].copy_from_slice(&[4, 5, 6]);
        assert_eq!(unpad_rows(&padded, 3, 256, 2), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn flip_reverses_rows() {
        let mut data = vec![1, 1, 2, 2, 3, 3];
        flip_rows(&mut data, 2);
        assert_eq!(data, vec![3, 3, 2, 2, 1, 1]);
    }
}
