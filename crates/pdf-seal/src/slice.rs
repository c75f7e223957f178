//! Cutting the seal into one vertical strip per page
//!
//! The strips are taken left to right so that slice `i` lands on page `i`
//! and the stacked pages show the whole seal along their right edges.

use crate::seal::SealImage;
use crate::types::*;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;

const BYTES_PER_PIXEL: usize = 4;

/// One vertical strip of the seal, encoded as a standalone PNG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealSlice {
    /// Index of the page this slice belongs to (0-based)
    pub index: usize,
    /// PNG-encoded RGBA pixels
    pub encoded: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl SealSlice {
    /// Decode the strip back into RGBA pixels
    pub fn decode(&self) -> Result<RgbaImage> {
        let image = image::load_from_memory_with_format(&self.encoded, ImageFormat::Png)
            .map_err(|e| SealError::Decode(format!("slice {}: {}", self.index + 1, e)))?;
        Ok(image.to_rgba8())
    }
}

/// Scratch raster sized to one slice, reused for every slice of a run
pub struct RasterArena {
    scratch: RgbaImage,
}

impl RasterArena {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            scratch: RgbaImage::new(width_px, height_px),
        }
    }

    /// Copy the columns `[x0, x0 + scratch width)` of the seal into the
    /// scratch buffer. Columns past the seal's right edge stay transparent.
    pub fn copy_columns(&mut self, seal: &SealImage, x0: u32) -> &RgbaImage {
        let source = seal.pixels();
        let (source_width, source_height) = source.dimensions();
        let (slice_width, slice_height) = self.scratch.dimensions();

        let dst: &mut [u8] = &mut self.scratch;
        dst.fill(0);

        let copy_width = slice_width.min(source_width.saturating_sub(x0)) as usize;
        if copy_width > 0 {
            let src = source.as_raw();
            let src_stride = source_width as usize * BYTES_PER_PIXEL;
            let dst_stride = slice_width as usize * BYTES_PER_PIXEL;
            let row_bytes = copy_width * BYTES_PER_PIXEL;
            let x_offset = x0 as usize * BYTES_PER_PIXEL;

            for y in 0..source_height.min(slice_height) as usize {
                let s = y * src_stride + x_offset;
                let d = y * dst_stride;
                dst[d..d + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
            }
        }

        &self.scratch
    }
}

/// Width of every slice: the seal width divided by the page count, rounded up
pub fn slice_width(seal_width_px: u32, page_count: u32) -> u32 {
    seal_width_px.div_ceil(page_count)
}

/// Cut the seal into `page_count` strips of equal width.
///
/// Because the width is rounded up, the last strip may extend past the
/// seal; the overhang is transparent. The output is deterministic: the
/// same seal and page count always give byte-identical slices.
pub fn slice_seal(seal: &SealImage, page_count: usize) -> Result<Vec<SealSlice>> {
    let pages = u32::try_from(page_count)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or(SealError::InvalidPageCount(page_count))?;

    let width = slice_width(seal.width_px(), pages);
    let height = seal.height_px();
    let mut arena = RasterArena::new(width, height);
    let mut slices = Vec::with_capacity(page_count);

    for index in 0..pages {
        let x0 = index.saturating_mul(width);
        let raster = arena.copy_columns(seal, x0);
        let encoded = encode_png(raster)
            .map_err(|e| SealError::Slice(format!("slice {}: {}", index + 1, e)))?;

        log::debug!(
            "Slice {}/{}: x={}..{} ({} bytes)",
            index + 1,
            pages,
            x0,
            x0.saturating_add(width),
            encoded.len()
        );

        slices.push(SealSlice {
            index: index as usize,
            encoded,
            width_px: width,
            height_px: height,
        });
    }

    Ok(slices)
}

/// Run the whole slicing batch on the blocking pool.
///
/// The returned set is complete or the call fails; the first failure is
/// reported as [`SealError::Slice`].
pub async fn slice_seal_async(seal: Arc<SealImage>, page_count: usize) -> Result<Vec<SealSlice>> {
    tokio::task::spawn_blocking(move || slice_seal(&seal, page_count))
        .await
        .map_err(|e| SealError::Slice(e.to_string()))?
}

fn encode_png(raster: &RgbaImage) -> std::result::Result<Vec<u8>, image::ImageError> {
    let mut encoded = Vec::new();
    raster.write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)?;
    Ok(encoded)
}
