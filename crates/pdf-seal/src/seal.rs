//! Seal image decoding

use crate::types::*;
use image::{ImageFormat, RgbaImage};

/// A decoded seal, stored as 8-bit RGBA so every slice keeps its alpha
#[derive(Debug, Clone, PartialEq)]
pub struct SealImage {
    pixels: RgbaImage,
}

impl SealImage {
    /// Wrap an already decoded raster. Empty rasters are rejected.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(SealError::Decode(format!(
                "seal image has no pixels ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self { pixels })
    }

    pub fn width_px(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height_px(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Decode PNG bytes into a seal image
pub fn decode_seal(bytes: &[u8]) -> Result<SealImage> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| SealError::Decode(e.to_string()))?;
    let seal = SealImage::from_rgba(decoded.to_rgba8())?;
    log::debug!(
        "Decoded seal image: {}x{} px",
        seal.width_px(),
        seal.height_px()
    );
    Ok(seal)
}

/// Decode PNG bytes on the blocking pool
pub async fn decode_seal_async(bytes: Vec<u8>) -> Result<SealImage> {
    tokio::task::spawn_blocking(move || decode_seal(&bytes)).await?
}
