//! Shared constants for seal stamping
//!
//! Unit conversions, default sizes and the media types / file names
//! the tool works with.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points = 25.4mm)
pub const POINTS_PER_MM: f32 = 2.83465;

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Seal
// =============================================================================

/// Physical diameter of a standard round company seal
pub const DEFAULT_SEAL_DIAMETER_MM: f32 = 42.0;

// =============================================================================
// Default Page Dimensions
// =============================================================================

/// Default page width in points (US Letter: 8.5" × 11")
pub const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// Default page height in points (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f32 = 792.0;

/// Default page dimensions as tuple (width, height)
pub const DEFAULT_PAGE_DIMENSIONS: (f32, f32) = (DEFAULT_PAGE_WIDTH_PT, DEFAULT_PAGE_HEIGHT_PT);

// =============================================================================
// Media Types
// =============================================================================

/// The only accepted seal image format (lossless, alpha-capable)
pub const SEAL_MEDIA_TYPE: &str = "image/png";

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

// =============================================================================
// Output Naming
// =============================================================================

/// Appended to the original file stem ("stamped")
pub const STAMPED_SUFFIX: &str = "（已盖章）";

/// Used when the original file name is unknown ("document with straddle seal")
pub const DEFAULT_OUTPUT_NAME: &str = "带骑缝章的文档.pdf";

// =============================================================================
// Image XObjects
// =============================================================================

/// Prefix for the resource names of embedded seal slices
pub const SLICE_XOBJECT_PREFIX: &str = "SealSlice";
