//! Placement of seal slices on pages
//!
//! Each slice is scaled uniformly so the seal's longer side maps to the
//! physical seal diameter, then drawn flush against the right page edge
//! at the chosen vertical anchor. Coordinates are PDF user space with the
//! origin at the page's bottom-left corner.

use crate::slice::SealSlice;
use crate::types::{Anchor, PageGeometry};

/// Rectangle in PDF points (origin at bottom-left)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Compute where a slice goes on a page.
///
/// No clamping is applied: a seal taller than the page extends past the
/// page bounds.
pub fn compute_placement(
    slice: &SealSlice,
    page: &PageGeometry,
    anchor: Anchor,
    target_diameter_pt: f32,
) -> Rect {
    place_slice(
        slice.width_px,
        slice.height_px,
        page,
        anchor,
        target_diameter_pt,
    )
}

/// [`compute_placement`] on raw slice dimensions
pub fn place_slice(
    width_px: u32,
    height_px: u32,
    page: &PageGeometry,
    anchor: Anchor,
    target_diameter_pt: f32,
) -> Rect {
    let scale = target_diameter_pt / width_px.max(height_px) as f32;
    let width = width_px as f32 * scale;
    let height = height_px as f32 * scale;

    let x = page.width_pt - width;
    let y = match anchor {
        Anchor::UpperThird => page.height_pt - page.height_pt / 3.0 - height / 2.0,
        Anchor::Center => page.height_pt / 2.0 - height / 2.0,
        Anchor::LowerThird => page.height_pt / 3.0 - height / 2.0,
    };

    Rect::new(x, y, width, height)
}

/// Placements for a whole document, pairing slice `i` with page `i`
pub fn plan_placements(
    slices: &[SealSlice],
    pages: &[PageGeometry],
    anchor: Anchor,
    target_diameter_pt: f32,
) -> Vec<Rect> {
    slices
        .iter()
        .zip(pages)
        .map(|(slice, page)| compute_placement(slice, page, anchor, target_diameter_pt))
        .collect()
}
