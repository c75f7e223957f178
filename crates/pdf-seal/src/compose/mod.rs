//! PDF composition - imprinting seal slices onto document pages
//!
//! This module drives the stamping of an existing document:
//! 1. Read each page's size from its MediaBox
//! 2. Compute the slice placement for the page
//! 3. Embed the slice as an image XObject with a soft mask
//! 4. Append a content stream that draws it

mod image_xobject;
mod io;
mod page;

pub use image_xobject::add_rgba_image;
pub use io::{document_to_bytes, load_pdf, load_pdf_bytes, save_pdf, write_pdf_atomic};
pub use page::{page_geometries, page_geometry};

use crate::options::SealOptions;
use crate::placement::{Rect, compute_placement};
use crate::slice::SealSlice;
use crate::types::*;
use lopdf::{Document, ObjectId};

/// Stamp one slice onto every page of `doc`, in page order.
///
/// `on_page` is called with `(completed, total)` after each page.
/// Returns the placement used on each page.
pub fn stamp_document(
    doc: &mut Document,
    slices: &[SealSlice],
    options: &SealOptions,
    mut on_page: impl FnMut(usize, usize),
) -> Result<Vec<Rect>> {
    options.validate()?;

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let total = page_ids.len();
    if total == 0 {
        return Err(SealError::NoPages);
    }
    if slices.len() != total {
        return Err(SealError::InvalidState(format!(
            "{} slices prepared for a document with {} pages",
            slices.len(),
            total
        )));
    }

    let diameter_pt = options.seal_diameter_pt();
    let mut placements = Vec::with_capacity(total);

    for (index, (&page_id, slice)) in page_ids.iter().zip(slices).enumerate() {
        if slice.index != index {
            return Err(SealError::InvalidState(format!(
                "slice {} is out of order at page {}",
                slice.index + 1,
                index + 1
            )));
        }

        let geometry = page_geometry(doc, page_id)?;
        let rect = compute_placement(slice, &geometry, options.anchor, diameter_pt);

        let raster = slice.decode()?;
        let image_id = add_rgba_image(doc, &raster)?;
        let name = page::register_xobject(doc, page_id, image_id)?;
        page::append_image_draw(doc, page_id, &name, &rect, &geometry)?;

        log::debug!(
            "Page {}/{}: {} at ({:.2}, {:.2}) size {:.2}x{:.2}",
            index + 1,
            total,
            name,
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );

        placements.push(rect);
        on_page(index + 1, total);
    }

    Ok(placements)
}

/// Load, stamp and serialize a document on the blocking pool.
///
/// Parse failures are reported as [`SealError::DocumentLoad`], anything
/// after that as [`SealError::Composition`]. Bytes are only returned once
/// serialization has finished.
pub async fn stamp_pdf<F>(
    pdf_bytes: Vec<u8>,
    slices: Vec<SealSlice>,
    options: SealOptions,
    on_page: F,
) -> Result<Vec<u8>>
where
    F: FnMut(usize, usize) + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut doc = io::parse_pdf(&pdf_bytes)?;
        stamp_document(&mut doc, &slices, &options, on_page).map_err(into_composition)?;
        io::serialize(&mut doc).map_err(into_composition)
    })
    .await
    .map_err(|e| SealError::Composition(e.to_string()))?
}

fn into_composition(err: SealError) -> SealError {
    match err {
        SealError::Composition(_) => err,
        other => SealError::Composition(other.to_string()),
    }
}
