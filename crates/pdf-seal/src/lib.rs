pub mod compose;
pub mod constants;
mod media;
mod naming;
mod options;
mod placement;
mod seal;
mod slice;
mod types;

pub use compose::{
    add_rgba_image, document_to_bytes, load_pdf, load_pdf_bytes, page_geometries, page_geometry,
    save_pdf, stamp_document, stamp_pdf, write_pdf_atomic,
};
pub use media::*;
pub use naming::stamped_file_name;
pub use options::*;
pub use placement::{Rect, compute_placement, place_slice, plan_placements};
pub use seal::{SealImage, decode_seal, decode_seal_async};
pub use slice::{RasterArena, SealSlice, slice_seal, slice_seal_async};
pub use types::*;
