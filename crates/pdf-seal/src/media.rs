//! Media type checks for the two inputs

use crate::constants::{PDF_MEDIA_TYPE, SEAL_MEDIA_TYPE};
use crate::types::*;
use std::path::Path;

/// Infer a media type from a file extension
pub fn media_type_for_path(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(SEAL_MEDIA_TYPE),
        "pdf" => Some(PDF_MEDIA_TYPE),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Reject a seal upload whose declared media type is not PNG
pub fn ensure_seal_media_type(declared: &str) -> Result<()> {
    ensure_media_type(InputKind::Seal, declared, SEAL_MEDIA_TYPE)
}

/// Reject a document upload whose declared media type is not PDF
pub fn ensure_pdf_media_type(declared: &str) -> Result<()> {
    ensure_media_type(InputKind::Pdf, declared, PDF_MEDIA_TYPE)
}

fn ensure_media_type(input: InputKind, declared: &str, expected: &str) -> Result<()> {
    // Parameters such as "; charset=binary" are not significant
    let essence = declared.split(';').next().unwrap_or_default().trim();
    if essence.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(SealError::UnsupportedMediaType {
            input,
            found: declared.to_string(),
        })
    }
}
