//! Document I/O operations

use crate::types::*;
use lopdf::Document;
use std::path::{Path, PathBuf};

/// Load a PDF document from disk
pub async fn load_pdf(path: impl AsRef<Path>) -> Result<Document> {
    let bytes = tokio::fs::read(path.as_ref()).await?;
    load_pdf_bytes(bytes).await
}

/// Parse an in-memory PDF document
pub async fn load_pdf_bytes(bytes: Vec<u8>) -> Result<Document> {
    tokio::task::spawn_blocking(move || parse_pdf(&bytes)).await?
}

pub(crate) fn parse_pdf(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(SealError::DocumentLoad)
}

/// Serialize a document into PDF bytes
pub async fn document_to_bytes(mut doc: Document) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || serialize(&mut doc)).await?
}

pub(crate) fn serialize(doc: &mut Document) -> Result<Vec<u8>> {
    let mut writer = Vec::new();
    doc.save_to(&mut writer)?;
    Ok(writer)
}

/// Save a document to disk
pub async fn save_pdf(doc: Document, path: impl AsRef<Path>) -> Result<()> {
    let bytes = document_to_bytes(doc).await?;
    write_pdf_atomic(path, &bytes).await
}

/// Write bytes to `path` through a sibling temp file and a rename, so a
/// failed write never leaves a truncated file under the final name.
pub async fn write_pdf_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let partial = partial_path(path);

    if let Err(e) = tokio::fs::write(&partial, bytes).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(SealError::Export(e));
    }
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(SealError::Export(e));
    }
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("out/contract.pdf")),
            PathBuf::from("out/.contract.pdf.partial")
        );
    }
}
