use std::fs;
use std::path::Path;

use crate::domain::{Document, DocumentMeta};
use crate::error::{codes, AppError};

const PAGE_BREAK: char = '\x0c';

fn is_supported(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .as_deref(),
        Some("txt") | Some("md")
    )
}

/// Turn one file's text into documents. Text extracted from paginated reports
/// (e.g. `pdftotext` output) carries form feeds; each page becomes its own document.
pub fn documents_from_text(source_id: &str, origin_path: &str, text: &str) -> Vec<Document> {
    if !text.contains(PAGE_BREAK) {
        if text.trim().is_empty() {
            return Vec::new();
        }
        return vec![Document {
            source_id: source_id.to_string(),
            full_text: text.to_string(),
            metadata: DocumentMeta {
                origin_path: origin_path.to_string(),
                page: None,
            },
        }];
    }

    text.split(PAGE_BREAK)
        .enumerate()
        .filter(|(_, page)| !page.trim().is_empty())
        .map(|(i, page)| Document {
            source_id: source_id.to_string(),
            full_text: page.to_string(),
            metadata: DocumentMeta {
                origin_path: origin_path.to_string(),
                page: Some(i as u32 + 1),
            },
        })
        .collect()
}

/// Load every `.txt` / `.md` file directly under `dir`, in file-name order.
pub fn load_documents_from_dir(dir: &Path) -> Result<Vec<Document>, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::new(codes::INGEST_FAILED, "Failed to read documents directory")
            .with_details(format!("path={}; err={}", dir.display(), e))
    })?;

    let mut paths = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect::<Vec<_>>();
    paths.sort();

    let mut out = Vec::new();
    for path in paths {
        if !is_supported(&path) {
            tracing::info!(path = %path.display(), "skipping unsupported file");
            continue;
        }
        let text = fs::read_to_string(&path).map_err(|e| {
            AppError::new(codes::INGEST_FAILED, "Failed to read document")
                .with_details(format!("path={}; err={}", path.display(), e))
        })?;
        let source_id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let docs = documents_from_text(&source_id, &path.to_string_lossy(), &text);
        tracing::debug!(source_id = %source_id, documents = docs.len(), "loaded file");
        out.extend(docs);
    }
    Ok(out)
}
