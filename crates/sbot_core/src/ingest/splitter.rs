use crate::domain::{Chunk, Document};
use crate::error::{codes, AppError};

/// Fixed-window character splitter.
///
/// Windows are `chunk_size` chars long and consecutive windows of the same document share
/// exactly `chunk_overlap` chars. Only the final window of a document may be shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, AppError> {
        if chunk_size == 0 || chunk_overlap >= chunk_size {
            return Err(AppError::new(
                codes::CONFIG_INVALID,
                "Chunk overlap must be smaller than a positive chunk size",
            )
            .with_details(format!(
                "chunk_size={chunk_size}; chunk_overlap={chunk_overlap}"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_document(&self, doc: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = doc.full_text.chars().collect();
        let mut out = Vec::new();
        if chars.is_empty() {
            return out;
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut start = 0usize;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            let text: String = chars[start..end].iter().collect();
            out.push(Chunk::new(&doc.source_id, doc.metadata.page, start, text));
            if end == chars.len() {
                break;
            }
            start += step;
        }
        out
    }

    pub fn split_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|d| self.split_document(d)).collect()
    }
}
