pub mod loader;
pub mod splitter;

pub use loader::load_documents_from_dir;
pub use splitter::TextSplitter;
