//! Offline document ingestion into the vector store

pub mod indexer;
pub mod splitter;

pub use indexer::index_document;
pub use indexer::index_files;
pub use indexer::IndexStats;
pub use splitter::TextSplitter;
