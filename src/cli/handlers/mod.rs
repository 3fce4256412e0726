//! CLI command handlers module
//!
//! One file per subcommand:
//! - serve: API server
//! - ask: one-off question from the terminal
//! - index: document ingestion
//! - info: configuration display

pub mod ask;
pub mod index;
pub mod info;
pub mod serve;

// Re-export all public handlers
pub use ask::*;
pub use index::*;
pub use info::*;
pub use serve::*;
