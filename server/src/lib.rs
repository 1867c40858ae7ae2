pub mod compile_cache;
pub mod constants;
pub mod enums;
pub mod index;
pub mod indexer;
pub mod lsp_convert;
pub mod models;
pub mod server;
pub mod watcher;

pub use compile_cache::{CompileCache, CompiledUnit};
pub use index::SymbolIndex;
pub use indexer::Indexer;
pub use watcher::WorkspaceWatcher;
