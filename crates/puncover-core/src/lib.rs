//! Puncover Core: symbol model, file tree and call graph

pub mod error;
pub mod graph;
pub mod model;
pub mod path;
pub mod symbols;
pub mod tree;


#[cfg(test)]
pub mod test_utils;

pub use error::CoreError;
pub use graph::{CallGraph, StackPath};
pub use model::{Address, File, FileId, Folder, FolderId, Symbol, SymbolKind, base_name, left_strip_from_list};
pub use path::{normalize_path, parent_path};
pub use symbols::{SymbolTable, parse_hex_address};
pub use tree::{FileTree, FolderCollapse};
