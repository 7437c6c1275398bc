//! Core data structures for the symbol model

use serde::{Deserialize, Serialize};

/// Address of a symbol. The primary identity of everything in the model.
pub type Address = u64;

/// Index of a [`File`] inside a [`crate::FileTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// Index of a [`Folder`] inside a [`crate::FileTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderId(pub usize);

/// Discriminates what a symbol represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Variable,
}

impl SymbolKind {
    /// Map an `nm` type character to a kind. `T`/`t` live in `.text`.
    pub fn from_type_char(type_char: char) -> Self {
        match type_char {
            'T' | 't' => SymbolKind::Function,
            _ => SymbolKind::Variable,
        }
    }
}

/// A named, addressed function or variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub address: Address,
    /// Address exactly as printed by the toolchain.
    pub address_text: String,
    pub name: String,
    /// Demangled signature, used for fuzzy matching.
    pub display_name: Option<String>,
    pub kind: SymbolKind,
    pub size: Option<u64>,
    /// File name without directories.
    pub base_file: Option<String>,
    pub path: Option<String>,
    pub line: Option<u32>,
    /// Raw instruction lines, in order.
    pub asm: Vec<String>,
    pub stack_size: Option<u64>,
    /// Trailing qualifier token of the stack report, e.g. `static`.
    pub stack_qualifiers: Option<String>,
    pub callers: Vec<Address>,
    pub callees: Vec<Address>,
    pub prev_function: Option<Address>,
    pub next_function: Option<Address>,
    pub file: Option<FileId>,
}

impl Symbol {
    /// Path-agnostic constructor: name and address only.
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Symbol {
            address,
            address_text: format!("{:08x}", address),
            name: name.into(),
            display_name: None,
            kind: SymbolKind::Function,
            size: None,
            base_file: None,
            path: None,
            line: None,
            asm: Vec::new(),
            stack_size: None,
            stack_qualifiers: None,
            callers: Vec::new(),
            callees: Vec::new(),
            prev_function: None,
            next_function: None,
            file: None,
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    pub fn is_variable(&self) -> bool {
        self.kind == SymbolKind::Variable
    }

    /// Record a source location. `base_file` is derived from the path.
    pub fn set_location(&mut self, path: &str, line: u32) {
        self.base_file = Some(base_name(path).to_string());
        self.path = Some(path.to_string());
        self.line = Some(line);
    }

    /// Whether the source location is still unknown.
    pub fn lacks_location(&self) -> bool {
        self.path.is_none() && self.base_file.is_none() && self.line.is_none()
    }

    /// Display name if known, otherwise the raw name.
    pub fn signature(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Instruction listing with the common indentation removed.
    pub fn display_asm(&self) -> Vec<String> {
        left_strip_from_list(&self.asm)
    }
}

/// A source file, one per distinct normalized path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub id: FileId,
    /// Normalized full path. Identity of the file.
    pub path: String,
    pub name: String,
    pub folder: Option<FolderId>,
    /// Symbols attached to this file, in address order.
    pub symbols: Vec<Address>,
}

/// A directory, one per distinct directory path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub path: String,
    pub name: String,
    pub parent: Option<FolderId>,
    pub sub_folders: Vec<FolderId>,
    pub files: Vec<FileId>,
    /// Topmost ancestor; a top-level folder is its own root.
    pub root: Option<FolderId>,
    pub collapsed_name: Option<String>,
    pub collapsed_sub_folders: Vec<FolderId>,
}

/// Last path segment.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Remove the space/tab prefix shared by every non-blank line.
pub fn left_strip_from_list<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let common = lines
        .iter()
        .map(|l| l.as_ref())
        .filter(|l| !l.trim().is_empty())
        .map(indent_width)
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| {
            let l = l.as_ref();
            // the indent is ASCII, so any cut within it is a char boundary
            let cut = common.min(indent_width(l));
            l[cut..].to_string()
        })
        .collect()
}

fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}
