//! Enhancement passes run over the parsed symbol table
//!
//! Each pass declares the model facets it reads and the ones it adds.
//! [`Pipeline::new`] refuses an order in which a pass would run before
//! its inputs exist.

use bitflags::bitflags;
use puncover_core::{FileTree, SymbolTable};

use crate::config::CollectorConfig;
use crate::error::{CollectorError, Result};

pub mod assembly;
pub mod call_tree;
pub mod folders;
pub mod siblings;
pub mod sizes;

pub use assembly::{AnnotateAssembly, annotation_target, is_branch_mnemonic};
pub use call_tree::{CallTree, add_function_call, call_target};
pub use folders::{BuildFolderTree, DeriveFolders};
pub use siblings::LinkSiblings;
pub use sizes::FunctionSizeFromAssembly;

bitflags! {
    /// Facets of the model that parsers and passes fill in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Field: u16 {
        /// Instruction lines of every disassembled symbol.
        const ASM = 1 << 0;
        /// Byte size of every function with instructions.
        const SIZES = 1 << 1;
        /// Address literals annotated with `<name>`.
        const ANNOTATED_ASM = 1 << 2;
        const CALL_GRAPH = 1 << 3;
        const SIBLINGS = 1 << 4;
        /// Normalized paths and owning files.
        const FILES = 1 << 5;
        const FOLDER_TREE = 1 << 6;
    }
}

/// Everything the collector knows about one binary.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub symbols: SymbolTable,
    pub tree: FileTree,
    /// Facets filled in so far.
    pub fields: Field,
}

impl Default for Field {
    fn default() -> Self {
        Field::empty()
    }
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One post-processing pass over the model.
pub trait Enhancer {
    fn name(&self) -> &'static str;

    /// Facets that must exist before this pass runs.
    fn requires(&self) -> Field;

    /// Facets this pass adds.
    fn produces(&self) -> Field;

    fn run(&self, model: &mut Model) -> Result<()>;
}

/// An ordered list of passes whose requirements were checked up front.
pub struct Pipeline {
    passes: Vec<Box<dyn Enhancer>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.passes.iter().map(|p| p.name())).finish()
    }
}

impl Pipeline {
    /// Check that each pass only needs facets in `available` or produced
    /// by a pass before it.
    pub fn new(passes: Vec<Box<dyn Enhancer>>, available: Field) -> Result<Self> {
        let mut have = available;
        for pass in &passes {
            let missing = pass.requires() - have;
            if !missing.is_empty() {
                return Err(CollectorError::PipelineOrder {
                    pass: pass.name(),
                    missing,
                });
            }
            have |= pass.produces();
        }
        Ok(Pipeline { passes })
    }

    /// The passes every collection runs, in order.
    pub fn standard(config: &CollectorConfig) -> Result<Self> {
        Self::new(
            vec![
                Box::new(FunctionSizeFromAssembly),
                Box::new(AnnotateAssembly::new(&config.branch_mnemonics)),
                Box::new(CallTree),
                Box::new(LinkSiblings),
                Box::new(DeriveFolders::new(&config.unknown_origin)),
                Box::new(BuildFolderTree::new(config.folder_collapse)),
            ],
            Field::ASM,
        )
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn run(&self, model: &mut Model) -> Result<()> {
        for pass in &self.passes {
            tracing::debug!("running pass {}", pass.name());
            pass.run(model)?;
            model.fields |= pass.produces();
        }
        Ok(())
    }
}
