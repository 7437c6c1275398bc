//! Collector: feeds toolchain text into the model and runs the passes

use std::path::Path;

use puncover_core::{
    Address, CallGraph, CoreError, FileId, FileTree, FolderId, StackPath, Symbol, SymbolTable,
};

use crate::config::CollectorConfig;
use crate::enhancers::{
    AnnotateAssembly, BuildFolderTree, CallTree, DeriveFolders, Enhancer, Field,
    FunctionSizeFromAssembly, LinkSiblings, Model, Pipeline,
};
use crate::error::{CollectorError, Result};
use crate::parsers;
use crate::signature::{TypeAliasTable, display_names_match};

/// Accumulates parsed symbols for one binary.
///
/// Feed it size table, disassembly and stack usage text in that order,
/// then call [`Collector::finish`] for the enhanced [`Analysis`].
#[derive(Debug)]
pub struct Collector {
    config: CollectorConfig,
    aliases: TypeAliasTable,
    model: Model,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(CollectorConfig::default())
    }
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Self {
        let aliases = config.type_alias_table();
        let mut model = Model::new();
        model.fields = Field::ASM;
        Self {
            config,
            aliases,
            model,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.model.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.model.symbols
    }

    pub fn tree(&self) -> &FileTree {
        &self.model.tree
    }

    pub fn tree_mut(&mut self) -> &mut FileTree {
        &mut self.model.tree
    }

    /// Symbol at `address`, created with `name` if there is none yet.
    pub fn add_symbol(&mut self, name: &str, address: Address) -> &mut Symbol {
        self.model.symbols.get_or_insert(address, name)
    }

    pub fn symbol_by_addr(&self, hex: &str) -> std::result::Result<Option<&Symbol>, CoreError> {
        self.model.symbols.by_hex(hex)
    }

    // ── Parsing ──────────────────────────────────────────────────

    pub fn parse_size_line(&mut self, line: &str) -> bool {
        parsers::parse_size_line(&mut self.model.symbols, line)
    }

    pub fn parse_display_name_line(&mut self, line: &str) -> bool {
        parsers::parse_display_name_line(&mut self.model.symbols, line)
    }

    pub fn parse_assembly_text(&mut self, text: &str) -> usize {
        parsers::parse_assembly_text(&mut self.model.symbols, text, &self.config.clone_suffixes)
    }

    pub fn parse_stack_usage_line(&mut self, line: &str) -> bool {
        parsers::parse_stack_usage_line(&mut self.model.symbols, line, &self.aliases)
    }

    /// Parse every line of a size table. Returns the number of symbols read.
    pub fn parse_size_text(&mut self, text: &str) -> usize {
        text.lines().filter(|line| self.parse_size_line(line)).count()
    }

    pub fn parse_display_name_text(&mut self, text: &str) -> usize {
        text.lines().filter(|line| self.parse_display_name_line(line)).count()
    }

    /// Parse every line of a stack usage report. Returns the number of
    /// symbols that received a stack size.
    pub fn parse_stack_usage_text(&mut self, text: &str) -> usize {
        text.lines().filter(|line| self.parse_stack_usage_line(line)).count()
    }

    pub fn parse_size_file(&mut self, path: &Path) -> Result<usize> {
        let text = read_input(path)?;
        let count = self.parse_size_text(&text);
        tracing::info!("{}: {} sized symbols", path.display(), count);
        Ok(count)
    }

    pub fn parse_display_name_file(&mut self, path: &Path) -> Result<usize> {
        let text = read_input(path)?;
        let count = self.parse_display_name_text(&text);
        tracing::info!("{}: {} display names", path.display(), count);
        Ok(count)
    }

    pub fn parse_assembly_file(&mut self, path: &Path) -> Result<usize> {
        let text = read_input(path)?;
        let count = self.parse_assembly_text(&text);
        tracing::info!("{}: {} disassembled symbols", path.display(), count);
        Ok(count)
    }

    pub fn parse_stack_usage_file(&mut self, path: &Path) -> Result<usize> {
        let text = read_input(path)?;
        let count = self.parse_stack_usage_text(&text);
        tracing::debug!("{}: {} stack sizes attached", path.display(), count);
        Ok(count)
    }

    pub fn display_names_match(&self, a: Option<&str>, b: Option<&str>) -> bool {
        display_names_match(a, b, &self.aliases)
    }

    /// Bytes of machine code in one instruction line.
    pub fn count_assembly_code_bytes(&self, line: &str) -> u64 {
        parsers::count_assembly_code_bytes(line)
    }

    // ── Single passes ────────────────────────────────────────────

    /// Run one pass now. Fails if its inputs have not been produced yet.
    pub fn enhance(&mut self, pass: &dyn Enhancer) -> Result<()> {
        let missing = pass.requires() - self.model.fields;
        if !missing.is_empty() {
            return Err(CollectorError::PipelineOrder {
                pass: pass.name(),
                missing,
            });
        }
        pass.run(&mut self.model)?;
        self.model.fields |= pass.produces();
        Ok(())
    }

    pub fn enhance_function_size_from_assembly(&mut self) -> Result<()> {
        self.enhance(&FunctionSizeFromAssembly)
    }

    pub fn enhance_assembly(&mut self) -> Result<()> {
        let pass = AnnotateAssembly::new(&self.config.branch_mnemonics);
        self.enhance(&pass)
    }

    pub fn enhance_call_tree(&mut self) -> Result<()> {
        self.enhance(&CallTree)
    }

    pub fn enhance_sibling_symbols(&mut self) -> Result<()> {
        self.enhance(&LinkSiblings)
    }

    pub fn derive_folders(&mut self) -> Result<()> {
        let pass = DeriveFolders::new(&self.config.unknown_origin);
        self.enhance(&pass)
    }

    pub fn enhance_file_elements(&mut self) -> Result<()> {
        let pass = BuildFolderTree::new(self.config.folder_collapse);
        self.enhance(&pass)
    }

    /// Run the standard passes and hand out the read-only result.
    pub fn finish(mut self) -> Result<Analysis> {
        let pipeline = Pipeline::standard(&self.config)?;
        pipeline.run(&mut self.model)?;

        let call_graph = CallGraph::from_symbols(&self.model.symbols);
        tracing::info!(
            "collected {} symbols in {} files, {} call edges",
            self.model.symbols.len(),
            self.model.tree.files().count(),
            call_graph.edge_count()
        );

        Ok(Analysis {
            symbols: self.model.symbols,
            tree: self.model.tree,
            call_graph,
        })
    }
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CollectorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Fully enhanced symbols, files and folders of one binary.
#[derive(Debug)]
pub struct Analysis {
    symbols: SymbolTable,
    tree: FileTree,
    call_graph: CallGraph,
}

impl Analysis {
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    pub fn symbol(&self, address: Address) -> Option<&Symbol> {
        self.symbols.get(address)
    }

    pub fn symbol_by_addr(&self, hex: &str) -> std::result::Result<Option<&Symbol>, CoreError> {
        self.symbols.by_hex(hex)
    }

    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.by_name(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.functions()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.variables()
    }

    pub fn symbols_in_file(&self, base_file: &str) -> Vec<&Symbol> {
        self.symbols.symbols_in_file(base_file)
    }

    /// Symbols attached to `file`, in address order.
    pub fn file_symbols(&self, file: FileId) -> std::result::Result<Vec<&Symbol>, CoreError> {
        let file = self.tree.file(file).ok_or(CoreError::UnknownFile(file))?;
        let mut symbols: Vec<&Symbol> = file
            .symbols
            .iter()
            .filter_map(|address| self.symbols.get(*address))
            .collect();
        symbols.sort_by_key(|s| s.address);
        Ok(symbols)
    }

    pub fn root_folders(&self) -> &[FolderId] {
        self.tree.root_folders()
    }

    pub fn collapsed_root_folders(&self) -> &[FolderId] {
        self.tree.collapsed_root_folders()
    }

    pub fn callers(&self, address: Address) -> Vec<&Symbol> {
        self.resolve(self.symbols.get(address).map(|s| s.callers.as_slice()))
    }

    pub fn callees(&self, address: Address) -> Vec<&Symbol> {
        self.resolve(self.symbols.get(address).map(|s| s.callees.as_slice()))
    }

    fn resolve(&self, addresses: Option<&[Address]>) -> Vec<&Symbol> {
        addresses
            .unwrap_or_default()
            .iter()
            .filter_map(|address| self.symbols.get(*address))
            .collect()
    }

    /// Worst-case stack of `address` including everything it calls.
    pub fn deepest_callee_tree(&self, address: Address) -> std::result::Result<StackPath, CoreError> {
        self.call_graph.deepest_callee_tree(address)
    }

    /// Worst-case stack over every call chain that reaches `address`.
    pub fn deepest_caller_tree(&self, address: Address) -> std::result::Result<StackPath, CoreError> {
        self.call_graph.deepest_caller_tree(address)
    }
}
