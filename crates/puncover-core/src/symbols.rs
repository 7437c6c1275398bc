//! Symbol table keyed by address

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::model::{Address, Symbol, SymbolKind};

/// Arena of symbols. Iteration is always in address order.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<Address, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: BTreeMap::new(),
        }
    }

    /// Insert a symbol, replacing any symbol at the same address.
    pub fn insert(&mut self, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(symbol.address, symbol)
    }

    /// Existing symbol at `address`, or a fresh one created with `name`.
    pub fn get_or_insert(&mut self, address: Address, name: &str) -> &mut Symbol {
        self.symbols
            .entry(address)
            .or_insert_with(|| Symbol::new(name, address))
    }

    pub fn get(&self, address: Address) -> Option<&Symbol> {
        self.symbols.get(&address)
    }

    pub fn get_mut(&mut self, address: Address) -> Option<&mut Symbol> {
        self.symbols.get_mut(&address)
    }

    pub fn contains(&self, address: Address) -> bool {
        self.symbols.contains_key(&address)
    }

    /// Look up a symbol by its address written in hex, with or without `0x`.
    pub fn by_hex(&self, hex: &str) -> Result<Option<&Symbol>, CoreError> {
        let address = parse_hex_address(hex)?;
        Ok(self.get(address))
    }

    /// First symbol (by address) with the given name.
    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.symbols.values().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Symbol> {
        self.symbols.values_mut()
    }

    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.symbols.keys().copied()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Symbol> {
        self.of_kind(SymbolKind::Function)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Symbol> {
        self.of_kind(SymbolKind::Variable)
    }

    fn of_kind(&self, kind: SymbolKind) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(move |s| s.kind == kind)
    }

    /// All symbols whose base file matches, in address order.
    pub fn symbols_in_file(&self, base_file: &str) -> Vec<&Symbol> {
        self.symbols
            .values()
            .filter(|s| s.base_file.as_deref() == Some(base_file))
            .collect()
    }
}

/// Parse a toolchain hex address such as `0000009c` or `0x9c`.
pub fn parse_hex_address(text: &str) -> Result<Address, CoreError> {
    let digits = text
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    Address::from_str_radix(digits, 16).map_err(|_| CoreError::InvalidAddress(text.to_string()))
}
