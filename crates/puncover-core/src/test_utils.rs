//! Test utilities for puncover-core

use crate::model::{Address, Symbol, SymbolKind};
use crate::symbols::SymbolTable;

/// A function symbol with a known stack size.
pub fn function(name: &str, address: Address, stack: Option<u64>) -> Symbol {
    let mut symbol = Symbol::new(name, address);
    symbol.stack_size = stack;
    symbol
}

/// A variable symbol with a size.
pub fn variable(name: &str, address: Address, size: u64) -> Symbol {
    let mut symbol = Symbol::new(name, address);
    symbol.kind = SymbolKind::Variable;
    symbol.size = Some(size);
    symbol
}

/// Table whose call edges are given as `(caller, callee)` pairs.
pub fn table_with_calls(symbols: Vec<Symbol>, calls: &[(Address, Address)]) -> SymbolTable {
    let mut table = SymbolTable::new();
    for symbol in symbols {
        table.insert(symbol);
    }
    for (caller, callee) in calls {
        if let Some(s) = table.get_mut(*caller) {
            s.callees.push(*callee);
        }
        if let Some(s) = table.get_mut(*callee) {
            s.callers.push(*caller);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_with_calls_is_symmetric() {
        let table = table_with_calls(
            vec![function("a", 0x10, None), function("b", 0x20, None)],
            &[(0x10, 0x20)],
        );
        assert_eq!(table.get(0x10).unwrap().callees, vec![0x20]);
        assert_eq!(table.get(0x20).unwrap().callers, vec![0x10]);
    }
}
