//! GCC `-fstack-usage` (`.su`) report parsing

use puncover_core::{Address, SymbolTable, base_name};

use crate::signature::{TypeAliasTable, display_names_match};

// <path>:<line>:<column>:<signature>\t<bytes>\t<qualifiers>
static_regex!(STACK_USAGE_LINE, r"^(.+?):(\d+):(\d+):([^\t]+)\t(\d+)\t(.*)$");

/// Attach the stack usage of one report line to a function symbol.
///
/// Candidates are the functions defined in a file with the same base name.
/// A candidate on the reported line wins; otherwise the reported signature
/// is compared against each candidate's display name. Ties go to the lowest
/// address. Returns whether a symbol was updated.
pub fn parse_stack_usage_line(symbols: &mut SymbolTable, line: &str, aliases: &TypeAliasTable) -> bool {
    let Some(caps) = STACK_USAGE_LINE.captures(line) else {
        tracing::debug!("not a stack usage line: {}", line);
        return false;
    };
    let (Ok(line_number), Ok(stack_size)) = (caps[2].parse::<u32>(), caps[5].parse::<u64>()) else {
        return false;
    };
    let base_file = base_name(&caps[1]);
    let signature = &caps[4];

    let Some(address) = find_candidate(symbols, base_file, line_number, signature, aliases) else {
        tracing::debug!("no symbol for stack usage of {} at {}:{}", signature, base_file, line_number);
        return false;
    };

    match symbols.get_mut(address) {
        Some(symbol) => {
            symbol.stack_size = Some(stack_size);
            symbol.stack_qualifiers = Some(caps[6].to_string());
            true
        }
        None => false,
    }
}

fn find_candidate(
    symbols: &SymbolTable,
    base_file: &str,
    line_number: u32,
    signature: &str,
    aliases: &TypeAliasTable,
) -> Option<Address> {
    let candidates: Vec<_> = symbols
        .functions()
        .filter(|s| s.base_file.as_deref() == Some(base_file))
        .collect();

    let exact: Vec<Address> = candidates
        .iter()
        .filter(|s| s.line == Some(line_number))
        .map(|s| s.address)
        .collect();
    if let Some(first) = exact.first() {
        if exact.len() > 1 {
            tracing::debug!("{} symbols at {}:{}, using {:#x}", exact.len(), base_file, line_number, first);
        }
        return Some(*first);
    }

    let fuzzy: Vec<Address> = candidates
        .iter()
        .filter(|s| display_names_match(Some(signature), Some(s.signature()), aliases))
        .map(|s| s.address)
        .collect();
    if fuzzy.len() > 1 {
        tracing::debug!("{} symbols in {} match {}, using {:#x}", fuzzy.len(), base_file, signature, fuzzy[0]);
    }
    fuzzy.first().copied()
}
