//! Size table (`nm --size-sort -l`) parsing

use puncover_core::{Address, SymbolKind, SymbolTable, parse_hex_address};
use regex::Captures;

// <address> <size> <type> <name>\t<path>:<line>
static_regex!(SIZE_LINE, r"^([0-9a-f]+)\s+([0-9a-f]+)\s+(\S)\s+(\S+)\t(.+):(\d+)$");
// same, but the demangled name may contain spaces
static_regex!(DISPLAY_NAME_LINE, r"^([0-9a-f]+)\s+([0-9a-f]+)\s+(\S)\s+(.+?)\t(.+):(\d+)$");

struct SizeEntry<'a> {
    address: Address,
    address_text: &'a str,
    size: u64,
    type_char: char,
    name: &'a str,
    path: &'a str,
    line: u32,
}

impl<'a> SizeEntry<'a> {
    fn from_captures(caps: &Captures<'a>) -> Option<Self> {
        let address_text = caps.get(1)?.as_str();
        Some(SizeEntry {
            address: parse_hex_address(address_text).ok()?,
            address_text,
            size: u64::from_str_radix(caps.get(2)?.as_str(), 16).ok()?,
            type_char: caps.get(3)?.as_str().chars().next()?,
            name: caps.get(4)?.as_str(),
            path: caps.get(5)?.as_str(),
            line: caps.get(6)?.as_str().parse().ok()?,
        })
    }
}

/// Parse one size table line into the symbol at its address.
///
/// Returns `false` and leaves the table untouched when the line lacks the
/// `\t<path>:<line>` suffix or is otherwise incomplete.
pub fn parse_size_line(symbols: &mut SymbolTable, line: &str) -> bool {
    let Some(entry) = SIZE_LINE
        .captures(line)
        .and_then(|caps| SizeEntry::from_captures(&caps))
    else {
        tracing::trace!("not a size line: {}", line);
        return false;
    };

    let symbol = symbols.get_or_insert(entry.address, entry.name);
    symbol.name = entry.name.to_string();
    symbol.address_text = entry.address_text.to_string();
    symbol.size = Some(entry.size);
    symbol.kind = SymbolKind::from_type_char(entry.type_char);
    symbol.set_location(entry.path, entry.line);
    true
}

/// Parse one line of the demangled size table and record its name as the
/// display name of the symbol already at that address.
///
/// Never creates symbols. Returns whether a display name was recorded.
pub fn parse_display_name_line(symbols: &mut SymbolTable, line: &str) -> bool {
    let Some(entry) = DISPLAY_NAME_LINE
        .captures(line)
        .and_then(|caps| SizeEntry::from_captures(&caps))
    else {
        return false;
    };

    match symbols.get_mut(entry.address) {
        Some(symbol) => {
            symbol.display_name = Some(entry.name.to_string());
            true
        }
        None => {
            tracing::debug!("display name for unknown address {:#x}: {}", entry.address, entry.name);
            false
        }
    }
}
