//! objdump disassembly parsing

use puncover_core::{SymbolTable, parse_hex_address};

// 000034fc <window_raw_click_subscribe>:
static_regex!(SYMBOL_HEADER, r"^([0-9a-f]+) <(.+)>:$");
// /path/to/file.c:42, optionally followed by " (discriminator 3)"
static_regex!(
    SOURCE_LINE,
    r"^((?:/|[A-Za-z]:[\\/]).*):(\d+)(?: \(discriminator \d+\))?$"
);
//     34fe:	4901      	ldr	r1, [pc, #4]
static_regex!(OPCODE, r"^\s*[0-9a-f]+:\s+([0-9a-f]+(?: [0-9a-f]+)*)(?:\s|$)");

/// Parse a whole disassembly listing into the symbol table.
///
/// Each `<address> <<name>>:` header opens a block. Source annotations set
/// the location of the block's symbol if it has none yet; every other
/// non-blank line is kept as instruction text. Returns the number of headers.
pub fn parse_assembly_text(symbols: &mut SymbolTable, text: &str, clone_suffixes: &[String]) -> usize {
    let mut headers = 0;
    let mut current = None;

    for line in text.lines() {
        if let Some(caps) = SYMBOL_HEADER.captures(line) {
            let Ok(address) = parse_hex_address(&caps[1]) else {
                current = None;
                continue;
            };
            let is_new = !symbols.contains(address);
            let symbol = symbols.get_or_insert(address, strip_clone_suffix(&caps[2], clone_suffixes));
            if is_new {
                symbol.address_text = caps[1].to_string();
            }
            current = Some(address);
            headers += 1;
            continue;
        }

        if line.trim().is_empty() {
            current = None;
            continue;
        }

        let Some(symbol) = current.and_then(|address| symbols.get_mut(address)) else {
            continue;
        };

        if let Some(caps) = SOURCE_LINE.captures(line) {
            if symbol.lacks_location() {
                if let Ok(number) = caps[2].parse() {
                    symbol.set_location(&caps[1], number);
                }
            }
            continue;
        }

        symbol.asm.push(line.to_string());
    }

    tracing::debug!("disassembly: {} symbol blocks", headers);
    headers
}

/// Drop GCC clone tags such as `.constprop.0` or `.isra.1` from a name.
///
/// Names starting with `.` are local labels and kept as they are.
pub fn strip_clone_suffix<'a>(name: &'a str, suffixes: &[String]) -> &'a str {
    if name.starts_with('.') {
        return name;
    }
    let mut offset = 0;
    for segment in name.split('.') {
        if offset > 0 && suffixes.iter().any(|s| s == segment) {
            return &name[..offset - 1];
        }
        offset += segment.len() + 1;
    }
    name
}

/// Number of machine code bytes encoded in one instruction line.
pub fn count_assembly_code_bytes(line: &str) -> u64 {
    OPCODE
        .captures(line)
        .map(|caps| caps[1].chars().filter(char::is_ascii_hexdigit).count() as u64 / 2)
        .unwrap_or(0)
}
