use std::collections::HashMap;

use puncover_core::{Address, parse_hex_address};

use super::{Enhancer, Field, Model};
use crate::config::CollectorConfig;
use crate::error::Result;

// <address>: <opcode bytes> <mnemonic> <operands>
static_regex!(
    INSTRUCTION,
    r"^\s*[0-9a-f]+:\s+[0-9a-f]+(?: [0-9a-f]+)*\s+(\S+)(?:\s+(.*))?$"
);
static_regex!(BARE_HEX, r"^[0-9a-f]+$");

/// Append `<name>` to jump, branch and call instructions whose last operand
/// is the raw address of a known symbol. Lines that already carry an
/// annotation are left alone, so running the pass twice changes nothing.
///
/// Other instructions are skipped: RISC-V objdump prints immediates in
/// decimal, and `li a0,0` must not turn into a reference to address 0.
pub struct AnnotateAssembly {
    branch_mnemonics: Vec<String>,
}

impl AnnotateAssembly {
    pub fn new(branch_mnemonics: &[String]) -> Self {
        Self {
            branch_mnemonics: branch_mnemonics.to_vec(),
        }
    }
}

impl Default for AnnotateAssembly {
    fn default() -> Self {
        Self::new(&CollectorConfig::default().branch_mnemonics)
    }
}

impl Enhancer for AnnotateAssembly {
    fn name(&self) -> &'static str {
        "annotate-assembly"
    }

    fn requires(&self) -> Field {
        Field::ASM
    }

    fn produces(&self) -> Field {
        Field::ANNOTATED_ASM
    }

    fn run(&self, model: &mut Model) -> Result<()> {
        let names: HashMap<Address, String> = model
            .symbols
            .iter()
            .map(|s| (s.address, s.name.clone()))
            .collect();

        let mut annotated = 0;
        for symbol in model.symbols.iter_mut() {
            for line in symbol.asm.iter_mut() {
                let Some(name) = annotation_target(line.as_str(), &self.branch_mnemonics).and_then(|a| names.get(&a)) else {
                    continue;
                };
                line.push_str(" <");
                line.push_str(name);
                line.push('>');
                annotated += 1;
            }
        }
        tracing::info!("assembly: {} address literals annotated", annotated);
        Ok(())
    }
}

/// Address named by the last operand of an unannotated control-transfer
/// instruction line.
pub fn annotation_target(line: &str, branch_mnemonics: &[String]) -> Option<Address> {
    if line.contains('<') {
        return None;
    }
    let caps = INSTRUCTION.captures(line)?;
    if !is_branch_mnemonic(caps.get(1)?.as_str(), branch_mnemonics) {
        return None;
    }
    let operands = caps.get(2)?.as_str();
    // strip trailing comments such as "; 0x80000000"
    let operands = operands.split(['\t', ';']).next().unwrap_or_default();
    let last = operands
        .rsplit(|c: char| c == ',' || c.is_whitespace())
        .find(|t| !t.is_empty())?;
    if !BARE_HEX.is_match(last) {
        return None;
    }
    parse_hex_address(last).ok()
}

/// Whether `mnemonic` matches one of the patterns, where a trailing `*`
/// matches any remainder.
pub fn is_branch_mnemonic(mnemonic: &str, patterns: &[String]) -> bool {
    let mnemonic = mnemonic.to_ascii_lowercase();
    patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => mnemonic.starts_with(prefix),
        None => mnemonic == *pattern,
    })
}
