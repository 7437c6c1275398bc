use puncover_core::{Address, SymbolTable, parse_hex_address};

use super::{Enhancer, Field, Model};
use crate::error::Result;

//   8e4:	f000 f824 	bl	930 <app_log>
//   a0006ac4:	c73fe0ef 	jal	ra,a0005736 <printf>
static_regex!(CALL_TARGET, r"^\s*[0-9a-f]+:\s.*[\s,(]([0-9a-f]+) <([^>]+)>");

/// Fill `callers`/`callees` from the annotated references in each
/// symbol's instructions.
pub struct CallTree;

impl Enhancer for CallTree {
    fn name(&self) -> &'static str {
        "call-tree"
    }

    fn requires(&self) -> Field {
        Field::ANNOTATED_ASM
    }

    fn produces(&self) -> Field {
        Field::CALL_GRAPH
    }

    fn run(&self, model: &mut Model) -> Result<()> {
        let references: Vec<(Address, Address)> = model
            .symbols
            .iter()
            .flat_map(|s| {
                s.asm
                    .iter()
                    .filter_map(|line| call_target(line))
                    .map(move |target| (s.address, target))
            })
            .collect();

        let mut edges = 0;
        for (caller, callee) in references {
            if add_function_call(&mut model.symbols, caller, callee) {
                edges += 1;
            }
        }
        tracing::info!("call tree: {} edges", edges);
        Ok(())
    }
}

/// Address referenced by an instruction of the form `... <hex> <<name>>`.
pub fn call_target(line: &str) -> Option<Address> {
    let caps = CALL_TARGET.captures(line)?;
    parse_hex_address(&caps[1]).ok()
}

/// Record that `caller` calls `callee` on both symbols.
///
/// Returns `false` when either address is unknown or the edge exists already.
pub fn add_function_call(symbols: &mut SymbolTable, caller: Address, callee: Address) -> bool {
    if !symbols.contains(callee) {
        return false;
    }
    let Some(from) = symbols.get_mut(caller) else {
        return false;
    };
    if from.callees.contains(&callee) {
        return false;
    }
    from.callees.push(callee);

    if let Some(to) = symbols.get_mut(callee) {
        if !to.callers.contains(&caller) {
            to.callers.push(caller);
        }
    }
    true
}
