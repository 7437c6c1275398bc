use super::{Enhancer, Field, Model};
use crate::error::Result;
use crate::parsers::count_assembly_code_bytes;

/// Give every disassembled symbol without a size the byte count of its
/// instructions.
pub struct FunctionSizeFromAssembly;

impl Enhancer for FunctionSizeFromAssembly {
    fn name(&self) -> &'static str {
        "function-size-from-assembly"
    }

    fn requires(&self) -> Field {
        Field::ASM
    }

    fn produces(&self) -> Field {
        Field::SIZES
    }

    fn run(&self, model: &mut Model) -> Result<()> {
        let mut derived = 0;
        for symbol in model.symbols.iter_mut().filter(|s| s.size.is_none() && !s.asm.is_empty()) {
            symbol.size = Some(symbol.asm.iter().map(|l| count_assembly_code_bytes(l)).sum());
            derived += 1;
        }
        tracing::info!("sizes: {} derived from assembly", derived);
        Ok(())
    }
}
