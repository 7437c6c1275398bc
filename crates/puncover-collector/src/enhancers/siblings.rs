use puncover_core::Address;

use super::{Enhancer, Field, Model};
use crate::error::Result;

/// Link each function to the functions directly before and after it in
/// address order. Variables are skipped.
pub struct LinkSiblings;

impl Enhancer for LinkSiblings {
    fn name(&self) -> &'static str {
        "link-siblings"
    }

    fn requires(&self) -> Field {
        Field::empty()
    }

    fn produces(&self) -> Field {
        Field::SIBLINGS
    }

    fn run(&self, model: &mut Model) -> Result<()> {
        let functions: Vec<Address> = model.symbols.functions().map(|s| s.address).collect();

        for (idx, address) in functions.iter().enumerate() {
            if let Some(symbol) = model.symbols.get_mut(*address) {
                symbol.prev_function = idx.checked_sub(1).map(|prev| functions[prev]);
                symbol.next_function = functions.get(idx + 1).copied();
            }
        }
        tracing::debug!("siblings: {} functions linked", functions.len());
        Ok(())
    }
}
