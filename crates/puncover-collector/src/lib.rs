//! Parsers and enhancement passes for toolchain output
//!
//! Turns `nm` size tables, `objdump` disassembly and GCC stack usage
//! reports into the symbol, file and folder model of `puncover-core`.

macro_rules! static_regex {
    ($name:ident, $str:expr) => {
        static $name: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($str).unwrap());
    };
}

pub mod collector;
pub mod config;
pub mod enhancers;
pub mod error;
pub mod parsers;
pub mod signature;


pub use collector::{Analysis, Collector};
pub use config::{CollectorConfig, TypeAliasGroup, default_type_aliases};
pub use enhancers::{Enhancer, Field, Model, Pipeline};
pub use error::{CollectorError, Result};
pub use signature::{TypeAliasTable, display_names_match};
