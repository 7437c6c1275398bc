//! Line parsers for toolchain text output
//!
//! Parsers never fail: a line that does not have the expected shape is
//! skipped and reported as "no match".

pub mod disassembly;
pub mod size;
pub mod stack_usage;

pub use disassembly::{count_assembly_code_bytes, parse_assembly_text, strip_clone_suffix};
pub use size::{parse_display_name_line, parse_size_line};
pub use stack_usage::parse_stack_usage_line;
