//! Collector configuration, loaded from TOML

use std::path::Path;

use puncover_core::FolderCollapse;
use serde::{Deserialize, Serialize};

use crate::error::{CollectorError, Result};
use crate::signature::TypeAliasTable;

/// Spellings that all denote the same parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAliasGroup {
    pub canonical: String,
    pub aliases: Vec<String>,
}

impl TypeAliasGroup {
    pub fn new(canonical: &str, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// File, folder and base file name given to symbols without a source location.
    pub unknown_origin: String,
    pub type_aliases: Vec<TypeAliasGroup>,
    pub folder_collapse: FolderCollapse,
    /// GCC clone tags removed from disassembly names, e.g. `foo.constprop.0` -> `foo`.
    pub clone_suffixes: Vec<String>,
    /// Jump, branch and call mnemonics whose raw hex operand may be
    /// annotated with a symbol name. A trailing `*` matches any suffix,
    /// so `b*` covers `bl`, `bne.n` and `bltu`.
    pub branch_mnemonics: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            unknown_origin: "<libgcc>".to_string(),
            type_aliases: default_type_aliases(),
            folder_collapse: FolderCollapse::default(),
            clone_suffixes: ["constprop", "isra", "part", "lto_priv", "cold", "clone"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            branch_mnemonics: ["b*", "j*", "call*", "tail", "cbz", "cbnz"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CollectorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CollectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!("loaded collector config from {}", path.display());
        Ok(config)
    }

    pub fn type_alias_table(&self) -> TypeAliasTable {
        TypeAliasTable::from_groups(&self.type_aliases)
    }

    /// Synthetic path for symbols without a source location.
    pub fn unknown_path(&self) -> String {
        format!("{0}/{0}", self.unknown_origin)
    }
}

/// Integer spellings of a 32-bit target plus the Arduino `byte`.
pub fn default_type_aliases() -> Vec<TypeAliasGroup> {
    vec![
        TypeAliasGroup::new("unsigned char", &["uint8_t", "byte"]),
        TypeAliasGroup::new("signed char", &["int8_t"]),
        TypeAliasGroup::new(
            "unsigned short",
            &["uint16_t", "short unsigned int", "unsigned short int"],
        ),
        TypeAliasGroup::new("short", &["int16_t", "short int", "signed short"]),
        TypeAliasGroup::new(
            "unsigned int",
            &["size_t", "unsigned", "uint32_t", "unsigned long", "long unsigned int", "unsigned long int"],
        ),
        TypeAliasGroup::new("int", &["int32_t", "long", "long int", "signed", "signed int", "ssize_t"]),
        TypeAliasGroup::new(
            "unsigned long long",
            &["uint64_t", "long long unsigned int", "unsigned long long int"],
        ),
        TypeAliasGroup::new("long long", &["int64_t", "long long int", "signed long long"]),
    ]
}
