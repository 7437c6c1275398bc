use thiserror::Error;

use crate::model::{Address, FileId, FolderId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid hex address: {0}")]
    InvalidAddress(String),
    #[error("No symbol at address {0:#x}")]
    UnknownSymbol(Address),
    #[error("Unknown file id {0:?}")]
    UnknownFile(FileId),
    #[error("Unknown folder id {0:?}")]
    UnknownFolder(FolderId),
}
