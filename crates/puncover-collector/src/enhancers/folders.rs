use puncover_core::{FolderCollapse, base_name, normalize_path};

use super::{Enhancer, Field, Model};
use crate::error::Result;

/// Normalize every symbol path and attach the symbol to its file.
///
/// Symbols without a known origin are filed under `<origin>/<origin>`.
pub struct DeriveFolders {
    unknown_origin: String,
}

impl DeriveFolders {
    pub fn new(unknown_origin: &str) -> Self {
        Self {
            unknown_origin: unknown_origin.to_string(),
        }
    }
}

impl Enhancer for DeriveFolders {
    fn name(&self) -> &'static str {
        "derive-folders"
    }

    fn requires(&self) -> Field {
        Field::empty()
    }

    fn produces(&self) -> Field {
        Field::FILES
    }

    fn run(&self, model: &mut Model) -> Result<()> {
        let unknown_path = format!("{0}/{0}", self.unknown_origin);
        let mut unknown = 0;

        for symbol in model.symbols.iter_mut() {
            let path = match symbol.path.as_deref() {
                Some(path) => {
                    let path = normalize_path(path);
                    symbol.base_file = Some(base_name(&path).to_string());
                    path
                }
                None => {
                    symbol.base_file = Some(self.unknown_origin.clone());
                    unknown += 1;
                    unknown_path.clone()
                }
            };

            let file = model.tree.file_for_path(&path);
            model.tree.attach_symbol(file, symbol.address)?;
            symbol.file = Some(file);
            symbol.path = Some(path);
        }

        tracing::info!(
            "folders: {} files, {} symbols of unknown origin",
            model.tree.files().count(),
            unknown
        );
        Ok(())
    }
}

/// Link the folder hierarchy and compute its collapsed view.
pub struct BuildFolderTree {
    collapse: FolderCollapse,
}

impl BuildFolderTree {
    pub fn new(collapse: FolderCollapse) -> Self {
        Self { collapse }
    }
}

impl Enhancer for BuildFolderTree {
    fn name(&self) -> &'static str {
        "build-folder-tree"
    }

    fn requires(&self) -> Field {
        Field::FILES
    }

    fn produces(&self) -> Field {
        Field::FOLDER_TREE
    }

    fn run(&self, model: &mut Model) -> Result<()> {
        model.tree.build(self.collapse);
        Ok(())
    }
}
