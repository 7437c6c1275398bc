//! Source file and folder hierarchy, with collapsing of pass-through folders

use std::collections::HashMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{Address, File, FileId, Folder, FolderId, base_name};
use crate::path::parent_path;

/// Which folders are merged into their sub-folders in the collapsed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FolderCollapse {
    /// Any folder without files of its own, even one with several
    /// sub-folders. This is how puncover has always grouped its folder
    /// view; use `SingleChild` to keep branching folders as their own nodes.
    #[default]
    FileLess,
    /// Only folders without files and with exactly one sub-folder.
    SingleChild,
}

/// Arena of files and folders, interned by path.
#[derive(Debug, Clone, Default)]
pub struct FileTree {
    files: Vec<File>,
    folders: Vec<Folder>,
    file_index: HashMap<String, FileId>,
    folder_index: HashMap<String, FolderId>,
    roots: Vec<FolderId>,
    collapsed_roots: Vec<FolderId>,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern the file at `path` together with all of its ancestor folders.
    pub fn file_for_path(&mut self, path: &str) -> FileId {
        if let Some(id) = self.file_index.get(path) {
            return *id;
        }

        let folder = parent_path(path).map(|dir| self.folder_for_path(dir));
        let id = FileId(self.files.len());
        self.files.push(File {
            id,
            path: path.to_string(),
            name: base_name(path).to_string(),
            folder,
            symbols: Vec::new(),
        });
        self.file_index.insert(path.to_string(), id);
        id
    }

    /// Intern the folder at `path` together with all of its ancestors.
    pub fn folder_for_path(&mut self, path: &str) -> FolderId {
        if let Some(id) = self.folder_index.get(path) {
            return *id;
        }

        let parent = parent_path(path).map(|dir| self.folder_for_path(dir));
        let id = FolderId(self.folders.len());
        self.folders.push(Folder {
            id,
            path: path.to_string(),
            name: base_name(path).to_string(),
            parent,
            sub_folders: Vec::new(),
            files: Vec::new(),
            root: None,
            collapsed_name: None,
            collapsed_sub_folders: Vec::new(),
        });
        self.folder_index.insert(path.to_string(), id);
        id
    }

    /// Record that `address` belongs to `file`.
    pub fn attach_symbol(&mut self, file: FileId, address: Address) -> Result<(), CoreError> {
        let entry = self.files.get_mut(file.0).ok_or(CoreError::UnknownFile(file))?;
        if !entry.symbols.contains(&address) {
            entry.symbols.push(address);
        }
        Ok(())
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.files.get(id.0)
    }

    pub fn folder(&self, id: FolderId) -> Option<&Folder> {
        self.folders.get(id.0)
    }

    pub fn file_by_path(&self, path: &str) -> Option<&File> {
        self.file_index.get(path).and_then(|id| self.file(*id))
    }

    pub fn folder_by_path(&self, path: &str) -> Option<&Folder> {
        self.folder_index.get(path).and_then(|id| self.folder(*id))
    }

    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.iter()
    }

    pub fn folders(&self) -> impl Iterator<Item = &Folder> {
        self.folders.iter()
    }

    /// Top-level folders. Empty until [`FileTree::build`] ran.
    pub fn root_folders(&self) -> &[FolderId] {
        &self.roots
    }

    /// First folders worth showing below each root. Empty until [`FileTree::build`] ran.
    pub fn collapsed_root_folders(&self) -> &[FolderId] {
        &self.collapsed_roots
    }

    /// Link children to parents, resolve roots and compute the collapsed view.
    ///
    /// Safe to call again after more paths were interned.
    pub fn build(&mut self, collapse: FolderCollapse) {
        for folder in &mut self.folders {
            folder.sub_folders.clear();
            folder.files.clear();
            folder.collapsed_sub_folders.clear();
        }

        for file in &self.files {
            if let Some(folder) = file.folder {
                self.folders[folder.0].files.push(file.id);
            }
        }
        for idx in 0..self.folders.len() {
            if let Some(parent) = self.folders[idx].parent {
                self.folders[parent.0].sub_folders.push(FolderId(idx));
            }
        }

        let files = &self.files;
        let names: Vec<String> = self.folders.iter().map(|f| f.name.clone()).collect();
        for folder in &mut self.folders {
            folder.sub_folders.sort_by(|a, b| names[a.0].cmp(&names[b.0]));
            folder.files.sort_by(|a, b| files[a.0].name.cmp(&files[b.0].name));
        }

        let mut roots: Vec<FolderId> = self
            .folders
            .iter()
            .filter(|f| f.parent.is_none())
            .map(|f| f.id)
            .collect();
        roots.sort_by(|a, b| names[a.0].cmp(&names[b.0]));
        self.roots = roots;

        for idx in 0..self.folders.len() {
            let mut top = FolderId(idx);
            while let Some(parent) = self.folders[top.0].parent {
                top = parent;
            }
            self.folders[idx].root = Some(top);
        }

        self.collapse(collapse);
        tracing::debug!(
            "folder tree: {} folders, {} roots, {} collapsed roots",
            self.folders.len(),
            self.roots.len(),
            self.collapsed_roots.len()
        );
    }

    fn collapse(&mut self, collapse: FolderCollapse) {
        let pass_through: Vec<bool> = self
            .folders
            .iter()
            .map(|f| {
                f.files.is_empty()
                    && !f.sub_folders.is_empty()
                    && (collapse == FolderCollapse::FileLess || f.sub_folders.len() == 1)
            })
            .collect();

        // Parents precede their children in the arena, so one forward pass
        // sees every parent's collapsed name before its children need it.
        for idx in 0..self.folders.len() {
            let name = match self.folders[idx].parent {
                Some(parent) if pass_through[parent.0] => format!(
                    "{}/{}",
                    self.folders[parent.0].collapsed_name.as_deref().unwrap_or_default(),
                    self.folders[idx].name
                ),
                _ => self.folders[idx].name.clone(),
            };
            self.folders[idx].collapsed_name = Some(name);
        }

        for idx in 0..self.folders.len() {
            let mut collapsed = Vec::new();
            self.expand_into(&self.folders[idx].sub_folders, &pass_through, &mut collapsed);
            self.folders[idx].collapsed_sub_folders = collapsed;
        }

        let mut collapsed_roots = Vec::new();
        self.expand_into(&self.roots, &pass_through, &mut collapsed_roots);
        self.collapsed_roots = collapsed_roots;
    }

    fn expand_into(&self, ids: &[FolderId], pass_through: &[bool], out: &mut Vec<FolderId>) {
        for id in ids {
            if pass_through[id.0] {
                self.expand_into(&self.folders[id.0].sub_folders, pass_through, out);
            } else {
                out.push(*id);
            }
        }
    }

    /// Indented text view of the collapsed tree.
    pub fn render_collapsed(&self) -> String {
        let mut out = String::new();
        for id in &self.collapsed_roots {
            self.render_folder(*id, 0, &mut out);
        }
        out
    }

    fn render_folder(&self, id: FolderId, depth: usize, out: &mut String) {
        let folder = &self.folders[id.0];
        let indent = "  ".repeat(depth);
        let name = folder.collapsed_name.as_deref().unwrap_or(&folder.name);
        let _ = writeln!(out, "{}{}/", indent, name);
        for sub in &folder.collapsed_sub_folders {
            self.render_folder(*sub, depth + 1, out);
        }
        for file in &folder.files {
            let _ = writeln!(out, "{}  {}", indent, self.files[file.0].name);
        }
    }
}
