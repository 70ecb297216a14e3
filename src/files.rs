// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Where documents are read from and written to.
//!
//! Paths handed to these traits are the logical, normalized paths documents are known
//! by. Copying, deleting and committing files is left to the caller.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Component, Path, PathBuf},
};

pub trait FileSource {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

pub trait FileSink {
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Reads and writes files below a directory on disk.
#[derive(Clone, Debug)]
pub struct DirectoryFiles {
    root: PathBuf,
}

impl DirectoryFiles {
    pub fn new(root: impl Into<PathBuf>) -> DirectoryFiles {
        DirectoryFiles { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSource for DirectoryFiles {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(self.root.join(path))
    }
}

impl FileSink for DirectoryFiles {
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(full_path, contents)
    }
}

/// In-memory file tree, used by tests and by callers that keep pristine copies.
#[derive(Clone, Debug, Default)]
pub struct MemoryFiles {
    files: BTreeMap<PathBuf, String>,
}

impl MemoryFiles {
    pub fn new() -> MemoryFiles {
        MemoryFiles::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> MemoryFiles {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, contents: impl Into<String>) {
        self.files.insert(normalize_path(path.as_ref()), contents.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(&normalize_path(path.as_ref())).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }
}

impl FileSource for MemoryFiles {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.get(path)
            .map(str::to_string)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))
    }
}

impl FileSink for MemoryFiles {
    fn write(&mut self, path: &Path, contents: &str) -> io::Result<()> {
        self.insert(path, contents);
        Ok(())
    }
}

/// Lexically resolves `.` and `..` components. Leading `..` that can't be resolved
/// are kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(Component::ParentDir) | Some(Component::CurDir) | None => parts.push(component),
            },
            Component::Normal(_) | Component::RootDir | Component::Prefix(_) => parts.push(component),
        }
    }
    parts.iter().collect()
}
