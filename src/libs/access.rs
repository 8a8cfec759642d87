//! Storage access gate consulted before any import or export touches a file.

use std::fmt::Debug;
use std::fs;
use std::path::PathBuf;

pub trait StorageAccess: Send + Sync + Debug {
    fn has_storage_access(&self) -> bool;
    fn request_storage_access(&self) -> bool;
}

/// Always granted.
#[derive(Debug, Default, Clone, Copy)]
pub struct GrantedAccess;

impl StorageAccess for GrantedAccess {
    fn has_storage_access(&self) -> bool {
        true
    }

    fn request_storage_access(&self) -> bool {
        true
    }
}

/// Grants access when the directory exists and is writable, and requests it
/// by creating the directory.
#[derive(Debug, Clone)]
pub struct DirectoryAccess {
    dir: PathBuf,
}

impl DirectoryAccess {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryAccess { dir: dir.into() }
    }
}

impl StorageAccess for DirectoryAccess {
    fn has_storage_access(&self) -> bool {
        fs::metadata(&self.dir).map(|m| m.is_dir() && !m.permissions().readonly()).unwrap_or(false)
    }

    fn request_storage_access(&self) -> bool {
        fs::create_dir_all(&self.dir).is_ok() && self.has_storage_access()
    }
}
