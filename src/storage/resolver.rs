use std::path::{Component, Path, PathBuf};

use crate::config::{HelperConfig, MAX_FILENAME_BYTES};
use crate::error::HelperError;

/// Which directory filenames are resolved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageRoot {
    /// Mounted external storage.
    External(PathBuf),
    /// Application-private cache directory.
    AppCache(PathBuf),
}

impl StorageRoot {
    pub fn path(&self) -> &Path {
        match self {
            Self::External(p) | Self::AppCache(p) => p,
        }
    }
}

/// Maps a logical filename to its location on disk. Resolution is pure: no I/O.
#[derive(Debug, Clone)]
pub struct StoragePathResolver {
    root: StorageRoot,
}

impl StoragePathResolver {
    pub fn new(root: StorageRoot) -> Self {
        Self { root }
    }

    /// External storage wins when configured, otherwise the app cache directory.
    pub fn from_config(config: &HelperConfig) -> Self {
        let root = match config.external_storage_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => StorageRoot::External(PathBuf::from(dir)),
            _ => StorageRoot::AppCache(PathBuf::from(&config.app_cache_dir)),
        };
        Self::new(root)
    }

    pub fn root(&self) -> &StorageRoot {
        &self.root
    }

    /// Resolve `filename` to its path under the storage root.
    ///
    /// `filename` may name a nested file (`albums/a.mp3`); every component must
    /// be a plain name, so traversal out of the root is impossible.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, HelperError> {
        validate_filename(filename)?;
        Ok(self.root.path().join(filename))
    }
}

fn validate_filename(filename: &str) -> Result<(), HelperError> {
    if filename.is_empty() {
        return Err(HelperError::invalid_filename(filename, "filename is empty"));
    }
    if filename.len() > MAX_FILENAME_BYTES {
        return Err(HelperError::invalid_filename(filename, "filename is too long"));
    }
    if filename.contains('\0') {
        return Err(HelperError::invalid_filename(filename, "filename contains NUL"));
    }
    // Windows separators would smuggle `..` past component parsing on unix.
    if filename.contains('\\') {
        return Err(HelperError::invalid_filename(filename, "filename contains a backslash"));
    }
    if filename.starts_with('/') {
        return Err(HelperError::invalid_filename(filename, "filename must be relative"));
    }
    if filename.ends_with('/') {
        return Err(HelperError::invalid_filename(filename, "filename names a directory"));
    }
    // `a//b.mp3` names the same file as `a/b.mp3`; only one spelling is a valid key.
    if filename.split('/').any(str::is_empty) {
        return Err(HelperError::invalid_filename(filename, "filename has an empty segment"));
    }

    // `Path::components` silently drops interior `.` segments, so check raw segments too.
    if filename.split('/').any(|seg| seg == "." || seg == "..") {
        return Err(HelperError::invalid_filename(filename, "path traversal is not allowed"));
    }
    for component in Path::new(filename).components() {
        match component {
            Component::Normal(_) => {}
            Component::ParentDir | Component::CurDir => {
                return Err(HelperError::invalid_filename(
                    filename,
                    "path traversal is not allowed",
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(HelperError::invalid_filename(filename, "filename must be relative"));
            }
        }
    }
    Ok(())
}
