//! # Path Resolution
//!
//! Turns `/`-separated paths into node handles by walking one directory
//! entry at a time.
//!
//! ## Responsibility
//! - Define the contract for path resolution ([`PathResolver`])
//! - Provide the component walker used by [`Inode::lookup`]
//!
//! ## Rules
//! - Empty components are skipped, so `a//b/` is `a/b`
//! - `.` and `..` are looked up like any other name
//! - A leading `/` starts from the filesystem root, found by following
//!   `..` until it points back at itself
//!
//! ```rust
//! use ramfs::{FileType, MountOptions, Permissions, RamFs};
//!
//! let fs = RamFs::mount(MountOptions::default())?;
//! let root = fs.root();
//! let etc = root.create("etc", FileType::Directory, Permissions::default_dir())?;
//! let hosts = etc.create("hosts", FileType::File, Permissions::default_file())?;
//!
//! assert_eq!(root.lookup("etc/hosts")?, hosts);
//! assert_eq!(etc.lookup("/etc/./hosts")?, hosts);
//! assert_eq!(etc.lookup("../etc")?, etc);
//! # Ok::<(), ramfs::FsError>(())
//! ```

use crate::dirent::DOTDOT;
use crate::{FsError, Inode};

/// Strategy for resolving a path relative to a starting directory.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn PathResolver`.
pub trait PathResolver: Send + Sync {
    /// Resolve `path` starting at `start`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if a component does not exist
    /// - [`FsError::NotADirectory`] if a non-final component is not a directory
    fn resolve(&self, start: &Inode, path: &str) -> Result<Inode, FsError>;

    /// Resolve everything but the last component.
    ///
    /// Returns the parent directory and the final name, for callers about
    /// to create, unlink or move that name.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the path has no final component
    /// - anything [`resolve`](Self::resolve) fails with for the parent
    fn resolve_parent(&self, start: &Inode, path: &str) -> Result<(Inode, String), FsError> {
        let trimmed = path.trim_end_matches('/');
        let (parent, name) = match trimmed.rfind('/') {
            Some(split) => (&trimmed[..=split], &trimmed[split + 1..]),
            None => ("", trimmed),
        };
        if name.is_empty() {
            return Err(FsError::invalid(
                "resolve_parent",
                format!("no final component in {path:?}"),
            ));
        }
        Ok((self.resolve(start, parent)?, name.to_owned()))
    }
}

/// Walks the path one component at a time with [`Inode::find`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentResolver;

impl ComponentResolver {
    fn root_of(start: &Inode) -> Result<Inode, FsError> {
        let mut current = start.retain();
        loop {
            let parent = current.find(DOTDOT)?;
            if parent == current {
                return Ok(current);
            }
            current = parent;
        }
    }
}

impl PathResolver for ComponentResolver {
    fn resolve(&self, start: &Inode, path: &str) -> Result<Inode, FsError> {
        let mut current = if path.starts_with('/') {
            Self::root_of(start)?
        } else {
            start.retain()
        };
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = current.find(component)?;
        }
        Ok(current)
    }
}

impl Inode {
    /// Resolve a `/`-separated path relative to this directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if a component does not exist
    /// - [`FsError::NotADirectory`] if a non-final component is not a directory
    pub fn lookup(&self, path: &str) -> Result<Inode, FsError> {
        ComponentResolver.resolve(self, path)
    }
}
