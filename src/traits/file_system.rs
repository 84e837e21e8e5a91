//! Mounted filesystem capability.

use crate::{FsError, Inode, StatFs};

/// A mounted filesystem instance as a host mount layer sees it.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `Box<dyn FileSystem>`.
pub trait FileSystem: Send + Sync {
    /// A new counted reference to the root directory.
    fn root_inode(&self) -> Inode;

    /// Aggregate statistics.
    fn info(&self) -> StatFs;

    /// Flush all pending changes.
    ///
    /// # Errors
    ///
    /// - [`FsError::Backend`] for backend-specific failures
    fn sync(&self) -> Result<(), FsError>;

    /// Tear the instance down, giving back its reference to the root.
    fn unmount(self: Box<Self>);
}
