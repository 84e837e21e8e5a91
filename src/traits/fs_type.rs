//! Filesystem type capability.

use crate::{FileSystem, FsError, MountOptions};

/// A named filesystem implementation that can produce mounted instances.
///
/// Registered by name in an [`FsRegistry`](crate::FsRegistry).
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `Box<dyn FileSystemType>`.
pub trait FileSystemType: Send + Sync {
    /// Name the type is registered under.
    fn name(&self) -> &str;

    /// Create a fresh instance.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if `options` do not validate
    /// - [`FsError::OutOfMemory`] if the instance cannot be allocated
    fn mount(&self, options: &MountOptions) -> Result<Box<dyn FileSystem>, FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_type_is_object_safe() {
        fn _check(_: &dyn FileSystemType) {}
    }

    #[test]
    fn fs_type_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FileSystemType>() {
            _assert_send_sync::<T>();
        }
    }
}
