//! Error types for the ramfs core.

use std::io;

/// Filesystem error type with contextual variants.
///
/// Every tree, buffer and mount operation returns `Result<T, FsError>`. A
/// failed call leaves the tree exactly as it was before the call.
///
/// # Examples
///
/// ```rust
/// use ramfs::FsError;
///
/// let err = FsError::NotFound { name: "missing".into() };
/// assert_eq!(err.to_string(), "not found: missing");
/// assert_eq!(err.errno(), 2);
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Entry errors
    /// No entry with this name exists in the directory.
    #[error("not found: {name}")]
    NotFound {
        /// The entry name that was looked up.
        name: String,
    },

    /// An entry with this name is already present.
    #[error("{operation}: already exists: {name}")]
    AlreadyExists {
        /// The conflicting entry name.
        name: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// A directory was required but the node is not one.
    #[error("not a directory: inode {inode}")]
    NotADirectory {
        /// Inode number of the offending node.
        inode: u64,
    },

    /// A non-directory was required but the node is a directory.
    #[error("is a directory: inode {inode}")]
    IsADirectory {
        /// Inode number of the offending node.
        inode: u64,
    },

    /// Directory still holds entries besides `.` and `..`.
    #[error("directory not empty: {name}")]
    DirectoryNotEmpty {
        /// Name of the directory entry.
        name: String,
    },

    /// Directory listing index past the last entry.
    #[error("entry index out of range: {index} (entries: {count})")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// Number of entries in the directory.
        count: usize,
    },

    // Argument errors
    /// Argument rejected by the operation.
    #[error("{operation}: invalid argument: {reason}")]
    InvalidArgument {
        /// The operation that failed.
        operation: &'static str,
        /// Why the argument was rejected.
        reason: String,
    },

    /// Entry name exceeds the mount's maximum name length.
    #[error("name too long: {len} > {max}")]
    NameTooLong {
        /// Length of the rejected name in bytes.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// The two nodes belong to different filesystem instances.
    #[error("{operation}: nodes belong to different filesystems")]
    CrossDevice {
        /// The operation that failed.
        operation: &'static str,
    },

    // Resource errors
    /// Allocation failed or the configured capacity would be exceeded.
    #[error("out of memory: requested {requested} bytes")]
    OutOfMemory {
        /// Bytes the failed call tried to add.
        requested: u64,
    },

    // Backend errors
    /// Operation is not supported by this filesystem.
    #[error("operation not supported: {operation}")]
    NotSupported {
        /// The unsupported operation.
        operation: &'static str,
    },

    /// Mount options could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Internal failure, such as a poisoned lock.
    #[error("backend error: {0}")]
    Backend(String),
}

impl FsError {
    pub(crate) fn invalid(operation: &'static str, reason: impl Into<String>) -> Self {
        FsError::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn poisoned() -> Self {
        FsError::Backend("lock poisoned".into())
    }

    /// POSIX errno a host dispatcher reports for this error.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound { .. } | FsError::OutOfRange { .. } => 2, // ENOENT
            FsError::AlreadyExists { .. } => 17,                       // EEXIST
            FsError::NotADirectory { .. } => 20,                       // ENOTDIR
            FsError::IsADirectory { .. } => 21,                        // EISDIR
            FsError::DirectoryNotEmpty { .. } => 39,                   // ENOTEMPTY
            FsError::InvalidArgument { .. } | FsError::Deserialization(_) => 22, // EINVAL
            FsError::NameTooLong { .. } => 36,                         // ENAMETOOLONG
            FsError::CrossDevice { .. } => 18,                         // EXDEV
            FsError::OutOfMemory { .. } => 12,                         // ENOMEM
            FsError::NotSupported { .. } => 38,                        // ENOSYS
            FsError::Backend(_) => 5,                                  // EIO
        }
    }
}

impl From<FsError> for io::Error {
    fn from(error: FsError) -> Self {
        let kind = match &error {
            FsError::NotFound { .. } | FsError::OutOfRange { .. } => io::ErrorKind::NotFound,
            FsError::AlreadyExists { .. } => io::ErrorKind::AlreadyExists,
            FsError::NotADirectory { .. } => io::ErrorKind::NotADirectory,
            FsError::IsADirectory { .. } => io::ErrorKind::IsADirectory,
            FsError::DirectoryNotEmpty { .. } => io::ErrorKind::DirectoryNotEmpty,
            FsError::InvalidArgument { .. } | FsError::NameTooLong { .. } => {
                io::ErrorKind::InvalidInput
            }
            FsError::Deserialization(_) => io::ErrorKind::InvalidData,
            FsError::CrossDevice { .. } => io::ErrorKind::CrossesDevices,
            FsError::OutOfMemory { .. } => io::ErrorKind::OutOfMemory,
            FsError::NotSupported { .. } => io::ErrorKind::Unsupported,
            FsError::Backend(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_error_not_found_display() {
        let err = FsError::NotFound {
            name: "missing".into(),
        };
        assert_eq!(err.to_string(), "not found: missing");
    }

    #[test]
    fn fs_error_already_exists_display() {
        let err = FsError::AlreadyExists {
            name: "exists".into(),
            operation: "create",
        };
        assert_eq!(err.to_string(), "create: already exists: exists");
    }

    #[test]
    fn fs_error_out_of_range_display() {
        let err = FsError::OutOfRange { index: 7, count: 2 };
        assert!(err.to_string().contains('7'));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn fs_error_errno_mapping() {
        assert_eq!(FsError::NotADirectory { inode: 3 }.errno(), 20);
        assert_eq!(FsError::IsADirectory { inode: 3 }.errno(), 21);
        assert_eq!(
            FsError::DirectoryNotEmpty { name: "d".into() }.errno(),
            39
        );
        assert_eq!(FsError::OutOfMemory { requested: 1 }.errno(), 12);
        assert_eq!(FsError::OutOfRange { index: 0, count: 0 }.errno(), 2);
        assert_eq!(FsError::invalid("unlink", "dot entry").errno(), 22);
    }

    #[test]
    fn fs_error_into_io_not_found() {
        let io_err = io::Error::from(FsError::NotFound { name: "x".into() });
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn fs_error_into_io_directory_not_empty() {
        let io_err = io::Error::from(FsError::DirectoryNotEmpty { name: "d".into() });
        assert_eq!(io_err.kind(), io::ErrorKind::DirectoryNotEmpty);
    }

    #[test]
    fn fs_error_into_io_keeps_message() {
        let io_err = io::Error::from(FsError::poisoned());
        assert_eq!(io_err.kind(), io::ErrorKind::Other);
        assert!(io_err.to_string().contains("lock poisoned"));
    }
}
