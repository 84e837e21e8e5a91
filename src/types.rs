//! Core types shared across the crate.

use std::time::SystemTime;

/// The root directory always has inode 1.
pub const ROOT_INODE: u64 = 1;

/// Block size reported in node metadata and filesystem statistics.
pub const BLOCK_SIZE: u64 = 4096;

/// Size of one directory entry record: a 256-byte name field plus an
/// 8-byte child reference.
pub const DIRENT_SIZE: u64 = 264;

/// Longest entry name a record can hold (the name field is NUL-terminated).
pub const MAX_NAME_LEN: usize = 255;

/// Type of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Character device; content behaves like a regular file.
    CharDevice,
    /// Block device; content behaves like a regular file.
    BlockDevice,
}

impl FileType {
    /// Returns `true` for [`FileType::Directory`].
    #[inline]
    pub fn is_dir(self) -> bool {
        self == FileType::Directory
    }
}

/// Metadata for a node.
///
/// Size, block count and link count are derived from the node's state on
/// every query; nothing here is cached on the node.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Inode number (unique within the filesystem instance).
    pub inode: u64,
    /// Type of the node.
    pub file_type: FileType,
    /// Size in bytes. For directories, `entry count * DIRENT_SIZE`.
    pub size: u64,
    /// Preferred I/O block size.
    pub block_size: u64,
    /// Size in blocks, `ceil(size / block_size)`.
    pub blocks: u64,
    /// Number of directory entries referencing the node (+1 for the root).
    pub nlink: u64,
    /// Mode bits. Stored, never enforced.
    pub permissions: Permissions,
    /// Device id for device nodes.
    pub rdev: u64,
    /// Last access time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub accessed: SystemTime,
    /// Last content modification time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub modified: SystemTime,
    /// Last metadata change time.
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub changed: SystemTime,
}

impl Metadata {
    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }
}

/// One positional directory listing record.
///
/// Carries the child's inode number, not a counted reference.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirEntry {
    /// Entry name.
    pub name: String,
    /// Inode number of the entry's target.
    pub inode: u64,
}

/// Unix-style permissions stored as a mode bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permissions(u32);

impl Permissions {
    /// Create permissions from a Unix mode (e.g., 0o755).
    #[inline]
    pub const fn from_mode(mode: u32) -> Self {
        Self(mode & 0o7777)
    }

    /// Get the raw mode value.
    #[inline]
    pub const fn mode(&self) -> u32 {
        self.0
    }

    /// Default permissions for a new file (0o644 = rw-r--r--).
    #[inline]
    pub const fn default_file() -> Self {
        Self(0o644)
    }

    /// Default permissions for a new directory (0o755 = rwxr-xr-x).
    #[inline]
    pub const fn default_dir() -> Self {
        Self(0o755)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::default_file()
    }
}

/// Filesystem statistics (like `statvfs`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatFs {
    /// Capacity in bytes (0 = unlimited).
    pub total_bytes: u64,
    /// Bytes held by file contents and directory records.
    pub used_bytes: u64,
    /// Bytes left before the capacity is reached (0 when unlimited).
    pub available_bytes: u64,
    /// Number of live nodes.
    pub used_inodes: u64,
    /// Block size in bytes.
    pub block_size: u64,
    /// Maximum entry name length.
    pub max_name_len: u64,
}

/// Readiness of a node for I/O.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStatus {
    /// Reads will not block.
    pub read: bool,
    /// Writes will not block.
    pub write: bool,
    /// The node is in an error state.
    pub error: bool,
}

/// Serde support for SystemTime (when serde feature is enabled).
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        (duration.as_secs(), duration.subsec_nanos()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (u64, u32) = Deserialize::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::new(secs, nanos))
    }
}
