//! Filesystem instance: owns the root and the state every node shares.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::FsError;
use crate::config::MountOptions;
use crate::inode::{Inode, Node};
use crate::traits::{FileSystem, FileSystemType};
use crate::types::{BLOCK_SIZE, FileType, Permissions, ROOT_INODE, StatFs};
use crate::usage::Usage;

/// State shared by all nodes of one instance.
///
/// Nodes hold it strongly and it refers to no node, so it never keeps
/// anything alive.
#[derive(Debug)]
pub(crate) struct FsCore {
    pub(crate) usage: Arc<Usage>,
    pub(crate) options: MountOptions,
    tree: Mutex<()>,
    next_ino: AtomicU64,
}

impl FsCore {
    fn new(options: MountOptions) -> Self {
        Self {
            usage: Arc::new(Usage::new(options.capacity)),
            options,
            tree: Mutex::new(()),
            next_ino: AtomicU64::new(ROOT_INODE),
        }
    }

    pub(crate) fn next_ino(&self) -> u64 {
        self.next_ino.fetch_add(1, Ordering::Relaxed)
    }

    /// Serializes structural mutations (create, link, unlink, move).
    pub(crate) fn lock_tree(&self) -> Result<MutexGuard<'_, ()>, FsError> {
        self.tree.lock().map_err(|_| FsError::poisoned())
    }
}

/// A mounted in-memory filesystem.
///
/// Holds the one counted reference that keeps the root alive. Unmounting
/// gives that reference back; the root and everything below it are freed
/// once no outside handle refers to them either.
///
/// # Example
///
/// ```rust
/// use ramfs::{FileType, MountOptions, Permissions, RamFs};
///
/// let fs = RamFs::mount(MountOptions::default())?;
/// let usage = fs.usage();
/// let dir = fs.root().create("d", FileType::Directory, Permissions::default_dir())?;
/// drop(dir);
/// fs.unmount();
/// assert_eq!(usage.live_inodes(), 0);
/// # Ok::<(), ramfs::FsError>(())
/// ```
#[derive(Debug)]
pub struct RamFs {
    core: Arc<FsCore>,
    root: Inode,
}

impl RamFs {
    /// Create an instance with an empty root directory whose `.` and `..`
    /// both point at itself.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if the options do not validate
    /// - [`FsError::OutOfMemory`] if the root cannot be allocated
    pub fn mount(options: MountOptions) -> Result<Self, FsError> {
        options.validate()?;
        let core = Arc::new(FsCore::new(options));
        let root = Node::allocate(&core, FileType::Directory, Permissions::default_dir(), None, 1)?;
        log::debug!(
            "mounted ramfs (source={:?}, max_name_len={}, capacity={:?})",
            core.options.source,
            core.options.max_name_len,
            core.options.capacity
        );
        Ok(Self {
            core,
            root: Inode(root),
        })
    }

    /// A new counted reference to the root directory.
    pub fn root(&self) -> Inode {
        self.root.retain()
    }

    /// Options this instance was mounted with.
    pub fn options(&self) -> &MountOptions {
        &self.core.options
    }

    /// Live usage counters; stays readable after unmount.
    pub fn usage(&self) -> Arc<Usage> {
        Arc::clone(&self.core.usage)
    }

    /// Aggregate statistics.
    pub fn info(&self) -> StatFs {
        let usage = &self.core.usage;
        let used = usage.used_bytes();
        let (total, available) = match usage.capacity() {
            Some(cap) => (cap, cap.saturating_sub(used)),
            None => (0, 0),
        };
        StatFs {
            total_bytes: total,
            used_bytes: used,
            available_bytes: available,
            used_inodes: usage.live_inodes(),
            block_size: BLOCK_SIZE,
            max_name_len: self.core.options.max_name_len as u64,
        }
    }

    /// Flush everything. Nothing to do for a memory-only filesystem.
    pub fn sync(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Release the instance's reference to the root and free the instance.
    pub fn unmount(self) {
        log::debug!(
            "unmounting ramfs ({} live inodes, {} bytes)",
            self.core.usage.live_inodes(),
            self.core.usage.used_bytes()
        );
        drop(self);
    }
}

impl FileSystem for RamFs {
    fn root_inode(&self) -> Inode {
        self.root()
    }

    fn info(&self) -> StatFs {
        RamFs::info(self)
    }

    fn sync(&self) -> Result<(), FsError> {
        RamFs::sync(self)
    }

    fn unmount(self: Box<Self>) {
        RamFs::unmount(*self);
    }
}

/// The `ramfs` filesystem type, for registration with [`FsRegistry`](crate::FsRegistry).
#[derive(Debug, Clone, Copy, Default)]
pub struct RamFsType;

impl FileSystemType for RamFsType {
    fn name(&self) -> &str {
        "ramfs"
    }

    fn mount(&self, options: &MountOptions) -> Result<Box<dyn FileSystem>, FsError> {
        Ok(Box::new(RamFs::mount(options.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DIRENT_SIZE;

    #[test]
    fn mount_creates_self_referencing_root() {
        let fs = RamFs::mount(MountOptions::default()).unwrap();
        let root = fs.root();
        assert_eq!(root.ino(), ROOT_INODE);
        assert!(root.is_dir());
        assert_eq!(root.find(".").unwrap(), root);
        assert_eq!(root.find("..").unwrap(), root);
        assert_eq!(root.metadata().unwrap().nlink, 1);
        assert_eq!(root.metadata().unwrap().size, 2 * DIRENT_SIZE);
    }

    #[test]
    fn mount_rejects_invalid_options() {
        let result = RamFs::mount(MountOptions::default().with_max_name_len(0));
        assert!(matches!(result, Err(FsError::InvalidArgument { .. })));
    }

    #[test]
    fn mount_fails_without_room_for_root() {
        let result = RamFs::mount(MountOptions::default().with_capacity(DIRENT_SIZE));
        assert!(matches!(result, Err(FsError::OutOfMemory { .. })));
    }

    #[test]
    fn root_returns_retained_reference() {
        let fs = RamFs::mount(MountOptions::default()).unwrap();
        let before = fs.root().reference_count();
        let held = fs.root();
        assert_eq!(held.reference_count(), before + 1);
    }

    #[test]
    fn unmount_frees_everything() {
        let fs = RamFs::mount(MountOptions::default()).unwrap();
        let usage = fs.usage();
        fs.root()
            .create("f", FileType::File, Permissions::default_file())
            .unwrap()
            .write_at(0, b"data")
            .unwrap();
        fs.unmount();
        assert_eq!(usage.live_inodes(), 0);
        assert_eq!(usage.used_bytes(), 0);
    }

    #[test]
    fn unmount_with_outstanding_handle_defers_destruction() {
        let fs = RamFs::mount(MountOptions::default()).unwrap();
        let usage = fs.usage();
        let root = fs.root();
        fs.unmount();
        assert_eq!(usage.live_inodes(), 1);
        assert_eq!(root.find(".").unwrap(), root);
        drop(root);
        assert_eq!(usage.live_inodes(), 0);
    }

    #[test]
    fn info_reports_usage_and_capacity() {
        let fs = RamFs::mount(MountOptions::default().with_capacity(10_000)).unwrap();
        let file = fs
            .root()
            .create("f", FileType::File, Permissions::default_file())
            .unwrap();
        file.write_at(0, &[7u8; 100]).unwrap();

        let info = fs.info();
        assert_eq!(info.total_bytes, 10_000);
        assert_eq!(info.used_bytes, 3 * DIRENT_SIZE + 100);
        assert_eq!(info.available_bytes, 10_000 - info.used_bytes);
        assert_eq!(info.used_inodes, 2);
        assert_eq!(info.block_size, BLOCK_SIZE);
        assert_eq!(info.max_name_len, 255);
        assert!(fs.sync().is_ok());
    }

    #[test]
    fn fs_type_mounts_through_trait_object() {
        let fs_type: &dyn FileSystemType = &RamFsType;
        assert_eq!(fs_type.name(), "ramfs");
        let fs = fs_type.mount(&MountOptions::default()).unwrap();
        assert!(fs.root_inode().is_dir());
        assert_eq!(fs.info().used_inodes, 1);
        fs.unmount();
    }
}
