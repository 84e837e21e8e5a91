//! Node lifecycle and per-node operations.
//!
//! A node is shared through [`Inode`], a counted handle: cloning it is a
//! retain, dropping it is a release. Directory records that own a child
//! hold the same kind of count. The node is destroyed, and its storage
//! released, exactly when the last count goes away.
//!
//! `.` and `..` records are back-links (`Weak`) and never keep a node
//! alive. Every owning edge points from a directory to a child, so the
//! ownership graph is acyclic.
//!
//! A destroyed directory takes the links of its records with it: a child
//! that outlives it on a handle alone has one link fewer, down to 0.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use crate::FsError;
use crate::buffer::Buffer;
use crate::dirent::{DOT, DOTDOT, DirEntries, Record};
use crate::fs::FsCore;
use crate::types::{BLOCK_SIZE, FileType, Metadata, Permissions, PollStatus};

/// Content of a node: bytes for files and devices, records for directories.
#[derive(Debug)]
pub(crate) enum Content {
    Bytes(Buffer),
    Entries(DirEntries),
}

#[derive(Debug)]
pub(crate) struct NodeState {
    pub(crate) content: Content,
    pub(crate) nlink: u64,
    pub(crate) permissions: Permissions,
    pub(crate) rdev: u64,
    pub(crate) accessed: SystemTime,
    pub(crate) modified: SystemTime,
    pub(crate) changed: SystemTime,
}

impl NodeState {
    fn size(&self) -> u64 {
        match &self.content {
            Content::Bytes(buffer) => buffer.len() as u64,
            Content::Entries(entries) => entries.size(),
        }
    }

    /// Content changed.
    pub(crate) fn touch(&mut self) {
        let now = SystemTime::now();
        self.modified = now;
        self.changed = now;
    }

    /// Metadata changed.
    pub(crate) fn touch_changed(&mut self) {
        self.changed = SystemTime::now();
    }

    pub(crate) fn entries(&self, ino: u64) -> Result<&DirEntries, FsError> {
        match &self.content {
            Content::Entries(entries) => Ok(entries),
            Content::Bytes(_) => Err(FsError::NotADirectory { inode: ino }),
        }
    }

    pub(crate) fn entries_mut(&mut self, ino: u64) -> Result<&mut DirEntries, FsError> {
        match &mut self.content {
            Content::Entries(entries) => Ok(entries),
            Content::Bytes(_) => Err(FsError::NotADirectory { inode: ino }),
        }
    }

    fn buffer(&self, ino: u64) -> Result<&Buffer, FsError> {
        match &self.content {
            Content::Bytes(buffer) => Ok(buffer),
            Content::Entries(_) => Err(FsError::IsADirectory { inode: ino }),
        }
    }

    fn buffer_mut(&mut self, ino: u64) -> Result<&mut Buffer, FsError> {
        match &mut self.content {
            Content::Bytes(buffer) => Ok(buffer),
            Content::Entries(_) => Err(FsError::IsADirectory { inode: ino }),
        }
    }
}

/// A file or directory in the tree.
pub(crate) struct Node {
    ino: u64,
    kind: FileType,
    core: Arc<FsCore>,
    state: RwLock<NodeState>,
}

impl Node {
    /// Allocate a node attached to `core`.
    ///
    /// Directories get their `.` entry and a `..` entry pointing at
    /// `parent`, or at themselves when `parent` is `None` (the root).
    pub(crate) fn allocate(
        core: &Arc<FsCore>,
        kind: FileType,
        permissions: Permissions,
        parent: Option<&Arc<Node>>,
        nlink: u64,
    ) -> Result<Arc<Node>, FsError> {
        let now = SystemTime::now();
        let content = if kind.is_dir() {
            Content::Entries(DirEntries::default())
        } else {
            Content::Bytes(Buffer::default())
        };
        let node = Arc::new(Node {
            ino: core.next_ino(),
            kind,
            core: Arc::clone(core),
            state: RwLock::new(NodeState {
                content,
                nlink,
                permissions,
                rdev: 0,
                accessed: now,
                modified: now,
                changed: now,
            }),
        });
        core.usage.node_allocated();

        if kind.is_dir() {
            let parent = parent.unwrap_or(&node);
            let entries = DirEntries::with_synthetic(
                Record::back(DOT, node.ino, Arc::downgrade(&node)),
                Record::back(DOTDOT, parent.ino, Arc::downgrade(parent)),
                &core.usage,
            )?;
            node.write()?.content = Content::Entries(entries);
        }
        log::trace!("ino {}: allocated {:?}", node.ino, kind);
        Ok(node)
    }

    pub(crate) fn ino(&self) -> u64 {
        self.ino
    }

    pub(crate) fn kind(&self) -> FileType {
        self.kind
    }

    pub(crate) fn core(&self) -> &Arc<FsCore> {
        &self.core
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, NodeState>, FsError> {
        self.state.read().map_err(|_| FsError::poisoned())
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, NodeState>, FsError> {
        self.state.write().map_err(|_| FsError::poisoned())
    }
}

impl Node {
    /// Release this node's storage, moving the children its entries owned
    /// onto `orphans`.
    fn release_content(&mut self, orphans: &mut Vec<Arc<Node>>) {
        let usage = &self.core.usage;
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        match &mut state.content {
            Content::Bytes(buffer) => buffer.clear(usage),
            Content::Entries(entries) => orphans.extend(entries.take_owned(usage)),
        }
    }

    /// An entry naming this node went away with its directory.
    fn lose_link(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.nlink = state.nlink.saturating_sub(1);
        state.touch_changed();
    }
}

impl Drop for Node {
    // Subtrees are torn down from a work list rather than by nested drops,
    // so stack depth stays constant however deep the tree is.
    fn drop(&mut self) {
        let mut orphans = Vec::new();
        self.release_content(&mut orphans);
        while let Some(child) = orphans.pop() {
            child.lose_link();
            // Last reference: empty it here so its own drop has nothing to walk.
            if let Some(mut node) = Arc::into_inner(child) {
                node.release_content(&mut orphans);
            }
        }
        self.core.usage.node_released();
        log::trace!("ino {}: destroyed", self.ino);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("ino", &self.ino)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Counted handle to a node.
///
/// Cloning retains the node and dropping releases it; the node is freed
/// when its last handle and last owning directory entry are gone. Two
/// handles compare equal when they refer to the same node.
///
/// # Example
///
/// ```rust
/// use ramfs::{FileType, MountOptions, Permissions, RamFs};
///
/// let fs = RamFs::mount(MountOptions::default())?;
/// let root = fs.root();
/// let file = root.create("notes", FileType::File, Permissions::default_file())?;
/// file.write_at(0, b"hello")?;
/// assert_eq!(file.read_to_end()?, b"hello");
/// assert_eq!(root.find("notes")?, file);
/// # Ok::<(), ramfs::FsError>(())
/// ```
#[derive(Clone)]
pub struct Inode(pub(crate) Arc<Node>);

impl Inode {
    /// Take one more counted reference to this node.
    pub fn retain(&self) -> Inode {
        self.clone()
    }

    /// Give this reference back. The node is destroyed if it was the last one.
    pub fn release(self) {
        drop(self);
    }

    /// Inode number.
    pub fn ino(&self) -> u64 {
        self.0.ino
    }

    /// Node type.
    pub fn file_type(&self) -> FileType {
        self.0.kind
    }

    /// Returns `true` if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.0.kind.is_dir()
    }

    /// Number of counted references currently keeping the node alive:
    /// handles plus owning directory entries.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Returns `true` if both handles belong to the same filesystem instance.
    pub fn same_filesystem(&self, other: &Inode) -> bool {
        Arc::ptr_eq(self.0.core(), other.0.core())
    }

    /// Current metadata, derived from the node's state.
    pub fn metadata(&self) -> Result<Metadata, FsError> {
        let state = self.0.read()?;
        let size = state.size();
        Ok(Metadata {
            inode: self.0.ino,
            file_type: self.0.kind,
            size,
            block_size: BLOCK_SIZE,
            blocks: size.div_ceil(BLOCK_SIZE),
            nlink: state.nlink,
            permissions: state.permissions,
            rdev: state.rdev,
            accessed: state.accessed,
            modified: state.modified,
            changed: state.changed,
        })
    }

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes copied, which is 0 at or past the end.
    ///
    /// # Errors
    ///
    /// - [`FsError::IsADirectory`] if the node is a directory
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> Result<usize, FsError> {
        let state = self.0.read()?;
        Ok(state.buffer(self.0.ino)?.read_at(offset, buf))
    }

    /// Read up to `len` bytes starting at `offset` into a new vector.
    pub fn read_range(&self, offset: usize, len: usize) -> Result<Vec<u8>, FsError> {
        let state = self.0.read()?;
        let buffer = state.buffer(self.0.ino)?;
        let start = offset.min(buffer.len());
        let end = start.saturating_add(len).min(buffer.len());
        Ok(buffer.as_slice()[start..end].to_vec())
    }

    /// Read the whole content.
    pub fn read_to_end(&self) -> Result<Vec<u8>, FsError> {
        let state = self.0.read()?;
        Ok(state.buffer(self.0.ino)?.as_slice().to_vec())
    }

    /// Write `bytes` at `offset`, growing the node first if they reach
    /// past its end. Any gap is zero-filled.
    ///
    /// # Errors
    ///
    /// - [`FsError::IsADirectory`] if the node is a directory
    /// - [`FsError::OutOfMemory`] if the growth cannot be satisfied
    /// - [`FsError::InvalidArgument`] if `offset + bytes.len()` overflows
    pub fn write_at(&self, offset: usize, bytes: &[u8]) -> Result<usize, FsError> {
        let mut state = self.0.write()?;
        let usage = &self.0.core.usage;
        let written = state.buffer_mut(self.0.ino)?.write_at(offset, bytes, usage)?;
        state.touch();
        Ok(written)
    }

    /// Set the content length to exactly `len`, zero-filling on growth.
    ///
    /// # Errors
    ///
    /// - [`FsError::IsADirectory`] if the node is a directory
    /// - [`FsError::OutOfMemory`] if the growth cannot be satisfied; the
    ///   content is left as it was
    pub fn resize(&self, len: usize) -> Result<(), FsError> {
        let mut state = self.0.write()?;
        let usage = &self.0.core.usage;
        let buffer = state.buffer_mut(self.0.ino)?;
        let old = buffer.len();
        buffer.resize(len, usage)?;
        if old != len {
            state.touch();
        }
        log::trace!("ino {}: resize {} -> {}", self.0.ino, old, len);
        Ok(())
    }

    /// Set the device id of a device node.
    pub fn set_rdev(&self, rdev: u64) -> Result<(), FsError> {
        let mut state = self.0.write()?;
        state.rdev = rdev;
        state.touch_changed();
        Ok(())
    }

    /// Replace the stored mode bits.
    pub fn set_permissions(&self, permissions: Permissions) -> Result<(), FsError> {
        let mut state = self.0.write()?;
        state.permissions = permissions;
        state.touch_changed();
        Ok(())
    }

    /// Set the access and modification times.
    pub fn set_times(&self, accessed: SystemTime, modified: SystemTime) -> Result<(), FsError> {
        let mut state = self.0.write()?;
        state.accessed = accessed;
        state.modified = modified;
        state.touch_changed();
        Ok(())
    }

    /// Flush data and metadata. Nothing to do for a memory-only node.
    pub fn sync_all(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Flush data. Nothing to do for a memory-only node.
    pub fn sync_data(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// I/O readiness. Memory-backed content is always ready.
    ///
    /// # Errors
    ///
    /// - [`FsError::IsADirectory`] if the node is a directory
    pub fn poll(&self) -> Result<PollStatus, FsError> {
        if self.is_dir() {
            return Err(FsError::IsADirectory { inode: self.ino() });
        }
        Ok(PollStatus {
            read: true,
            write: true,
            error: false,
        })
    }

    /// Device control. ramfs nodes have no controls.
    pub fn io_control(&self, _cmd: u32, _data: usize) -> Result<(), FsError> {
        Err(FsError::NotSupported {
            operation: "io_control",
        })
    }
}

impl PartialEq for Inode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Inode {}

impl fmt::Debug for Inode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inode")
            .field("ino", &self.0.ino)
            .field("kind", &self.0.kind)
            .finish()
    }
}
