//! Structural operations on directories.
//!
//! Every mutation here runs under the filesystem's tree lock and then
//! takes the write locks of the nodes it touches. Each call either
//! completes with all link counts and entry records consistent, or fails
//! before changing anything.

use std::sync::Arc;

use crate::FsError;
use crate::dirent::{DOT, DOTDOT, Record, check_name};
use crate::inode::{Inode, Node};
use crate::types::{DirEntry, FileType, Permissions};

impl Inode {
    fn require_dir(&self) -> Result<(), FsError> {
        if self.is_dir() {
            Ok(())
        } else {
            Err(FsError::NotADirectory { inode: self.ino() })
        }
    }

    fn max_name_len(&self) -> usize {
        self.0.core().options.max_name_len
    }

    /// Look up `name` in this directory and return a new counted reference
    /// to the child.
    ///
    /// `.` and `..` are ordinary entries here.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if this node is not a directory
    /// - [`FsError::NotFound`] if no entry matches, or the entry is a
    ///   back-link whose target is gone
    pub fn find(&self, name: &str) -> Result<Inode, FsError> {
        self.require_dir()?;
        let state = self.0.read()?;
        state
            .entries(self.ino())?
            .find(name)
            .and_then(Record::target)
            .map(Inode)
            .ok_or_else(|| FsError::NotFound {
                name: name.to_owned(),
            })
    }

    /// Create a new node called `name` in this directory.
    ///
    /// The child starts with a link count of 1. A new directory gets `.`
    /// and `..` entries, with `..` pointing back here.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if this node is not a directory
    /// - [`FsError::InvalidArgument`] / [`FsError::NameTooLong`] for a bad name
    /// - [`FsError::NotFound`] if this directory has itself been unlinked,
    ///   or outlived the directory that held it
    /// - [`FsError::AlreadyExists`] if `name` is taken
    /// - [`FsError::OutOfMemory`] if the node or its entry cannot be allocated
    pub fn create(
        &self,
        name: &str,
        kind: FileType,
        permissions: Permissions,
    ) -> Result<Inode, FsError> {
        self.require_dir()?;
        check_name(name, self.max_name_len(), "create")?;

        let _tree = self.0.core().lock_tree()?;
        let mut state = self.0.write()?;
        if state.nlink == 0 {
            return Err(FsError::NotFound {
                name: name.to_owned(),
            });
        }
        if state.entries(self.ino())?.find(name).is_some() {
            return Err(FsError::AlreadyExists {
                name: name.to_owned(),
                operation: "create",
            });
        }

        let child = Node::allocate(self.0.core(), kind, permissions, Some(&self.0), 1)?;
        let usage = &self.0.core().usage;
        state
            .entries_mut(self.ino())?
            .append(Record::owned(name, Arc::clone(&child)), usage)?;
        state.touch();
        log::trace!("ino {}: create {:?} -> ino {}", self.ino(), name, child.ino());
        Ok(Inode(child))
    }

    /// Add a second name for `target` in this directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::IsADirectory`] if `target` is a directory
    /// - [`FsError::NotADirectory`] if this node is not a directory
    /// - [`FsError::CrossDevice`] if `target` belongs to another instance
    /// - [`FsError::AlreadyExists`] if `name` is taken
    pub fn link(&self, name: &str, target: &Inode) -> Result<(), FsError> {
        if target.is_dir() {
            return Err(FsError::IsADirectory {
                inode: target.ino(),
            });
        }
        self.require_dir()?;
        if !self.same_filesystem(target) {
            return Err(FsError::CrossDevice { operation: "link" });
        }
        check_name(name, self.max_name_len(), "link")?;

        let _tree = self.0.core().lock_tree()?;
        let mut state = self.0.write()?;
        if state.nlink == 0 {
            return Err(FsError::NotFound {
                name: name.to_owned(),
            });
        }
        if state.entries(self.ino())?.find(name).is_some() {
            return Err(FsError::AlreadyExists {
                name: name.to_owned(),
                operation: "link",
            });
        }

        let mut target_state = target.0.write()?;
        state
            .entries_mut(self.ino())?
            .append(Record::owned(name, Arc::clone(&target.0)), &self.0.core().usage)?;
        target_state.nlink += 1;
        target_state.touch_changed();
        state.touch();
        log::trace!("ino {}: link {:?} -> ino {}", self.ino(), name, target.ino());
        Ok(())
    }

    /// Remove the entry `name` from this directory.
    ///
    /// The child's link count drops by one and the entry's reference is
    /// released; the child is destroyed if nothing else holds it.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] for `.` or `..`
    /// - [`FsError::NotADirectory`] if this node is not a directory
    /// - [`FsError::NotFound`] if `name` is absent
    /// - [`FsError::DirectoryNotEmpty`] if the child is a directory with
    ///   entries besides `.` and `..`
    pub fn unlink(&self, name: &str) -> Result<(), FsError> {
        if name == DOT || name == DOTDOT {
            return Err(FsError::invalid("unlink", format!("cannot unlink {name:?}")));
        }
        self.require_dir()?;

        let _tree = self.0.core().lock_tree()?;
        let mut state = self.0.write()?;
        let entries = state.entries_mut(self.ino())?;
        let index = entries.position(name).ok_or_else(|| FsError::NotFound {
            name: name.to_owned(),
        })?;
        let child = entries
            .get(index)
            .and_then(Record::owned_target)
            .map(Arc::clone)
            .ok_or_else(|| FsError::NotFound {
                name: name.to_owned(),
            })?;

        let mut child_state = child.write()?;
        if child.kind().is_dir() && !child_state.entries(child.ino())?.is_empty_dir() {
            return Err(FsError::DirectoryNotEmpty {
                name: name.to_owned(),
            });
        }
        child_state.nlink = child_state.nlink.saturating_sub(1);
        child_state.touch_changed();
        drop(child_state);

        let removed = entries.remove_at(index, &self.0.core().usage);
        state.touch();
        drop(state);
        log::trace!("ino {}: unlink {:?} (ino {})", self.ino(), name, removed.ino);
        // Released outside the directory lock.
        drop(removed);
        Ok(())
    }

    /// Move the entry `old_name` of this directory to `new_name` in `dst`.
    ///
    /// The record moves; the node does not, and its link count is
    /// unchanged. A directory moved under a new parent has its `..`
    /// re-pointed there.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if either side is not a directory
    /// - [`FsError::InvalidArgument`] for `.`/`..`, or when a directory
    ///   would move into itself or a descendant
    /// - [`FsError::CrossDevice`] if `dst` belongs to another instance
    /// - [`FsError::NotFound`] if `old_name` is absent, or `dst` has been
    ///   unlinked
    /// - [`FsError::AlreadyExists`] if `new_name` is taken in `dst`
    pub fn move_entry(&self, old_name: &str, dst: &Inode, new_name: &str) -> Result<(), FsError> {
        self.require_dir()?;
        dst.require_dir()?;
        if old_name == DOT || old_name == DOTDOT {
            return Err(FsError::invalid("move", format!("cannot move {old_name:?}")));
        }
        if !self.same_filesystem(dst) {
            return Err(FsError::CrossDevice { operation: "move" });
        }
        check_name(new_name, self.max_name_len(), "move")?;

        let _tree = self.0.core().lock_tree()?;
        let (index, moved) = {
            let state = self.0.read()?;
            let entries = state.entries(self.ino())?;
            entries
                .position(old_name)
                .and_then(|i| entries.get(i)?.owned_target().map(|n| (i, Arc::clone(n))))
                .ok_or_else(|| FsError::NotFound {
                    name: old_name.to_owned(),
                })?
        };
        {
            let dst_state = dst.0.read()?;
            if dst_state.nlink == 0 {
                return Err(FsError::NotFound {
                    name: new_name.to_owned(),
                });
            }
            if dst_state.entries(dst.ino())?.find(new_name).is_some() {
                return Err(FsError::AlreadyExists {
                    name: new_name.to_owned(),
                    operation: "move",
                });
            }
        }

        let usage = &self.0.core().usage;
        if self == dst {
            let mut state = self.0.write()?;
            let entries = state.entries_mut(self.ino())?;
            entries.append(Record::owned(new_name, Arc::clone(&moved)), usage)?;
            entries.remove_at(index, usage);
            state.touch();
        } else {
            let reparent = moved.kind().is_dir();
            if reparent {
                ensure_not_within(&moved, &dst.0)?;
            }
            let mut src_state = self.0.write()?;
            let mut dst_state = dst.0.write()?;
            let mut moved_state = moved.write()?;
            let src_entries = src_state.entries_mut(self.ino())?;
            dst_state
                .entries_mut(dst.ino())?
                .append(Record::owned(new_name, Arc::clone(&moved)), usage)?;
            src_entries.remove_at(index, usage);
            if reparent {
                moved_state
                    .entries_mut(moved.ino())?
                    .set_parent(dst.ino(), Arc::downgrade(&dst.0));
            }
            moved_state.touch_changed();
            src_state.touch();
            dst_state.touch();
        }
        log::trace!(
            "ino {}: move {:?} -> ino {} {:?} (ino {})",
            self.ino(),
            old_name,
            dst.ino(),
            new_name,
            moved.ino()
        );
        Ok(())
    }

    /// The raw entry at `index`, for listing. Takes no counted reference
    /// on the child.
    ///
    /// Order is not stable across removals and `.`/`..` are not
    /// guaranteed to stay in the first two slots.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if this node is not a directory
    /// - [`FsError::OutOfRange`] if `index` is past the last entry
    pub fn get_entry(&self, index: usize) -> Result<DirEntry, FsError> {
        self.require_dir()?;
        let state = self.0.read()?;
        let entries = state.entries(self.ino())?;
        entries
            .get(index)
            .map(|record| DirEntry {
                name: record.name.clone(),
                inode: record.ino,
            })
            .ok_or(FsError::OutOfRange {
                index,
                count: entries.count(),
            })
    }

    /// Every entry of this directory, in storage order.
    pub fn list(&self) -> Result<Vec<DirEntry>, FsError> {
        let mut listing = Vec::new();
        for index in 0.. {
            match self.get_entry(index) {
                Ok(entry) => listing.push(entry),
                Err(FsError::OutOfRange { .. }) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(listing)
    }
}

/// Fail if `dir` is `node` or lies below it.
fn ensure_not_within(node: &Arc<Node>, dir: &Arc<Node>) -> Result<(), FsError> {
    let mut current = Arc::clone(dir);
    loop {
        if Arc::ptr_eq(&current, node) {
            return Err(FsError::invalid(
                "move",
                "cannot move a directory into itself or a descendant",
            ));
        }
        let parent = current
            .read()?
            .entries(current.ino())?
            .find(DOTDOT)
            .and_then(Record::target);
        match parent {
            Some(parent) if !Arc::ptr_eq(&parent, &current) => current = parent,
            _ => return Ok(()),
        }
    }
}
