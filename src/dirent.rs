//! Entry records of a directory node.
//!
//! A directory's contents are a flat sequence of fixed-size records. Each
//! record either owns a counted reference to its child or, for the
//! synthetic `.` and `..` entries, holds a plain back-link that never
//! keeps anything alive.
//!
//! Removal is swap-remove: the last record fills the hole. Order is not
//! preserved and `.`/`..` may leave the first two slots.

use std::sync::{Arc, Weak};

use crate::FsError;
use crate::inode::Node;
use crate::types::DIRENT_SIZE;
use crate::usage::Usage;

pub(crate) const DOT: &str = ".";
pub(crate) const DOTDOT: &str = "..";

/// Reference from a record to its target node.
#[derive(Debug)]
pub(crate) enum Link {
    /// Counted reference; keeps the child alive.
    Owned(Arc<Node>),
    /// Traversal-only back-link (`.` and `..`).
    Back(Weak<Node>),
}

#[derive(Debug)]
pub(crate) struct Record {
    pub(crate) name: String,
    pub(crate) ino: u64,
    pub(crate) link: Link,
}

impl Record {
    pub(crate) fn owned(name: &str, node: Arc<Node>) -> Self {
        Self {
            name: name.to_owned(),
            ino: node.ino(),
            link: Link::Owned(node),
        }
    }

    pub(crate) fn back(name: &str, ino: u64, node: Weak<Node>) -> Self {
        Self {
            name: name.to_owned(),
            ino,
            link: Link::Back(node),
        }
    }

    /// Upgrade to a strong reference; `None` if a back-link has gone stale.
    pub(crate) fn target(&self) -> Option<Arc<Node>> {
        match &self.link {
            Link::Owned(node) => Some(Arc::clone(node)),
            Link::Back(node) => node.upgrade(),
        }
    }

    pub(crate) fn owned_target(&self) -> Option<&Arc<Node>> {
        match &self.link {
            Link::Owned(node) => Some(node),
            Link::Back(_) => None,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DirEntries {
    records: Vec<Record>,
}

impl DirEntries {
    /// A fresh directory holding `.` and `..`.
    pub(crate) fn with_synthetic(
        this: Record,
        parent: Record,
        usage: &Usage,
    ) -> Result<Self, FsError> {
        let mut entries = Self::default();
        entries.append(this, usage)?;
        if let Err(e) = entries.append(parent, usage) {
            entries.take_owned(usage);
            return Err(e);
        }
        Ok(entries)
    }

    pub(crate) fn count(&self) -> usize {
        self.records.len()
    }

    /// Bytes these records account for.
    pub(crate) fn size(&self) -> u64 {
        self.records.len() as u64 * DIRENT_SIZE
    }

    /// Only `.` and `..` left.
    pub(crate) fn is_empty_dir(&self) -> bool {
        self.records
            .iter()
            .all(|r| r.name == DOT || r.name == DOTDOT)
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Linear scan for an exact name match.
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.records.iter().position(|r| r.name == name)
    }

    pub(crate) fn find(&self, name: &str) -> Option<&Record> {
        self.position(name).map(|i| &self.records[i])
    }

    /// Add one record at the end.
    pub(crate) fn append(&mut self, record: Record, usage: &Usage) -> Result<(), FsError> {
        usage.charge(DIRENT_SIZE)?;
        if self.records.try_reserve(1).is_err() {
            usage.refund(DIRENT_SIZE);
            return Err(FsError::OutOfMemory {
                requested: DIRENT_SIZE,
            });
        }
        self.records.push(record);
        Ok(())
    }

    /// Swap-remove the record at `index` and hand it back.
    pub(crate) fn remove_at(&mut self, index: usize, usage: &Usage) -> Record {
        let record = self.records.swap_remove(index);
        usage.refund(DIRENT_SIZE);
        record
    }

    /// Re-point `..` at a new parent.
    pub(crate) fn set_parent(&mut self, ino: u64, parent: Weak<Node>) {
        if let Some(record) = self.records.iter_mut().find(|r| r.name == DOTDOT) {
            record.ino = ino;
            record.link = Link::Back(parent);
        }
    }

    /// Empty the directory, giving back the records' bytes, and hand over
    /// the children the records owned.
    pub(crate) fn take_owned(&mut self, usage: &Usage) -> Vec<Arc<Node>> {
        usage.refund(self.size());
        std::mem::take(&mut self.records)
            .into_iter()
            .filter_map(|record| match record.link {
                Link::Owned(node) => Some(node),
                Link::Back(_) => None,
            })
            .collect()
    }
}

/// Reject names no record can hold.
pub(crate) fn check_name(name: &str, max: usize, operation: &'static str) -> Result<(), FsError> {
    if name.is_empty() {
        return Err(FsError::invalid(operation, "empty name"));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(FsError::invalid(
            operation,
            format!("name contains a separator or NUL: {name:?}"),
        ));
    }
    if name.len() > max {
        return Err(FsError::NameTooLong {
            len: name.len(),
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn back(name: &str, ino: u64) -> Record {
        Record::back(name, ino, Weak::new())
    }

    fn dir_with(names: &[&str], usage: &Usage) -> DirEntries {
        let mut entries = DirEntries::with_synthetic(back(DOT, 1), back(DOTDOT, 1), usage).unwrap();
        for (i, name) in names.iter().enumerate() {
            entries.append(back(name, 10 + i as u64), usage).unwrap();
        }
        entries
    }

    fn names(entries: &DirEntries) -> Vec<String> {
        (0..entries.count())
            .map(|i| entries.get(i).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn synthetic_entries_come_first() {
        let usage = Usage::new(None);
        let entries = dir_with(&[], &usage);
        assert_eq!(names(&entries), vec![".", ".."]);
        assert!(entries.is_empty_dir());
        assert_eq!(usage.used_bytes(), 2 * DIRENT_SIZE);
    }

    #[test]
    fn size_is_multiple_of_record_size() {
        let usage = Usage::new(None);
        let entries = dir_with(&["a", "b", "c"], &usage);
        assert_eq!(entries.size(), 5 * DIRENT_SIZE);
        assert_eq!(entries.size() % DIRENT_SIZE, 0);
    }

    #[test]
    fn find_matches_exact_name_only() {
        let usage = Usage::new(None);
        let entries = dir_with(&["alpha", "alp"], &usage);
        assert_eq!(entries.find("alp").unwrap().ino, 11);
        assert!(entries.find("al").is_none());
        assert!(entries.find("alphabet").is_none());
    }

    #[test]
    fn remove_at_swaps_last_into_hole() {
        let usage = Usage::new(None);
        let mut entries = dir_with(&["a", "b", "c"], &usage);
        let removed = entries.remove_at(2, &usage);
        assert_eq!(removed.name, "a");
        assert_eq!(names(&entries), vec![".", "..", "c", "b"]);
        assert_eq!(usage.used_bytes(), 4 * DIRENT_SIZE);
    }

    #[test]
    fn remove_at_can_displace_synthetic_entries() {
        let usage = Usage::new(None);
        let mut entries = dir_with(&["a"], &usage);
        entries.remove_at(0, &usage);
        assert_eq!(names(&entries), vec!["a", ".."]);
    }

    #[test]
    fn append_over_capacity_is_refused() {
        let usage = Usage::new(Some(3 * DIRENT_SIZE));
        let mut entries = dir_with(&["a"], &usage);
        let result = entries.append(back("b", 9), &usage);
        assert!(matches!(result, Err(FsError::OutOfMemory { .. })));
        assert_eq!(entries.count(), 3);
        assert_eq!(usage.used_bytes(), 3 * DIRENT_SIZE);
    }

    #[test]
    fn with_synthetic_rolls_back_on_failure() {
        let usage = Usage::new(Some(DIRENT_SIZE));
        let result = DirEntries::with_synthetic(back(DOT, 1), back(DOTDOT, 1), &usage);
        assert!(result.is_err());
        assert_eq!(usage.used_bytes(), 0);
    }

    #[test]
    fn take_owned_empties_and_refunds() {
        let usage = Usage::new(None);
        let mut entries = dir_with(&["a", "b"], &usage);
        assert!(entries.take_owned(&usage).is_empty());
        assert_eq!(entries.count(), 0);
        assert_eq!(usage.used_bytes(), 0);
    }

    #[test]
    fn set_parent_follows_displaced_dotdot() {
        let usage = Usage::new(None);
        let mut entries = dir_with(&["a"], &usage);
        entries.remove_at(0, &usage);
        entries.set_parent(42, Weak::new());
        assert_eq!(entries.find(DOTDOT).unwrap().ino, 42);
    }

    #[test]
    fn stale_back_link_has_no_target() {
        let record = back(DOTDOT, 7);
        assert!(record.target().is_none());
        assert!(record.owned_target().is_none());
    }

    #[test]
    fn check_name_rules() {
        assert!(check_name("ok", 255, "create").is_ok());
        assert!(matches!(
            check_name("", 255, "create"),
            Err(FsError::InvalidArgument { .. })
        ));
        assert!(matches!(
            check_name("a/b", 255, "create"),
            Err(FsError::InvalidArgument { .. })
        ));
        assert!(matches!(
            check_name("abcdef", 5, "create"),
            Err(FsError::NameTooLong { len: 6, max: 5 })
        ));
    }
}
