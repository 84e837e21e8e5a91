//! Aggregate size and node accounting for one filesystem instance.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::FsError;

/// Live usage counters shared by every node of one filesystem.
///
/// Bytes cover file contents and directory records. Growth is charged
/// before it happens and refused once `capacity` would be passed, so a
/// refused call never leaves a partial mutation behind.
///
/// The counters outlive the instance for as long as a handle to them is
/// kept, which lets callers check that an unmount freed every node.
#[derive(Debug)]
pub struct Usage {
    bytes: AtomicU64,
    inodes: AtomicU64,
    capacity: Option<u64>,
}

impl Usage {
    pub(crate) fn new(capacity: Option<u64>) -> Self {
        Self {
            bytes: AtomicU64::new(0),
            inodes: AtomicU64::new(0),
            capacity,
        }
    }

    /// Bytes currently held by file contents and directory records.
    pub fn used_bytes(&self) -> u64 {
        self.bytes.load(Ordering::Acquire)
    }

    /// Number of nodes allocated and not yet destroyed.
    pub fn live_inodes(&self) -> u64 {
        self.inodes.load(Ordering::Acquire)
    }

    /// Configured byte cap, if any.
    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    /// Reserve `amount` more bytes.
    pub(crate) fn charge(&self, amount: u64) -> Result<(), FsError> {
        if amount == 0 {
            return Ok(());
        }
        self.bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                let next = used.checked_add(amount)?;
                match self.capacity {
                    Some(cap) if next > cap => None,
                    _ => Some(next),
                }
            })
            .map(|_| ())
            .map_err(|_| FsError::OutOfMemory { requested: amount })
    }

    /// Give back `amount` bytes.
    pub(crate) fn refund(&self, amount: u64) {
        if amount == 0 {
            return;
        }
        let _ = self
            .bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                Some(used.saturating_sub(amount))
            });
    }

    pub(crate) fn node_allocated(&self) {
        self.inodes.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn node_released(&self) {
        self.inodes.fetch_sub(1, Ordering::AcqRel);
    }
}
