//! Byte storage of a non-directory node.
//!
//! Growth zero-fills the new tail, shrinking truncates. A resize builds the
//! replacement buffer completely before installing it, so a failed
//! allocation leaves the old contents untouched.

use crate::FsError;
use crate::usage::Usage;

#[derive(Debug, Default)]
pub(crate) struct Buffer {
    data: Vec<u8>,
}

impl Buffer {
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Set the length to exactly `new_len`.
    pub(crate) fn resize(&mut self, new_len: usize, usage: &Usage) -> Result<(), FsError> {
        let old_len = self.data.len();
        if new_len == old_len {
            return Ok(());
        }
        if new_len == 0 {
            self.clear(usage);
            return Ok(());
        }

        let grow = new_len.saturating_sub(old_len) as u64;
        usage.charge(grow)?;

        let mut fresh = Vec::new();
        if fresh.try_reserve_exact(new_len).is_err() {
            usage.refund(grow);
            return Err(FsError::OutOfMemory {
                requested: new_len as u64,
            });
        }
        fresh.extend_from_slice(&self.data[..old_len.min(new_len)]);
        fresh.resize(new_len, 0);
        self.data = fresh;

        if new_len < old_len {
            usage.refund((old_len - new_len) as u64);
        }
        Ok(())
    }

    /// Release the storage entirely.
    pub(crate) fn clear(&mut self, usage: &Usage) {
        usage.refund(self.data.len() as u64);
        self.data = Vec::new();
    }

    /// Copy up to `buf.len()` bytes starting at `offset`; 0 past the end.
    pub(crate) fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        if offset >= self.data.len() {
            return 0;
        }
        let n = buf.len().min(self.data.len() - offset);
        buf[..n].copy_from_slice(&self.data[offset..offset + n]);
        n
    }

    /// Copy `bytes` in at `offset`, growing first if they reach past the end.
    pub(crate) fn write_at(
        &mut self,
        offset: usize,
        bytes: &[u8],
        usage: &Usage,
    ) -> Result<usize, FsError> {
        let end = offset
            .checked_add(bytes.len())
            .ok_or_else(|| FsError::invalid("write_at", "offset + length overflows"))?;
        if end > self.data.len() {
            self.resize(end, usage)?;
        }
        self.data[offset..end].copy_from_slice(bytes);
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(bytes: &[u8], usage: &Usage) -> Buffer {
        let mut buf = Buffer::default();
        buf.write_at(0, bytes, usage).unwrap();
        buf
    }

    #[test]
    fn resize_same_length_is_noop() {
        let usage = Usage::new(None);
        let mut buf = filled(b"abc", &usage);
        buf.resize(3, &usage).unwrap();
        assert_eq!(buf.as_slice(), b"abc");
        assert_eq!(usage.used_bytes(), 3);
    }

    #[test]
    fn resize_zero_releases_buffer() {
        let usage = Usage::new(None);
        let mut buf = filled(b"hello", &usage);
        buf.resize(0, &usage).unwrap();
        assert_eq!(buf.len(), 0);
        assert_eq!(usage.used_bytes(), 0);
    }

    #[test]
    fn resize_grow_zero_fills_tail() {
        let usage = Usage::new(None);
        let mut buf = filled(b"ab", &usage);
        buf.resize(5, &usage).unwrap();
        assert_eq!(buf.as_slice(), b"ab\0\0\0");
        assert_eq!(usage.used_bytes(), 5);
    }

    #[test]
    fn resize_shrink_truncates() {
        let usage = Usage::new(None);
        let mut buf = filled(b"abcdef", &usage);
        buf.resize(2, &usage).unwrap();
        assert_eq!(buf.as_slice(), b"ab");
        assert_eq!(usage.used_bytes(), 2);
    }

    #[test]
    fn resize_after_clear_is_all_zero() {
        let usage = Usage::new(None);
        let mut buf = filled(b"garbage", &usage);
        buf.resize(0, &usage).unwrap();
        buf.resize(16, &usage).unwrap();
        assert_eq!(buf.as_slice(), &[0u8; 16]);
    }

    #[test]
    fn resize_over_capacity_leaves_state() {
        let usage = Usage::new(Some(4));
        let mut buf = filled(b"abc", &usage);
        let result = buf.resize(10, &usage);
        assert!(matches!(result, Err(FsError::OutOfMemory { .. })));
        assert_eq!(buf.as_slice(), b"abc");
        assert_eq!(usage.used_bytes(), 3);
    }

    #[test]
    fn resize_unallocatable_leaves_state() {
        let usage = Usage::new(None);
        let mut buf = filled(b"abc", &usage);
        let result = buf.resize(usize::MAX, &usage);
        assert!(matches!(result, Err(FsError::OutOfMemory { .. })));
        assert_eq!(buf.as_slice(), b"abc");
        assert_eq!(usage.used_bytes(), 3);
    }

    #[test]
    fn read_at_clamps_to_length() {
        let usage = Usage::new(None);
        let buf = filled(b"hello", &usage);
        let mut out = [0u8; 10];
        assert_eq!(buf.read_at(3, &mut out), 2);
        assert_eq!(&out[..2], b"lo");
    }

    #[test]
    fn read_at_past_end_returns_zero() {
        let usage = Usage::new(None);
        let buf = filled(b"hello", &usage);
        let mut out = [0u8; 4];
        assert_eq!(buf.read_at(5, &mut out), 0);
        assert_eq!(buf.read_at(100, &mut out), 0);
    }

    #[test]
    fn write_at_overwrites_and_extends() {
        let usage = Usage::new(None);
        let mut buf = filled(b"hello", &usage);
        assert_eq!(buf.write_at(3, b"LO!!", &usage).unwrap(), 4);
        assert_eq!(buf.as_slice(), b"helLO!!");
    }

    #[test]
    fn write_at_beyond_end_zero_fills_gap() {
        let usage = Usage::new(None);
        let mut buf = filled(b"ab", &usage);
        buf.write_at(5, b"z", &usage).unwrap();
        assert_eq!(buf.as_slice(), b"ab\0\0\0z");
    }

    #[test]
    fn write_at_overflowing_offset_rejected() {
        let usage = Usage::new(None);
        let mut buf = Buffer::default();
        let result = buf.write_at(usize::MAX, b"xy", &usage);
        assert!(matches!(result, Err(FsError::InvalidArgument { .. })));
        assert_eq!(buf.len(), 0);
    }
}
