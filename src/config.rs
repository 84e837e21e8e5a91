//! Mount-time configuration.

use crate::FsError;
use crate::types::MAX_NAME_LEN;

/// Options handed to [`RamFs::mount`](crate::RamFs::mount).
///
/// ramfs keeps nothing on a device, so `source` is only recorded. The
/// other fields bound what the tree may hold.
///
/// # Example
///
/// ```rust
/// use ramfs::MountOptions;
///
/// let options = MountOptions::default()
///     .with_source("none")
///     .with_capacity(1 << 20);
/// assert_eq!(options.capacity, Some(1 << 20));
/// assert_eq!(options.max_name_len, 255);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MountOptions {
    /// Device or source name given by the host. Unused.
    pub source: Option<String>,
    /// Longest entry name accepted, in bytes (`1..=255`).
    pub max_name_len: usize,
    /// Byte cap over all file contents and directory records.
    /// `None` means unlimited.
    pub capacity: Option<u64>,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            source: None,
            max_name_len: MAX_NAME_LEN,
            capacity: None,
        }
    }
}

impl MountOptions {
    /// Set the source name.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the maximum entry name length.
    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    /// Set the byte capacity.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Check the options before a mount.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if `max_name_len` is outside `1..=255`
    pub fn validate(&self) -> Result<(), FsError> {
        if self.max_name_len == 0 || self.max_name_len > MAX_NAME_LEN {
            return Err(FsError::invalid(
                "mount",
                format!(
                    "max_name_len must be within 1..={MAX_NAME_LEN}, got {}",
                    self.max_name_len
                ),
            ));
        }
        Ok(())
    }

    /// Decode options from a JSON object; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// - [`FsError::Deserialization`] if the text is not a valid options object
    #[cfg(feature = "serde")]
    pub fn from_json(text: &str) -> Result<Self, FsError> {
        serde_json::from_str(text).map_err(|e| FsError::Deserialization(e.to_string()))
    }
}
