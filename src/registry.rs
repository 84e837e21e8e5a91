//! Name to filesystem-type table consulted by a host mount layer.

use std::collections::BTreeMap;
use std::fmt;

use crate::fs::RamFsType;
use crate::{FileSystem, FileSystemType, FsError, MountOptions};

/// Registered filesystem types, keyed by [`FileSystemType::name`].
///
/// The registry is a plain value; the host decides where it lives.
///
/// # Example
///
/// ```rust
/// use ramfs::{FsRegistry, MountOptions};
///
/// let registry = FsRegistry::with_defaults();
/// let fs = registry.mount("ramfs", &MountOptions::default().with_source("none"))?;
/// assert!(fs.root_inode().is_dir());
/// fs.unmount();
/// # Ok::<(), ramfs::FsError>(())
/// ```
#[derive(Default)]
pub struct FsRegistry {
    types: BTreeMap<String, Box<dyn FileSystemType>>,
}

impl FsRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with `ramfs` already registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RamFsType);
        registry
    }

    /// Register `fs_type` under its own name, replacing any type already
    /// registered under that name.
    pub fn register<T: FileSystemType + 'static>(&mut self, fs_type: T) {
        let name = fs_type.name().to_owned();
        if self.types.insert(name.clone(), Box::new(fs_type)).is_some() {
            log::debug!("filesystem type {name:?} re-registered");
        }
    }

    /// Mount a new instance of the type registered as `type_name`.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] if no type is registered under `type_name`
    /// - anything the type's own `mount` fails with
    pub fn mount(
        &self,
        type_name: &str,
        options: &MountOptions,
    ) -> Result<Box<dyn FileSystem>, FsError> {
        let fs_type = self.types.get(type_name).ok_or_else(|| {
            FsError::invalid("mount", format!("unknown filesystem type {type_name:?}"))
        })?;
        log::debug!("mounting {type_name:?} from {:?}", options.source);
        fs_type.mount(options)
    }

    /// Registered names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl fmt::Debug for FsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}
