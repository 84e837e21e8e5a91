//! # Host-Facing Traits
//!
//! The capabilities a host mount layer programs against.
//!
//! | Trait | Role |
//! |-------|------|
//! | [`FileSystemType`] | Named factory, registered in an [`FsRegistry`](crate::FsRegistry) |
//! | [`FileSystem`] | A mounted instance: root, statistics, sync, unmount |
//!
//! Node-level operations (find, create, read, write, ...) live on
//! [`Inode`](crate::Inode) itself; the host never sees node internals.
//!
//! ## Thread Safety
//!
//! Both traits require `Send + Sync` and take `&self`, except `unmount`,
//! which consumes the instance.
//!
//! ## Object Safety
//!
//! Both traits are object-safe:
//!
//! ```rust
//! use ramfs::{FileSystemType, MountOptions, RamFsType};
//!
//! let fs_type: Box<dyn FileSystemType> = Box::new(RamFsType);
//! let fs = fs_type.mount(&MountOptions::default())?;
//! assert!(fs.root_inode().is_dir());
//! fs.unmount();
//! # Ok::<(), ramfs::FsError>(())
//! ```

mod file_system;
mod fs_type;

pub use file_system::FileSystem;
pub use fs_type::FileSystemType;
