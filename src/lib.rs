//! # ramfs
//!
//! An in-memory hierarchical filesystem: a tree of directory, file and
//! device nodes, each independently reference-counted, with POSIX-like
//! create, link, unlink, move, read, write and resize.
//!
//! Nothing is persisted. A node lives exactly as long as something refers
//! to it: an [`Inode`] handle held by a caller, or a directory entry that
//! names it.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use ramfs::{FileType, MountOptions, Permissions, RamFs};
//!
//! let fs = RamFs::mount(MountOptions::default())?;
//! let root = fs.root();
//!
//! let docs = root.create("docs", FileType::Directory, Permissions::default_dir())?;
//! let readme = docs.create("readme", FileType::File, Permissions::default_file())?;
//! readme.write_at(0, b"hello")?;
//!
//! assert_eq!(root.lookup("docs/readme")?.read_to_end()?, b"hello");
//! for entry in docs.list()? {
//!     println!("{} -> {}", entry.name, entry.inode);
//! }
//!
//! docs.unlink("readme")?;
//! root.unlink("docs")?;
//! fs.unmount();
//! # Ok::<(), ramfs::FsError>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`RamFs`] | A mounted instance; owns the root |
//! | [`Inode`] | Counted handle to a node; clone retains, drop releases |
//! | [`MountOptions`] | Source name, name-length limit, byte capacity |
//! | [`Usage`] | Live byte and node counters |
//! | [`FsError`] | Error taxonomy, mappable to errno and `io::Error` |
//! | [`Metadata`] | Size, blocks, link count, mode, times |
//! | [`DirEntry`] | One positional listing record |
//! | [`FsRegistry`] | Name to [`FileSystemType`] table for a host mount layer |
//!
//! ---
//!
//! ## Ownership
//!
//! Directory entries own their children. The `.` and `..` entries and the
//! instance's pointer to its root are back-links that own nothing, so the
//! ownership graph has no cycles and dropping the last handle always frees
//! a node. Link counts track the number of entries naming a node; the
//! root carries one extra for the instance.
//!
//! ---
//!
//! ## Error Handling
//!
//! Every fallible call returns `Result<T, FsError>` and leaves the tree
//! unchanged on failure:
//!
//! ```rust
//! use ramfs::FsError;
//!
//! let err = FsError::NotFound { name: "missing".into() };
//! assert_eq!(err.to_string(), "not found: missing");
//! assert_eq!(err.errno(), 2);
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! All methods take `&self` and every public type is `Send + Sync`. Each
//! node has its own lock; structural changes (create, link, unlink, move)
//! are additionally serialized per instance.
//!
//! ---
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade: `debug`
//! for mount and unmount, `trace` for every structural change, resize and
//! node destruction. The crate never installs a logger.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`Metadata`], [`DirEntry`], [`Permissions`], [`StatFs`], [`MountOptions`]; adds `MountOptions::from_json` |

// Private modules
mod buffer;
mod config;
mod dirent;
mod error;
mod fs;
mod inode;
mod path_resolver;
mod registry;
mod traits;
mod tree;
mod types;
mod usage;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use types::{
    BLOCK_SIZE, DIRENT_SIZE, DirEntry, FileType, MAX_NAME_LEN, Metadata, Permissions, PollStatus,
    ROOT_INODE, StatFs,
};

// Public re-exports - filesystem
pub use config::MountOptions;
pub use fs::{RamFs, RamFsType};
pub use inode::Inode;
pub use usage::Usage;

// Public re-exports - host-facing traits
pub use registry::FsRegistry;
pub use traits::{FileSystem, FileSystemType};

// Public re-exports - path resolution
pub use path_resolver::{ComponentResolver, PathResolver};
