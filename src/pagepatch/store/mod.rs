//! # Storage Layer
//!
//! Durable state lives in two partitions:
//! 1. **Records**: every [`PatchRecord`](crate::model::PatchRecord) for every
//!    page, as one ordered list.
//! 2. **Preferences**: the three user toggles.
//!
//! [`backend::StorageBackend`] handles raw I/O. [`patch_store::PatchStore`]
//! layers the record semantics on top:
//!
//! - **Key uniqueness**: at most one text/image record per `(page, locator)`.
//!   A second save updates in place and keeps the first `originalContent`.
//! - **Flush before swap**: each mutation writes the whole next list; the
//!   in-memory cache changes only once the write succeeded.
//! - **Lazy cache**: records are read once per store instance.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: JSON files in the data directory.
//! - [`mem_backend::MemBackend`]: For testing logic without filesystem I/O.
//!
//! ## Storage Layout
//!
//! ```text
//! <data dir>/
//! ├── patches.json        # {"version": 1, "records": [...]}
//! ├── preferences.json    # {"textEditingEnabled": true, ...}
//! └── config.json         # Engine tuning
//! ```

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;
pub mod patch_store;
pub mod schema;

pub use backend::StorageBackend;
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
pub use patch_store::PatchStore;
