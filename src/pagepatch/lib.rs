//! # Pagepatch Architecture
//!
//! Pagepatch lets a user edit the visible text and images of any webpage in
//! place, remembers those edits per page address, and re-applies them the
//! next time the page is loaded. It can also paint opaque overlay rectangles
//! over parts of a page.
//!
//! The engine never touches a real browser. Everything it needs from a page
//! goes through the [`dom::Document`] trait, so the same core drives a
//! browser host, the in-memory [`dom::mem::MemDocument`] used by the tests,
//! and the command-line tool that replays patches onto JSON page snapshots.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Hosts                                                      │
//! │  - Browser page: PageContext (page.rs)                      │
//! │  - Settings surface / CLI: PagepatchApi (api.rs), main.rs   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine                                                     │
//! │  - Edit sessions (session.rs), replay (replay.rs)           │
//! │  - Settle detection (settle.rs), commands (commands/*.rs)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Model                                                      │
//! │  - Locator paths (locator.rs), records (model.rs)           │
//! │  - Overlays (overlay.rs), document access (dom/)            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - StorageBackend trait                                     │
//! │  - FsBackend (production), MemBackend (testing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! Below the hosts, code takes regular Rust arguments and returns regular
//! Rust types. It never writes to stdout/stderr and never exits the process.
//! Diagnostics go through `tracing`; the binary decides where they end up.
//!
//! ## Module Overview
//!
//! - [`api`]: Facade used by the settings surface and the CLI
//! - [`commands`]: Store-level operations (list, clear, prefs, replay, locate)
//! - [`page`]: Per-page context: messages, load settle, replay, editing
//! - [`session`]: The edit session state machine
//! - [`replay`]: Applying stored records to a loaded page
//! - [`settle`]: Debounced "page has settled" detection
//! - [`locator`]: Structural element paths
//! - [`model`]: Patch records and page identity
//! - [`overlay`]: Overlay rectangles
//! - [`dom`]: Document access trait and the in-memory document
//! - [`store`]: Storage abstraction and implementations
//! - [`config`]: User preferences and engine configuration
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod dom;
pub mod error;
pub mod locator;
pub mod model;
pub mod overlay;
pub mod page;
pub mod replay;
pub mod session;
pub mod settle;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
