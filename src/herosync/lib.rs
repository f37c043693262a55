//! # Herosync Architecture
//!
//! Herosync moves footage off a GoPro: it downloads chapter files into a local
//! `incoming/` directory, joins them into whole videos in `outgoing/`, uploads
//! those, and cleans up whatever copies are no longer needed. Every step is
//! driven by one question: where does each file currently live?
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prints results, owns exit codes        │
//! │  - Installs logging and the Ctrl-C handler                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - status, list, download, combine, publish, cleanup        │
//! │  - Operates on Rust types, returns CmdResult                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core (inventory.rs, scan.rs, filename.rs, device/)         │
//! │  - Reconciles camera, incoming and outgoing listings        │
//! │  - MediaDevice trait: GoProClient, InMemoryDevice           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Inventory
//!
//! Nothing is persisted between runs. Each command lists the camera and both
//! local directories afresh and merges them into an [`inventory::Inventory`],
//! where every file carries a [`model::Status`]. Deletions are only ever
//! decided from a complete, freshly built inventory; a listing failure aborts
//! the command instead of acting on partial data.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code:
//! - Takes regular Rust function arguments
//! - Returns regular Rust types (`Result<CmdResult>`)
//! - **Never** writes to stdout/stderr (it logs through `tracing`)
//! - **Never** calls `std::process::exit`
//!
//! ## Testing Strategy
//!
//! 1. **Commands** (`commands/*.rs`): unit tests against
//!    [`device::memory::InMemoryDevice`] and temp directories. Most tests
//!    live here.
//! 2. **API** (`api.rs`): dispatch and the `yolo` pipeline.
//! 3. **CLI** (`tests/`): the compiled binary against a tiny fake camera.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Business logic for each command
//! - [`inventory`]: Reconciliation, filters and grouping
//! - [`device`]: Camera abstraction and implementations
//! - [`discovery`]: mDNS lookup of the camera and base URL resolution
//! - [`filename`]: Camera filename convention
//! - [`scan`]: Local directory listing
//! - [`combiner`]: Chapter concatenation (ffmpeg)
//! - [`publisher`]: Video upload (YouTube)
//! - [`config`]: Layered configuration
//! - [`logging`]: Subscriber setup for the binary
//! - [`cancel`]: Cooperative cancellation
//! - [`progress`]: Transfer progress logging
//! - [`model`]: `Status` and `FileRecord`
//! - [`error`]: Error types
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod api;
pub mod cancel;
pub mod combiner;
pub mod commands;
pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod filename;
pub mod inventory;
pub mod logging;
pub mod model;
pub mod progress;
pub mod publisher;
pub mod scan;
