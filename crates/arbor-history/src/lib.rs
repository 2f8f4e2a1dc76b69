//! History-store collaborator interface for Arbor.
//!
//! The merge core does not own persistence. When an ancestor node is no
//! longer live, the tree merger walks historical snapshots through the
//! [`HistoryStore`] trait defined here; the snapshot format itself is
//! opaque to the core. [`MemoryHistoryStore`] is the in-memory reference
//! implementation used by tests and embedders.
//!
//! # Key Types
//!
//! - [`Commit`] / [`CommitId`] — One recorded version of a named root
//! - [`Snapshot`] / [`SnapshotId`] — The stored tree payload of a commit
//! - [`HistoryStore`] — Async lookup service (fetch commit, log,
//!   fetch snapshot, load node tree)
//! - [`MemoryHistoryStore`] — RwLock-backed reference implementation

pub mod commit;
pub mod error;
pub mod memory;
pub mod traits;

pub use commit::{Commit, CommitId, Snapshot, SnapshotId};
pub use error::{HistoryError, HistoryResult};
pub use memory::MemoryHistoryStore;
pub use traits::HistoryStore;
