//! In-memory storage for submissions awaiting a confirmation step.
//!
//! Entries live for a fixed TTL after insertion. Nothing is persisted;
//! an entry that is never confirmed simply expires.

mod store;

pub use store::PendingStore;
