#![forbid(unsafe_code)]
//! Patch merge engine and persistence port.
//!
//! The engine applies a partial Board fragment to a stored Board under the
//! field-level replace rule, enforcing authorization and whole-document
//! validation before anything is committed. Persistence is a port: the
//! engine only requires that each update observes a consistent prior Board
//! and commits a consistent next Board.

mod clock;
mod error;
mod merge;
mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{MergeError, StoreError, UpdateError};
pub use merge::{append_comment, apply_patch, set_storyboard, NewComment};
pub use store::{BoardStore, MemoryStore, SqliteStore};

pub const CRATE_NAME: &str = "waypoint-engine";
