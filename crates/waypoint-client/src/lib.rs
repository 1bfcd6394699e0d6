#![forbid(unsafe_code)]
//! Mutation client: optimistic cache writes, canonical reconciliation.
//!
//! The cache is a disposable projection of the server's canonical copy. A
//! submit applies the fragment locally first (same field-level replace rule
//! the server uses), then sends it; success replaces the entry wholesale
//! with the canonical Board, failure leaves the optimistic state in place
//! marked diverged. There is no rollback and no response-ordering guarantee;
//! callers needing ordering serialize their own submits.

mod cache;
mod flows;
mod mutation;
mod notify;
mod transport;

pub use cache::{BoardCache, CacheEntry, EntryStatus};
pub use flows::fresh_id;
pub use mutation::{MutationClient, SubmitError, SubmitOptions};
pub use notify::{Notifier, NullNotifier};
pub use transport::{BoardTransport, HttpTransport, TransportError};

pub const CRATE_NAME: &str = "waypoint-client";
