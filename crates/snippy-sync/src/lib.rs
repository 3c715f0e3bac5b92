//! Filter-state synchronization for the snippet list view
//!
//! Keeps three things consistent: the URL (source of truth), the decoded
//! `FilterSet`, and the last fetched `PageResult`.
//!
//! - `FilterStateSynchronizer`: the state machine
//! - `SyncDriver`: runs the state machine on a tokio event loop
//! - `Navigator`/`MemoryHistory`: the URL collaborator

pub mod driver;
pub mod navigator;
pub mod synchronizer;
pub mod view;

pub use driver::{DriverEvent, DriverHandle, SyncDriver};
pub use navigator::{HistoryOp, Location, MemoryHistory, Navigator};
pub use synchronizer::{FetchCompletion, FilterStateSynchronizer, PendingFetch, Transition};
pub use view::{FailureKind, ListView, Phase, Snapshot};
