//! Delta dispatch: publishing pending URLs onto the downstream work queue
//!
//! The dispatcher never marks anything as sent. The delta only shrinks when
//! the downstream crawler acknowledges a URL through the store, so delivery is
//! at least once by construction.

mod dispatcher;
mod queue;

pub use dispatcher::{CycleReport, DeltaDispatcher};
pub use queue::{QueueError, SqliteQueue, WorkItem, WorkQueue};
