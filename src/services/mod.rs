pub mod debounce;
pub mod snapshot;
pub mod warn_sink;

pub use debounce::{DebounceScheduler, DebouncedAction};
pub use snapshot::{CanonicalForm, Snapshot, SnapshotComparator};
pub use warn_sink::{SyncWarning, WarnSink};
