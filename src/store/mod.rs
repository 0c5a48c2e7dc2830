pub mod draft_store;
pub mod id_table;
pub mod order;

pub use draft_store::{DraftStore, RemovedDraft};
pub use id_table::IdTable;
pub use order::{compute_new_order, placement_anchor, resolve_drop_zone, DropPosition, DropZone};
