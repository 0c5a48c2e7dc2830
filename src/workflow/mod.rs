pub mod delete_flow;
pub mod dispatcher;
pub mod drag;
pub mod reorder_flow;
pub mod save_flow;
pub mod state;

pub use delete_flow::{DeleteOutcome, DeletionChannel};
pub use dispatcher::{StructuralDispatcher, StructuralOp};
pub use drag::{DragEvent, DragTracker};
pub use reorder_flow::{placement_for_created, MoveOutcome, ReorderChannel};
pub use save_flow::{SaveCoordinator, SaveOutcome, SaveReport};
pub use state::{Lifecycle, SaveState, SessionState, SharedState};
