pub mod draft;
pub mod ids;
pub mod question;

pub use draft::{DraftPatch, QuestionDraft, SyncStatus};
pub use ids::{DraftId, QuestionId, WorksheetId};
pub use question::{ChoiceOption, MarkschemeRule, QuestionContent, QuestionKind, TypePayload};
