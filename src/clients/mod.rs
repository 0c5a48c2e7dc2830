pub mod http_client;
pub mod memory_client;
pub mod question_api;

pub use http_client::HttpQuestionClient;
pub use memory_client::{ApiCall, MemoryQuestionApi};
pub use question_api::{ApiOperation, QuestionApi};
