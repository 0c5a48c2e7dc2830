//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session` - 编辑会话
//! - 独占一份草稿集合和它的保存状态
//! - 把内容编辑交给防抖 + 保存协调器
//! - 把排序、删除直接交给结构流程
//! - 关闭时取消防抖，丢弃迟到的结果
//!
//! ### `app` - 演示应用
//! - 按配置选择持久化后端（HTTP / 内存）
//! - 演示一次连续输入后的自动保存
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! session (EditorSession)
//!     ↓
//! workflow (save / reorder / delete / dispatcher)
//!     ↓
//! services (snapshot / debounce / warn) + store (DraftStore)
//!     ↓
//! clients (QuestionApi)
//! ```

pub mod app;
pub mod session;

pub use app::App;
pub use session::{EditorSession, SessionOptions};
