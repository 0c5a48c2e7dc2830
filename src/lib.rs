//! # Question Draft Sync
//!
//! 试卷题目编辑器的草稿同步引擎：本地随意增删改排，后台自动持久化。
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 持久化 API 抽象（`QuestionApi`）及 HTTP / 内存两种实现
//!
//! ### ② 存储层（Store）
//! - `store/` - 有序草稿集合、临时 ID 对账表、纯函数排序
//!
//! ### ③ 业务能力层（Services）
//! - `SnapshotComparator` - 判断内容是否真的变化
//! - `DebounceScheduler` - 合并连续编辑
//! - `WarnSink` - 单个草稿的同步失败警告
//!
//! ### ④ 流程层（Workflow）
//! - `SaveCoordinator` - 保存周期（互斥、比较、新建/更新、对账）
//! - `ReorderChannel` / `DeletionChannel` - 绕过防抖的结构操作
//! - `StructuralDispatcher` - 结构操作按发出顺序到达服务端
//!
//! ### ⑤ 编排层（Orchestration）
//! - `EditorSession` - 一个编辑会话
//! - `App` - 演示程序
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpQuestionClient, MemoryQuestionApi, QuestionApi};
pub use config::Config;
pub use error::{AppError, Result};
pub use models::{DraftId, DraftPatch, QuestionDraft, QuestionId, QuestionKind, SyncStatus, WorksheetId};
pub use orchestrator::{App, EditorSession, SessionOptions};
pub use store::{DropPosition, DropZone};
pub use workflow::{DragEvent, MoveOutcome, SaveOutcome, SaveReport, SaveState};
