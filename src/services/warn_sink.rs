//! 警告收集服务 - 业务能力层
//!
//! 只负责"把单个草稿的同步失败告诉用户"，不关心流程

use crate::clients::ApiOperation;
use crate::error::ApiError;
use crate::models::DraftId;
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// 面向用户的同步警告
#[derive(Debug, Clone, PartialEq)]
pub struct SyncWarning {
    pub draft_id: DraftId,
    pub operation: ApiOperation,
    pub message: String,
    /// 瞬时故障（网络、5xx、限流），下个周期很可能成功
    pub transient: bool,
    pub at: DateTime<Utc>,
}

/// 警告收集服务
///
/// 职责：
/// - 记录单个草稿的同步失败，供展示层读取
/// - 可选地追加写入警告文件
/// - 不决定是否重试
pub struct WarnSink {
    warnings: Mutex<Vec<SyncWarning>>,
    warn_file_path: Option<String>,
}

impl WarnSink {
    /// 只在内存中记录
    pub fn new() -> Self {
        Self {
            warnings: Mutex::new(Vec::new()),
            warn_file_path: None,
        }
    }

    /// 同时写入警告文件
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            warnings: Mutex::new(Vec::new()),
            warn_file_path: Some(path.into()),
        }
    }

    fn warnings(&self) -> MutexGuard<'_, Vec<SyncWarning>> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 记录一条警告
    ///
    /// # 参数
    /// - `draft_id`: 出错的草稿
    /// - `operation`: 失败的操作
    /// - `message`: 错误描述
    pub fn push(&self, draft_id: &DraftId, operation: ApiOperation, message: impl Into<String>) {
        self.record(draft_id, operation, message.into(), false);
    }

    /// 记录一次 API 失败，按错误类型标记是否可重试
    pub fn push_error(&self, draft_id: &DraftId, operation: ApiOperation, error: &ApiError) {
        self.record(draft_id, operation, error.to_string(), error.is_transient());
    }

    fn record(&self, draft_id: &DraftId, operation: ApiOperation, message: String, transient: bool) {
        let warning = SyncWarning {
            draft_id: draft_id.clone(),
            operation,
            message,
            transient,
            at: Utc::now(),
        };

        warn!(
            "⚠️ 草稿 {} 的 {} 失败{}: {}",
            warning.draft_id,
            warning.operation,
            retry_hint(&warning),
            warning.message
        );

        if let Some(path) = &self.warn_file_path {
            if let Err(e) = append_line(path, &warning) {
                debug!("写入警告文件 {} 失败: {}", path, e);
            }
        }

        self.warnings().push(warning);
    }

    /// 当前全部警告
    pub fn snapshot(&self) -> Vec<SyncWarning> {
        self.warnings().clone()
    }

    /// 取走全部警告
    pub fn drain(&self) -> Vec<SyncWarning> {
        std::mem::take(&mut *self.warnings())
    }

    pub fn len(&self) -> usize {
        self.warnings().len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings().is_empty()
    }
}

impl Default for WarnSink {
    fn default() -> Self {
        Self::new()
    }
}

fn retry_hint(warning: &SyncWarning) -> &'static str {
    if warning.transient {
        "（可重试）"
    } else {
        ""
    }
}

fn append_line(path: &str, warning: &SyncWarning) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let line = format!(
        "{} | 草稿 {} | {}{} | {}\n",
        warning.at.format("%Y-%m-%d %H:%M:%S"),
        warning.draft_id,
        warning.operation,
        retry_hint(warning),
        warning.message
    );

    file.write_all(line.as_bytes())
}
