//! 持久化 API 接口
//!
//! 核心只把这四个操作当作有成功/失败结果的远程调用，不关心传输细节。

use crate::error::ApiError;
use crate::models::{QuestionContent, QuestionId, WorksheetId};
use crate::store::DropPosition;
use async_trait::async_trait;
use std::fmt;

/// 持久化操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    Create,
    Update,
    Delete,
    Reorder,
}

impl ApiOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiOperation::Create => "create-question",
            ApiOperation::Update => "update-question",
            ApiOperation::Delete => "delete-question",
            ApiOperation::Reorder => "reorder-question",
        }
    }
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 题目持久化 API
///
/// 所有方法只接受持久 ID，临时 ID 在类型层面就无法传入。
#[async_trait]
pub trait QuestionApi: Send + Sync {
    /// 新建题目，返回服务端分配的 ID
    async fn create_question(
        &self,
        worksheet_id: &WorksheetId,
        content: &QuestionContent,
    ) -> Result<QuestionId, ApiError>;

    /// 更新题目内容
    async fn update_question(
        &self,
        worksheet_id: &WorksheetId,
        question_id: &QuestionId,
        content: &QuestionContent,
    ) -> Result<(), ApiError>;

    /// 删除题目
    async fn delete_question(
        &self,
        worksheet_id: &WorksheetId,
        question_id: &QuestionId,
    ) -> Result<(), ApiError>;

    /// 以锚点描述移动：把 `moved` 放到 `target` 之前或之后
    async fn reorder_question(
        &self,
        worksheet_id: &WorksheetId,
        moved: &QuestionId,
        target: &QuestionId,
        position: DropPosition,
    ) -> Result<(), ApiError>;
}
