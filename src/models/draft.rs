use crate::error::DraftError;
use crate::models::ids::DraftId;
use crate::models::question::{is_valid_points, QuestionContent, QuestionKind, TypePayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 草稿同步状态
///
/// ```text
/// add ──► LocalUncommitted ──save──► Clean ◄──save── Dirty
///              │ edit                  │ edit         ▲
///              └──► LocalUncommitted   └──────────────┘
/// 任意状态 ──delete──► Deleted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// 仍持有临时 ID，从未保存成功
    LocalUncommitted,
    /// 与服务端一致
    Clean,
    /// 已有持久 ID，存在未保存的修改
    Dirty,
    /// 已删除（终态）
    Deleted,
}

impl SyncStatus {
    /// 编辑后的状态；新建优先于脏标记
    pub fn after_edit(self) -> Self {
        match self {
            SyncStatus::LocalUncommitted => SyncStatus::LocalUncommitted,
            SyncStatus::Clean | SyncStatus::Dirty => SyncStatus::Dirty,
            SyncStatus::Deleted => SyncStatus::Deleted,
        }
    }

    /// 保存成功后的状态
    ///
    /// `content_unchanged` 为 false 表示保存期间草稿又被编辑过，
    /// 此时刚保存的并不是当前内容，草稿仍然是 Dirty。
    pub fn after_save(self, content_unchanged: bool) -> Self {
        match self {
            SyncStatus::LocalUncommitted | SyncStatus::Dirty | SyncStatus::Clean => {
                if content_unchanged {
                    SyncStatus::Clean
                } else {
                    SyncStatus::Dirty
                }
            }
            SyncStatus::Deleted => SyncStatus::Deleted,
        }
    }

    /// 是否需要在下一个保存周期中处理
    pub fn needs_save(self) -> bool {
        matches!(self, SyncStatus::LocalUncommitted | SyncStatus::Dirty)
    }
}

/// 题目草稿
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub id: DraftId,
    pub kind: QuestionKind,
    pub prompt: String,
    pub point_value: f64,
    pub payload: TypePayload,
    /// 在试卷中的位置（从1开始，连续）
    pub order: usize,
    pub sync_status: SyncStatus,
    /// 每次编辑递增，用于判断保存的是否是当前内容
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
}

impl QuestionDraft {
    pub fn new(id: DraftId, kind: QuestionKind, order: usize) -> Self {
        Self {
            id,
            kind,
            prompt: String::new(),
            point_value: 0.0,
            payload: kind.default_payload(),
            order,
            sync_status: SyncStatus::LocalUncommitted,
            revision: 0,
            updated_at: Utc::now(),
        }
    }

    /// 实际生效的分值（简答题按评分细则求和）
    pub fn effective_points(&self) -> f64 {
        self.payload.derived_points().unwrap_or(self.point_value)
    }

    /// 发送给持久化 API 的内容
    pub fn content(&self) -> QuestionContent {
        QuestionContent {
            kind: self.kind,
            prompt: self.prompt.clone(),
            point_value: self.effective_points(),
            payload: self.payload.clone(),
        }
    }

    /// 合并部分字段，先校验再修改
    pub fn apply(&mut self, patch: DraftPatch) -> Result<(), DraftError> {
        if let Some(points) = patch.point_value {
            if !is_valid_points(points) {
                return Err(DraftError::InvalidPoints { value: points });
            }
        }
        if let Some((index, value)) = patch.payload.as_ref().and_then(TypePayload::invalid_weight) {
            return Err(DraftError::InvalidRuleWeight { index, value });
        }
        if let Some(total) = patch.payload.as_ref().and_then(TypePayload::derived_points) {
            if !is_valid_points(total) {
                return Err(DraftError::InvalidPoints { value: total });
            }
        }

        let kind = patch.kind.unwrap_or(self.kind);
        let payload = match patch.payload {
            Some(payload) if payload.kind() != kind => {
                return Err(DraftError::PayloadKindMismatch {
                    kind: kind.to_string(),
                    payload: payload.kind().to_string(),
                });
            }
            Some(payload) => Some(payload),
            None if kind != self.kind => Some(kind.default_payload()),
            None => None,
        };

        self.kind = kind;
        if let Some(prompt) = patch.prompt {
            self.prompt = prompt;
        }
        if let Some(points) = patch.point_value {
            self.point_value = points;
        }
        if let Some(payload) = payload {
            self.payload = payload;
        }

        self.revision += 1;
        self.updated_at = Utc::now();
        self.sync_status = self.sync_status.after_edit();
        Ok(())
    }
}

/// 草稿的部分字段修改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPatch {
    pub kind: Option<QuestionKind>,
    pub prompt: Option<String>,
    pub point_value: Option<f64>,
    pub payload: Option<TypePayload>,
}

impl DraftPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: QuestionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn point_value(mut self, points: f64) -> Self {
        self.point_value = Some(points);
        self
    }

    pub fn payload(mut self, payload: TypePayload) -> Self {
        self.payload = Some(payload);
        self
    }
}
