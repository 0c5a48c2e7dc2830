//! 草稿存储
//!
//! 有序的题目草稿集合，附带每个草稿的同步状态、试卷标题和当前选中项。
//! 所有接收草稿 ID 的方法都先经过 `IdTable` 解析。

use crate::error::DraftError;
use crate::models::{DraftId, DraftPatch, QuestionDraft, QuestionId, QuestionKind, SyncStatus};
use crate::store::id_table::IdTable;
use crate::store::order::{compute_new_order, DropPosition};
use std::collections::HashMap;
use tracing::debug;

/// 删除结果
#[derive(Debug, Clone)]
pub struct RemovedDraft {
    /// 被删除的草稿（状态为 Deleted）
    pub draft: QuestionDraft,
    /// 删除前的同步状态
    pub previous_status: SyncStatus,
    /// 选中项的回退目标：前一个兄弟，否则新的第一项，否则无
    pub fallback: Option<DraftId>,
    /// 被删除的草稿是否是选中项
    pub was_selected: bool,
}

#[derive(Debug, Default)]
pub struct DraftStore {
    title: String,
    drafts: Vec<QuestionDraft>,
    ids: IdTable,
    selected: Option<DraftId>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// 新建草稿，分配临时 ID 并追加到末尾
    pub fn add(&mut self, kind: QuestionKind) -> DraftId {
        let id = DraftId::new_temp();
        let order = self.drafts.len() + 1;
        self.drafts.push(QuestionDraft::new(id.clone(), kind, order));
        debug!("新建草稿 {} ({}), 位置 {}", id, kind, order);
        id
    }

    /// 合并字段并标记为脏
    pub fn update(&mut self, id: &DraftId, patch: DraftPatch) -> Result<(), DraftError> {
        let index = self.index_of(id)?;
        self.drafts[index].apply(patch)
    }

    /// 删除草稿，并在它是选中项时把选中项回退
    pub fn remove(&mut self, id: &DraftId) -> Result<RemovedDraft, DraftError> {
        let index = self.index_of(id)?;
        let mut draft = self.drafts.remove(index);
        self.renumber();

        let fallback = if index > 0 {
            self.drafts.get(index - 1).map(|d| d.id.clone())
        } else {
            self.drafts.first().map(|d| d.id.clone())
        };

        let was_selected = self.selected.as_ref() == Some(&draft.id);
        if was_selected {
            self.selected = fallback.clone();
        }

        let previous_status = draft.sync_status;
        draft.sync_status = SyncStatus::Deleted;

        Ok(RemovedDraft {
            draft,
            previous_status,
            fallback,
            was_selected,
        })
    }

    /// 把草稿移动到目标之前或之后，并重新编号
    ///
    /// 不改变同步状态；顺序没有变化时返回 false。
    pub fn splice_order(
        &mut self,
        id: &DraftId,
        target: &DraftId,
        position: DropPosition,
    ) -> Result<bool, DraftError> {
        let current = self.order();
        let next = compute_new_order(&current, &self.resolve(id), &self.resolve(target), position)?;
        if next == current {
            return Ok(false);
        }

        let rank: HashMap<&DraftId, usize> =
            next.iter().enumerate().map(|(i, id)| (id, i)).collect();
        self.drafts
            .sort_by_key(|d| rank.get(&d.id).copied().unwrap_or(usize::MAX));
        self.renumber();
        Ok(true)
    }

    pub fn get(&self, id: &DraftId) -> Option<&QuestionDraft> {
        let id = self.resolve(id);
        self.drafts.iter().find(|d| d.id == id)
    }

    /// 按顺序返回全部草稿
    pub fn all(&self) -> &[QuestionDraft] {
        &self.drafts
    }

    /// 当前顺序下的 ID 列表
    pub fn order(&self) -> Vec<DraftId> {
        self.drafts.iter().map(|d| d.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn contains(&self, id: &DraftId) -> bool {
        self.get(id).is_some()
    }

    /// 解析为当前有效的 ID
    pub fn resolve(&self, id: &DraftId) -> DraftId {
        self.ids.resolve(id)
    }

    pub fn select(&mut self, id: &DraftId) -> Result<(), DraftError> {
        let index = self.index_of(id)?;
        self.selected = Some(self.drafts[index].id.clone());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&DraftId> {
        self.selected.as_ref()
    }

    /// 首次保存成功后，用持久 ID 替换临时 ID
    ///
    /// 返回 false 表示对账被拒绝（临时 ID 已对账，或持久 ID 冲突）。
    /// 草稿已被删除时仍然记录映射，调用方据此补发删除。
    pub fn reconcile(&mut self, temp: &DraftId, persistent: &QuestionId) -> bool {
        if !self.ids.record(temp, persistent) {
            return false;
        }

        let new_id = DraftId::Persistent(persistent.clone());
        if let Some(draft) = self.drafts.iter_mut().find(|d| &d.id == temp) {
            draft.id = new_id.clone();
        }
        if self.selected.as_ref() == Some(temp) {
            self.selected = Some(new_id);
        }
        true
    }

    /// 保存成功后更新状态
    ///
    /// `revision` 是发出请求时的版本号；草稿已不存在时返回 None。
    pub fn mark_saved(&mut self, id: &DraftId, revision: u64) -> Option<SyncStatus> {
        let id = self.resolve(id);
        let draft = self.drafts.iter_mut().find(|d| d.id == id)?;
        draft.sync_status = draft.sync_status.after_save(draft.revision == revision);
        Some(draft.sync_status)
    }

    fn index_of(&self, id: &DraftId) -> Result<usize, DraftError> {
        let resolved = self.resolve(id);
        self.drafts
            .iter()
            .position(|d| d.id == resolved)
            .ok_or_else(|| DraftError::NotFound { id: id.to_string() })
    }

    fn renumber(&mut self) {
        for (index, draft) in self.drafts.iter_mut().enumerate() {
            draft.order = index + 1;
        }
    }
}
