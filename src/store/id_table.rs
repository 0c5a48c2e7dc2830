//! 临时 ID → 持久 ID 翻译表
//!
//! 所有引用草稿 ID 的操作都先经过这里解析，
//! 调用方手里的临时 ID 在首次保存成功后依然可用。

use crate::models::{DraftId, QuestionId};
use std::collections::{HashMap, HashSet};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct IdTable {
    by_temp: HashMap<Uuid, QuestionId>,
    assigned: HashSet<QuestionId>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次对账结果
    ///
    /// 临时 ID 已经对账过，或持久 ID 已被其他草稿占用时返回 false。
    pub fn record(&mut self, temp: &DraftId, persistent: &QuestionId) -> bool {
        let DraftId::Temp(token) = temp else {
            return false;
        };

        if self.by_temp.contains_key(token) {
            warn!("临时 ID {} 已经对账过，忽略 {}", temp, persistent);
            return false;
        }
        if !self.assigned.insert(persistent.clone()) {
            warn!("持久 ID {} 已被其他草稿占用", persistent);
            return false;
        }

        self.by_temp.insert(*token, persistent.clone());
        true
    }

    /// 解析为当前有效的 ID
    pub fn resolve(&self, id: &DraftId) -> DraftId {
        match id {
            DraftId::Temp(token) => self
                .by_temp
                .get(token)
                .map(|persistent| DraftId::Persistent(persistent.clone()))
                .unwrap_or_else(|| id.clone()),
            DraftId::Persistent(_) => id.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_temp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_temp.is_empty()
    }
}
