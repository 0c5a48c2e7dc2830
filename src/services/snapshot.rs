//! 快照比较服务 - 业务能力层
//!
//! 把草稿集合规范化为可比较的形式，用来判断"上次保存后是否真的有变化"。
//! 顺序、同步状态、版本号、时间戳不属于题目内容，规范化时全部去掉。

use crate::models::QuestionDraft;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// 规范化后的草稿集合
///
/// 每个草稿一条记录，键为当前 ID，值为按固定键序序列化的内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm {
    entries: BTreeMap<String, String>,
    digest: String,
}

impl CanonicalForm {
    pub fn from_entries(entries: BTreeMap<String, String>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for (key, value) in &entries {
            hasher.update(key.as_bytes());
            hasher.update(&[0x1f]);
            hasher.update(value.as_bytes());
            hasher.update(&[0x1e]);
        }

        Self {
            digest: hasher.finalize().to_string(),
            entries,
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    pub fn entry(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CanonicalForm {
    fn default() -> Self {
        Self::from_entries(BTreeMap::new())
    }
}

/// 上次成功保存后的快照，只会整体替换，不会原地修改
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    form: CanonicalForm,
    taken_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &CanonicalForm {
        &self.form
    }

    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at
    }

    /// 生成保存周期结束后的新快照
    ///
    /// # 参数
    /// - `live_keys`: 仍在草稿集合中的 ID，其余旧记录被丢弃
    /// - `saved`: 本周期成功保存的内容（键为持久 ID）
    ///
    /// 保存失败的草稿保留旧记录（或没有记录），下次比较时依然显示为有变化。
    pub fn commit<'a, I>(&self, live_keys: I, saved: BTreeMap<String, String>) -> Snapshot
    where
        I: IntoIterator<Item = &'a str>,
    {
        let live: Vec<&str> = live_keys.into_iter().collect();
        let mut entries: BTreeMap<String, String> = self
            .form
            .entries
            .iter()
            .filter(|(key, _)| live.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        entries.extend(saved);

        Snapshot {
            form: CanonicalForm::from_entries(entries),
            taken_at: Some(Utc::now()),
        }
    }

    /// 去掉一条记录（草稿已从集合中删除），保存时间不变
    pub fn without(&self, key: &str) -> Snapshot {
        if self.form.entry(key).is_none() {
            return self.clone();
        }

        let mut entries = self.form.entries.clone();
        entries.remove(key);
        Snapshot {
            form: CanonicalForm::from_entries(entries),
            taken_at: self.taken_at,
        }
    }
}

/// 参与比较的题目内容，字段顺序即序列化顺序
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalEntry<'a> {
    kind: &'a str,
    prompt: &'a str,
    point_value: f64,
    payload: &'a crate::models::TypePayload,
}

/// 快照比较服务
pub struct SnapshotComparator;

impl SnapshotComparator {
    /// 单个草稿的规范化内容
    ///
    /// 先转成 `serde_json::Value`（对象键有序），再输出紧凑字符串，
    /// 与字段构造顺序无关。
    pub fn canonical_entry(draft: &QuestionDraft) -> String {
        let entry = CanonicalEntry {
            kind: draft.kind.as_str(),
            prompt: &draft.prompt,
            point_value: draft.effective_points(),
            payload: &draft.payload,
        };

        match serde_json::to_value(&entry) {
            Ok(value) => value.to_string(),
            Err(e) => {
                warn!("草稿 {} 规范化失败: {}", draft.id, e);
                format!("{:?}", draft.content())
            }
        }
    }

    /// 规范化整个草稿集合
    pub fn canonicalize(drafts: &[QuestionDraft]) -> CanonicalForm {
        CanonicalForm::from_entries(
            drafts
                .iter()
                .map(|draft| (draft.id.to_string(), Self::canonical_entry(draft)))
                .collect(),
        )
    }

    /// 与上次快照相比是否有变化
    pub fn has_changed_since(last: &Snapshot, current: &CanonicalForm) -> bool {
        last.form.digest() != current.digest()
    }
}
