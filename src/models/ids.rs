use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 服务端分配的题目 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 试卷 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorksheetId(String);

impl WorksheetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorksheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 草稿 ID
///
/// `Temp` 是客户端生成的临时令牌，只在本地有意义；
/// 持久化 API 只接受 `QuestionId`，所以临时 ID 不可能被发往服务端。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DraftId {
    Temp(Uuid),
    Persistent(QuestionId),
}

impl DraftId {
    /// 生成新的临时 ID
    pub fn new_temp() -> Self {
        DraftId::Temp(Uuid::new_v4())
    }

    pub fn is_temp(&self) -> bool {
        matches!(self, DraftId::Temp(_))
    }

    pub fn as_persistent(&self) -> Option<&QuestionId> {
        match self {
            DraftId::Persistent(id) => Some(id),
            DraftId::Temp(_) => None,
        }
    }
}

impl From<QuestionId> for DraftId {
    fn from(id: QuestionId) -> Self {
        DraftId::Persistent(id)
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftId::Temp(token) => write!(f, "tmp-{}", token),
            DraftId::Persistent(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_ids_are_unique_and_prefixed() {
        let a = DraftId::new_temp();
        let b = DraftId::new_temp();

        assert_ne!(a, b);
        assert!(a.is_temp());
        assert!(a.to_string().starts_with("tmp-"));
        assert!(a.as_persistent().is_none());
    }

    #[test]
    fn test_persistent_id_display() {
        let id: DraftId = QuestionId::new("q-7").into();
        assert_eq!(id.to_string(), "q-7");
        assert_eq!(id.as_persistent().map(QuestionId::as_str), Some("q-7"));
    }
}
