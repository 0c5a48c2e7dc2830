//! 删除流程 - 流程层
//!
//! 本地立即移除并回退选中项；持久草稿的删除经结构队列下发，
//! 临时草稿只在本地删除（正在新建的由保存流程补发删除）。

use crate::error::DraftError;
use crate::models::{DraftId, QuestionDraft};
use crate::workflow::dispatcher::{StructuralDispatcher, StructuralOp};
use crate::workflow::state::SessionState;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub removed: QuestionDraft,
    /// 删除后的选中项
    pub selection: Option<DraftId>,
    /// 是否下发了删除请求
    pub remote: bool,
}

pub struct DeletionChannel {
    dispatcher: StructuralDispatcher,
}

impl DeletionChannel {
    pub fn new(dispatcher: StructuralDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn delete_item(
        &self,
        state: &mut SessionState,
        id: &DraftId,
    ) -> Result<DeleteOutcome, DraftError> {
        let removed = state.store.remove(id)?;

        let remote = match removed.draft.id.as_persistent() {
            Some(question_id) => {
                // 已删除的题目不再算作未保存内容
                state.snapshot = state.snapshot.without(question_id.as_str());
                self.dispatcher.dispatch(StructuralOp::Delete {
                    id: question_id.clone(),
                })
            }
            None => {
                debug!("草稿 {} 从未保存，只在本地删除", removed.draft.id);
                false
            }
        };

        Ok(DeleteOutcome {
            selection: state.store.selected().cloned(),
            removed: removed.draft,
            remote,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ApiCall, ApiOperation, MemoryQuestionApi, QuestionApi};
    use crate::models::{QuestionKind, SyncStatus, WorksheetId};
    use crate::services::{SnapshotComparator, WarnSink};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_persistent_delete_reaches_server() {
        let api = Arc::new(MemoryQuestionApi::new());
        let ws = WorksheetId::new("ws");
        let mut state = SessionState::new();
        let temp = state.store.add(QuestionKind::TrueFalse);
        let qid = api
            .create_question(&ws, &state.store.get(&temp).unwrap().content())
            .await
            .unwrap();
        state.store.reconcile(&temp, &qid);

        let dispatcher = StructuralDispatcher::spawn(api.clone(), ws, Arc::new(WarnSink::new()));
        let outcome = DeletionChannel::new(dispatcher.clone())
            .delete_item(&mut state, &temp)
            .unwrap();
        dispatcher.flush().await;

        assert!(outcome.remote);
        assert_eq!(outcome.removed.sync_status, SyncStatus::Deleted);
        assert_eq!(
            api.calls_of(ApiOperation::Delete),
            vec![ApiCall::Delete { id: qid }]
        );
        assert!(api.server_order().is_empty());
    }

    #[tokio::test]
    async fn test_persistent_delete_prunes_snapshot() {
        let api = Arc::new(MemoryQuestionApi::new());
        let ws = WorksheetId::new("ws");
        let mut state = SessionState::new();
        let keep = state.store.add(QuestionKind::TrueFalse);
        let gone = state.store.add(QuestionKind::TrueFalse);
        for temp in [&keep, &gone] {
            let qid = api
                .create_question(&ws, &state.store.get(temp).unwrap().content())
                .await
                .unwrap();
            state.store.reconcile(temp, &qid);
        }
        let saved = SnapshotComparator::canonicalize(state.store.all());
        state.snapshot = state.snapshot.commit(
            saved.entries().keys().map(String::as_str),
            saved.entries().clone(),
        );

        let dispatcher = StructuralDispatcher::spawn(api.clone(), ws, Arc::new(WarnSink::new()));
        DeletionChannel::new(dispatcher.clone())
            .delete_item(&mut state, &gone)
            .unwrap();
        dispatcher.flush().await;

        assert_eq!(state.snapshot.form().entry("q-2"), None);
        assert!(!SnapshotComparator::has_changed_since(
            &state.snapshot,
            &SnapshotComparator::canonicalize(state.store.all())
        ));
    }

    #[tokio::test]
    async fn test_temp_delete_is_local_and_moves_selection() {
        let api = Arc::new(MemoryQuestionApi::new());
        let dispatcher =
            StructuralDispatcher::spawn(api.clone(), WorksheetId::new("ws"), Arc::new(WarnSink::new()));
        let mut state = SessionState::new();
        let first = state.store.add(QuestionKind::TrueFalse);
        let second = state.store.add(QuestionKind::TrueFalse);
        state.store.select(&second).unwrap();

        let outcome = DeletionChannel::new(dispatcher.clone())
            .delete_item(&mut state, &second)
            .unwrap();
        dispatcher.flush().await;

        assert!(!outcome.remote);
        assert_eq!(outcome.selection, Some(first));
        assert_eq!(api.call_count(), 0);
    }
}
