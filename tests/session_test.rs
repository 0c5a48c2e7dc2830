use question_draft_sync::clients::{ApiCall, ApiOperation, MemoryQuestionApi};
use question_draft_sync::models::{
    DraftId, DraftPatch, MarkschemeRule, QuestionId, QuestionKind, SyncStatus, TypePayload, WorksheetId,
};
use question_draft_sync::store::{DropPosition, DropZone};
use question_draft_sync::workflow::{DragEvent, MoveOutcome, SaveOutcome, SaveReport, SaveState, StructuralOp};
use question_draft_sync::{AppError, EditorSession, SessionOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn setup(debounce_ms: u64) -> (Arc<MemoryQuestionApi>, EditorSession) {
    let api = Arc::new(MemoryQuestionApi::new());
    let session = EditorSession::new(
        WorksheetId::new("ws-1"),
        api.clone(),
        SessionOptions {
            debounce: Duration::from_millis(debounce_ms),
            warn_file: None,
        },
    );
    (api, session)
}

fn q(id: &str) -> QuestionId {
    QuestionId::new(id)
}

fn persistent(id: &str) -> DraftId {
    DraftId::Persistent(q(id))
}

fn completed(outcome: SaveOutcome) -> SaveReport {
    match outcome {
        SaveOutcome::Completed(report) => report,
        other => panic!("expected completed save, got {:?}", other),
    }
}

/// 新建并保存若干草稿，返回它们最初的临时 ID
async fn saved_drafts(session: &EditorSession, prompts: &[&str]) -> Vec<DraftId> {
    let ids: Vec<DraftId> = prompts
        .iter()
        .map(|prompt| {
            let id = session.add_question(QuestionKind::MathExpression).unwrap();
            session
                .update_question(&id, DraftPatch::new().prompt(*prompt))
                .unwrap();
            id
        })
        .collect();
    completed(session.save_now().await);
    ids
}

fn local_order(session: &EditorSession) -> Vec<DraftId> {
    session.drafts().into_iter().map(|d| d.id).collect()
}

fn server_order_as_drafts(api: &MemoryQuestionApi) -> Vec<DraftId> {
    api.server_order().into_iter().map(DraftId::Persistent).collect()
}

#[tokio::test(start_paused = true)]
async fn test_typing_burst_creates_once_with_final_prompt() {
    let (api, session) = setup(500);

    let id = assert_ok!(session.add_question(QuestionKind::MultipleChoice));
    let mut prompt = String::new();
    for ch in "abcd".chars() {
        prompt.push(ch);
        assert_ok!(session.update_question(&id, DraftPatch::new().prompt(prompt.as_str())));
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(api.call_count(), 0);

    tokio::time::sleep(Duration::from_millis(600)).await;

    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        ApiCall::Create { content } => {
            assert_eq!(content.prompt, "abcd");
            assert_eq!(content.kind, QuestionKind::MultipleChoice);
        }
        other => panic!("expected create, got {:?}", other),
    }

    let draft = session.draft(&id).unwrap();
    assert_eq!(draft.id, persistent("q-1"));
    assert_eq!(draft.sync_status, SyncStatus::Clean);
    assert_eq!(session.save_state(), SaveState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_second_save_without_edits_sends_nothing() {
    let (api, session) = setup(500);
    saved_drafts(&session, &["x + 1", "2x"]).await;
    let after_first = api.call_count();

    assert_eq!(session.save_now().await, SaveOutcome::Unchanged);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(api.call_count(), after_first);
}

#[tokio::test(start_paused = true)]
async fn test_reconciled_ids_used_by_later_structural_calls() {
    let (api, session) = setup(500);

    // 编辑、排序后才第一次保存
    let a = session.add_question(QuestionKind::TrueFalse).unwrap();
    let b = session.add_question(QuestionKind::TrueFalse).unwrap();
    let c = session.add_question(QuestionKind::TrueFalse).unwrap();
    session
        .update_question(&c, DraftPatch::new().prompt("third"))
        .unwrap();
    assert_eq!(
        session.move_item(&c, &a, DropPosition::Before).unwrap(),
        MoveOutcome::LocalOnly
    );
    completed(session.save_now().await);
    session.flush_structural().await;

    // 按本地顺序新建，服务端顺序一致
    assert_eq!(local_order(&session), vec![persistent("q-1"), persistent("q-2"), persistent("q-3")]);
    assert_eq!(session.draft(&c).unwrap().id, persistent("q-1"));
    assert!(api.calls_of(ApiOperation::Reorder).is_empty());

    // 之后仍然用临时 ID 操作
    session.move_item(&c, &b, DropPosition::After).unwrap();
    session.delete_question(&a).unwrap();
    session.flush_structural().await;

    let structural: Vec<ApiCall> = api
        .calls()
        .into_iter()
        .filter(|call| matches!(call, ApiCall::Reorder { .. } | ApiCall::Delete { .. }))
        .collect();
    assert_eq!(
        structural,
        vec![
            ApiCall::Reorder {
                moved: q("q-1"),
                target: q("q-3"),
                position: DropPosition::After,
            },
            ApiCall::Delete { id: q("q-2") },
        ]
    );
    assert_eq!(server_order_as_drafts(&api), local_order(&session));
}

#[tokio::test(start_paused = true)]
async fn test_reorder_correctness_and_noop() {
    let (api, session) = setup(500);
    let ids = saved_drafts(&session, &["A", "B", "C"]).await;

    session.move_item(&ids[2], &ids[0], DropPosition::Before).unwrap();
    session.flush_structural().await;
    assert_eq!(api.server_order(), vec![q("q-3"), q("q-1"), q("q-2")]);

    // 回到 [A,B,C] 后再把 A 放到 C 之后
    session.move_item(&ids[2], &ids[1], DropPosition::After).unwrap();
    session.move_item(&ids[0], &ids[2], DropPosition::After).unwrap();
    session.flush_structural().await;
    assert_eq!(api.server_order(), vec![q("q-2"), q("q-3"), q("q-1")]);
    assert_eq!(server_order_as_drafts(&api), local_order(&session));

    let before = api.calls_of(ApiOperation::Reorder).len();
    assert_eq!(
        session.move_item(&ids[2], &ids[1], DropPosition::After).unwrap(),
        MoveOutcome::Unchanged
    );
    assert_eq!(
        session.move_item(&ids[1], &ids[2], DropPosition::Before).unwrap(),
        MoveOutcome::Unchanged
    );
    session.flush_structural().await;
    assert_eq!(api.calls_of(ApiOperation::Reorder).len(), before);
}

#[tokio::test(start_paused = true)]
async fn test_delete_selection_fallback() {
    let (_api, session) = setup(500);
    let a = session.add_question(QuestionKind::TrueFalse).unwrap();
    let b = session.add_question(QuestionKind::TrueFalse).unwrap();
    let c = session.add_question(QuestionKind::TrueFalse).unwrap();

    session.select(&b).unwrap();
    let outcome = session.delete_question(&b).unwrap();
    assert_eq!(outcome.selection, Some(a.clone()));
    assert_eq!(session.selected(), Some(a.clone()));

    session.delete_question(&a).unwrap();
    assert_eq!(session.selected(), Some(c.clone()));

    let last = session.delete_question(&c).unwrap();
    assert_eq!(last.selection, None);
    assert!(session.drafts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_partial_failure_is_isolated_and_retried() {
    let (api, session) = setup(500);
    let ids = saved_drafts(&session, &["a", "b"]).await;

    session
        .update_question(&ids[0], DraftPatch::new().prompt("a2"))
        .unwrap();
    session
        .update_question(&ids[1], DraftPatch::new().prompt("b2"))
        .unwrap();
    api.fail_for(ApiOperation::Update, &q("q-1"), 1);

    let report = completed(session.save_now().await);
    assert_eq!(report.failed, vec![persistent("q-1")]);
    assert_eq!(report.updated, vec![q("q-2")]);
    assert_eq!(session.draft(&ids[0]).unwrap().sync_status, SyncStatus::Dirty);
    assert_eq!(session.draft(&ids[1]).unwrap().sync_status, SyncStatus::Clean);

    let warnings = session.drain_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].draft_id, persistent("q-1"));
    assert_eq!(warnings[0].operation, ApiOperation::Update);
    assert!(warnings[0].transient);
    assert!(session.has_unsaved_changes());

    let retry = completed(session.save_now().await);
    assert_eq!(retry.updated, vec![q("q-1")]);
    assert_eq!(session.draft(&ids[0]).unwrap().sync_status, SyncStatus::Clean);
    assert_eq!(api.question(&q("q-1")).unwrap().prompt, "a2");
}

#[tokio::test(start_paused = true)]
async fn test_edit_during_inflight_save_is_saved_next() {
    let (api, session) = setup(500);
    let id = session.add_question(QuestionKind::MathExpression).unwrap();
    session
        .update_question(&id, DraftPatch::new().prompt("first"))
        .unwrap();

    api.pause();
    let saving = {
        let session = session.clone();
        tokio::spawn(async move { session.save_now().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.save_state(), SaveState::Saving);

    session
        .update_question(&id, DraftPatch::new().prompt("second"))
        .unwrap();
    api.resume();
    completed(saving.await.unwrap());

    // 保存的是旧内容，草稿仍然是 Dirty
    let draft = session.draft(&id).unwrap();
    assert_eq!(draft.id, persistent("q-1"));
    assert_eq!(draft.sync_status, SyncStatus::Dirty);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(
        api.calls_of(ApiOperation::Update),
        vec![ApiCall::Update {
            id: q("q-1"),
            content: session.draft(&id).unwrap().content(),
        }]
    );
    assert_eq!(session.draft(&id).unwrap().sync_status, SyncStatus::Clean);
    assert_eq!(api.question(&q("q-1")).unwrap().prompt, "second");
}

#[tokio::test(start_paused = true)]
async fn test_trigger_during_save_reruns_after_cycle() {
    let (api, session) = setup(100);
    api.pause();

    let id = session.add_question(QuestionKind::TrueFalse).unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(session.save_state(), SaveState::Saving);

    // 防抖再次到期时保存还没结束
    session
        .update_question(&id, DraftPatch::new().prompt("later"))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(api.call_count(), 0);

    api.resume();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let operations: Vec<ApiOperation> = api.calls().iter().map(ApiCall::operation).collect();
    assert_eq!(operations, vec![ApiOperation::Create, ApiOperation::Update]);
    assert_eq!(api.question(&q("q-1")).unwrap().prompt, "later");
    assert_eq!(session.draft(&id).unwrap().sync_status, SyncStatus::Clean);
}

#[tokio::test(start_paused = true)]
async fn test_results_after_close_are_discarded() {
    let (api, session) = setup(500);
    let id = session.add_question(QuestionKind::TrueFalse).unwrap();

    api.pause();
    let saving = {
        let session = session.clone();
        tokio::spawn(async move { session.save_now().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    session.close();
    api.resume();
    let report = completed(saving.await.unwrap());

    assert_eq!(report.discarded, 1);
    assert!(report.created.is_empty());
    assert_eq!(api.calls_of(ApiOperation::Create).len(), 1);
    // 会话状态没有被改写
    let draft = session.draft(&id).unwrap();
    assert!(draft.id.is_temp());
    assert_eq!(draft.sync_status, SyncStatus::LocalUncommitted);
    assert_eq!(session.save_state(), SaveState::Idle);
    assert_err!(session.add_question(QuestionKind::TrueFalse));
}

#[tokio::test(start_paused = true)]
async fn test_delete_during_create_sends_compensating_delete() {
    let (api, session) = setup(500);
    let id = session.add_question(QuestionKind::TrueFalse).unwrap();

    api.pause();
    let saving = {
        let session = session.clone();
        tokio::spawn(async move { session.save_now().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let outcome = session.delete_question(&id).unwrap();
    assert!(!outcome.remote);

    api.resume();
    let report = completed(saving.await.unwrap());
    session.flush_structural().await;

    assert_eq!(report.compensated, vec![q("q-1")]);
    assert_eq!(
        api.calls(),
        vec![
            ApiCall::Create {
                content: outcome.removed.content(),
            },
            ApiCall::Delete { id: q("q-1") },
        ]
    );
    assert!(api.server_order().is_empty());
    assert!(session.warnings().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deleting_unsaved_draft_is_local_only() {
    let (api, session) = setup(500);
    let id = session.add_question(QuestionKind::LongAnswer).unwrap();

    let outcome = session.delete_question(&id).unwrap();
    assert!(!outcome.remote);
    assert_eq!(outcome.removed.sync_status, SyncStatus::Deleted);

    tokio::time::sleep(Duration::from_secs(2)).await;
    session.flush_structural().await;
    assert_eq!(api.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_drag_to_list_edges() {
    let (api, session) = setup(500);
    let ids = saved_drafts(&session, &["A", "B", "C"]).await;

    assert_eq!(session.handle_drag(DragEvent::PickedUp(ids[2].clone())).unwrap(), None);
    assert_eq!(
        session.handle_drag(DragEvent::Dropped(DropZone::ListStart)).unwrap(),
        Some(MoveOutcome::Dispatched(StructuralOp::Reorder {
            moved: q("q-3"),
            target: q("q-1"),
            position: DropPosition::Before,
        }))
    );

    session.handle_drag(DragEvent::PickedUp(ids[2].clone())).unwrap();
    assert_eq!(
        session.handle_drag(DragEvent::Dropped(DropZone::ListEnd)).unwrap(),
        Some(MoveOutcome::Dispatched(StructuralOp::Reorder {
            moved: q("q-3"),
            target: q("q-2"),
            position: DropPosition::After,
        }))
    );

    // 取消的拖拽不产生任何请求
    session.handle_drag(DragEvent::PickedUp(ids[0].clone())).unwrap();
    session.handle_drag(DragEvent::Cancelled).unwrap();
    assert_eq!(
        session.handle_drag(DragEvent::Dropped(DropZone::ListEnd)).unwrap(),
        None
    );

    session.flush_structural().await;
    assert_eq!(api.calls_of(ApiOperation::Reorder).len(), 2);
    assert_eq!(api.server_order(), vec![q("q-1"), q("q-2"), q("q-3")]);
}

#[tokio::test(start_paused = true)]
async fn test_server_order_follows_local_with_unsaved_anchors() {
    let (api, session) = setup(500);
    let ids = saved_drafts(&session, &["A", "B", "C"]).await;

    // [D, A, B, C]，D 尚未保存
    let d = session.add_question(QuestionKind::TrueFalse).unwrap();
    session.move_item(&d, &ids[0], DropPosition::Before).unwrap();

    // B 放到 D 之后：目标是临时 ID，改用最近的持久兄弟作锚点
    assert_eq!(
        session.move_item(&ids[1], &d, DropPosition::After).unwrap(),
        MoveOutcome::Dispatched(StructuralOp::Reorder {
            moved: q("q-2"),
            target: q("q-1"),
            position: DropPosition::Before,
        })
    );

    completed(session.save_now().await);
    session.flush_structural().await;

    assert_eq!(
        local_order(&session),
        vec![persistent("q-4"), persistent("q-2"), persistent("q-1"), persistent("q-3")]
    );
    assert_eq!(server_order_as_drafts(&api), local_order(&session));
    assert!(session.warnings().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_save_now_still_finishes() {
    let (api, session) = setup(500);
    let id = session.add_question(QuestionKind::MathExpression).unwrap();
    session
        .update_question(&id, DraftPatch::new().prompt("x^2"))
        .unwrap();

    api.pause();
    let waited = tokio::time::timeout(Duration::from_millis(50), session.save_now()).await;
    assert!(waited.is_err());

    // 调用方不再等待，周期在后台走完
    api.resume();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(session.save_state(), SaveState::Idle);
    let draft = session.draft(&id).unwrap();
    assert_eq!(draft.id, persistent("q-1"));
    assert_eq!(draft.sync_status, SyncStatus::Clean);
    assert_eq!(api.calls_of(ApiOperation::Create).len(), 1);

    // 之后的编辑照常保存
    session
        .update_question(&id, DraftPatch::new().prompt("x^3"))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(api.calls_of(ApiOperation::Update).len(), 1);
    assert_eq!(api.question(&q("q-1")).unwrap().prompt, "x^3");
}

#[tokio::test(start_paused = true)]
async fn test_negative_rule_weight_never_reaches_server() {
    let (api, session) = setup(500);
    let id = session.add_question(QuestionKind::LongAnswer).unwrap();

    let result = session.update_question(
        &id,
        DraftPatch::new().payload(TypePayload::LongAnswer {
            markscheme: vec![MarkschemeRule {
                description: "扣分项".to_string(),
                weight: -5.0,
            }],
        }),
    );
    assert!(matches!(result, Err(AppError::Draft(_))));
    assert_err!(session.update_question(&id, DraftPatch::new().point_value(f64::INFINITY)));

    completed(session.save_now().await);
    match &api.calls()[0] {
        ApiCall::Create { content } => assert!(content.point_value >= 0.0),
        other => panic!("expected create, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_deleting_saved_draft_leaves_nothing_unsaved() {
    let (api, session) = setup(500);
    let ids = saved_drafts(&session, &["a", "b"]).await;
    assert!(!session.has_unsaved_changes());

    let outcome = session.delete_question(&ids[1]).unwrap();
    assert!(outcome.remote);
    assert!(!session.has_unsaved_changes());
    assert_eq!(session.save_now().await, SaveOutcome::Unchanged);

    session.flush_structural().await;
    assert_eq!(api.server_order(), vec![q("q-1")]);
}
