//! 内存持久化后端
//!
//! 在进程内模拟题目 API：分配 `q-1, q-2, …` 形式的 ID，维护服务端顺序，
//! 记录每一次调用，并支持故障注入和挂起调用，供演示程序和测试使用。

use crate::clients::question_api::{ApiOperation, QuestionApi};
use crate::error::ApiError;
use crate::models::{DraftId, QuestionContent, QuestionId, WorksheetId};
use crate::store::{compute_new_order, DropPosition};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::debug;

/// 一次 API 调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Create {
        content: QuestionContent,
    },
    Update {
        id: QuestionId,
        content: QuestionContent,
    },
    Delete {
        id: QuestionId,
    },
    Reorder {
        moved: QuestionId,
        target: QuestionId,
        position: DropPosition,
    },
}

impl ApiCall {
    pub fn operation(&self) -> ApiOperation {
        match self {
            ApiCall::Create { .. } => ApiOperation::Create,
            ApiCall::Update { .. } => ApiOperation::Update,
            ApiCall::Delete { .. } => ApiOperation::Delete,
            ApiCall::Reorder { .. } => ApiOperation::Reorder,
        }
    }
}

#[derive(Debug)]
struct FailureRule {
    operation: ApiOperation,
    question: Option<QuestionId>,
    remaining: usize,
}

#[derive(Debug, Default)]
struct ServerState {
    next_id: u64,
    questions: HashMap<QuestionId, QuestionContent>,
    order: Vec<QuestionId>,
    calls: Vec<ApiCall>,
    failures: Vec<FailureRule>,
}

impl ServerState {
    /// 命中故障规则时消耗一次并返回 true
    fn should_fail(&mut self, operation: ApiOperation, question: Option<&QuestionId>) -> bool {
        let hit = self.failures.iter_mut().find(|rule| {
            rule.operation == operation
                && rule.remaining > 0
                && (rule.question.is_none() || rule.question.as_ref() == question)
        });

        match hit {
            Some(rule) => {
                rule.remaining -= 1;
                true
            }
            None => false,
        }
    }

    fn ensure_exists(&self, operation: ApiOperation, id: &QuestionId) -> Result<(), ApiError> {
        if self.questions.contains_key(id) {
            Ok(())
        } else {
            Err(ApiError::BadResponse {
                endpoint: operation.to_string(),
                status: 404,
                message: Some(format!("题目 {} 不存在", id)),
            })
        }
    }
}

/// 内存题目 API
pub struct MemoryQuestionApi {
    state: Mutex<ServerState>,
    paused: watch::Sender<bool>,
}

impl MemoryQuestionApi {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            state: Mutex::new(ServerState::default()),
            paused,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 让接下来 `times` 次该操作失败
    pub fn fail_next(&self, operation: ApiOperation, times: usize) {
        self.lock().failures.push(FailureRule {
            operation,
            question: None,
            remaining: times,
        });
    }

    /// 让针对某道题的接下来 `times` 次该操作失败
    pub fn fail_for(&self, operation: ApiOperation, question: &QuestionId, times: usize) {
        self.lock().failures.push(FailureRule {
            operation,
            question: Some(question.clone()),
            remaining: times,
        });
    }

    /// 挂起后续调用，直到 `resume`
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// 已到达服务端的全部调用（含失败的）
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    pub fn calls_of(&self, operation: ApiOperation) -> Vec<ApiCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .cloned()
            .collect()
    }

    /// 服务端当前的题目顺序
    pub fn server_order(&self) -> Vec<QuestionId> {
        self.lock().order.clone()
    }

    pub fn question(&self, id: &QuestionId) -> Option<QuestionContent> {
        self.lock().questions.get(id).cloned()
    }

    async fn wait_until_resumed(&self) {
        let mut rx = self.paused.subscribe();
        // 发送端由 self 持有，不会提前关闭
        let _ = rx.wait_for(|paused| !*paused).await;
    }

    fn injected(operation: ApiOperation) -> ApiError {
        ApiError::Rejected {
            endpoint: operation.to_string(),
            reason: "注入的故障".to_string(),
        }
    }
}

impl Default for MemoryQuestionApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuestionApi for MemoryQuestionApi {
    async fn create_question(
        &self,
        _worksheet_id: &WorksheetId,
        content: &QuestionContent,
    ) -> Result<QuestionId, ApiError> {
        self.wait_until_resumed().await;
        let mut state = self.lock();
        state.calls.push(ApiCall::Create {
            content: content.clone(),
        });

        if state.should_fail(ApiOperation::Create, None) {
            return Err(Self::injected(ApiOperation::Create));
        }

        state.next_id += 1;
        let id = QuestionId::new(format!("q-{}", state.next_id));
        state.questions.insert(id.clone(), content.clone());
        state.order.push(id.clone());
        debug!("内存后端新建题目 {}", id);
        Ok(id)
    }

    async fn update_question(
        &self,
        _worksheet_id: &WorksheetId,
        question_id: &QuestionId,
        content: &QuestionContent,
    ) -> Result<(), ApiError> {
        self.wait_until_resumed().await;
        let mut state = self.lock();
        state.calls.push(ApiCall::Update {
            id: question_id.clone(),
            content: content.clone(),
        });

        if state.should_fail(ApiOperation::Update, Some(question_id)) {
            return Err(Self::injected(ApiOperation::Update));
        }
        state.ensure_exists(ApiOperation::Update, question_id)?;
        state.questions.insert(question_id.clone(), content.clone());
        Ok(())
    }

    async fn delete_question(
        &self,
        _worksheet_id: &WorksheetId,
        question_id: &QuestionId,
    ) -> Result<(), ApiError> {
        self.wait_until_resumed().await;
        let mut state = self.lock();
        state.calls.push(ApiCall::Delete {
            id: question_id.clone(),
        });

        if state.should_fail(ApiOperation::Delete, Some(question_id)) {
            return Err(Self::injected(ApiOperation::Delete));
        }
        state.ensure_exists(ApiOperation::Delete, question_id)?;
        state.questions.remove(question_id);
        state.order.retain(|id| id != question_id);
        Ok(())
    }

    async fn reorder_question(
        &self,
        _worksheet_id: &WorksheetId,
        moved: &QuestionId,
        target: &QuestionId,
        position: DropPosition,
    ) -> Result<(), ApiError> {
        self.wait_until_resumed().await;
        let mut state = self.lock();
        state.calls.push(ApiCall::Reorder {
            moved: moved.clone(),
            target: target.clone(),
            position,
        });

        if state.should_fail(ApiOperation::Reorder, Some(moved)) {
            return Err(Self::injected(ApiOperation::Reorder));
        }
        state.ensure_exists(ApiOperation::Reorder, moved)?;
        state.ensure_exists(ApiOperation::Reorder, target)?;

        let sequence: Vec<DraftId> = state.order.iter().cloned().map(DraftId::from).collect();
        let next = compute_new_order(
            &sequence,
            &moved.clone().into(),
            &target.clone().into(),
            position,
        )
        .map_err(|e| ApiError::BadResponse {
            endpoint: ApiOperation::Reorder.to_string(),
            status: 400,
            message: Some(e.to_string()),
        })?;

        state.order = next
            .into_iter()
            .filter_map(|id| id.as_persistent().cloned())
            .collect();
        Ok(())
    }
}
