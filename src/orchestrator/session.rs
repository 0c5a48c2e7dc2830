//! 编辑会话 - 编排层
//!
//! ## 职责
//!
//! 一个编辑会话独占一份试卷草稿集合，把展示层的编辑意图分发给各个流程：
//!
//! 1. **内容编辑**：写入草稿存储 → 防抖 → 保存协调器
//! 2. **排序**：绕过防抖，直接走排序流程
//! 3. **删除**：绕过防抖，直接走删除流程
//! 4. **关闭**：取消防抖计时，之后到达的结果一律丢弃
//!
//! ## 资源归属
//!
//! - 会话状态（`SharedState`）只属于本会话
//! - 防抖计时器由会话持有，动作里只保存弱引用，会话释放后计时自然失效

use crate::clients::QuestionApi;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{DraftId, DraftPatch, QuestionDraft, QuestionKind, WorksheetId};
use crate::services::{DebounceScheduler, DebouncedAction, SnapshotComparator, SyncWarning, WarnSink};
use crate::store::DropPosition;
use crate::workflow::{
    DeleteOutcome, DeletionChannel, DragEvent, Lifecycle, MoveOutcome, ReorderChannel,
    SaveCoordinator, SaveOutcome, SaveState, SessionState, SharedState, StructuralDispatcher,
};
use std::sync::{Arc, MutexGuard, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 会话选项
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 防抖静默期
    pub debounce: Duration,
    /// 警告追加写入的文件
    pub warn_file: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            warn_file: None,
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
            warn_file: config.warn_file.clone(),
        }
    }
}

struct SessionInner {
    worksheet_id: WorksheetId,
    shared: SharedState,
    coordinator: SaveCoordinator,
    reorder: ReorderChannel,
    deletion: DeletionChannel,
    dispatcher: StructuralDispatcher,
    warnings: Arc<WarnSink>,
    debounce: DebounceScheduler,
}

impl SessionInner {
    /// 运行一个保存周期；周期中又有触发时重新开始防抖计时
    async fn save_cycle(&self) -> SaveOutcome {
        let outcome = self.coordinator.trigger(&self.shared).await;
        if let SaveOutcome::Completed(report) = &outcome {
            if report.rerun_requested {
                debug!("保存期间有新的触发，重新计时");
                self.debounce.notify_edit();
            }
        }
        outcome
    }
}

/// 编辑会话句柄，可以克隆后交给展示层的各个部件
#[derive(Clone)]
pub struct EditorSession {
    inner: Arc<SessionInner>,
}

impl EditorSession {
    /// 创建会话，必须在 tokio 运行时内调用
    pub fn new(worksheet_id: WorksheetId, api: Arc<dyn QuestionApi>, options: SessionOptions) -> Self {
        let warnings = Arc::new(match options.warn_file {
            Some(path) => WarnSink::with_path(path),
            None => WarnSink::new(),
        });
        let dispatcher =
            StructuralDispatcher::spawn(api.clone(), worksheet_id.clone(), warnings.clone());

        let inner = Arc::new_cyclic(|weak: &Weak<SessionInner>| {
            let weak = weak.clone();
            let action: DebouncedAction = Arc::new(move || {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.save_cycle().await;
                    }
                })
            });

            SessionInner {
                coordinator: SaveCoordinator::new(
                    api,
                    worksheet_id.clone(),
                    warnings.clone(),
                    dispatcher.clone(),
                ),
                reorder: ReorderChannel::new(dispatcher.clone()),
                deletion: DeletionChannel::new(dispatcher.clone()),
                shared: SharedState::new(),
                debounce: DebounceScheduler::new(options.debounce, action),
                worksheet_id,
                dispatcher,
                warnings,
            }
        });

        info!("📝 编辑会话已创建: 试卷 {}", inner.worksheet_id);
        Self { inner }
    }

    /// 按配置创建会话
    pub fn from_config(config: &Config, api: Arc<dyn QuestionApi>) -> Self {
        Self::new(
            WorksheetId::new(config.worksheet_id.as_str()),
            api,
            SessionOptions::from(config),
        )
    }

    pub fn worksheet_id(&self) -> &WorksheetId {
        &self.inner.worksheet_id
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.shared.lock()
    }

    fn active_state(&self) -> Result<MutexGuard<'_, SessionState>> {
        let state = self.state();
        if state.is_active() {
            Ok(state)
        } else {
            Err(AppError::SessionClosed)
        }
    }

    // ========== 内容编辑（经过防抖） ==========

    /// 新建草稿
    pub fn add_question(&self, kind: QuestionKind) -> Result<DraftId> {
        let id = self.active_state()?.store.add(kind);
        self.inner.debounce.notify_edit();
        Ok(id)
    }

    /// 修改草稿内容
    pub fn update_question(&self, id: &DraftId, patch: DraftPatch) -> Result<()> {
        self.active_state()?.store.update(id, patch)?;
        self.inner.debounce.notify_edit();
        Ok(())
    }

    /// 修改试卷标题（只在本地保存）
    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        self.active_state()?.store.set_title(title);
        Ok(())
    }

    pub fn title(&self) -> String {
        self.state().store.title().to_string()
    }

    pub fn select(&self, id: &DraftId) -> Result<()> {
        self.active_state()?.store.select(id)?;
        Ok(())
    }

    pub fn selected(&self) -> Option<DraftId> {
        self.state().store.selected().cloned()
    }

    // ========== 结构操作（绕过防抖） ==========

    /// 把 `dragged` 移到 `target` 之前或之后
    pub fn move_item(
        &self,
        dragged: &DraftId,
        target: &DraftId,
        position: DropPosition,
    ) -> Result<MoveOutcome> {
        let mut state = self.active_state()?;
        Ok(self.inner.reorder.move_item(&mut state, dragged, target, position)?)
    }

    /// 处理拖拽事件，放下时执行移动
    pub fn handle_drag(&self, event: DragEvent) -> Result<Option<MoveOutcome>> {
        let mut state = self.active_state()?;
        let sequence = state.store.order();
        let request = state.drag.handle(event, &sequence);

        let Some((dragged, target, position)) = request else {
            return Ok(None);
        };
        let outcome = self
            .inner
            .reorder
            .move_item(&mut state, &dragged, &target, position)?;
        Ok(Some(outcome))
    }

    /// 删除草稿
    pub fn delete_question(&self, id: &DraftId) -> Result<DeleteOutcome> {
        let mut state = self.active_state()?;
        Ok(self.inner.deletion.delete_item(&mut state, id)?)
    }

    // ========== 保存 ==========

    /// 立即保存，取消尚未到期的防抖计时
    ///
    /// 周期在独立任务中运行，调用方放弃等待时周期仍会走完。
    pub async fn save_now(&self) -> SaveOutcome {
        self.inner.debounce.cancel();
        let inner = self.inner.clone();
        match tokio::spawn(async move { inner.save_cycle().await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("保存任务异常结束: {}", e);
                SaveOutcome::Interrupted
            }
        }
    }

    /// 等待已下发的排序/删除全部完成
    pub async fn flush_structural(&self) {
        self.inner.dispatcher.flush().await;
    }

    pub fn is_save_pending(&self) -> bool {
        self.inner.debounce.is_pending()
    }

    // ========== 读取 ==========

    /// 按顺序返回全部草稿
    pub fn drafts(&self) -> Vec<QuestionDraft> {
        self.state().store.all().to_vec()
    }

    pub fn draft(&self, id: &DraftId) -> Option<QuestionDraft> {
        self.state().store.get(id).cloned()
    }

    pub fn save_state(&self) -> SaveState {
        self.state().save_state
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    /// 是否有尚未保存的内容
    pub fn has_unsaved_changes(&self) -> bool {
        let state = self.state();
        let current = SnapshotComparator::canonicalize(state.store.all());
        SnapshotComparator::has_changed_since(&state.snapshot, &current)
    }

    pub fn warnings(&self) -> Vec<SyncWarning> {
        self.inner.warnings.snapshot()
    }

    /// 取走全部警告（展示层读取后清空）
    pub fn drain_warnings(&self) -> Vec<SyncWarning> {
        self.inner.warnings.drain()
    }

    // ========== 关闭 ==========

    /// 关闭会话
    ///
    /// 取消防抖计时；正在进行的请求不会被打断，但其结果不再写回。
    pub fn close(&self) {
        self.inner.debounce.cancel();
        let mut state = self.state();
        if state.lifecycle == Lifecycle::Closed {
            return;
        }
        state.lifecycle = Lifecycle::Closed;
        info!("编辑会话已关闭: 试卷 {}", self.inner.worksheet_id);
    }
}
