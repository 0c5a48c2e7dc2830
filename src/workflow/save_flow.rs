//! 保存流程 - 流程层
//!
//! 一个保存周期：
//! 1. 与上次快照比较，没有变化直接返回
//! 2. 按本地顺序逐个新建/更新有变化的草稿（保证服务端追加顺序与本地一致）
//! 3. 新建成功后对账 ID，必要时补位或补发删除
//! 4. 提交新快照
//!
//! 单个草稿失败只记警告，不影响其他草稿；失败的草稿保留旧快照记录，下个周期重试。

use crate::clients::{ApiOperation, QuestionApi};
use crate::error::ApiError;
use crate::models::{DraftId, QuestionContent, QuestionId, WorksheetId};
use crate::services::{SnapshotComparator, WarnSink};
use crate::utils::logging;
use crate::workflow::dispatcher::{StructuralDispatcher, StructuralOp};
use crate::workflow::reorder_flow::placement_for_created;
use crate::workflow::state::{SaveState, SharedState};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 一次保存触发的结果
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// 已有保存周期在进行，本次触发合并到其后
    AlreadySaving,
    /// 与上次快照一致，没有发出任何请求
    Unchanged,
    /// 会话已关闭
    SessionClosed,
    /// 保存任务在完成前被中断
    Interrupted,
    Completed(SaveReport),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// (原临时 ID, 持久 ID)
    pub created: Vec<(DraftId, QuestionId)>,
    pub updated: Vec<QuestionId>,
    pub failed: Vec<DraftId>,
    /// 新建成功但草稿已被删除，补发了删除
    pub compensated: Vec<QuestionId>,
    /// 会话关闭后到达、被丢弃的结果数
    pub discarded: usize,
    /// 周期进行中又收到了触发
    pub rerun_requested: bool,
}

#[derive(Debug, Clone)]
enum JobKind {
    Create,
    Update(QuestionId),
}

#[derive(Debug, Clone)]
struct SaveJob {
    id: DraftId,
    revision: u64,
    content: QuestionContent,
    canonical: String,
    kind: JobKind,
}

impl SaveJob {
    fn operation(&self) -> ApiOperation {
        match self.kind {
            JobKind::Create => ApiOperation::Create,
            JobKind::Update(_) => ApiOperation::Update,
        }
    }
}

/// 周期未走到 `finish` 就被丢弃时，把保存状态恢复为空闲
struct CycleGuard<'a> {
    shared: &'a SharedState,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        if state.save_state == SaveState::Saving {
            debug!("保存周期被中断，恢复为空闲");
            state.save_state = SaveState::Idle;
        }
    }
}

/// 保存协调器
///
/// - 同一时间只允许一个保存周期
/// - 不持有草稿，只通过 `SharedState` 短暂加锁读写
/// - 锁不跨越任何 API 调用
pub struct SaveCoordinator {
    api: Arc<dyn QuestionApi>,
    worksheet_id: WorksheetId,
    warnings: Arc<WarnSink>,
    dispatcher: StructuralDispatcher,
}

impl SaveCoordinator {
    pub fn new(
        api: Arc<dyn QuestionApi>,
        worksheet_id: WorksheetId,
        warnings: Arc<WarnSink>,
        dispatcher: StructuralDispatcher,
    ) -> Self {
        Self {
            api,
            worksheet_id,
            warnings,
            dispatcher,
        }
    }

    /// 运行一个保存周期
    pub async fn trigger(&self, shared: &SharedState) -> SaveOutcome {
        let jobs = match self.begin(shared) {
            Ok(jobs) => jobs,
            Err(outcome) => return outcome,
        };
        let _guard = CycleGuard { shared };

        info!("💾 开始保存，共 {} 个草稿有变化", jobs.len());

        let mut report = SaveReport::default();
        let mut saved = BTreeMap::new();

        for job in jobs {
            {
                let state = shared.lock();
                if !state.is_active() {
                    debug!("会话已关闭，停止发送剩余请求");
                    break;
                }
                if !state.store.contains(&job.id) {
                    debug!("草稿 {} 已删除，跳过保存", job.id);
                    continue;
                }
            }

            let result = self.send(&job).await;
            self.apply_result(shared, job, result, &mut report, &mut saved);
        }

        self.finish(shared, saved, &mut report);
        SaveOutcome::Completed(report)
    }

    /// 检查前置条件并收集任务；不需要保存时返回对应结果
    fn begin(&self, shared: &SharedState) -> Result<Vec<SaveJob>, SaveOutcome> {
        let mut state = shared.lock();

        if !state.is_active() {
            return Err(SaveOutcome::SessionClosed);
        }
        if state.save_state == SaveState::Saving {
            state.rerun_requested = true;
            debug!("保存进行中，本次触发合并到下一轮");
            return Err(SaveOutcome::AlreadySaving);
        }

        let current = SnapshotComparator::canonicalize(state.store.all());
        if !SnapshotComparator::has_changed_since(&state.snapshot, &current) {
            debug!("内容与上次保存一致，跳过");
            return Err(SaveOutcome::Unchanged);
        }

        let mut jobs = Vec::new();
        let mut reverted = Vec::new();
        for draft in state.store.all() {
            let key = draft.id.to_string();
            let canonical = current.entry(&key).unwrap_or_default().to_string();

            if state.snapshot.form().entry(&key) == Some(canonical.as_str()) {
                // 改了又改回去
                if draft.sync_status.needs_save() {
                    reverted.push((draft.id.clone(), draft.revision));
                }
                continue;
            }

            let kind = match draft.id.as_persistent() {
                Some(question_id) => JobKind::Update(question_id.clone()),
                None => JobKind::Create,
            };
            jobs.push(SaveJob {
                id: draft.id.clone(),
                revision: draft.revision,
                content: draft.content(),
                canonical,
                kind,
            });
        }

        for (id, revision) in reverted {
            state.store.mark_saved(&id, revision);
        }

        state.save_state = SaveState::Saving;
        Ok(jobs)
    }

    async fn send(&self, job: &SaveJob) -> Result<Option<QuestionId>, ApiError> {
        match &job.kind {
            JobKind::Create => self
                .api
                .create_question(&self.worksheet_id, &job.content)
                .await
                .map(Some),
            JobKind::Update(question_id) => self
                .api
                .update_question(&self.worksheet_id, question_id, &job.content)
                .await
                .map(|_| None),
        }
    }

    fn apply_result(
        &self,
        shared: &SharedState,
        job: SaveJob,
        result: Result<Option<QuestionId>, ApiError>,
        report: &mut SaveReport,
        saved: &mut BTreeMap<String, String>,
    ) {
        let mut state = shared.lock();

        if !state.is_active() {
            debug!("会话已关闭，丢弃草稿 {} 的保存结果", job.id);
            report.discarded += 1;
            return;
        }

        let still_present = state.store.contains(&job.id);

        match result {
            Ok(Some(created)) => {
                if !state.store.reconcile(&job.id, &created) {
                    self.warnings.push(
                        &job.id,
                        ApiOperation::Create,
                        format!("服务端返回的 ID {} 无法对账", created),
                    );
                    report.failed.push(job.id);
                    return;
                }

                if !still_present {
                    info!("草稿 {} 在新建期间被删除，补发删除 {}", job.id, created);
                    self.dispatcher.dispatch(StructuralOp::Delete {
                        id: created.clone(),
                    });
                    report.compensated.push(created);
                    return;
                }

                state.store.mark_saved(&job.id, job.revision);
                saved.insert(created.to_string(), job.canonical);
                if let Some(op) = placement_for_created(&state.store, &created) {
                    self.dispatcher.dispatch(op);
                }
                info!("✓ 草稿 {} 已新建为 {}", job.id, created);
                report.created.push((job.id, created));
            }
            Ok(None) => {
                if let JobKind::Update(question_id) = job.kind {
                    if still_present {
                        state.store.mark_saved(&job.id, job.revision);
                        saved.insert(question_id.to_string(), job.canonical);
                    }
                    debug!("✓ 题目 {} 已更新", question_id);
                    report.updated.push(question_id);
                }
            }
            Err(e) => {
                if still_present {
                    let current = state.store.resolve(&job.id);
                    self.warnings.push_error(&current, job.operation(), &e);
                    report.failed.push(current);
                } else {
                    debug!("草稿 {} 已删除，忽略保存失败: {}", job.id, e);
                }
            }
        }
    }

    fn finish(
        &self,
        shared: &SharedState,
        saved: BTreeMap<String, String>,
        report: &mut SaveReport,
    ) {
        let mut state = shared.lock();

        if state.is_active() {
            let live: Vec<String> = state.store.all().iter().map(|d| d.id.to_string()).collect();
            state.snapshot = state
                .snapshot
                .commit(live.iter().map(String::as_str), saved);
            report.rerun_requested = state.take_rerun();
        }
        state.save_state = SaveState::Idle;
        drop(state);

        logging::log_save_complete(
            report.created.len(),
            report.updated.len(),
            report.failed.len(),
        );
    }
}
