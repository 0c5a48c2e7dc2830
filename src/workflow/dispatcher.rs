//! 结构操作分发器
//!
//! 排序和删除不经过防抖，也不等待内容保存；它们进入同一个队列，
//! 由单个后台任务按发出顺序逐个调用 API。

use crate::clients::{ApiOperation, QuestionApi};
use crate::error::ApiError;
use crate::models::{DraftId, QuestionId, WorksheetId};
use crate::services::WarnSink;
use crate::store::DropPosition;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

/// 结构操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralOp {
    Reorder {
        moved: QuestionId,
        target: QuestionId,
        position: DropPosition,
    },
    Delete {
        id: QuestionId,
    },
}

impl StructuralOp {
    fn subject(&self) -> &QuestionId {
        match self {
            StructuralOp::Reorder { moved, .. } => moved,
            StructuralOp::Delete { id } => id,
        }
    }

    fn operation(&self) -> ApiOperation {
        match self {
            StructuralOp::Reorder { .. } => ApiOperation::Reorder,
            StructuralOp::Delete { .. } => ApiOperation::Delete,
        }
    }
}

enum Command {
    Op(StructuralOp),
    Flush(oneshot::Sender<()>),
}

/// 结构操作分发器句柄，可以自由克隆
#[derive(Clone)]
pub struct StructuralDispatcher {
    tx: mpsc::UnboundedSender<Command>,
}

impl StructuralDispatcher {
    /// 启动后台任务，必须在 tokio 运行时内调用
    pub fn spawn(
        api: Arc<dyn QuestionApi>,
        worksheet_id: WorksheetId,
        warnings: Arc<WarnSink>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_worker(rx, api, worksheet_id, warnings));
        Self { tx }
    }

    /// 入队，不等待结果
    pub fn dispatch(&self, op: StructuralOp) -> bool {
        debug!("结构操作入队: {:?}", op);
        self.tx.send(Command::Op(op)).is_ok()
    }

    /// 等待此前入队的操作全部完成
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Command>,
    api: Arc<dyn QuestionApi>,
    worksheet_id: WorksheetId,
    warnings: Arc<WarnSink>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Op(op) => {
                if let Err(e) = execute(api.as_ref(), &worksheet_id, &op).await {
                    warnings.push_error(
                        &DraftId::Persistent(op.subject().clone()),
                        op.operation(),
                        &e,
                    );
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("结构操作分发器退出");
}

async fn execute(
    api: &dyn QuestionApi,
    worksheet_id: &WorksheetId,
    op: &StructuralOp,
) -> Result<(), ApiError> {
    match op {
        StructuralOp::Reorder {
            moved,
            target,
            position,
        } => {
            api.reorder_question(worksheet_id, moved, target, *position)
                .await?;
            info!("✓ 题目 {} 已移动到 {} 的{}", moved, target, position_label(*position));
        }
        StructuralOp::Delete { id } => {
            api.delete_question(worksheet_id, id).await?;
            info!("✓ 题目 {} 已删除", id);
        }
    }
    Ok(())
}

fn position_label(position: DropPosition) -> &'static str {
    match position {
        DropPosition::Before => "前面",
        DropPosition::After => "后面",
    }
}
