//! 排序流程 - 流程层
//!
//! 本地顺序立即更新；服务端只接收两端都是持久 ID 的锚点移动。
//!
//! | 被拖项 | 目标 | 处理 |
//! |--------|------|------|
//! | 持久   | 持久 | 直接下发 |
//! | 临时   | 任意 | 仅本地，新建成功时再补位 |
//! | 持久   | 临时 | 改用最近的持久兄弟作锚点，没有则仅本地 |

use crate::error::DraftError;
use crate::models::{DraftId, QuestionId};
use crate::store::{placement_anchor, DraftStore, DropPosition};
use crate::workflow::dispatcher::{StructuralDispatcher, StructuralOp};
use crate::workflow::state::SessionState;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// 顺序没有变化，不发请求
    Unchanged,
    /// 已下发到服务端
    Dispatched(StructuralOp),
    /// 只改了本地顺序
    LocalOnly,
}

pub struct ReorderChannel {
    dispatcher: StructuralDispatcher,
}

impl ReorderChannel {
    pub fn new(dispatcher: StructuralDispatcher) -> Self {
        Self { dispatcher }
    }

    /// 移动一项
    ///
    /// # 参数
    /// - `dragged`: 被拖动的草稿（临时 ID 在对账后依然可用）
    /// - `target`: 锚点草稿
    /// - `position`: 放在锚点之前还是之后
    pub fn move_item(
        &self,
        state: &mut SessionState,
        dragged: &DraftId,
        target: &DraftId,
        position: DropPosition,
    ) -> Result<MoveOutcome, DraftError> {
        if !state.store.splice_order(dragged, target, position)? {
            return Ok(MoveOutcome::Unchanged);
        }

        let moved = state.store.resolve(dragged);
        let Some(moved_id) = moved.as_persistent() else {
            debug!("草稿 {} 尚未保存，排序只在本地生效", moved);
            return Ok(MoveOutcome::LocalOnly);
        };

        let op = match state.store.resolve(target).as_persistent() {
            Some(target_id) => StructuralOp::Reorder {
                moved: moved_id.clone(),
                target: target_id.clone(),
                position,
            },
            None => match anchored_reorder(&state.store, moved_id) {
                Some(op) => op,
                None => {
                    debug!("草稿 {} 附近没有已保存的题目，排序只在本地生效", moved);
                    return Ok(MoveOutcome::LocalOnly);
                }
            },
        };

        self.dispatcher.dispatch(op.clone());
        Ok(MoveOutcome::Dispatched(op))
    }
}

/// 新建成功后让服务端位置与本地一致
///
/// 服务端总把新题追加到末尾；本地它后面还有已保存的题目时才需要补位。
pub fn placement_for_created(store: &DraftStore, created: &QuestionId) -> Option<StructuralOp> {
    let order = store.order();
    let id = DraftId::Persistent(created.clone());
    let index = order.iter().position(|candidate| candidate == &id)?;

    if !order[index + 1..].iter().any(|candidate| !candidate.is_temp()) {
        return None;
    }
    anchored_reorder(store, created)
}

/// 以最近的持久兄弟为锚点的移动
fn anchored_reorder(store: &DraftStore, moved: &QuestionId) -> Option<StructuralOp> {
    let order = store.order();
    let (anchor, position) = placement_anchor(
        &order,
        &DraftId::Persistent(moved.clone()),
        |candidate| !candidate.is_temp(),
    )?;

    Some(StructuralOp::Reorder {
        moved: moved.clone(),
        target: anchor.as_persistent()?.clone(),
        position,
    })
}
