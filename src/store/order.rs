//! 排序相关的纯函数，不依赖任何拖拽实现

use crate::error::DraftError;
use crate::models::DraftId;
use serde::{Deserialize, Serialize};

/// 相对目标的放置位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropPosition {
    Before,
    After,
}

impl DropPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropPosition::Before => "before",
            DropPosition::After => "after",
        }
    }
}

/// 拖拽放下的区域
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropZone {
    /// 放在某一项的前面或后面
    Item {
        target: DraftId,
        position: DropPosition,
    },
    /// 列表开头
    ListStart,
    /// 列表末尾
    ListEnd,
}

/// 把放下区域解析为 (目标, 位置)
///
/// 列表两端分别落到第一项之前、最后一项之后；空列表返回 None。
pub fn resolve_drop_zone(sequence: &[DraftId], zone: DropZone) -> Option<(DraftId, DropPosition)> {
    match zone {
        DropZone::Item { target, position } => Some((target, position)),
        DropZone::ListStart => sequence.first().map(|id| (id.clone(), DropPosition::Before)),
        DropZone::ListEnd => sequence.last().map(|id| (id.clone(), DropPosition::After)),
    }
}

/// 计算移动后的新顺序
///
/// # 参数
/// - `sequence`: 当前顺序
/// - `moved`: 被拖动的项
/// - `target`: 锚点项
/// - `position`: 放在锚点之前还是之后
pub fn compute_new_order(
    sequence: &[DraftId],
    moved: &DraftId,
    target: &DraftId,
    position: DropPosition,
) -> Result<Vec<DraftId>, DraftError> {
    let from = index_of(sequence, moved)?;
    index_of(sequence, target)?;

    if moved == target {
        return Ok(sequence.to_vec());
    }

    let mut next = sequence.to_vec();
    let item = next.remove(from);
    let anchor = index_of(&next, target)?;
    let to = match position {
        DropPosition::Before => anchor,
        DropPosition::After => anchor + 1,
    };
    next.insert(to, item);

    Ok(next)
}

/// 按当前顺序为某一项计算锚点
///
/// 优先取前面最近的可用项（放在其后），否则取后面最近的可用项（放在其前）。
pub fn placement_anchor<F>(
    sequence: &[DraftId],
    id: &DraftId,
    usable: F,
) -> Option<(DraftId, DropPosition)>
where
    F: Fn(&DraftId) -> bool,
{
    let index = sequence.iter().position(|candidate| candidate == id)?;

    if let Some(prev) = sequence[..index].iter().rev().find(|c| usable(*c)) {
        return Some((prev.clone(), DropPosition::After));
    }
    sequence[index + 1..]
        .iter()
        .find(|c| usable(*c))
        .map(|next| (next.clone(), DropPosition::Before))
}

fn index_of(sequence: &[DraftId], id: &DraftId) -> Result<usize, DraftError> {
    sequence
        .iter()
        .position(|candidate| candidate == id)
        .ok_or_else(|| DraftError::NotFound { id: id.to_string() })
}
