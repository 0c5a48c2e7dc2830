//! 拖拽适配
//!
//! 把界面层的拖拽事件折叠为一次 (被拖项, 目标, 位置) 移动请求。

use crate::models::DraftId;
use crate::store::{resolve_drop_zone, DropPosition, DropZone};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    PickedUp(DraftId),
    Dropped(DropZone),
    Cancelled,
}

#[derive(Debug, Default)]
pub struct DragTracker {
    dragging: Option<DraftId>,
}

impl DragTracker {
    /// 当前正在拖动的项
    pub fn dragging(&self) -> Option<&DraftId> {
        self.dragging.as_ref()
    }

    /// 处理一个拖拽事件，放下时返回移动请求
    ///
    /// 没有拿起就放下、或列表为空时，不产生请求。
    pub fn handle(
        &mut self,
        event: DragEvent,
        sequence: &[DraftId],
    ) -> Option<(DraftId, DraftId, DropPosition)> {
        match event {
            DragEvent::PickedUp(id) => {
                self.dragging = Some(id);
                None
            }
            DragEvent::Cancelled => {
                self.dragging = None;
                None
            }
            DragEvent::Dropped(zone) => {
                let moved = self.dragging.take()?;
                let (target, position) = resolve_drop_zone(sequence, zone)?;
                Some((moved, target, position))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_and_drop_on_item() {
        let seq = vec![DraftId::new_temp(), DraftId::new_temp()];
        let mut tracker = DragTracker::default();

        assert_eq!(tracker.handle(DragEvent::PickedUp(seq[1].clone()), &seq), None);
        assert_eq!(tracker.dragging(), Some(&seq[1]));

        let request = tracker.handle(
            DragEvent::Dropped(DropZone::Item {
                target: seq[0].clone(),
                position: DropPosition::Before,
            }),
            &seq,
        );
        assert_eq!(
            request,
            Some((seq[1].clone(), seq[0].clone(), DropPosition::Before))
        );
        assert_eq!(tracker.dragging(), None);
    }

    #[test]
    fn test_drop_on_list_end() {
        let seq = vec![DraftId::new_temp(), DraftId::new_temp(), DraftId::new_temp()];
        let mut tracker = DragTracker::default();

        tracker.handle(DragEvent::PickedUp(seq[0].clone()), &seq);
        let request = tracker.handle(DragEvent::Dropped(DropZone::ListEnd), &seq);
        assert_eq!(
            request,
            Some((seq[0].clone(), seq[2].clone(), DropPosition::After))
        );
    }

    #[test]
    fn test_cancel_and_stray_drop() {
        let seq = vec![DraftId::new_temp()];
        let mut tracker = DragTracker::default();

        tracker.handle(DragEvent::PickedUp(seq[0].clone()), &seq);
        tracker.handle(DragEvent::Cancelled, &seq);
        assert_eq!(
            tracker.handle(DragEvent::Dropped(DropZone::ListStart), &seq),
            None
        );
    }
}
