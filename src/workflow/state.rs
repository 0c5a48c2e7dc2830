//! 会话状态
//!
//! 草稿存储、快照、保存状态、生命周期都归一个编辑会话独占。
//! 锁只在同步代码段内持有，从不跨越 `.await`。

use crate::services::Snapshot;
use crate::store::DraftStore;
use crate::workflow::drag::DragTracker;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 保存状态（互斥标志）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Saving,
}

/// 会话生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Closed,
}

#[derive(Debug)]
pub struct SessionState {
    pub store: DraftStore,
    pub snapshot: Snapshot,
    pub save_state: SaveState,
    pub lifecycle: Lifecycle,
    pub drag: DragTracker,
    /// 保存进行中又收到了触发，本周期结束后需要再来一轮
    pub rerun_requested: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            store: DraftStore::new(),
            snapshot: Snapshot::empty(),
            save_state: SaveState::Idle,
            lifecycle: Lifecycle::Active,
            drag: DragTracker::default(),
            rerun_requested: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    /// 取出并清除"需要再来一轮"标记
    pub fn take_rerun(&mut self) -> bool {
        std::mem::take(&mut self.rerun_requested)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// 会话内共享的状态句柄
#[derive(Debug, Clone, Default)]
pub struct SharedState(Arc<Mutex<SessionState>>);

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
