//! 防抖调度服务 - 业务能力层
//!
//! 把一串连续的编辑合并为一次保存触发：每次 `notify_edit` 都重新开始静默期计时，
//! 静默期内没有新的编辑时才执行一次动作。

use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// 静默期结束后执行的动作
pub type DebouncedAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// 防抖调度器
///
/// 持有可取消的计时任务句柄。计时结束后动作在独立任务中运行，
/// 因此重新计时或 `cancel` 只会取消计时，不会打断正在执行的动作。
pub struct DebounceScheduler {
    quiet: Duration,
    action: DebouncedAction,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl DebounceScheduler {
    pub fn new(quiet: Duration, action: DebouncedAction) -> Self {
        Self {
            quiet,
            action,
            timer: Mutex::new(None),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    fn timer(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 记录一次编辑，重新开始计时
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn notify_edit(&self) {
        let mut timer = self.timer();
        if let Some(handle) = timer.take() {
            handle.abort();
        }

        let action = self.action.clone();
        let quiet = self.quiet;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            debug!("静默期结束，触发保存");
            tokio::spawn(action());
        }));
    }

    /// 取消尚未到期的计时，返回是否真的取消了一个计时
    pub fn cancel(&self) -> bool {
        match self.timer().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// 是否有尚未到期的计时
    pub fn is_pending(&self) -> bool {
        self.timer()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
