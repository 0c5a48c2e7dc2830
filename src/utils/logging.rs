/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先，否则使用 `default_level`。重复调用是安全的。
pub fn init(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录会话启动信息
///
/// # 参数
/// - `worksheet_id`: 试卷ID
/// - `debounce_ms`: 防抖静默期
/// - `backend`: 后端描述
pub fn log_session_start(worksheet_id: &str, debounce_ms: u64, backend: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 编辑会话启动 - 试卷 {}", worksheet_id);
    info!("⏱️ 防抖静默期: {} ms", debounce_ms);
    info!("🔌 持久化后端: {}", backend);
    info!("{}", "=".repeat(60));
}

/// 记录一次保存周期的结果
///
/// # 参数
/// - `created`: 新建成功数量
/// - `updated`: 更新成功数量
/// - `failed`: 失败数量
pub fn log_save_complete(created: usize, updated: usize, failed: usize) {
    info!("{}", "─".repeat(60));
    info!(
        "✓ 保存周期完成: 新建 {} / 更新 {} / 失败 {}",
        created, updated, failed
    );
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
