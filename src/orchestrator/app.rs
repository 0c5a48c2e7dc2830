//! 演示应用 - 编排层
//!
//! 选择持久化后端、创建编辑会话，并演示一次"新建题目 → 连续输入 → 自动保存"的过程。

use crate::clients::{HttpQuestionClient, MemoryQuestionApi, QuestionApi};
use crate::config::Config;
use crate::models::{DraftPatch, QuestionKind};
use crate::orchestrator::session::EditorSession;
use crate::utils::{logging, truncate_text};
use crate::workflow::SaveState;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    session: EditorSession,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        let (api, backend): (Arc<dyn QuestionApi>, &str) = if config.uses_remote_api() {
            let client = HttpQuestionClient::new(&config).context("创建 HTTP 客户端失败")?;
            (Arc::new(client), config.api_base_url.as_str())
        } else {
            (Arc::new(MemoryQuestionApi::new()), "内存后端")
        };

        logging::log_session_start(&config.worksheet_id, config.debounce_ms, backend);

        let session = EditorSession::from_config(&config, api);
        Ok(Self { config, session })
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    /// 运行演示
    pub async fn run(&self) -> Result<()> {
        let id = self.session.add_question(QuestionKind::MultipleChoice)?;
        info!("➕ 新建选择题草稿 {}", id);

        // 200 ms 内输入四个字符
        let mut prompt = String::new();
        for ch in "abcd".chars() {
            prompt.push(ch);
            self.session
                .update_question(&id, DraftPatch::new().prompt(prompt.as_str()))?;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        tokio::time::sleep(self.config.debounce() + Duration::from_millis(100)).await;
        while self.session.save_state() == SaveState::Saving {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.session.flush_structural().await;

        self.print_drafts();
        for warning in self.session.drain_warnings() {
            warn!(
                "⚠️ {} {}: {}",
                warning.draft_id, warning.operation, warning.message
            );
        }

        self.session.close();
        Ok(())
    }

    fn print_drafts(&self) {
        let drafts = self.session.drafts();
        info!("\n📋 当前草稿 ({} 道):", drafts.len());
        for draft in &drafts {
            info!(
                "  {}. [{}] {} | {} | {:?}",
                draft.order,
                draft.kind,
                draft.id,
                truncate_text(&draft.prompt, 40),
                draft.sync_status
            );

            if self.config.verbose_logging {
                match serde_json::to_string_pretty(draft) {
                    Ok(json) => info!("{}", json),
                    Err(e) => warn!("草稿 {} 序列化失败: {}", draft.id, e),
                }
            }
        }
    }
}
