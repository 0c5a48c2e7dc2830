use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 正在编辑的试卷 ID
    pub worksheet_id: String,
    /// 防抖静默期（毫秒）
    pub debounce_ms: u64,
    /// 持久化 API 地址，为空时使用内存后端
    pub api_base_url: String,
    /// 透传给 API 的静态令牌
    pub api_token: Option<String>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 警告输出文件，为空则只记录在内存中
    pub warn_file: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 默认日志级别（RUST_LOG 优先）
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            worksheet_id: "demo-worksheet".to_string(),
            debounce_ms: 500,
            api_base_url: String::new(),
            api_token: None,
            request_timeout_secs: 10,
            warn_file: None,
            verbose_logging: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量加载，解析失败的值回退到默认值
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            worksheet_id: std::env::var("WORKSHEET_ID").unwrap_or(default.worksheet_id),
            debounce_ms: std::env::var("DEBOUNCE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.debounce_ms),
            api_base_url: std::env::var("API_BASE_URL").unwrap_or(default.api_base_url),
            api_token: std::env::var("API_TOKEN").ok().or(default.api_token),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            warn_file: std::env::var("WARN_FILE").ok().or(default.warn_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(default.log_level),
        }
    }

    /// 从环境变量加载，数值解析失败时报错
    pub fn try_from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_env();
        config.debounce_ms = parse_env("DEBOUNCE_MS", "u64")?.unwrap_or(config.debounce_ms);
        config.request_timeout_secs =
            parse_env("REQUEST_TIMEOUT_SECS", "u64")?.unwrap_or(config.request_timeout_secs);
        config.verbose_logging =
            parse_env("VERBOSE_LOGGING", "bool")?.unwrap_or(config.verbose_logging);
        Ok(config)
    }

    /// 程序入口使用的加载方式：设置了 `CONFIG_FILE` 时读取该 TOML 文件，否则读环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = std::env::var("CONFIG_FILE").ok();
        Self::load_from(config_file.as_deref().map(Path::new))
    }

    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        match config_file {
            Some(path) => Self::from_toml_file(path),
            None => Self::try_from_env(),
        }
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 是否配置了远程 API
    pub fn uses_remote_api(&self) -> bool {
        !self.api_base_url.trim().is_empty()
    }
}

fn parse_env<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &str,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
        Err(_) => Ok(None),
    }
}
