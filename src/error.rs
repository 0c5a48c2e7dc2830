use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 持久化 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 草稿操作错误
    #[error("草稿错误: {0}")]
    Draft(#[from] DraftError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 编辑会话已关闭
    #[error("编辑会话已关闭")]
    SessionClosed,
}

/// 持久化 API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// API 返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 后端拒绝了请求（内存后端的故障注入也走这里）
    #[error("请求被拒绝 ({endpoint}): {reason}")]
    Rejected { endpoint: String, reason: String },
}

impl ApiError {
    /// 是否为可重试的瞬时故障
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::RequestFailed { .. } | ApiError::Rejected { .. } => true,
            ApiError::BadResponse { status, .. } => *status >= 500 || *status == 429,
            ApiError::EmptyResponse { .. } | ApiError::JsonParseFailed { .. } => false,
        }
    }
}

/// 草稿操作错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DraftError {
    /// 草稿不存在
    #[error("草稿不存在: {id}")]
    NotFound { id: String },
    /// 分值为负数或不是有限数
    #[error("分值必须是非负有限数: {value}")]
    InvalidPoints { value: f64 },
    /// 评分细则的权重为负数或不是有限数
    #[error("第 {index} 条评分细则的权重无效: {value}")]
    InvalidRuleWeight { index: usize, value: f64 },
    /// 题型与题目数据不匹配
    #[error("题型 {kind} 与题目数据 {payload} 不匹配")]
    PayloadKindMismatch { kind: String, payload: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::JsonParseFailed {
            source: Box::new(err),
        }
    }
}

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
