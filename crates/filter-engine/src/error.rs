//! 过滤器引擎错误类型
//!
//! 错误只出现在构建和配置阶段，求值过程本身不会失败。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("过滤器无效: {0}")]
    InvalidFilter(String),

    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("属性集必须是 JSON 对象, 实际为 {0}")]
    NotAnObject(&'static str),
}

pub type Result<T> = std::result::Result<T, FilterError>;
