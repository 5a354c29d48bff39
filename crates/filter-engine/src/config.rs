//! 配置管理模块
//!
//! 支持配置文件加载与环境变量覆盖。

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 兄弟节点排序配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// 编译时是否按代价重排兄弟节点
    pub sort_siblings: bool,
    /// 是否对嵌套的组合节点逐层排序
    pub recursive: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            sort_siblings: true,
            recursive: false,
        }
    }
}

/// 结构检查配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// 为 true 时结构问题导致编译失败，否则只记录警告
    pub strict: bool,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_level: String,
    /// 是否输出 JSON 格式日志
    pub json_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// 引擎配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub environment: String,
    pub optimizer: OptimizerConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的覆盖先加载的同名配置项）：
    /// 1. config/default.toml
    /// 2. config/{environment}.toml，environment 取自 FILTER_ENV，默认 development
    /// 3. 环境变量（FILTER_ 前缀，层级用双下划线分隔，如 FILTER_OPTIMIZER__RECURSIVE -> optimizer.recursive）
    pub fn load() -> Result<Self> {
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        Self::load_from(Path::new(&config_dir))
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path) -> Result<Self> {
        let env = std::env::var("FILTER_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .set_default("environment", env.clone())?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                Environment::with_prefix("FILTER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
