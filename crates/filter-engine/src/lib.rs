//! 谓词过滤器树
//!
//! 判断一条记录（一组具名属性）是否满足规则，提供：
//! - 字符串 / 数值 / 缺失三态取值及带容差的匹配语义
//! - any / all / none 组合与存在、等值、集合、范围、外部函数等叶子谓词
//! - 基于代价估算的兄弟节点排序，提高短路概率
//! - 无状态的递归求值，构建完成后可并发使用

pub mod compiler;
pub mod config;
pub mod context;
pub mod cost;
pub mod debug;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod models;
pub mod observability;
pub mod sorter;
pub mod value;

pub use compiler::{lint, CompiledFilter, FilterCompiler, Finding};
pub use crate::config::{EngineConfig, LoggingConfig, OptimizerConfig, ValidationConfig};
pub use context::{EvaluationContext, FilterContext, FilterFunction, Properties, PropertyStore};
pub use error::{FilterError, Result};
pub use evaluator::{eval, FilterMatcher, MatchResult};
pub use models::{Filter, FilterGlobal, FunctionId};
pub use sorter::{compare, compare_set_filter, optimize, sort};
pub use value::Value;
