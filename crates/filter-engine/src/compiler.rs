//! 过滤器编译器
//!
//! 供构建方在发布过滤器树之前调用：结构检查、按配置重排兄弟节点、预提取引用的属性键。

use crate::config::{EngineConfig, OptimizerConfig, ValidationConfig};
use crate::context::{FilterContext, PropertyStore};
use crate::error::{FilterError, Result};
use crate::models::{Filter, FilterGlobal};
use crate::sorter::optimize;
use crate::value::Value;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// 结构检查发现的问题
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// 节点路径，如 root.operands[1]
    pub path: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// 检查过滤器树中不会匹配或无意义的节点
///
/// 这些节点求值时只会得到 false（或恒定结果），不影响正确性。
pub fn lint(filter: &Filter) -> Vec<Finding> {
    let mut findings = Vec::new();
    lint_node(filter, "root", &mut findings);
    findings
}

fn lint_node(filter: &Filter, path: &str, findings: &mut Vec<Finding>) {
    let mut report = |message: String| {
        findings.push(Finding {
            path: path.to_string(),
            message,
        })
    };

    if filter.global().is_none() && filter.key() == Some("") {
        report("属性键为空".to_string());
    }

    match filter {
        Filter::Any { operands } | Filter::All { operands } | Filter::NoneOf { operands } => {
            if operands.is_empty() {
                report("组合节点没有操作数".to_string());
            }
            for (i, operand) in operands.iter().enumerate() {
                lint_node(operand, &format!("{}.operands[{}]", path, i), findings);
            }
        }
        Filter::Equality { value, .. } => {
            if value.is_absent() {
                report("期望值缺失，永远不会匹配".to_string());
            }
        }
        Filter::EqualitySet { values, .. } => {
            if values.is_empty() {
                report("集合为空，永远不会匹配".to_string());
            } else if values.iter().all(Value::is_absent) {
                report("集合只包含缺失值，永远不会匹配".to_string());
            }
        }
        Filter::Range { min, max, .. } => {
            if min.is_nan() || max.is_nan() {
                report("范围边界为 NaN，永远不会匹配".to_string());
            } else if min >= max {
                report(format!("范围 [{}, {}) 为空，永远不会匹配", min, max));
            }
        }
        Filter::Existence { .. } | Filter::Function { .. } | Filter::Always => {}
    }
}

/// 编译后的过滤器
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    /// 已排序的过滤器树
    pub filter: Filter,
    /// 引用的记录属性键（不含全局变量）
    pub required_keys: HashSet<String>,
    /// 引用的全局变量
    pub required_globals: HashSet<FilterGlobal>,
    /// 整棵树的估算代价
    pub cost: u32,
    /// 编译版本号（用于缓存失效）
    pub compile_version: u64,
}

impl CompiledFilter {
    pub fn eval<P, C>(&self, props: &P, ctx: &C) -> bool
    where
        P: PropertyStore + ?Sized,
        C: FilterContext + ?Sized,
    {
        self.filter.eval(props, ctx)
    }
}

/// 过滤器编译器
pub struct FilterCompiler {
    optimizer: OptimizerConfig,
    validation: ValidationConfig,
    compile_version: u64,
}

impl FilterCompiler {
    pub fn new() -> Self {
        Self::with_config(OptimizerConfig::default(), ValidationConfig::default())
    }

    pub fn with_config(optimizer: OptimizerConfig, validation: ValidationConfig) -> Self {
        Self {
            optimizer,
            validation,
            compile_version: 0,
        }
    }

    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self::with_config(config.optimizer.clone(), config.validation.clone())
    }

    /// 编译过滤器树
    pub fn compile(&mut self, filter: Filter) -> Result<CompiledFilter> {
        let findings = lint(&filter);
        if !findings.is_empty() {
            if self.validation.strict {
                let messages: Vec<String> = findings.iter().map(ToString::to_string).collect();
                return Err(FilterError::InvalidFilter(messages.join("; ")));
            }
            for finding in &findings {
                warn!(path = %finding.path, "过滤器结构问题: {}", finding.message);
            }
        }

        let filter = if self.optimizer.sort_siblings {
            optimize(filter, self.optimizer.recursive)
        } else {
            filter
        };

        let mut required_keys = HashSet::new();
        let mut required_globals = HashSet::new();
        collect_references(&filter, &mut required_keys, &mut required_globals);

        self.compile_version += 1;
        let cost = filter.cost();

        debug!(
            compile_version = self.compile_version,
            cost,
            keys = required_keys.len(),
            "过滤器已编译"
        );

        Ok(CompiledFilter {
            filter,
            required_keys,
            required_globals,
            cost,
            compile_version: self.compile_version,
        })
    }
}

impl Default for FilterCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// 递归收集引用的属性键和全局变量
fn collect_references(
    filter: &Filter,
    keys: &mut HashSet<String>,
    globals: &mut HashSet<FilterGlobal>,
) {
    match (filter.global(), filter.key()) {
        (Some(global), _) => {
            globals.insert(global);
        }
        (None, Some(key)) => {
            keys.insert(key.to_string());
        }
        (None, None) => {}
    }

    for operand in filter.operands() {
        collect_references(operand, keys, globals);
    }
}
