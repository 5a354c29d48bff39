//! 过滤器树调试输出
//!
//! 输出格式仅供阅读，不保证稳定。

use crate::models::Filter;
use std::fmt;
use tracing::debug;

/// 单个节点的一行描述（不含子节点）
pub(crate) fn describe(filter: &Filter) -> String {
    match filter {
        Filter::Any { .. } => "any".to_string(),
        Filter::All { .. } => "all".to_string(),
        Filter::NoneOf { .. } => "none".to_string(),
        Filter::Existence { key, exists } => {
            format!("existence - key:{} exists:{}", key, exists)
        }
        Filter::Equality { key, value, global } => format!(
            "equality - global:{} key:{} val:{}",
            u8::from(global.is_some()),
            key,
            value
        ),
        Filter::EqualitySet {
            key,
            values,
            global,
        } => {
            let values: Vec<String> = values.iter().map(ToString::to_string).collect();
            format!(
                "equality set - global:{} key:{} vals:[{}]",
                u8::from(global.is_some()),
                key,
                values.join(", ")
            )
        }
        Filter::Range {
            key,
            min,
            max,
            global,
        } => format!(
            "range - global:{} key:{} min:{:.6} max:{:.6}",
            u8::from(global.is_some()),
            key,
            min,
            max
        ),
        Filter::Function { id } => format!("function - id:{}", id),
        Filter::Always => "always".to_string(),
    }
}

fn write_tree(f: &mut fmt::Formatter<'_>, filter: &Filter, indent: usize) -> fmt::Result {
    writeln!(f, "{:indent$}{}", "", describe(filter), indent = indent)?;
    for operand in filter.operands() {
        write_tree(f, operand, indent + 2)?;
    }
    Ok(())
}

impl Filter {
    /// 缩进的树形描述，每层缩进两个空格
    pub fn dump(&self) -> String {
        self.to_string()
    }

    /// 以 debug 级别输出整棵树
    pub fn log_tree(&self, label: &str) {
        debug!(label, cost = self.cost(), "过滤器树:\n{}", self.dump());
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tree(f, self, 0)
    }
}
