//! 过滤器求值
//!
//! 递归遍历过滤器树，按兄弟节点当前顺序短路求值。求值过程不修改任何状态，
//! 同一棵树可以在多个线程上针对不同记录并发求值。

use crate::context::{FilterContext, PropertyStore};
use crate::debug::describe;
use crate::matcher::{match_equal, match_equal_set, match_range};
use crate::models::{Filter, FilterGlobal};
use crate::value::Value;

/// 判断记录是否满足过滤器
pub fn eval<P, C>(filter: &Filter, props: &P, ctx: &C) -> bool
where
    P: PropertyStore + ?Sized,
    C: FilterContext + ?Sized,
{
    match filter {
        Filter::Any { operands } => operands.iter().any(|f| eval(f, props, ctx)),
        Filter::All { operands } => operands.iter().all(|f| eval(f, props, ctx)),
        Filter::NoneOf { operands } => !operands.iter().any(|f| eval(f, props, ctx)),
        Filter::Existence { key, exists } => *exists == props.contains(key),
        Filter::Equality { key, value, global } => {
            match_equal(value, resolve(key, *global, props, ctx))
        }
        Filter::EqualitySet {
            key,
            values,
            global,
        } => match_equal_set(values, resolve(key, *global, props, ctx)),
        Filter::Range {
            key,
            min,
            max,
            global,
        } => match_range(*min, *max, resolve(key, *global, props, ctx)),
        Filter::Function { id } => ctx.eval_function(*id),
        Filter::Always => true,
    }
}

/// 叶子过滤器的取值：有全局引用时读上下文，否则按键查记录
fn resolve<'a, P, C>(
    key: &str,
    global: Option<FilterGlobal>,
    props: &'a P,
    ctx: &'a C,
) -> &'a Value
where
    P: PropertyStore + ?Sized,
    C: FilterContext + ?Sized,
{
    match global {
        Some(global) => ctx.global(global),
        None => props.get(key),
    }
}

impl Filter {
    /// 判断记录是否满足该过滤器
    pub fn eval<P, C>(&self, props: &P, ctx: &C) -> bool
    where
        P: PropertyStore + ?Sized,
        C: FilterContext + ?Sized,
    {
        eval(self, props, ctx)
    }
}

/// 带追踪信息的求值结果
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub matched: bool,
    /// 实际求值过的叶子节点数量
    pub evaluated_leaves: usize,
    pub trace: Vec<String>,
}

/// 可记录求值过程的匹配器
///
/// 结果与 [`eval`] 一致，额外记录访问过的节点和短路位置，用于排查规则。
pub struct FilterMatcher {
    trace_enabled: bool,
}

impl FilterMatcher {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用求值追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn evaluate<P, C>(&self, filter: &Filter, props: &P, ctx: &C) -> MatchResult
    where
        P: PropertyStore + ?Sized,
        C: FilterContext + ?Sized,
    {
        let mut result = MatchResult::default();
        result.matched = self.evaluate_node(filter, props, ctx, &mut result, "root");
        result
    }

    fn evaluate_node<P, C>(
        &self,
        filter: &Filter,
        props: &P,
        ctx: &C,
        result: &mut MatchResult,
        path: &str,
    ) -> bool
    where
        P: PropertyStore + ?Sized,
        C: FilterContext + ?Sized,
    {
        if !filter.is_operator() {
            let matched = eval(filter, props, ctx);
            result.evaluated_leaves += 1;

            if self.trace_enabled {
                result.trace.push(format!(
                    "{}: {} => {}",
                    path,
                    describe(filter),
                    if matched { "MATCHED" } else { "NOT_MATCHED" }
                ));
            }
            return matched;
        }

        let operands = filter.operands();
        if self.trace_enabled {
            result.trace.push(format!(
                "{}: 开始评估 {} 组 (共 {} 个子节点)",
                path,
                describe(filter),
                operands.len()
            ));
        }

        // any 在遇到 true 时短路，all 和 none 分别在遇到 false / true 时短路
        let stop_on = !matches!(filter, Filter::All { .. });
        for (i, operand) in operands.iter().enumerate() {
            let child_path = format!("{}.operands[{}]", path, i);
            let child = self.evaluate_node(operand, props, ctx, result, &child_path);

            if child == stop_on {
                if self.trace_enabled {
                    result
                        .trace
                        .push(format!("{}: {} 短路 - 子节点 {}", path, describe(filter), i));
                }
                return match filter {
                    Filter::NoneOf { .. } => false,
                    _ => child,
                };
            }
        }

        match filter {
            Filter::Any { .. } => false,
            _ => true,
        }
    }
}

impl Default for FilterMatcher {
    fn default() -> Self {
        Self::new()
    }
}
