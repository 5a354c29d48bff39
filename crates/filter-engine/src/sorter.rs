//! 兄弟过滤器排序
//!
//! 构建阶段按估算代价重排同一层的兄弟节点，让廉价且容易失败的条件先求值，
//! 提高组合节点短路的概率。排序只作用于给定的一层，是否递归由调用方决定。

use crate::models::Filter;
use std::cmp::Ordering;
use tracing::trace;

/// 对一层兄弟过滤器排序，返回新序列，输入保持不变
///
/// 比较结果相等的节点保持输入顺序。
pub fn sort(filters: &[Filter]) -> Vec<Filter> {
    let mut entries: Vec<(u32, &Filter)> = filters.iter().map(|f| (f.cost(), f)).collect();

    // 比较器不是严格全序（范围规则只在首个操作数同键时生效），用插入排序保证稳定
    for i in 1..entries.len() {
        let mut j = i;
        while j > 0 && compare_with_cost(entries[j - 1], entries[j]) == Ordering::Greater {
            entries.swap(j - 1, j);
            j -= 1;
        }
    }

    entries.into_iter().map(|(_, f)| f.clone()).collect()
}

/// 比较两个兄弟过滤器的求值先后
pub fn compare(a: &Filter, b: &Filter) -> Ordering {
    compare_with_cost((a.cost(), a), (b.cost(), b))
}

fn compare_with_cost((cost_a, a): (u32, &Filter), (cost_b, b): (u32, &Filter)) -> Ordering {
    if !a.is_operator() && !b.is_operator() {
        // 代价相同时按键降序，使 $zoom 排在 $geometry 之前
        return cost_a
            .cmp(&cost_b)
            .then_with(|| b.key().unwrap_or("").cmp(a.key().unwrap_or("")));
    }

    // 至少一方是组合节点：先比较代价，再比较操作数
    cost_a.cmp(&cost_b).then_with(|| compare_set_filter(a, b))
}

/// 组合节点的次级比较
///
/// 操作数少的在前；数量相同且首个操作数都是同键、上界无穷的范围时，
/// 下界更大（更严格）的在前；其余情况视为相等。
pub fn compare_set_filter(a: &Filter, b: &Filter) -> Ordering {
    let (oa, ob) = (a.operands(), b.operands());

    if oa.len() != ob.len() {
        return oa.len().cmp(&ob.len());
    }

    match (oa.first(), ob.first()) {
        (
            Some(Filter::Range {
                key: key_a,
                min: min_a,
                max: max_a,
                ..
            }),
            Some(Filter::Range {
                key: key_b,
                min: min_b,
                max: max_b,
                ..
            }),
        ) if key_a == key_b && max_a.is_infinite() && max_b.is_infinite() => {
            min_b.partial_cmp(min_a).unwrap_or(Ordering::Equal)
        }
        _ => Ordering::Equal,
    }
}

/// 对组合节点的操作数排序
///
/// `recursive` 为 true 时自底向上处理所有嵌套的组合节点，否则只处理根节点这一层。
/// 叶子节点原样返回。
pub fn optimize(mut filter: Filter, recursive: bool) -> Filter {
    if let Some(operands) = filter.operands_mut() {
        if recursive {
            for operand in operands.iter_mut() {
                *operand = optimize(std::mem::take(operand), true);
            }
        }
        *operands = sort(operands);
        trace!(count = operands.len(), recursive, "兄弟过滤器已排序");
    }
    filter
}
