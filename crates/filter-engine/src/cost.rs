//! 过滤器求值代价估算
//!
//! 代价只用于兄弟节点排序，与匹配结果无关。

use crate::models::Filter;

/// 组合节点的额外代价，避免与同样廉价的简单过滤器混排
pub const OPERATOR_COST: u32 = 100;
/// 存在性检查排在等值和范围之后：更具体的条件更容易提前失败
pub const EXISTENCE_COST: u32 = 20;
/// 按键查找记录属性
pub const PROPERTY_LOOKUP_COST: u32 = 10;
/// 读取上下文全局变量
pub const GLOBAL_LOOKUP_COST: u32 = 1;
/// 外部函数总是最后求值
pub const FUNCTION_COST: u32 = 1000;

impl Filter {
    /// 估算求值代价
    pub fn cost(&self) -> u32 {
        match self {
            Self::Any { operands } | Self::All { operands } | Self::NoneOf { operands } => {
                operator_cost(operands.iter().map(Filter::cost))
            }
            Self::Existence { .. } => EXISTENCE_COST,
            Self::EqualitySet { global, .. }
            | Self::Equality { global, .. }
            | Self::Range { global, .. } => match global {
                Some(_) => GLOBAL_LOOKUP_COST,
                None => PROPERTY_LOOKUP_COST,
            },
            Self::Function { .. } => FUNCTION_COST,
            // 恒真节点没有求值开销
            Self::Always => 0,
        }
    }
}

/// 组合节点代价，超大树在 u32::MAX 处饱和
fn operator_cost(operand_costs: impl Iterator<Item = u32>) -> u32 {
    operand_costs.fold(OPERATOR_COST, u32::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FilterGlobal;
    use crate::value::Value;

    #[test]
    fn test_leaf_costs() {
        assert_eq!(Filter::exists("name").cost(), 20);
        assert_eq!(Filter::missing("name").cost(), 20);
        assert_eq!(Filter::equals("kind", "park").cost(), 10);
        assert_eq!(Filter::one_of("kind", vec![Value::from("park")]).cost(), 10);
        assert_eq!(Filter::range("height", 0.0, 10.0).cost(), 10);
        assert_eq!(Filter::function(0).cost(), 1000);
        assert_eq!(Filter::Always.cost(), 0);
    }

    #[test]
    fn test_global_lookup_is_cheaper() {
        assert_eq!(Filter::global_equals(FilterGlobal::Geometry, "point").cost(), 1);
        assert_eq!(
            Filter::global_one_of(FilterGlobal::Geometry, vec![Value::from("line")]).cost(),
            1
        );
        assert_eq!(Filter::global_range(FilterGlobal::Zoom, 0.0, 10.0).cost(), 1);
        assert!(
            Filter::global_range(FilterGlobal::Zoom, 0.0, 10.0).cost()
                < Filter::range("$zoom", 0.0, 10.0).cost()
        );
    }

    #[test]
    fn test_operator_cost_sums_operands() {
        assert_eq!(Filter::any(vec![]).cost(), 100);
        assert_eq!(
            Filter::all(vec![Filter::equals("kind", "park"), Filter::exists("name")]).cost(),
            130
        );

        let nested = Filter::none_of(vec![
            Filter::function(1),
            Filter::any(vec![Filter::global_equals(FilterGlobal::Zoom, 3)]),
        ]);
        assert_eq!(nested.cost(), 100 + 1000 + 101);
    }

    #[test]
    fn test_operator_cost_saturates() {
        let costs = std::iter::repeat_n(FUNCTION_COST, 5_000_000);
        assert_eq!(operator_cost(costs), u32::MAX);

        let nested = Filter::any(vec![Filter::function(0); 4]);
        assert_eq!(operator_cost([u32::MAX - 50, nested.cost()].into_iter()), u32::MAX);
    }
}
