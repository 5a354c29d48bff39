//! 值匹配
//!
//! 所有比较都按类型分派，类型不一致一律不匹配。

use crate::value::Value;

/// 字符串只做精确比较
fn match_string(expected: &str, actual: &Value) -> bool {
    matches!(actual, Value::String(s) if s == expected)
}

/// 数值相等：完全相同，或差值不超过机器精度（吸收上游解码的舍入误差）
fn match_number(expected: f64, actual: &Value) -> bool {
    match actual {
        Value::Number(n) => *n == expected || (n - expected).abs() <= f64::EPSILON,
        _ => false,
    }
}

/// 等值匹配
pub fn match_equal(expected: &Value, actual: &Value) -> bool {
    match expected {
        Value::String(s) => match_string(s, actual),
        Value::Number(n) => match_number(*n, actual),
        Value::Absent => false,
    }
}

/// 集合匹配：与任意一项相等即可，空集合永不匹配
pub fn match_equal_set(values: &[Value], actual: &Value) -> bool {
    match actual {
        Value::String(s) => values.iter().any(|v| match_string(s, v)),
        Value::Number(n) => values.iter().any(|v| match_number(*n, v)),
        Value::Absent => false,
    }
}

/// 范围匹配：只有数值参与，min <= value < max
pub fn match_range(min: f64, max: f64, actual: &Value) -> bool {
    match actual {
        Value::Number(n) => *n >= min && *n < max,
        Value::String(_) | Value::Absent => false,
    }
}
